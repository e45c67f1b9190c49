//! Connection pooling, migrations, and write serialization.
//!
//! The pool is an explicitly owned handle created once at startup and passed
//! into repositories; nothing in this crate reaches for ambient global
//! state.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::fs;
use std::path::Path;

use crate::errors::StorageError;
use rollcall_core::errors::{DatabaseError, Error, Result};

mod write_actor;
pub use write_actor::{spawn_writer, WriteHandle};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const POOL_MAX_SIZE: u32 = 8;

/// Per-checkout connection tuning. Foreign keys are opt-in per connection in
/// SQLite; WAL keeps readers unblocked while the writer actor holds its
/// transaction.
#[derive(Debug, Clone, Copy)]
struct ConnectionTuning;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionTuning {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Create the database file if needed, build the pool, and run pending
/// migrations. This is the one-time initialization entry point; the returned
/// pool is the handle everything else borrows.
pub fn init(db_path: &str) -> Result<DbPool> {
    if !Path::new(db_path).exists() {
        create_db_file(db_path)?;
    }
    let pool = create_pool(db_path)?;
    run_migrations(&pool)?;
    Ok(pool)
}

pub fn create_pool(db_path: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .connection_customizer(Box::new(ConnectionTuning))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::PoolCreationFailed(e.to_string())))
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = get_connection(pool)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|e| StorageError::MigrationFailed(e.to_string()).into())
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get().map_err(|e| StorageError::Pool(e).into())
}

fn create_db_file(db_path: &str) -> Result<()> {
    let io_err = |e: std::io::Error| Error::Database(DatabaseError::ConnectionFailed(e.to_string()));

    if let Some(dir) = Path::new(db_path).parent() {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
    }
    fs::File::create(db_path).map(|_| ()).map_err(io_err)
}
