//! Single-writer actor serializing all database mutations.
//!
//! SQLite permits one writer at a time. Instead of letting pool connections
//! contend for the write lock, every mutation is shipped to one background
//! task that owns a dedicated connection and runs each job inside an
//! immediate transaction. A job is all-or-nothing, which is exactly what the
//! reconciliation and correction batches require.

use diesel::SqliteConnection;
use log::error;
use std::any::Any;
use tokio::sync::{mpsc, oneshot};

use super::DbPool;
use crate::errors::StorageError;
use rollcall_core::errors::{DatabaseError, Error, Result};

/// A write job: runs against the writer's connection, already inside a
/// transaction. The return type is erased so one channel carries all jobs.
type Job = Box<dyn FnOnce(&mut SqliteConnection) -> Result<Erased> + Send + 'static>;
type Erased = Box<dyn Any + Send + 'static>;

const QUEUE_DEPTH: usize = 1024;

/// Handle for submitting jobs to the writer actor. Cheap to clone.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(Job, oneshot::Sender<Result<Erased>>)>,
}

impl WriteHandle {
    /// Run `job` on the writer connection inside an immediate transaction
    /// and return its result. The transaction commits only when the job
    /// returns `Ok`.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Any + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |conn| job(conn).map(|value| Box::new(value) as Erased)),
                reply_tx,
            ))
            .await
            .map_err(|_| writer_gone())?;

        let result = reply_rx.await.map_err(|_| writer_gone())?;
        result.map(|boxed| {
            *boxed
                .downcast::<T>()
                .unwrap_or_else(|_| panic!("write job returned a value of the wrong type"))
        })
    }
}

fn writer_gone() -> Error {
    Error::Database(DatabaseError::Internal(
        "database writer actor is not running".to_string(),
    ))
}

/// Spawn the background writer task. It checks out one connection and
/// processes jobs serially until every [`WriteHandle`] is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(Job, oneshot::Sender<Result<Erased>>)>(QUEUE_DEPTH);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(err) => {
                error!("writer actor could not check out a connection: {err}");
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Erased> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(Error::from);

            // A caller that gave up waiting is the only way this send fails.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
