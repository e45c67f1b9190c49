/// Area recorded when a scan carries no area name.
pub const UNKNOWN_AREA: &str = "Unknown";

/// Maximum time a check-in session may stay open before correction closes it.
pub const MAX_OPEN_SESSION_HOURS: i64 = 3;

/// Minimum recognition confidence accepted for a check-in.
pub const RECOGNITION_CONFIDENCE_THRESHOLD: f64 = 0.75;

/// TTL for the per-day check-in snapshot served to new subscribers.
pub const SNAPSHOT_TTL_SECS: u64 = 5;

/// Capacity of each day topic's broadcast channel.
pub const TOPIC_CHANNEL_CAPACITY: usize = 64;
