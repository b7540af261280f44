//! Transient error classification.
//!
//! Remote libSQL replicas surface short-lived infrastructure failures (node
//! recycling, shared lock contention, dropped connections) that resolve on
//! their own within seconds. The synchronizer retries these with backoff;
//! everything else is surfaced immediately. SQL and constraint errors never
//! match.

const TRANSIENT_MARKERS: &[&str] = &[
    "unable to acquire shared lock",
    "deletion must be in progress",
    "database is locked",
    "connection reset",
    "connection refused",
    "broken pipe",
    "timed out",
    "stream closed",
];

/// Detect transient libSQL errors by message.
pub fn is_transient_libsql_error(e: &libsql::Error) -> bool {
    is_transient_message(&e.to_string())
}

fn is_transient_message(msg: &str) -> bool {
    let msg = msg.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| msg.contains(marker))
}
