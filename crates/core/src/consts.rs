//! Constant variables.

/// Widest identifier accepted, in bits.
pub const MAX_DID_BITS: u16 = 1024;
/// Identifier width used when nothing else is configured.
pub const DEFAULT_DID_BITS: u16 = 160;
/// Seconds between two stabilization rounds.
pub const DEFAULT_STABILIZE_INTERVAL_SECS: u64 = 10;
/// Seconds a cached peer connection may stay idle before it is closed.
pub const DEFAULT_STALE_CONNECTION_SECS: i64 = 180;
/// Longest idle window accepted for cached peer connections, 30 days.
pub const MAX_STALE_CONNECTION_SECS: i64 = 30 * 24 * 3600;
/// Milliseconds to wait for a peer to answer one request.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;
