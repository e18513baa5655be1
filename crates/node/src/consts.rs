//! Defaults of the node daemon.

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 50100;
pub const DEFAULT_CONFIG_LOCATION: &str = "~/.chordkv/config.yaml";
pub use chordkv_core::consts::DEFAULT_DID_BITS as DEFAULT_HASH_BITS;
pub use chordkv_core::consts::DEFAULT_REQUEST_TIMEOUT_MS;
pub use chordkv_core::consts::DEFAULT_STABILIZE_INTERVAL_SECS as DEFAULT_STABILIZE_INTERVAL;
pub use chordkv_core::consts::DEFAULT_STALE_CONNECTION_SECS;
pub use chordkv_core::consts::MAX_DID_BITS;
pub use chordkv_core::consts::MAX_STALE_CONNECTION_SECS;
