//! Error of chordkv_core

use crate::message::Purpose;

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors collections in chordkv-core.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid did: {0}")]
    InvalidDid(String),

    #[error("Did width {0} bits is out of range 1..={1}")]
    InvalidDidWidth(u16, u16),

    #[error("Did width mismatch, expect {0} bits, got {1} bits")]
    DidWidthMismatch(u16, u16),

    #[error("Stale connection window {0}s is out of range 1..={1}")]
    InvalidStaleConnectionSecs(i64, i64),

    #[error("Failed on read/write DHT state, lock poisoned")]
    DHTSyncLockError,

    #[error("Message for {0} exceeded the hop limit {1}")]
    HopLimitExceeded(String, u16),

    #[error("Peer {0} unreachable: {1}")]
    PeerUnreachable(String, #[source] chordkv_transport::error::Error),

    #[error("Join rejected by {0}")]
    JoinRejected(String),

    #[error("Status message {0:?} is not a request")]
    NotARequest(Purpose),

    #[error("Unexpected reply {0:?}")]
    UnexpectedReply(Purpose),

    #[error("Remote node answered with error: {0}")]
    Remote(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("JSON deserialization error: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("Bincode serialization error: {0}")]
    BincodeSerialize(#[source] bincode::Error),

    #[error("Bincode deserialization error: {0}")]
    BincodeDeserialize(#[source] bincode::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] chordkv_transport::error::Error),
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Error::DHTSyncLockError
    }
}
