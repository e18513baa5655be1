#![allow(missing_docs)]

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("Connection {0} is closed")]
    ConnectionClosed(String),

    #[error("Connection {0} not found, peer is not listening")]
    ConnectionNotFound(String),

    #[error("Address {0} is already in use")]
    AddressInUse(String),

    #[error("Listener {0} not found")]
    ListenerNotFound(String),

    #[error("Request callback failed: {0}")]
    Callback(String),
}
