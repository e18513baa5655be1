//! A bunch of wrap errors.

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors of the node daemon.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid logging level: {0}")]
    InvalidLoggingLevel(String),
    #[error("Cannot find home directory")]
    HomeDirError,
    #[error("Cannot find parent directory")]
    ParentDirError,
    #[error("Create file error: {0}")]
    CreateFileError(String),
    #[error("Open file error: {0}")]
    OpenFileError(String),
    #[error("Encode config error: {0}")]
    EncodeError(String),
    #[error("Decode config error: {0}")]
    DecodeError(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Ring error: {0}")]
    CoreError(#[from] chordkv_core::error::Error),
}
