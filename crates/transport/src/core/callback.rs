//! Callback invoked by a listener for every inbound request.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

/// Error returned by a [RequestCallback]. The listener logs it and drops the connection.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Answers requests arriving on a listener.
#[async_trait]
pub trait RequestCallback {
    /// Handle one request frame from `remote` and produce the reply frame.
    async fn on_request(&self, remote: &str, data: Bytes) -> Result<Bytes, CallbackError>;
}

/// Callback shared between a listener and every connection it accepts.
pub type SharedCallback = Arc<dyn RequestCallback + Send + Sync>;
