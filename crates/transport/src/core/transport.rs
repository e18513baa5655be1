//! Traits implemented by every transport.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::callback::SharedCallback;
use crate::error::Result;

/// An outbound channel to one peer.
/// A connection carries one request at a time: callers wait for the reply
/// before the next request is written.
#[async_trait]
pub trait ConnectionInterface {
    /// Address of the remote listener.
    fn remote_addr(&self) -> &str;

    /// Send a request frame and wait for the reply frame.
    async fn request(&self, data: Bytes) -> Result<Bytes>;

    /// Close the connection. Later requests fail with `ConnectionClosed`.
    async fn close(&self) -> Result<()>;

    /// Whether the connection was closed locally or by the peer.
    fn is_closed(&self) -> bool;
}

/// Connection handle cached by callers.
pub type SharedConnection = Arc<dyn ConnectionInterface + Send + Sync>;

/// Dials peers and serves inbound requests.
#[async_trait]
pub trait TransportInterface {
    /// Dial the listener at `addr`.
    async fn connect(&self, addr: &str) -> Result<SharedConnection>;

    /// Start serving requests on `addr` with `callback`.
    /// Returns the address actually bound, which differs from `addr` when port 0 is used.
    async fn listen(&self, addr: &str, callback: SharedCallback) -> Result<String>;

    /// Stop the listener bound to `addr`.
    async fn close_listener(&self, addr: &str) -> Result<()>;
}

/// Transport handle shared by the ring node and its connection cache.
pub type SharedTransport = Arc<dyn TransportInterface + Send + Sync>;
