use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use lazy_static::lazy_static;

use crate::core::callback::SharedCallback;
use crate::core::transport::ConnectionInterface;
use crate::core::transport::SharedConnection;
use crate::core::transport::TransportInterface;
use crate::error::Error;
use crate::error::Result;

/// Remote address reported to callbacks for dummy requests.
const DUMMY_REMOTE: &str = "dummy";

lazy_static! {
    static ref LISTENERS: DashMap<String, SharedCallback> = DashMap::new();
}

/// A dummy connection for local testing.
/// Implements the [ConnectionInterface] trait with no real network: a request
/// calls the callback registered for the remote address directly.
pub struct DummyConnection {
    addr: String,
    closed: AtomicBool,
}

/// [DummyTransport] registers listeners in a process-wide table and
/// dials them by address.
#[derive(Default)]
pub struct DummyTransport;

impl DummyConnection {
    fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            closed: AtomicBool::new(false),
        }
    }
}

impl DummyTransport {
    /// Create a new [DummyTransport] instance.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectionInterface for DummyConnection {
    fn remote_addr(&self) -> &str {
        &self.addr
    }

    async fn request(&self, data: Bytes) -> Result<Bytes> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed(self.addr.clone()));
        }
        let callback = LISTENERS
            .get(&self.addr)
            .map(|cb| cb.value().clone())
            .ok_or_else(|| Error::ConnectionNotFound(self.addr.clone()))?;

        callback
            .on_request(DUMMY_REMOTE, data)
            .await
            .map_err(|e| Error::Callback(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportInterface for DummyTransport {
    async fn connect(&self, addr: &str) -> Result<SharedConnection> {
        if !LISTENERS.contains_key(addr) {
            return Err(Error::ConnectionNotFound(addr.to_string()));
        }
        Ok(Arc::new(DummyConnection::new(addr)))
    }

    async fn listen(&self, addr: &str, callback: SharedCallback) -> Result<String> {
        match LISTENERS.entry(addr.to_string()) {
            Entry::Occupied(_) => Err(Error::AddressInUse(addr.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(callback);
                Ok(addr.to_string())
            }
        }
    }

    async fn close_listener(&self, addr: &str) -> Result<()> {
        LISTENERS
            .remove(addr)
            .map(|_| ())
            .ok_or_else(|| Error::ListenerNotFound(addr.to_string()))
    }
}
