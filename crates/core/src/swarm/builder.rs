#![warn(missing_docs)]
//! This module provider [SwarmBuilder] and it's interface for
//! [Swarm]

use std::sync::Arc;

use chordkv_transport::core::transport::SharedTransport;
use tokio::sync::Mutex;

use crate::consts::DEFAULT_STALE_CONNECTION_SECS;
use crate::consts::MAX_STALE_CONNECTION_SECS;
use crate::dht::Did;
use crate::dht::Node;
use crate::dht::PeerRing;
use crate::error::Error;
use crate::error::Result;
use crate::hasher::SharedHasher;
use crate::storage::MemStorage;
use crate::storage::SharedStorage;
use crate::swarm::PeerCache;
use crate::swarm::Swarm;

/// Creates a SwarmBuilder to configure a Swarm.
pub struct SwarmBuilder {
    host: String,
    port: u16,
    hasher: SharedHasher,
    transport: SharedTransport,
    storage: Option<SharedStorage>,
    did: Option<Did>,
    max_hops: Option<u16>,
    stale_connection_secs: i64,
}

impl SwarmBuilder {
    /// Creates new instance of [SwarmBuilder] for a node listening on `host:port`.
    pub fn new(host: &str, port: u16, hasher: SharedHasher, transport: SharedTransport) -> Self {
        SwarmBuilder {
            host: host.to_string(),
            port,
            hasher,
            transport,
            storage: None,
            did: None,
            max_hops: None,
            stale_connection_secs: DEFAULT_STALE_CONNECTION_SECS,
        }
    }

    /// Sets up the local key value store. Defaults to [MemStorage].
    pub fn storage(mut self, storage: SharedStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Place the node at `did` instead of the hash of its address.
    pub fn did(mut self, did: Did) -> Self {
        self.did = Some(did);
        self
    }

    /// Most forwards a message may take. Defaults to the identifier width.
    pub fn max_hops(mut self, max_hops: u16) -> Self {
        self.max_hops = Some(max_hops);
        self
    }

    /// Seconds a cached connection may stay idle, within `1..=MAX_STALE_CONNECTION_SECS`.
    pub fn stale_connection_secs(mut self, secs: i64) -> Self {
        self.stale_connection_secs = secs;
        self
    }

    /// Try build for `Swarm`.
    pub fn build(self) -> Result<Swarm> {
        if !(1..=MAX_STALE_CONNECTION_SECS).contains(&self.stale_connection_secs) {
            return Err(Error::InvalidStaleConnectionSecs(
                self.stale_connection_secs,
                MAX_STALE_CONNECTION_SECS,
            ));
        }
        let width = self.hasher.width();
        let did = match self.did {
            Some(did) if did.bits() != width => {
                return Err(Error::DidWidthMismatch(width, did.bits()));
            }
            Some(did) => did,
            None => self
                .hasher
                .hash(format!("{}:{}", self.host, self.port).as_bytes()),
        };
        let node = Node::new(did, &self.host, self.port);

        let dht = Arc::new(PeerRing::new(node.clone()));
        let peers = PeerCache::new(
            node,
            self.transport.clone(),
            chrono::Duration::seconds(self.stale_connection_secs),
        );
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemStorage::<Vec<u8>>::new()));

        Ok(Swarm {
            dht,
            peers,
            storage,
            transport: self.transport,
            hasher: self.hasher,
            max_hops: self.max_hops.unwrap_or(width),
            listener: Mutex::new(None),
        })
    }
}
