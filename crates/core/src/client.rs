//! Client for a running ring.
//! The client is not a ring member: it hands each request to one node, which routes it.

use chordkv_transport::core::transport::SharedTransport;

use crate::dht::Did;
use crate::dht::Node;
use crate::error::Error;
use crate::error::Result;
use crate::hasher::SharedHasher;
use crate::message::Message;
use crate::message::Purpose;
use crate::swarm::exchange;

/// Client sending key value requests to the node at `endpoint`.
pub struct RingClient {
    endpoint: String,
    transport: SharedTransport,
    hasher: SharedHasher,
    sender: Node,
}

impl RingClient {
    /// Create a client for the node listening on `endpoint` (`host:port`).
    /// `hasher` must match the ring's.
    pub fn new(endpoint: &str, transport: SharedTransport, hasher: SharedHasher) -> Self {
        let sender = Node::new(Did::zero(hasher.width()), "client", 0);
        Self {
            endpoint: endpoint.to_string(),
            transport,
            hasher,
            sender,
        }
    }

    async fn send(&self, purpose: Purpose, key: &[u8], body: Vec<u8>) -> Result<Message> {
        let msg = Message::new(purpose, None, key, body, &self.sender, &*self.hasher);
        let conn = self
            .transport
            .connect(&self.endpoint)
            .await
            .map_err(|e| Error::PeerUnreachable(self.endpoint.clone(), e))?;
        let result = exchange(&conn, &msg).await;
        if let Err(e) = conn.close().await {
            tracing::debug!("close connection to {} failed: {}", self.endpoint, e);
        }
        result?.into_result()
    }

    /// Store `value` under `key`.
    pub async fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.send(Purpose::KeySet, key, value.to_vec())
            .await
            .map(|_| ())
    }

    /// Read `key`; `None` when it has no value.
    pub async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let reply = self.send(Purpose::KeyGet, key, vec![]).await?;
        match reply.purpose {
            Purpose::StatusOk => Ok(Some(reply.body)),
            Purpose::StatusNotFound => Ok(None),
            other => Err(Error::UnexpectedReply(other)),
        }
    }

    /// Delete `key`.
    pub async fn del(&self, key: &[u8]) -> Result<()> {
        self.send(Purpose::KeyDel, key, vec![]).await.map(|_| ())
    }

    /// Node owning `key`.
    pub async fn lookup(&self, key: &[u8]) -> Result<Node> {
        Ok(self.send(Purpose::NodeAnn, key, vec![]).await?.sender)
    }
}
