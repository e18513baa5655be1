#![warn(missing_docs)]
//! The ring node: routing, ring operations and the transport callback.

mod builder;
/// Cache of connections to other ring nodes.
pub mod transport;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
pub use builder::SwarmBuilder;
use chordkv_transport::core::callback::CallbackError;
use chordkv_transport::core::callback::RequestCallback;
use chordkv_transport::core::callback::SharedCallback;
use chordkv_transport::core::transport::SharedConnection;
use chordkv_transport::core::transport::SharedTransport;
use tokio::sync::Mutex;

use crate::dht::Did;
use crate::dht::Node;
use crate::dht::PeerRing;
use crate::dht::PeerRingAction;
use crate::error::Error;
use crate::error::Result;
use crate::hasher::SharedHasher;
use crate::message::encode_node;
use crate::message::Message;
use crate::message::Purpose;
use crate::storage::SharedStorage;
pub use crate::swarm::transport::exchange;
pub use crate::swarm::transport::PeerCache;

/// A ring node.
/// Inbound requests arrive through [RequestCallback]; operations started locally go through
/// the same routing.
pub struct Swarm {
    /// Reference of DHT.
    pub(crate) dht: Arc<PeerRing>,
    pub(crate) peers: PeerCache,
    pub(crate) storage: SharedStorage,
    transport: SharedTransport,
    hasher: SharedHasher,
    max_hops: u16,
    listener: Mutex<Option<String>>,
}

impl Swarm {
    /// Get did of self.
    pub fn did(&self) -> &Did {
        self.dht.did()
    }

    /// The local node.
    pub fn node(&self) -> &Node {
        &self.dht.node
    }

    /// Get DHT(Distributed Hash Table) of self.
    pub fn dht(&self) -> Arc<PeerRing> {
        self.dht.clone()
    }

    /// Connection cache of self.
    pub fn peers(&self) -> &PeerCache {
        &self.peers
    }

    /// Local key value store.
    pub fn storage(&self) -> SharedStorage {
        self.storage.clone()
    }

    /// Hasher placing keys on the ring.
    pub fn hasher(&self) -> SharedHasher {
        self.hasher.clone()
    }

    /// Most forwards a message may take.
    pub fn max_hops(&self) -> u16 {
        self.max_hops
    }

    /// Create a message sent by self.
    pub fn message(&self, purpose: Purpose, id: Option<Did>, key: &[u8], body: Vec<u8>) -> Message {
        Message::new(purpose, id, key, body, self.node(), &*self.hasher)
    }

    /// Answer any message: execute it here or forward it, and turn failures into a
    /// `StatusError` reply.
    pub async fn handle_message(&self, msg: Message) -> Message {
        match self.route(&msg).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("{:?} for {} failed on {}: {}", msg.purpose, msg.id, self.node(), e);
                msg.reply_error(self.node(), &e.to_string())
            }
        }
    }

    pub(crate) async fn route(&self, msg: &Message) -> Result<Message> {
        let addressed_here = msg
            .target
            .as_ref()
            .map(|t| &t.did == self.did())
            .unwrap_or(false);
        let action = if addressed_here {
            self.dht.locate_addressed(&msg.id)?
        } else {
            self.dht.locate(&msg.id)?
        };
        match action {
            PeerRingAction::Local => self.handle_local(msg).await,
            PeerRingAction::Forward(next) => self.forward(&next, msg.clone()).await,
            PeerRingAction::Deliver(owner) => {
                let mut msg = msg.clone();
                msg.target = Some(owner.clone());
                self.forward(&owner, msg).await
            }
        }
    }

    async fn forward(&self, next: &Node, mut msg: Message) -> Result<Message> {
        if msg.hops >= self.max_hops {
            return Err(Error::HopLimitExceeded(msg.id.to_string(), self.max_hops));
        }
        msg.hops += 1;
        tracing::debug!(
            "{} forwards {:?} for {} to {}, hop {}",
            self.node(),
            msg.purpose,
            msg.id,
            next,
            msg.hops
        );
        self.peers.call(next, &msg).await
    }

    /// Send a message to `node` itself and fail on a `StatusError` reply.
    pub(crate) async fn request(&self, node: &Node, msg: Message) -> Result<Message> {
        let reply = if &node.did == self.did() {
            self.handle_local(&msg).await?
        } else {
            self.peers.call(node, &msg).await?
        };
        reply.into_result()
    }

    /// Start serving requests on the address of the local node.
    /// Returns the bound address.
    pub async fn serve(self: &Arc<Self>) -> Result<String> {
        let callback: SharedCallback = self.clone();
        let bound = self.transport.listen(&self.node().addr(), callback).await?;
        tracing::info!("{} serving on {}", self.node(), bound);
        *self.listener.lock().await = Some(bound.clone());
        Ok(bound)
    }

    /// Stop serving and close every cached connection.
    pub async fn shutdown(&self) -> Result<()> {
        let bound = self.listener.lock().await.take();
        if let Some(addr) = bound {
            self.transport.close_listener(&addr).await?;
        }
        self.peers.clear().await;
        tracing::info!("{} shut down", self.node());
        Ok(())
    }

    /// Join the ring through the node listening on `host:port`.
    pub async fn join_ring(&self, host: &str, port: u16) -> Result<()> {
        let addr = format!("{}:{}", host, port);
        tracing::info!("{} joining ring via {}", self.node(), addr);
        let conn = self.peers.dial(&addr).await?;
        let result = self.join_via(&conn).await;
        if let Err(e) = conn.close().await {
            tracing::debug!("close bootstrap connection failed: {}", e);
        }
        result
    }

    async fn join_via(&self, conn: &SharedConnection) -> Result<()> {
        let join = self.message(Purpose::NodeJoin, Some(self.did().clone()), &[], vec![]);
        let reply = exchange(conn, &join).await?.into_result()?;
        let successor = reply.sender;
        tracing::info!("{} joined, successor {}", self.node(), successor);

        self.dht.set_successor(Some(successor.clone()))?;
        // the node in front of the successor is in front of us now
        match self.predecessor_of(&successor).await {
            Ok(Some(pred)) => {
                self.dht.notify(&pred)?;
            }
            Ok(None) => {}
            Err(e) => tracing::debug!("{} has no predecessor from {}: {}", self.node(), successor, e),
        }
        self.notify(&successor).await?;
        self.find_successor(&successor).await?;

        for (index, start) in self.dht.finger_starts()?.into_iter().enumerate() {
            let probe = self.message(Purpose::NodeAnn, Some(start), &[], vec![]);
            match exchange(conn, &probe).await.and_then(|r| r.into_result()) {
                Ok(reply) => self.dht.set_finger(index, &reply.sender)?,
                Err(e) => tracing::debug!("seed finger {} failed: {}", index, e),
            }
        }
        Ok(())
    }

    /// Leave the ring: hand each neighbour the other one, then stop serving.
    pub async fn leave(&self) -> Result<()> {
        let state = self.dht.state()?;
        if let Some(succ) = &state.successor {
            let body = encode_node(state.predecessor.as_ref())?;
            let msg = Message::direct(Purpose::NodeLeave, succ, body, self.node());
            if let Err(e) = self.request(succ, msg).await {
                tracing::warn!("leave notice to successor {} failed: {}", succ, e);
            }
        }
        if let Some(pred) = &state.predecessor {
            let body = encode_node(state.successor.as_ref())?;
            let msg = Message::direct(Purpose::NodeLeave, pred, body, self.node());
            if let Err(e) = self.request(pred, msg).await {
                tracing::warn!("leave notice to predecessor {} failed: {}", pred, e);
            }
        }
        tracing::info!("{} left the ring", self.node());
        self.shutdown().await
    }

    /// Node owning `key`.
    pub async fn lookup(&self, key: &[u8]) -> Result<Node> {
        let msg = self.message(Purpose::NodeAnn, None, key, vec![]);
        Ok(self.route(&msg).await?.into_result()?.sender)
    }

    /// Node owning `did`.
    pub async fn lookup_id(&self, did: &Did) -> Result<Node> {
        let msg = self.message(Purpose::NodeAnn, Some(did.clone()), &[], vec![]);
        Ok(self.route(&msg).await?.into_result()?.sender)
    }

    /// Ask `node` for its successor; a node without one adopts self.
    pub async fn find_successor(&self, node: &Node) -> Result<Option<Node>> {
        let msg = Message::direct(Purpose::SuccReq, node, vec![], self.node());
        self.request(node, msg).await?.body_node()
    }

    /// Ask `node` for its predecessor.
    pub async fn predecessor_of(&self, node: &Node) -> Result<Option<Node>> {
        let msg = Message::direct(Purpose::PredReq, node, vec![], self.node());
        self.request(node, msg).await?.body_node()
    }

    /// Tell `node` that self may be its predecessor.
    pub async fn notify(&self, node: &Node) -> Result<()> {
        let msg = Message::direct(Purpose::NodeNotify, node, vec![], self.node());
        self.request(node, msg).await.map(|_| ())
    }

    /// Check that `node` answers.
    pub async fn heartbeat(&self, node: &Node) -> Result<()> {
        let msg = Message::direct(Purpose::HeartBeat, node, vec![], self.node());
        self.request(node, msg).await.map(|_| ())
    }

    /// Store `value` under `key` on its owner.
    pub async fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let msg = self.message(Purpose::KeySet, None, key, value.to_vec());
        self.route(&msg).await?.into_result().map(|_| ())
    }

    /// Read `key` from its owner; `None` when it has no value.
    pub async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let msg = self.message(Purpose::KeyGet, None, key, vec![]);
        let reply = self.route(&msg).await?.into_result()?;
        match reply.purpose {
            Purpose::StatusOk => Ok(Some(reply.body)),
            Purpose::StatusNotFound => Ok(None),
            other => Err(Error::UnexpectedReply(other)),
        }
    }

    /// Delete `key` on its owner.
    pub async fn del(&self, key: &[u8]) -> Result<()> {
        let msg = self.message(Purpose::KeyDel, None, key, vec![]);
        self.route(&msg).await?.into_result().map(|_| ())
    }
}

#[async_trait]
impl RequestCallback for Swarm {
    async fn on_request(&self, remote: &str, data: Bytes) -> std::result::Result<Bytes, CallbackError> {
        let msg = Message::from_bincode(&data)?;
        tracing::debug!(
            "{} received {:?} for {} from {} via {}",
            self.node(),
            msg.purpose,
            msg.id,
            msg.sender,
            remote
        );
        let reply = self.handle_message(msg).await;
        Ok(reply.to_bincode()?)
    }
}
