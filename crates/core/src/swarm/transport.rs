//! Cache of outbound connections to other ring nodes.

use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use chordkv_transport::core::transport::SharedConnection;
use chordkv_transport::core::transport::SharedTransport;
use tokio::sync::Mutex;

use crate::dht::Did;
use crate::dht::Node;
use crate::error::Error;
use crate::error::Result;
use crate::message::Message;
use crate::message::Purpose;

/// Connections keyed by the did of the peer, each stamped with its last successful use.
/// Every mutation of the table goes through one lock; requests themselves run outside it.
pub struct PeerCache {
    local: Node,
    transport: SharedTransport,
    stale_after: chrono::Duration,
    table: Mutex<HashMap<Did, CachedConnection>>,
}

struct CachedConnection {
    node: Node,
    connection: SharedConnection,
    last_active: DateTime<Utc>,
}

/// Send `msg` over `conn` and decode the reply.
pub async fn exchange(conn: &SharedConnection, msg: &Message) -> Result<Message> {
    let data = conn
        .request(msg.to_bincode()?)
        .await
        .map_err(|e| Error::PeerUnreachable(conn.remote_addr().to_string(), e))?;
    Message::from_bincode(&data)
}

impl PeerCache {
    /// Create an empty cache dialing through `transport`.
    pub fn new(local: Node, transport: SharedTransport, stale_after: chrono::Duration) -> Self {
        Self {
            local,
            transport,
            stale_after,
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Open an uncached connection to `addr`.
    pub async fn dial(&self, addr: &str) -> Result<SharedConnection> {
        self.transport
            .connect(addr)
            .await
            .map_err(|e| Error::PeerUnreachable(addr.to_string(), e))
    }

    async fn heartbeat(&self, node: &Node, conn: &SharedConnection) -> Result<()> {
        if conn.is_closed() {
            return Err(Error::PeerUnreachable(
                node.addr(),
                chordkv_transport::error::Error::ConnectionClosed(node.addr()),
            ));
        }
        let msg = Message::direct(Purpose::HeartBeat, node, vec![], &self.local);
        exchange(conn, &msg).await?.into_result().map(|_| ())
    }

    async fn touch(&self, node: &Node, conn: &SharedConnection) {
        self.table.lock().await.insert(node.did.clone(), CachedConnection {
            node: node.clone(),
            connection: conn.clone(),
            last_active: Utc::now(),
        });
    }

    /// Connection to `node`: the cached one if it still answers a heartbeat, a fresh one
    /// otherwise.
    pub async fn resolve(&self, node: &Node) -> Result<SharedConnection> {
        let cached = self
            .table
            .lock()
            .await
            .get(&node.did)
            .map(|c| c.connection.clone());

        if let Some(conn) = cached {
            match self.heartbeat(node, &conn).await {
                Ok(()) => {
                    self.touch(node, &conn).await;
                    return Ok(conn);
                }
                Err(e) => {
                    tracing::debug!("cached connection to {} failed heartbeat: {}", node, e);
                    self.remove(&node.did).await;
                }
            }
        }

        let conn = self.dial(&node.addr()).await?;
        tracing::debug!("{} connected to {}", self.local, node);
        self.touch(node, &conn).await;
        Ok(conn)
    }

    /// Send `msg` to `node` and return its reply.
    pub async fn call(&self, node: &Node, msg: &Message) -> Result<Message> {
        let conn = self.resolve(node).await?;
        match exchange(&conn, msg).await {
            Ok(reply) => {
                self.touch(node, &conn).await;
                Ok(reply)
            }
            Err(e) => {
                self.remove(&node.did).await;
                Err(e)
            }
        }
    }

    /// Close connections idle for longer than the staleness window at `now`, then re-check
    /// the others. Returns the dids of peers that no longer answer.
    pub async fn evict_stale(&self, now: DateTime<Utc>) -> Vec<Did> {
        let (stale, alive) = {
            let mut table = self.table.lock().await;
            let stale_ids: Vec<Did> = table
                .iter()
                .filter(|(_, c)| now - c.last_active > self.stale_after)
                .map(|(did, _)| did.clone())
                .collect();
            let stale: Vec<CachedConnection> =
                stale_ids.iter().filter_map(|did| table.remove(did)).collect();
            let alive: Vec<Node> = table.values().map(|c| c.node.clone()).collect();
            (stale, alive)
        };

        for c in stale {
            tracing::info!("{} closes stale connection to {}", self.local, c.node);
            if let Err(e) = c.connection.close().await {
                tracing::debug!("close connection to {} failed: {}", c.node, e);
            }
        }

        let mut dead = vec![];
        for node in alive {
            if let Err(e) = self.resolve(&node).await {
                tracing::warn!("{} lost peer {}: {}", self.local, node, e);
                self.remove(&node.did).await;
                dead.push(node.did);
            }
        }
        dead
    }

    /// Drop and close the connection to `did`.
    pub async fn remove(&self, did: &Did) {
        let removed = self.table.lock().await.remove(did);
        if let Some(c) = removed {
            if let Err(e) = c.connection.close().await {
                tracing::debug!("close connection to {} failed: {}", c.node, e);
            }
        }
    }

    /// Drop and close every connection.
    pub async fn clear(&self) {
        let drained: Vec<CachedConnection> =
            self.table.lock().await.drain().map(|(_, c)| c).collect();
        for c in drained {
            if let Err(e) = c.connection.close().await {
                tracing::debug!("close connection to {} failed: {}", c.node, e);
            }
        }
    }

    /// Whether a connection to `did` is cached.
    pub async fn contains(&self, did: &Did) -> bool {
        self.table.lock().await.contains_key(did)
    }

    /// Number of cached connections.
    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.is_empty()
    }
}
