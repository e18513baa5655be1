use std::sync::atomic::AtomicU16;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chordkv_transport::connections::DummyTransport;

use crate::dht::Did;
use crate::dht::Node;
use crate::hasher::Hasher;
use crate::hasher::Sha256Hasher;
use crate::swarm::Swarm;
use crate::swarm::SwarmBuilder;

mod test_connection;
mod test_ring;
mod test_stabilization;

/// Dummy listeners share one process wide table, every test node gets its own port.
pub static NEXT_PORT: AtomicU16 = AtomicU16::new(20000);

/// Keys spelled as decimal numbers land on that position, so tests can pick owners.
/// Other keys fall back to truncated SHA-256.
pub struct DecimalHasher {
    fallback: Sha256Hasher,
}

impl DecimalHasher {
    pub fn new(bits: u16) -> Self {
        Self {
            fallback: Sha256Hasher::new(bits).unwrap(),
        }
    }
}

impl Hasher for DecimalHasher {
    fn hash(&self, data: &[u8]) -> Did {
        match std::str::from_utf8(data).ok().and_then(|s| s.parse::<u64>().ok()) {
            Some(v) => Did::from_u64(self.width(), v),
            None => self.fallback.hash(data),
        }
    }

    fn width(&self) -> u16 {
        self.fallback.width()
    }
}

pub fn did(bits: u16, v: u64) -> Did {
    Did::from_u64(bits, v)
}

pub fn build_node(bits: u16, id: u64) -> Arc<Swarm> {
    let port = NEXT_PORT.fetch_add(1, Ordering::SeqCst);
    let swarm = SwarmBuilder::new(
        "dummy",
        port,
        Arc::new(DecimalHasher::new(bits)),
        Arc::new(DummyTransport::new()),
    )
    .did(did(bits, id))
    .build()
    .unwrap();
    Arc::new(swarm)
}

pub async fn prepare_node(bits: u16, id: u64) -> Arc<Swarm> {
    let swarm = build_node(bits, id);
    swarm.serve().await.unwrap();
    println!("node: {}", swarm.node());
    swarm
}

/// Nodes 10, 40 and 70 on a ring of 2^7, joined through node 10 and stabilized.
pub async fn prepare_ring_10_40_70() -> (Arc<Swarm>, Arc<Swarm>, Arc<Swarm>) {
    let n10 = prepare_node(7, 10).await;
    let n40 = prepare_node(7, 40).await;
    let n70 = prepare_node(7, 70).await;
    crate::tests::manually_join(&n40, &n10).await;
    crate::tests::manually_join(&n70, &n10).await;
    crate::tests::run_stabilize(&[n10.clone(), n40.clone(), n70.clone()], 2).await;
    (n10, n40, n70)
}

pub fn successor(swarm: &Swarm) -> Option<Node> {
    swarm.dht().successor().unwrap()
}

pub fn predecessor(swarm: &Swarm) -> Option<Node> {
    swarm.dht().predecessor().unwrap()
}
