use std::sync::Arc;

use crate::dht::Stabilizer;
use crate::swarm::Swarm;

pub mod default;

#[allow(dead_code)]
pub fn setup_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

/// Join `joiner` to the ring of `bootstrap`.
pub async fn manually_join(joiner: &Swarm, bootstrap: &Swarm) {
    let node = bootstrap.node();
    joiner.join_ring(&node.host, node.port).await.unwrap();
}

/// Stabilize every node once per round, in the given order.
pub async fn run_stabilize(swarms: &[Arc<Swarm>], rounds: usize) {
    for _ in 0..rounds {
        for swarm in swarms {
            Stabilizer::new(swarm.clone()).stabilize().await.unwrap();
        }
    }
}
