use std::sync::Arc;
use std::time::Duration;

use chordkv_transport::connections::TcpTransport;

use crate::client::RingClient;
use crate::hasher::sha2_hasher;
use crate::swarm::Swarm;
use crate::swarm::SwarmBuilder;
use crate::tests::default::predecessor;
use crate::tests::default::successor;
use crate::tests::manually_join;
use crate::tests::run_stabilize;

async fn prepare_tcp_node(port: u16) -> Arc<Swarm> {
    let swarm = SwarmBuilder::new(
        "127.0.0.1",
        port,
        sha2_hasher(32).unwrap(),
        Arc::new(TcpTransport::new(Duration::from_secs(5))),
    )
    .build()
    .unwrap();
    let swarm = Arc::new(swarm);
    swarm.serve().await.unwrap();
    swarm
}

#[tokio::test]
async fn test_tcp_two_nodes_ring() {
    let node1 = prepare_tcp_node(47931).await;
    let node2 = prepare_tcp_node(47932).await;
    assert_ne!(node1.did(), node2.did());

    manually_join(&node2, &node1).await;
    run_stabilize(&[node1.clone(), node2.clone()], 1).await;

    assert_eq!(successor(&node1), Some(node2.node().clone()));
    assert_eq!(predecessor(&node1), Some(node2.node().clone()));
    assert_eq!(successor(&node2), Some(node1.node().clone()));

    for i in 0..8 {
        let key = format!("tcp-key-{}", i);
        node1.set(key.as_bytes(), &[i as u8]).await.unwrap();
    }
    for i in 0..8 {
        let key = format!("tcp-key-{}", i);
        assert_eq!(node2.get(key.as_bytes()).await.unwrap(), Some(vec![i as u8]));
    }

    node2.leave().await.unwrap();
    node1.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_tcp_client() {
    let node1 = prepare_tcp_node(47933).await;
    let node2 = prepare_tcp_node(47934).await;
    manually_join(&node2, &node1).await;

    let client = RingClient::new(
        &node1.node().addr(),
        Arc::new(TcpTransport::default()),
        sha2_hasher(32).unwrap(),
    );
    client.set(b"hello", b"world").await.unwrap();
    assert_eq!(client.get(b"hello").await.unwrap(), Some(b"world".to_vec()));
    assert_eq!(client.get(b"nobody").await.unwrap(), None);

    let owner = client.lookup(b"hello").await.unwrap();
    let holder = if &owner == node1.node() { &node1 } else { &node2 };
    assert_eq!(
        holder.storage().get(b"hello").await.unwrap(),
        Some(b"world".to_vec())
    );

    client.del(b"hello").await.unwrap();
    assert_eq!(node2.get(b"hello").await.unwrap(), None);

    node1.shutdown().await.unwrap();
    node2.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_tcp_join_unreachable_bootstrap() {
    let node = prepare_tcp_node(47935).await;
    assert!(node.join_ring("127.0.0.1", 47936).await.is_err());
    // still a working ring of one
    node.set(b"k", b"v").await.unwrap();
    assert_eq!(node.get(b"k").await.unwrap(), Some(b"v".to_vec()));
    node.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_tcp_parallel_set_get() {
    let node1 = prepare_tcp_node(47937).await;
    let node2 = prepare_tcp_node(47938).await;
    manually_join(&node2, &node1).await;

    let nodes = [node1.clone(), node2.clone()];
    let writes = (0..32).map(|i| {
        let node = nodes[i % 2].clone();
        async move {
            let key = format!("parallel-{}", i);
            node.set(key.as_bytes(), &[i as u8]).await
        }
    });
    for result in futures::future::join_all(writes).await {
        result.unwrap();
    }

    let reads = (0..32).map(|i| {
        let node = nodes[(i + 1) % 2].clone();
        async move {
            let key = format!("parallel-{}", i);
            (i, node.get(key.as_bytes()).await)
        }
    });
    for (i, result) in futures::future::join_all(reads).await {
        assert_eq!(result.unwrap(), Some(vec![i as u8]));
    }

    let mut total = 0;
    for node in nodes.iter() {
        total += node.storage().count().await.unwrap();
    }
    assert_eq!(total, 32);

    node1.shutdown().await.unwrap();
    node2.shutdown().await.unwrap();
}
