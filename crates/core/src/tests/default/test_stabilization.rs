use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::channel::oneshot;

use crate::dht::Stabilizer;
use crate::tests::default::predecessor;
use crate::tests::default::prepare_node;
use crate::tests::default::prepare_ring_10_40_70;
use crate::tests::default::successor;
use crate::tests::run_stabilize;

#[tokio::test]
async fn test_stabilize_repairs_dead_successor() {
    let (n10, n40, n70) = prepare_ring_10_40_70().await;
    n70.set(b"45", b"kept").await.unwrap();

    // 40 disappears without a word
    n40.shutdown().await.unwrap();

    run_stabilize(&[n10.clone(), n70.clone()], 3).await;

    assert_eq!(successor(&n10), Some(n70.node().clone()));
    assert_eq!(predecessor(&n10), Some(n70.node().clone()));
    assert_eq!(successor(&n70), Some(n10.node().clone()));
    assert_eq!(predecessor(&n70), Some(n10.node().clone()));
    assert!(!n10.dht().state().unwrap().finger.contains(n40.did()));
    assert!(!n70.dht().state().unwrap().finger.contains(n40.did()));

    assert_eq!(n10.get(b"45").await.unwrap(), Some(b"kept".to_vec()));
    n10.set(b"20", b"new").await.unwrap();
    assert_eq!(
        n70.storage().get(b"20").await.unwrap(),
        Some(b"new".to_vec())
    );
}

#[tokio::test]
async fn test_fix_fingers_points_at_owners() {
    let (n10, n40, n70) = prepare_ring_10_40_70().await;
    let finger = n10.dht().state().unwrap().finger;
    let owners: Vec<_> = finger.list().iter().map(|n| n.did.clone()).collect();
    assert_eq!(owners, vec![
        n40.did().clone(),
        n40.did().clone(),
        n40.did().clone(),
        n40.did().clone(),
        n70.did().clone(),
        n10.did().clone(),
        n10.did().clone(),
    ]);
}

#[tokio::test]
async fn test_evict_idle_connections() {
    let (n10, n40, n70) = prepare_ring_10_40_70().await;
    assert!(n10.peers().contains(n40.did()).await);
    assert!(n10.peers().contains(n70.did()).await);

    let later = Utc::now() + chrono::Duration::seconds(181);
    let dead = n10.peers().evict_stale(later).await;
    assert!(dead.is_empty());
    assert!(n10.peers().is_empty().await);

    // idle peers are only disconnected, the ring is unchanged
    assert_eq!(successor(&n10), Some(n40.node().clone()));
    n10.heartbeat(n40.node()).await.unwrap();
    assert!(n10.peers().contains(n40.did()).await);
}

#[tokio::test]
async fn test_evict_reports_dead_peers() {
    let (n10, n40, n70) = prepare_ring_10_40_70().await;
    assert!(n10.peers().contains(n40.did()).await);

    n40.shutdown().await.unwrap();

    let dead = n10.peers().evict_stale(Utc::now()).await;
    assert_eq!(dead, vec![n40.did().clone()]);
    assert!(!n10.peers().contains(n40.did()).await);
    assert!(n10.peers().contains(n70.did()).await);
}

#[tokio::test]
async fn test_wait_stops_on_quit() {
    let node = prepare_node(16, 42).await;
    let stabilizer = Arc::new(Stabilizer::new(node.clone()));
    let (quit_tx, quit_rx) = oneshot::channel();

    let handle = tokio::spawn(stabilizer.wait(Duration::from_millis(10), quit_rx));
    tokio::time::sleep(Duration::from_millis(50)).await;
    quit_tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("stabilizer did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_wait_stops_when_sender_dropped() {
    let node = prepare_node(16, 43).await;
    let stabilizer = Arc::new(Stabilizer::new(node.clone()));
    let (quit_tx, quit_rx) = oneshot::channel::<()>();
    drop(quit_tx);

    tokio::time::timeout(
        Duration::from_secs(5),
        stabilizer.wait(Duration::from_secs(60), quit_rx),
    )
    .await
    .expect("stabilizer did not stop");
}
