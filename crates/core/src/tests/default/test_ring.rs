use std::sync::atomic::Ordering;
use std::sync::Arc;

use chordkv_transport::connections::DummyTransport;

use crate::dht::SortRing;
use crate::error::Error;
use crate::message::Message;
use crate::message::Purpose;
use crate::storage::MemStorage;
use crate::swarm::SwarmBuilder;
use crate::tests::default::did;
use crate::tests::default::DecimalHasher;
use crate::tests::default::NEXT_PORT;
use crate::tests::default::predecessor;
use crate::tests::default::prepare_node;
use crate::tests::default::prepare_ring_10_40_70;
use crate::tests::default::successor;
use crate::tests::manually_join;
use crate::tests::run_stabilize;

#[tokio::test]
async fn test_two_nodes_form_a_cycle() {
    let node1 = prepare_node(16, 100).await;
    let node2 = prepare_node(16, 30000).await;

    manually_join(&node2, &node1).await;

    assert_eq!(successor(&node1), Some(node2.node().clone()));
    assert_eq!(predecessor(&node1), Some(node2.node().clone()));
    assert_eq!(successor(&node2), Some(node1.node().clone()));
    assert_eq!(predecessor(&node2), Some(node1.node().clone()));

    // stabilization keeps a converged ring as it is
    run_stabilize(&[node1.clone(), node2.clone()], 2).await;
    assert_eq!(successor(&node1), Some(node2.node().clone()));
    assert_eq!(predecessor(&node2), Some(node1.node().clone()));
}

#[tokio::test]
async fn test_three_nodes_ring_order() {
    let (n10, n40, n70) = prepare_ring_10_40_70().await;

    assert_eq!(successor(&n10), Some(n40.node().clone()));
    assert_eq!(predecessor(&n10), Some(n70.node().clone()));
    assert_eq!(successor(&n40), Some(n70.node().clone()));
    assert_eq!(predecessor(&n40), Some(n10.node().clone()));
    assert_eq!(successor(&n70), Some(n10.node().clone()));
    assert_eq!(predecessor(&n70), Some(n40.node().clone()));

    // walking successors visits every node in clockwise order
    let mut dids = vec![n70.did().clone(), n10.did().clone(), n40.did().clone()];
    dids.sort(n10.did());
    let mut walked = vec![n10.did().clone()];
    let mut cur = successor(&n10).unwrap();
    while &cur.did != n10.did() {
        walked.push(cur.did.clone());
        let next = [&n10, &n40, &n70]
            .iter()
            .find(|s| s.did() == &cur.did)
            .map(|s| successor(s).unwrap())
            .unwrap();
        cur = next;
    }
    assert_eq!(walked, dids);
}

#[tokio::test]
async fn test_key_owned_by_successor_arc() {
    let (n10, n40, n70) = prepare_ring_10_40_70().await;

    // 45 lies in (40, 70] and belongs to node 70
    n40.set(b"45", b"x").await.unwrap();
    assert_eq!(
        n70.storage().get(b"45").await.unwrap(),
        Some(b"x".to_vec())
    );
    assert_eq!(n40.storage().get(b"45").await.unwrap(), None);

    let msg = n70.message(Purpose::KeyGet, None, b"45", vec![]);
    let reply = n70.handle_message(msg).await;
    assert_eq!(reply.purpose, Purpose::StatusOk);
    assert_eq!(reply.body, b"x".to_vec());
    assert_eq!(&reply.sender, n70.node());

    assert_eq!(n10.get(b"45").await.unwrap(), Some(b"x".to_vec()));
    assert_eq!(&n10.lookup(b"45").await.unwrap(), n70.node());
    assert_eq!(&n70.lookup_id(&did(7, 100)).await.unwrap(), n10.node());
    assert_eq!(&n70.lookup_id(&did(7, 40)).await.unwrap(), n40.node());
}

#[tokio::test]
async fn test_set_get_del_from_any_node() {
    let (n10, n40, n70) = prepare_ring_10_40_70().await;
    let nodes = [n10, n40, n70];
    let keys: Vec<String> = (0..12).map(|i| format!("key-{}", i)).collect();

    for (i, key) in keys.iter().enumerate() {
        let writer = &nodes[i % 3];
        writer
            .set(key.as_bytes(), format!("value-{}", i).as_bytes())
            .await
            .unwrap();
    }

    for (i, key) in keys.iter().enumerate() {
        for reader in nodes.iter() {
            assert_eq!(
                reader.get(key.as_bytes()).await.unwrap(),
                Some(format!("value-{}", i).into_bytes()),
                "{} read by {}",
                key,
                reader.node()
            );
        }
    }

    // each key is stored exactly once, on its owner
    let mut total = 0;
    for node in nodes.iter() {
        total += node.storage().count().await.unwrap();
    }
    assert_eq!(total, keys.len() as u32);

    nodes[1].del(b"key-3").await.unwrap();
    for reader in nodes.iter() {
        assert_eq!(reader.get(b"key-3").await.unwrap(), None);
    }

    // an empty value is distinct from a missing key
    nodes[2].set(b"empty", b"").await.unwrap();
    assert_eq!(nodes[0].get(b"empty").await.unwrap(), Some(vec![]));
    assert_eq!(nodes[0].get(b"missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_forward_counts_hops() {
    let (n10, _n40, n70) = prepare_ring_10_40_70().await;

    n70.set(b"65", b"far").await.unwrap();

    // 10 -> 40 by finger, 40 -> 70 as successor
    let msg = n10.message(Purpose::KeyGet, None, b"65", vec![]);
    let reply = n10.handle_message(msg).await;
    assert_eq!(reply.purpose, Purpose::StatusOk);
    assert_eq!(reply.body, b"far".to_vec());
    assert_eq!(reply.hops, 2);
}

#[tokio::test]
async fn test_hop_limit() {
    let (n10, _n40, _n70) = prepare_ring_10_40_70().await;
    assert_eq!(n10.max_hops(), 7);

    let mut msg = n10.message(Purpose::KeyGet, None, b"45", vec![]);
    msg.hops = n10.max_hops();
    let reply = n10.handle_message(msg).await;
    assert_eq!(reply.purpose, Purpose::StatusError);
    assert_eq!(reply.errors.len(), 1);
    assert!(reply.errors[0].contains("hop limit"));

    // an owned identifier is answered whatever the hop count
    let mut msg = n10.message(Purpose::KeyGet, None, b"100", vec![]);
    msg.hops = n10.max_hops();
    assert_eq!(
        n10.handle_message(msg).await.purpose,
        Purpose::StatusNotFound
    );
}

#[tokio::test]
async fn test_status_message_is_rejected() {
    let node = prepare_node(16, 1).await;
    let msg = Message::direct(Purpose::StatusOk, node.node(), vec![], node.node());
    let reply = node.handle_message(msg).await;
    assert_eq!(reply.purpose, Purpose::StatusError);
    assert!(matches!(
        reply.into_result(),
        Err(Error::Remote(e)) if e.contains("not a request")
    ));
}

#[tokio::test]
async fn test_leave_hands_over_neighbours() {
    let (n10, n40, n70) = prepare_ring_10_40_70().await;

    n40.leave().await.unwrap();

    assert_eq!(successor(&n10), Some(n70.node().clone()));
    assert_eq!(predecessor(&n70), Some(n10.node().clone()));
    assert_eq!(predecessor(&n10), Some(n70.node().clone()));
    assert_eq!(successor(&n70), Some(n10.node().clone()));
    assert!(!n10.dht().state().unwrap().finger.contains(n40.did()));

    // the ring keeps serving once fingers are refreshed
    run_stabilize(&[n10.clone(), n70.clone()], 1).await;
    n10.set(b"45", b"after").await.unwrap();
    assert_eq!(
        n70.storage().get(b"45").await.unwrap(),
        Some(b"after".to_vec())
    );
    assert_eq!(n70.get(b"45").await.unwrap(), Some(b"after".to_vec()));
}

#[tokio::test]
async fn test_last_neighbour_leaves() {
    let node1 = prepare_node(16, 100).await;
    let node2 = prepare_node(16, 30000).await;
    manually_join(&node2, &node1).await;

    node2.leave().await.unwrap();
    assert_eq!(successor(&node1), None);
    assert_eq!(predecessor(&node1), None);

    // alone again, everything is local
    node1.set(b"k", b"v").await.unwrap();
    assert_eq!(node1.get(b"k").await.unwrap(), Some(b"v".to_vec()));
}

#[tokio::test]
async fn test_join_rejects_same_did() {
    let node1 = prepare_node(16, 500).await;
    let twin = prepare_node(16, 500).await;
    let node = node1.node();
    assert!(matches!(
        twin.join_ring(&node.host, node.port).await,
        Err(Error::Remote(_))
    ));
}

#[tokio::test]
async fn test_join_through_node_that_does_not_own_it() {
    let (n10, n40, n70) = prepare_ring_10_40_70().await;
    let n55 = prepare_node(7, 55).await;

    // 55 belongs between 40 and 70, node 10 only relays the join
    manually_join(&n55, &n10).await;
    assert_eq!(successor(&n55), Some(n70.node().clone()));
    assert_eq!(predecessor(&n55), Some(n40.node().clone()));
    assert_eq!(predecessor(&n70), Some(n55.node().clone()));
    // 40 has not stabilized and still names 70 as its successor
    assert_eq!(successor(&n40), Some(n70.node().clone()));

    // 45 now lies in (40, 55] and reaches 55 by way of 70
    n40.set(b"45", b"fresh").await.unwrap();
    assert_eq!(
        n55.storage().get(b"45").await.unwrap(),
        Some(b"fresh".to_vec())
    );
    assert_eq!(n70.storage().get(b"45").await.unwrap(), None);
    assert_eq!(&n40.lookup_id(&did(7, 50)).await.unwrap(), n55.node());

    let msg = n40.message(Purpose::KeyGet, None, b"45", vec![]);
    let reply = n40.handle_message(msg).await;
    assert_eq!(reply.purpose, Purpose::StatusOk);
    assert_eq!(&reply.sender, n55.node());
    assert_eq!(reply.hops, 2);

    run_stabilize(&[n10.clone(), n40.clone(), n55.clone(), n70.clone()], 2).await;
    assert_eq!(successor(&n40), Some(n55.node().clone()));
    assert_eq!(predecessor(&n55), Some(n40.node().clone()));
    assert_eq!(n10.get(b"45").await.unwrap(), Some(b"fresh".to_vec()));
}

#[tokio::test]
async fn test_set_get_right_after_join() {
    let (n10, n40, n70) = prepare_ring_10_40_70().await;
    let n55 = prepare_node(7, 55).await;
    manually_join(&n55, &n10).await;

    let nodes = [n10, n40, n55, n70];
    let keys = ["5", "20", "45", "50", "60", "100"];
    for (i, key) in keys.iter().enumerate() {
        nodes[i % nodes.len()]
            .set(key.as_bytes(), key.as_bytes())
            .await
            .unwrap();
    }
    for key in keys.iter() {
        for reader in nodes.iter() {
            assert_eq!(
                reader.get(key.as_bytes()).await.unwrap(),
                Some(key.as_bytes().to_vec()),
                "{} read by {}",
                key,
                reader.node()
            );
        }
    }
}

#[tokio::test]
async fn test_storage_error_reaches_caller() {
    let n10 = prepare_node(7, 10).await;
    let n70 = SwarmBuilder::new(
        "dummy",
        NEXT_PORT.fetch_add(1, Ordering::SeqCst),
        Arc::new(DecimalHasher::new(7)),
        Arc::new(DummyTransport::new()),
    )
    .did(did(7, 70))
    .storage(Arc::new(MemStorage::with_capacity(1)))
    .build()
    .map(Arc::new)
    .unwrap();
    n70.serve().await.unwrap();
    manually_join(&n70, &n10).await;

    // 50 and 60 both belong to 70, which only has room for one key
    n10.set(b"50", b"first").await.unwrap();
    assert!(matches!(
        n10.set(b"60", b"second").await,
        Err(Error::Remote(e)) if e.contains("full")
    ));
    assert!(matches!(
        n70.set(b"60", b"second").await,
        Err(Error::Storage(_))
    ));
    n10.set(b"50", b"again").await.unwrap();
    assert_eq!(n10.get(b"50").await.unwrap(), Some(b"again".to_vec()));
}
