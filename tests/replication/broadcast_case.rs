//! Case: every replica receives the write, the primary serves the read.
//!
//! Scenario:
//!
//! 1. Start two storage nodes and build a client over a static directory
//!    seeded with both, replication factor 2.
//! 2. Set "42" = "42" in fire-and-forget mode.
//! 3. Get "42".
//!
//! Expected Result:
//!
//! - Both nodes eventually hold "42" = "42".
//! - Get returns "42".

use bytes::Bytes;
use ringkv::Error;
use ringkv::ReplicatedClient;

use crate::common::OrderedDirectory;
use crate::common::TestNode;

#[tokio::test]
async fn test_set_reaches_every_replica_and_reads_back() {
    let n1 = TestNode::start().await;
    let n2 = TestNode::start().await;

    let client = ReplicatedClient::builder(vec![n1.addr(), n2.addr()], "redis")
        .replication_factor(2)
        .build()
        .await
        .expect("build client");

    let candidates = client.resolve("42").await.unwrap();
    assert_eq!(candidates.len(), 2);

    client.set("42", "42").await.expect("set");

    assert!(n1.wait_for_value("42", b"42").await);
    assert!(n2.wait_for_value("42", b"42").await);
    assert_eq!(client.get("42").await.unwrap(), Some(Bytes::from_static(b"42")));

    client.close().await;
}

#[tokio::test]
async fn test_pipelined_writes_then_read_on_one_connection() {
    let node = TestNode::start().await;
    let client = ReplicatedClient::builder(vec![node.addr()], "redis")
        .build()
        .await
        .expect("build client");

    for i in 0..50 {
        client.set("counter", i.to_string()).await.expect("set");
    }

    // The read is ordered after every write on the same connection
    assert_eq!(client.get("counter").await.unwrap(), Some(Bytes::from_static(b"49")));
    assert_eq!(node.command_count(), 51);
    assert_eq!(client.pool().len(), 1);

    client.close().await;
}

#[tokio::test]
async fn test_missing_key_reads_as_none() {
    let n1 = TestNode::start().await;
    let n2 = TestNode::start().await;
    let client = ReplicatedClient::builder(vec![n1.addr(), n2.addr()], "redis")
        .build()
        .await
        .expect("build client");

    assert_eq!(client.get("never-written").await.unwrap(), None);
}

#[tokio::test]
async fn test_closed_client_redials_on_next_use() {
    let node = TestNode::start().await;
    let client = ReplicatedClient::builder(vec![node.addr()], "redis")
        .build()
        .await
        .expect("build client");

    client.set("k", "v1").await.unwrap();
    client.close().await;
    assert!(client.pool().is_empty());

    client.set("k", "v2").await.unwrap();
    assert!(node.wait_for_value("k", b"v2").await);
}

#[tokio::test]
async fn test_empty_directory_reports_no_nodes() {
    let client = ReplicatedClient::builder(vec!["unused:2379".to_string()], "redis")
        .directory(OrderedDirectory::new(vec![]))
        .build()
        .await
        .expect("build client");

    assert!(matches!(
        client.set("k", "v").await,
        Err(Error::NoNodesAvailable { .. })
    ));
    assert!(matches!(
        client.get("k").await,
        Err(Error::NoNodesAvailable { .. })
    ));
}
