//! Case: acknowledged writes surface replica rejections.
//!
//! Scenario:
//!
//! 1. Resolve every key to [primary, secondary].
//! 2. Set in acknowledged mode, once with a healthy secondary and once with a
//!    secondary that rejects writes.
//!
//! Expected Result:
//!
//! - With healthy replicas the value is present on both as soon as Set returns.
//! - A rejecting replica fails the Set with its error reply.

use ringkv::Error;
use ringkv::ProtocolError;
use ringkv::ReplicatedClient;
use ringkv::WriteMode;

use crate::common::NodeMode;
use crate::common::OrderedDirectory;
use crate::common::TestNode;

#[tokio::test]
async fn test_acknowledged_write_is_visible_on_return() {
    let primary = TestNode::start().await;
    let secondary = TestNode::start().await;

    let client = ReplicatedClient::builder(vec!["unused:2379".to_string()], "redis")
        .directory(OrderedDirectory::new(vec![primary.node(), secondary.node()]))
        .write_mode(WriteMode::Acknowledged)
        .build()
        .await
        .expect("build client");

    client.set("k", "v").await.expect("acknowledged set");

    assert_eq!(primary.value("k").as_deref(), Some(&b"v"[..]));
    assert_eq!(secondary.value("k").as_deref(), Some(&b"v"[..]));
}

#[tokio::test]
async fn test_rejected_write_fails_set() {
    let primary = TestNode::start().await;
    let secondary = TestNode::start_with(NodeMode::ReadOnly).await;

    let client = ReplicatedClient::builder(vec!["unused:2379".to_string()], "redis")
        .directory(OrderedDirectory::new(vec![primary.node(), secondary.node()]))
        .write_mode(WriteMode::Acknowledged)
        .build()
        .await
        .expect("build client");

    let result = client.set("k", "v").await;

    assert!(matches!(
        result,
        Err(Error::Protocol(ProtocolError::ServerError(ref m))) if m.starts_with("READONLY")
    ));
    // No rollback on the replica that accepted the write
    assert_eq!(primary.value("k").as_deref(), Some(&b"v"[..]));
}

#[tokio::test]
async fn test_parallel_acknowledged_write() {
    let primary = TestNode::start().await;
    let secondary = TestNode::start().await;

    let client = ReplicatedClient::builder(vec!["unused:2379".to_string()], "redis")
        .directory(OrderedDirectory::new(vec![primary.node(), secondary.node()]))
        .write_mode(WriteMode::Acknowledged)
        .parallel_writes(true)
        .build()
        .await
        .expect("build client");

    client.set("k", "v").await.expect("parallel set");

    assert_eq!(primary.command_count(), 1);
    assert_eq!(secondary.command_count(), 1);
}
