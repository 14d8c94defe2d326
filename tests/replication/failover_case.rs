//! Case: reads fail over past an unreachable primary, writes do not.
//!
//! Scenario:
//!
//! 1. Resolve every key to [dead, live], where nothing listens on `dead`.
//! 2. Seed `live` with "user:1001" = "Alice".
//! 3. Get "user:1001", then set it.
//!
//! Expected Result:
//!
//! - Get returns "Alice" from the secondary.
//! - Set fails with a connection error and `live` is never written.

use std::time::Duration;

use bytes::Bytes;
use ringkv::Error;
use ringkv::ReplicatedClient;

use crate::common::dead_node;
use crate::common::OrderedDirectory;
use crate::common::TestNode;

#[tokio::test]
async fn test_read_fails_over_to_secondary() {
    let dead = dead_node().await;
    let live = TestNode::start().await;
    live.insert("user:1001", b"Alice");

    let client = ReplicatedClient::builder(vec!["unused:2379".to_string()], "redis")
        .directory(OrderedDirectory::new(vec![dead, live.node()]))
        .connect_timeout(Duration::from_secs(1))
        .build()
        .await
        .expect("build client");

    assert_eq!(
        client.get("user:1001").await.unwrap(),
        Some(Bytes::from_static(b"Alice"))
    );
}

#[tokio::test]
async fn test_write_aborts_at_unreachable_primary() {
    let dead = dead_node().await;
    let live = TestNode::start().await;

    let client = ReplicatedClient::builder(vec!["unused:2379".to_string()], "redis")
        .directory(OrderedDirectory::new(vec![dead, live.node()]))
        .connect_timeout(Duration::from_secs(1))
        .build()
        .await
        .expect("build client");

    let result = client.set("user:1001", "Bob").await;

    assert!(matches!(
        result,
        Err(Error::Connection(_)) | Err(Error::Timeout { .. })
    ));
    assert_eq!(live.command_count(), 0);
    assert_eq!(live.value("user:1001"), None);
}

#[tokio::test]
async fn test_read_with_every_replica_unreachable_fails() {
    let client = ReplicatedClient::builder(vec!["unused:2379".to_string()], "redis")
        .directory(OrderedDirectory::new(vec![dead_node().await, dead_node().await]))
        .connect_timeout(Duration::from_secs(1))
        .build()
        .await
        .expect("build client");

    let err = client.get("k").await.unwrap_err();
    assert!(err.is_retryable());
}
