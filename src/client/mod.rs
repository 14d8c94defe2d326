//! Replicated key-value client
//!
//! - [`ReplicatedClient`] - Writes each key to all of its replicas and reads
//!   it back from the first replica that answers
//! - [`ClientBuilder`] - Configurable client construction
//!
//! # Basic Usage
//! ```no_run
//! use ringkv::ReplicatedClient;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = ReplicatedClient::builder(
//!         vec!["10.0.0.1:6379".into(), "10.0.0.2:6379".into()],
//!         "redis",
//!     )
//!     .replication_factor(2)
//!     .build()
//!     .await
//!     .unwrap();
//!
//!     client.set("user:1001", "Alice").await.unwrap();
//!     let value = client.get("user:1001").await.unwrap();
//!     println!("User data: {:?}", value);
//!
//!     client.close().await;
//! }
//! ```

mod builder;
mod replicated_client;

pub use builder::*;
pub use replicated_client::*;
