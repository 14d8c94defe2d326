//! # ringkv
//!
//! Client-side consistent-hashing router for a key-value store spread over
//! independent storage nodes (Redis-compatible, speaking RESP).
//!
//! Each key is resolved through a [`NodeDirectory`] to an ordered list of up
//! to `R` candidate nodes. [`ReplicatedClient::set`] writes the value to every
//! candidate, [`ReplicatedClient::get`] reads the candidates in order and
//! returns the first value found. Connections are opened lazily and pooled per
//! node address.
//!
//! ## Modules
//! - `client`: [`ReplicatedClient`] and its [`ClientBuilder`]
//! - `directory`: the [`NodeDirectory`] seam, [`HashRing`] and [`StaticDirectory`]
//! - `network`: the storage node transport ([`Connector`], [`NodeConnection`]),
//!   its RESP/TCP implementation and the [`ConnectionPool`]
//! - `config`: [`ClientConfig`] loaded from defaults, file and environment

mod client;
mod config;
mod constants;
mod directory;
mod errors;
mod network;
pub(crate) mod utils;

pub use crate::client::*;
pub use crate::config::*;
pub use crate::constants::*;
pub use crate::directory::*;
pub use crate::errors::*;
pub use crate::network::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
mod test_utils;
