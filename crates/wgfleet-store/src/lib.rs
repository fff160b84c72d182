//! Desired-state storage for a WireGuard fleet.
//!
//! [`Store`] wraps a single embedded [`sled`] database tree, optionally
//! synced against a cloud object store, and exposes typed collections for
//! [`model::Server`] and [`model::Peer`] records.

pub mod collections;
pub mod error;
pub mod kv;
pub mod model;
pub mod remote;
pub mod store;

pub use collections::{PeerCollection, ServerCollection};
pub use error::{Error, Result};
pub use model::{ExpireAction, Peer, PeerSpec, PeerStatus, Phase, Server, WireguardClientConfig};
pub use remote::RemoteSync;
pub use store::Store;
