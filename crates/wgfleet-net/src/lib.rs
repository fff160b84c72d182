//! Host address allocation within a WireGuard server's subnet.
//!
//! [`IpMap`] tracks which host addresses in a server's CIDR block are free
//! versus claimed by a peer. Peer creation pops the next free address;
//! peer deletion returns it to the pool.

#![forbid(unsafe_code)]

pub mod error;
mod ip_map;

pub use error::{Error, Result};
pub use ip_map::IpMap;
