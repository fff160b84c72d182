//! Error types for IP address allocation.

use std::net::IpAddr;
use thiserror::Error;

/// Errors that can occur while allocating addresses from an [`crate::IpMap`].
#[derive(Debug, Error)]
pub enum Error {
    /// The CIDR block could not be parsed.
    #[error("invalid CIDR block: {reason}")]
    InvalidCidr {
        /// The reason the CIDR block was rejected.
        reason: String,
    },

    /// The pool has no free addresses left to hand out.
    #[error("address pool exhausted")]
    PoolExhausted,

    /// The requested address does not belong to the pool's network.
    #[error("address {addr} is not in the pool's network")]
    NotInNetwork {
        /// The address that was outside the network.
        addr: IpAddr,
    },
}

/// Result type alias for IP allocation operations.
pub type Result<T> = std::result::Result<T, Error>;
