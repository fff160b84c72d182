//! A free/claimed address map over a single CIDR block.
//!
//! Every WireGuard server owns one [`IpMap`] built from its subnet. Peer
//! creation pops the next free host address from the map; peer deletion
//! returns it with [`IpMap::del`]. The network and broadcast addresses of
//! the block are never handed out.

use ipnet::IpNet;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::net::IpAddr;

use crate::error::{Error, Result};

/// A set of free host addresses within a single CIDR block.
pub struct IpMap {
    network: IpNet,
    free: Mutex<BTreeSet<IpAddr>>,
}

impl IpMap {
    /// Builds a new map with every host address in `cidr` marked free,
    /// excluding the network and broadcast addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if `cidr` cannot be parsed.
    pub fn new(cidr: &str) -> Result<Self> {
        let network: IpNet = cidr.parse().map_err(|e| Error::InvalidCidr {
            reason: format!("{e}"),
        })?;

        let free = match network {
            IpNet::V4(v4) => v4
                .hosts()
                .map(IpAddr::V4)
                .collect::<BTreeSet<_>>(),
            IpNet::V6(v6) => v6
                .hosts()
                .map(IpAddr::V6)
                .collect::<BTreeSet<_>>(),
        };

        Ok(Self {
            network,
            free: Mutex::new(free),
        })
    }

    /// Returns the CIDR block this map was built from.
    #[must_use]
    pub fn network(&self) -> IpNet {
        self.network
    }

    /// Whether `addr` belongs to this map's network, regardless of whether
    /// it is currently free or claimed.
    #[must_use]
    pub fn contains(&self, addr: IpAddr) -> bool {
        self.network.contains(&addr)
    }

    /// Whether `addr` is currently free.
    #[must_use]
    pub fn is_available(&self, addr: IpAddr) -> bool {
        self.free.lock().contains(&addr)
    }

    /// Claims and returns the lowest free address in the pool, as a host
    /// route (`/32` for IPv4, `/128` for IPv6).
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if no addresses remain.
    pub fn pop(&self) -> Result<IpNet> {
        let mut free = self.free.lock();
        let addr = *free.iter().next().ok_or(Error::PoolExhausted)?;
        free.remove(&addr);
        Ok(host_route(addr))
    }

    /// Returns `addr` to the free pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInNetwork`] if `addr` does not belong to this
    /// map's network.
    pub fn del(&self, addr: IpAddr) -> Result<()> {
        if !self.contains(addr) {
            return Err(Error::NotInNetwork { addr });
        }
        self.free.lock().insert(addr);
        Ok(())
    }

    /// Marks `addr` as claimed, removing it from the free pool if present.
    /// Used to seed a freshly built map with addresses already handed out
    /// to existing peers. A no-op if `addr` is outside this map's network
    /// (e.g. the network or broadcast address) or already claimed.
    pub fn claim(&self, addr: IpAddr) {
        self.free.lock().remove(&addr);
    }

    /// Number of addresses still free in the pool.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.free.lock().len()
    }
}

fn host_route(addr: IpAddr) -> IpNet {
    match addr {
        IpAddr::V4(v4) => IpNet::new(IpAddr::V4(v4), 32).expect("/32 is always valid"),
        IpAddr::V6(v6) => IpNet::new(IpAddr::V6(v6), 128).expect("/128 is always valid"),
    }
}
