//! Virtual address allocation within a mesh subnet.
//!
//! Allocation is first-fit over the usable host range in ascending order, so
//! the same subnet with the same pre-registered addresses always hands out
//! the same addresses.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use crate::error::{MeshError, Result};

/// Tracks claimed addresses in one IPv4 subnet.
#[derive(Debug, Clone)]
pub struct SubnetAllocator {
    subnet: Ipv4Net,
    /// First usable host address.
    low: u32,
    /// Last usable host address.
    high: u32,
    allocated: BTreeSet<Ipv4Addr>,
}

impl SubnetAllocator {
    /// Creates an allocator for an already-parsed subnet.
    #[must_use]
    pub fn new(subnet: Ipv4Net) -> Self {
        let subnet = subnet.trunc();
        let network = u32::from(subnet.network());
        let broadcast = u32::from(subnet.broadcast());
        // /31 and /32 have no network or broadcast address to skip
        let (low, high) = if subnet.prefix_len() >= 31 {
            (network, broadcast)
        } else {
            (network + 1, broadcast - 1)
        };
        Self {
            subnet,
            low,
            high,
            allocated: BTreeSet::new(),
        }
    }

    /// Creates an allocator from CIDR notation, e.g. `10.2.1.1/16`.
    ///
    /// # Errors
    ///
    /// Returns an error if the CIDR is not a valid IPv4 network.
    pub fn from_cidr(cidr: &str) -> Result<Self> {
        let subnet = cidr
            .trim()
            .parse::<Ipv4Net>()
            .map_err(|e| MeshError::InvalidSubnet(format!("{cidr}: {e}")))?;
        Ok(Self::new(subnet))
    }

    /// Creates an allocator from an address and a dotted netmask, e.g.
    /// `10.2.1.1` and `255.255.0.0`.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is malformed or the netmask is not
    /// contiguous.
    pub fn from_address_and_netmask(address: &str, netmask: &str) -> Result<Self> {
        let addr = address
            .trim()
            .parse::<Ipv4Addr>()
            .map_err(|e| MeshError::InvalidSubnet(format!("{address}: {e}")))?;
        let mask = netmask
            .trim()
            .parse::<Ipv4Addr>()
            .map_err(|e| MeshError::InvalidSubnet(format!("{netmask}: {e}")))?;
        let subnet = Ipv4Net::with_netmask(addr, mask)
            .map_err(|e| MeshError::InvalidSubnet(format!("{netmask}: {e}")))?;
        Ok(Self::new(subnet))
    }

    /// Returns the subnet this allocator manages.
    #[must_use]
    pub const fn subnet(&self) -> Ipv4Net {
        self.subnet
    }

    /// Returns true if `ip` is a usable host address of the subnet.
    #[must_use]
    pub fn is_in_subnet(&self, ip: Ipv4Addr) -> bool {
        (self.low..=self.high).contains(&u32::from(ip))
    }

    /// Returns true if `ip` has been claimed.
    #[must_use]
    pub fn is_allocated(&self, ip: Ipv4Addr) -> bool {
        self.allocated.contains(&ip)
    }

    /// Claims `ip` if it lies in the subnet. Claiming twice is a no-op.
    ///
    /// Returns whether the address is claimed after the call.
    pub fn register_allocated_ip(&mut self, ip: Ipv4Addr) -> bool {
        if !self.is_in_subnet(ip) {
            return false;
        }
        self.allocated.insert(ip);
        true
    }

    /// Claims every in-subnet address of `ips`; others are ignored.
    pub fn register_allocated_ips<I>(&mut self, ips: I)
    where
        I: IntoIterator<Item = Ipv4Addr>,
    {
        for ip in ips {
            self.register_allocated_ip(ip);
        }
    }

    /// Claims and returns the lowest free host address, or `None` once the
    /// subnet is exhausted.
    pub fn allocate_ip(&mut self) -> Option<Ipv4Addr> {
        let ip = (self.low..=self.high)
            .map(Ipv4Addr::from)
            .find(|ip| !self.allocated.contains(ip))?;
        self.allocated.insert(ip);
        Some(ip)
    }

    /// Releases a claimed address. Returns whether it was claimed.
    pub fn release_ip(&mut self, ip: Ipv4Addr) -> bool {
        self.allocated.remove(&ip)
    }

    /// Returns the number of claimed addresses.
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }

    /// Returns the number of usable addresses not yet claimed.
    #[must_use]
    pub fn available_count(&self) -> usize {
        let total = (self.high - self.low) as usize + 1;
        total.saturating_sub(self.allocated.len())
    }
}

/// Parses a host address as written in a topology document. A trailing
/// `/prefix` is tolerated and ignored.
#[must_use]
pub fn parse_host_address(address: &str) -> Option<Ipv4Addr> {
    let address = address.trim();
    address
        .parse::<Ipv4Addr>()
        .ok()
        .or_else(|| address.parse::<Ipv4Net>().ok().map(|net| net.addr()))
}
