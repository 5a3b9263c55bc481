//! Address allocation inside a WireGuard subnet
//!
//! Addresses are handed out sequentially: the subnet's network address is
//! skipped, the next one goes to the server and every following one to a
//! client. An allocation is refused rather than leave the subnet.

use crate::error::{ProvisionError, Result};
use ipnet::IpNet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

/// Increment an address by one, keeping its width.
///
/// The all-ones address wraps to the all-zero address of the same family.
/// Callers that care about staying inside a subnet check membership
/// afterwards, which catches the wrap as well.
pub fn next_address(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(v4) => IpAddr::V4(Ipv4Addr::from(u32::from(v4).wrapping_add(1))),
        IpAddr::V6(v6) => IpAddr::V6(Ipv6Addr::from(u128::from(v6).wrapping_add(1))),
    }
}

/// Same address with a host-only mask (/32 or /128)
pub fn to_host_address(addr: &IpNet) -> IpNet {
    IpNet::from(addr.addr())
}

/// Whether `ip` lies inside `subnet`
pub fn subnet_contains(subnet: &IpNet, ip: &IpAddr) -> bool {
    subnet.contains(ip)
}

/// Parse subnet text in CIDR notation (e.g. "10.9.0.0/24").
///
/// Host bits are accepted and dropped, so "10.9.0.7/24" yields 10.9.0.0/24.
pub fn parse_subnet(text: &str) -> Result<IpNet> {
    let subnet: IpNet = text
        .trim()
        .parse()
        .map_err(|e| ProvisionError::InvalidSubnet(format!("'{}': {}", text.trim(), e)))?;
    Ok(subnet.trunc())
}

/// Hands out interface addresses from one subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressAllocator {
    subnet: IpNet,
}

impl AddressAllocator {
    /// Create an allocator for the given subnet
    pub fn new(subnet: IpNet) -> Self {
        Self {
            subnet: subnet.trunc(),
        }
    }

    /// Allocator for the subnet an interface address belongs to
    pub fn for_interface(address: &IpNet) -> Self {
        Self::new(*address)
    }

    /// The subnet addresses are allocated from
    pub fn subnet(&self) -> IpNet {
        self.subnet
    }

    /// Server and first client addresses, each carrying the subnet's mask
    pub fn initial(&self) -> Result<(IpNet, IpNet)> {
        let server = next_address(self.subnet.network());
        let client = next_address(server);

        self.ensure_contains(server)?;
        self.ensure_contains(client)?;

        debug!(subnet = %self.subnet, %server, %client, "Allocated initial addresses");
        Ok((self.with_mask(server)?, self.with_mask(client)?))
    }

    /// Address for the client following `previous`.
    ///
    /// Both the new address and its successor, which is kept for the next
    /// client, must fit in the subnet.
    pub fn next_after(&self, previous: IpAddr) -> Result<IpNet> {
        let candidate = next_address(previous);
        self.ensure_contains(candidate)?;
        self.ensure_contains(next_address(candidate))?;

        debug!(subnet = %self.subnet, address = %candidate, "Allocated client address");
        self.with_mask(candidate)
    }

    fn ensure_contains(&self, ip: IpAddr) -> Result<()> {
        if subnet_contains(&self.subnet, &ip) {
            Ok(())
        } else {
            Err(ProvisionError::SubnetExhausted {
                subnet: self.subnet,
                next: ip,
            })
        }
    }

    fn with_mask(&self, ip: IpAddr) -> Result<IpNet> {
        IpNet::new(ip, self.subnet.prefix_len())
            .map_err(|e| ProvisionError::InvalidSubnet(format!("{}: {}", self.subnet, e)))
    }
}
