use std::net::{IpAddr, Ipv4Addr};

use pnet::ipnetwork::Ipv4Network;

use crate::error::{ReconError, Result};

/// Inclusive span of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Result<Self> {
        if u32::from(start_addr) > u32::from(end_addr) {
            return Err(ReconError::config(format!(
                "range start {start_addr} is above range end {end_addr}"
            )));
        }
        Ok(Self {
            start_addr,
            end_addr,
        })
    }

    pub fn len(&self) -> u64 {
        u64::from(u32::from(self.end_addr)) - u64::from(u32::from(self.start_addr)) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let value = u32::from(addr);
        u32::from(self.start_addr) <= value && value <= u32::from(self.end_addr)
    }

    pub fn to_iter(&self) -> impl Iterator<Item = IpAddr> + use<> {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        (start..=end).map(|ip| IpAddr::V4(Ipv4Addr::from(ip)))
    }
}

/// A CIDR block, e.g. `192.168.1.0/24`.
///
/// Host bits of the given address are ignored: `10.0.0.7/30` is the same network
/// as `10.0.0.0/30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkRange {
    network: Ipv4Network,
}

impl NetworkRange {
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self> {
        let network = Ipv4Network::new(addr, prefix)
            .map_err(|e| ReconError::config(format!("invalid network {addr}/{prefix}: {e}")))?;
        Ok(Self { network })
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    pub fn network_addr(&self) -> Ipv4Addr {
        self.network.network()
    }

    pub fn broadcast_addr(&self) -> Ipv4Addr {
        self.network.broadcast()
    }

    /// Usable host span.
    ///
    /// Network and broadcast addresses are dropped for prefixes below /31;
    /// /31 (point-to-point) and /32 keep every address.
    pub fn usable(&self) -> Ipv4Range {
        let first: u32 = self.network_addr().into();
        let last: u32 = self.broadcast_addr().into();
        if self.prefix() >= 31 {
            return Ipv4Range {
                start_addr: Ipv4Addr::from(first),
                end_addr: Ipv4Addr::from(last),
            };
        }
        Ipv4Range {
            start_addr: Ipv4Addr::from(first + 1),
            end_addr: Ipv4Addr::from(last - 1),
        }
    }

    pub fn host_count(&self) -> u64 {
        self.usable().len()
    }

    pub fn hosts(&self) -> impl Iterator<Item = IpAddr> + use<> {
        self.usable().to_iter()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
