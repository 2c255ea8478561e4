//! Local interface lookup for the link-layer sweep.
//!
//! ARP only reaches hosts on a directly attached segment, so before sweeping we
//! need an interface whose IPv4 network covers every candidate address.

use std::net::IpAddr;

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    IsDown,
    /// Loopback interfaces never carry ARP.
    IsLoopback,
    /// The interface does not have a MAC address.
    NoMacAddress,
    /// The interface does not support broadcast (required for ARP).
    NotBroadcast,
    /// The interface is a point-to-point link (e.g., a VPN).
    IsPointToPoint,
    /// The interface has no IPv4 address to send from.
    NoIpv4,
}

/// An interface together with the IPv4 network the sweep will send from.
#[derive(Debug, Clone)]
pub struct AttachedSegment {
    pub interface: NetworkInterface,
    pub source: Ipv4Network,
}

pub trait NetworkInterfaceExtension {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network>;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network> {
        self.ips
            .iter()
            .filter_map(|ip| match ip {
                IpNetwork::V4(ipv4) => Some(*ipv4),
                IpNetwork::V6(_) => None,
            })
            .collect()
    }
}

/// Finds the attached segment covering all `targets` on this machine.
pub fn find_attached_segment(targets: &[IpAddr]) -> Option<AttachedSegment> {
    select_segment(datalink::interfaces(), targets)
}

/// Picks the first viable interface owning a network that contains every target.
pub fn select_segment(interfaces: Vec<NetworkInterface>, targets: &[IpAddr]) -> Option<AttachedSegment> {
    if targets.is_empty() {
        return None;
    }

    interfaces
        .into_iter()
        .filter(|interface| is_viable_lan_interface(interface).is_ok())
        .find_map(|interface| {
            let source = interface
                .get_ipv4_nets()
                .into_iter()
                .find(|net| targets.iter().all(|target| covers(net, target)))?;
            Some(AttachedSegment { interface, source })
        })
}

fn covers(net: &Ipv4Network, target: &IpAddr) -> bool {
    match target {
        IpAddr::V4(v4) => net.contains(*v4),
        IpAddr::V6(_) => false,
    }
}

pub fn is_viable_lan_interface(interface: &NetworkInterface) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if interface.is_loopback() {
        return Err(ViabilityError::IsLoopback);
    }
    if interface.mac.is_none() {
        return Err(ViabilityError::NoMacAddress);
    }
    if !interface.is_broadcast() {
        return Err(ViabilityError::NotBroadcast);
    }
    if interface.is_point_to_point() {
        return Err(ViabilityError::IsPointToPoint);
    }
    if interface.get_ipv4_nets().is_empty() {
        return Err(ViabilityError::NoIpv4);
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
