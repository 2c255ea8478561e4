use std::net::Ipv4Addr;

use anyhow::Context;
use pnet::packet::Packet;
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::util::MacAddr;

pub const ETH_HDR_LEN: usize = 14;
pub const ARP_LEN: usize = 28;
pub const ARP_FRAME_LEN: usize = ETH_HDR_LEN + ARP_LEN;

/// Builds a broadcast "who-has `target_addr`" frame.
pub fn create_request(src_mac: MacAddr, src_addr: Ipv4Addr, target_addr: Ipv4Addr) -> anyhow::Result<Vec<u8>> {
    let mut buffer: Vec<u8> = vec![0u8; ARP_FRAME_LEN];
    {
        let mut eth = MutableEthernetPacket::new(&mut buffer).context("creating ethernet header")?;
        eth.set_source(src_mac);
        eth.set_destination(MacAddr::broadcast());
        eth.set_ethertype(EtherTypes::Arp);
    }
    {
        let mut arp = MutableArpPacket::new(&mut buffer[ETH_HDR_LEN..]).context("creating arp packet")?;
        arp.set_hardware_type(ArpHardwareTypes::Ethernet);
        arp.set_protocol_type(EtherTypes::Ipv4);
        arp.set_hw_addr_len(6);
        arp.set_proto_addr_len(4);
        arp.set_operation(ArpOperations::Request);
        arp.set_sender_hw_addr(src_mac);
        arp.set_sender_proto_addr(src_addr);
        arp.set_target_hw_addr(MacAddr::zero());
        arp.set_target_proto_addr(target_addr);
    }
    Ok(buffer)
}

/// Extracts the sender of an ARP reply. Anything else yields `None`.
pub fn parse_reply(frame: &[u8]) -> Option<(Ipv4Addr, MacAddr)> {
    let eth = EthernetPacket::new(frame)?;
    if eth.get_ethertype() != EtherTypes::Arp {
        return None;
    }
    let arp = ArpPacket::new(eth.payload())?;
    if arp.get_operation() != ArpOperations::Reply {
        return None;
    }
    Some((arp.get_sender_proto_addr(), arp.get_sender_hw_addr()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    const SRC_MAC: MacAddr = MacAddr(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff);
    const PEER_MAC: MacAddr = MacAddr(0x00, 0x11, 0x22, 0x33, 0x44, 0x55);

    fn reply_frame(sender: Ipv4Addr) -> Vec<u8> {
        let mut frame = create_request(PEER_MAC, sender, Ipv4Addr::new(192, 168, 1, 100)).unwrap();
        let mut arp = MutableArpPacket::new(&mut frame[ETH_HDR_LEN..]).unwrap();
        arp.set_operation(ArpOperations::Reply);
        frame
    }

    #[test]
    fn request_sets_ethernet_and_arp_fields() {
        let src = Ipv4Addr::new(192, 168, 1, 100);
        let dst = Ipv4Addr::new(192, 168, 1, 7);
        let frame = create_request(SRC_MAC, src, dst).unwrap();

        assert_eq!(frame.len(), ARP_FRAME_LEN);
        let eth = EthernetPacket::new(&frame).unwrap();
        assert_eq!(eth.get_source(), SRC_MAC);
        assert_eq!(eth.get_destination(), MacAddr::broadcast());
        assert_eq!(eth.get_ethertype(), EtherTypes::Arp);

        let arp = ArpPacket::new(eth.payload()).unwrap();
        assert_eq!(arp.get_operation(), ArpOperations::Request);
        assert_eq!(arp.get_sender_proto_addr(), src);
        assert_eq!(arp.get_target_proto_addr(), dst);
        assert_eq!(arp.get_target_hw_addr(), MacAddr::zero());
    }

    #[test]
    fn parse_reply_returns_sender() {
        let sender = Ipv4Addr::new(192, 168, 1, 42);
        assert_eq!(parse_reply(&reply_frame(sender)), Some((sender, PEER_MAC)));
    }

    #[test]
    fn parse_reply_ignores_requests_and_garbage() {
        let request = create_request(SRC_MAC, Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)).unwrap();
        assert_eq!(parse_reply(&request), None);
        assert_eq!(parse_reply(&[0u8; 4]), None);
    }
}
