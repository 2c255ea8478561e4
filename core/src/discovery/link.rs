//! ARP sweep over a directly attached segment.
//!
//! Needs root for the raw datalink socket and a local interface whose IPv4
//! network covers every target. Missing either makes the strategy unavailable
//! so the engine moves on to the next one.

use std::collections::{BTreeSet, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use pnet::datalink::DataLinkReceiver;
use tracing::{debug, trace};

use sweepr_common::models::DiscoveryMethod;
use sweepr_common::network::interface::{AttachedSegment, find_attached_segment};
use sweepr_protocols::arp;

use super::{DiscoveryStrategy, StrategyOutcome, SweepOptions};
use crate::network::channel;

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkLayerSweep;

#[async_trait]
impl DiscoveryStrategy for LinkLayerSweep {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::LinkLayer
    }

    async fn sweep(&self, targets: &[IpAddr], opts: &SweepOptions) -> StrategyOutcome {
        if !is_root::is_root() {
            return StrategyOutcome::Unavailable("raw datalink access needs root".into());
        }
        let Some(segment) = find_attached_segment(targets) else {
            return StrategyOutcome::Unavailable("targets are not on an attached segment".into());
        };
        debug!("ARP sweep on {} from {}", segment.interface.name, segment.source.ip());

        let v4: Vec<Ipv4Addr> = targets
            .iter()
            .filter_map(|addr| match addr {
                IpAddr::V4(v4) => Some(*v4),
                IpAddr::V6(_) => None,
            })
            .collect();
        let window = opts.timeout;

        // The datalink receiver blocks, keep it off the async workers.
        match tokio::task::spawn_blocking(move || arp_sweep(&segment, &v4, window)).await {
            Ok(Ok(live)) => StrategyOutcome::from_live(live),
            Ok(Err(e)) => StrategyOutcome::Unavailable(format!("{e:#}")),
            Err(e) => StrategyOutcome::Unavailable(e.to_string()),
        }
    }
}

fn arp_sweep(segment: &AttachedSegment, targets: &[Ipv4Addr], window: Duration) -> anyhow::Result<BTreeSet<IpAddr>> {
    let src_mac = segment.interface.mac.context("interface has no MAC address")?;
    let src_addr = segment.source.ip();
    let (mut tx, rx) = channel::open(&segment.interface)?;

    for target in targets {
        let frame = arp::create_request(src_mac, src_addr, *target)?;
        if let Some(Err(e)) = tx.send_to(&frame, None) {
            trace!("ARP request to {target} not sent: {e}");
        }
    }

    Ok(listen_for_replies(rx, targets, window))
}

fn listen_for_replies(mut rx: Box<dyn DataLinkReceiver>, targets: &[Ipv4Addr], window: Duration) -> BTreeSet<IpAddr> {
    let wanted: HashSet<Ipv4Addr> = targets.iter().copied().collect();
    let mut live = BTreeSet::new();
    let deadline = Instant::now() + window;

    while Instant::now() < deadline && live.len() < wanted.len() {
        let Ok(frame) = rx.next() else {
            continue;
        };
        if let Some(sender) = replying_target(frame, &wanted) {
            trace!("ARP reply from {sender}");
            live.insert(IpAddr::V4(sender));
        }
    }
    live
}

/// The sender of `frame` if it is an ARP reply from one of `wanted`.
fn replying_target(frame: &[u8], wanted: &HashSet<Ipv4Addr>) -> Option<Ipv4Addr> {
    let (sender, _mac) = arp::parse_reply(frame)?;
    wanted.contains(&sender).then_some(sender)
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
    use pnet::packet::arp::{ArpOperations, MutableArpPacket};
    use pnet::util::MacAddr;

    const PEER_MAC: MacAddr = MacAddr(0x00, 0x11, 0x22, 0x33, 0x44, 0x55);

    fn reply_from(sender: Ipv4Addr) -> Vec<u8> {
        let mut frame = arp::create_request(PEER_MAC, sender, Ipv4Addr::new(192, 168, 1, 100)).unwrap();
        MutableArpPacket::new(&mut frame[arp::ETH_HDR_LEN..])
            .unwrap()
            .set_operation(ArpOperations::Reply);
        frame
    }

    #[test]
    fn replies_from_targets_are_accepted() {
        let wanted: HashSet<Ipv4Addr> = [Ipv4Addr::new(192, 168, 1, 7)].into_iter().collect();
        assert_eq!(
            replying_target(&reply_from(Ipv4Addr::new(192, 168, 1, 7)), &wanted),
            Some(Ipv4Addr::new(192, 168, 1, 7))
        );
    }

    #[test]
    fn replies_from_strangers_and_requests_are_ignored() {
        let wanted: HashSet<Ipv4Addr> = [Ipv4Addr::new(192, 168, 1, 7)].into_iter().collect();
        assert_eq!(replying_target(&reply_from(Ipv4Addr::new(192, 168, 1, 8)), &wanted), None);

        let request = arp::create_request(PEER_MAC, Ipv4Addr::new(192, 168, 1, 7), Ipv4Addr::new(192, 168, 1, 1)).unwrap();
        assert_eq!(replying_target(&request, &wanted), None);
    }

    #[tokio::test]
    async fn unprivileged_or_detached_sweep_is_unavailable() {
        // TEST-NET-3 is never on a local segment.
        let targets = [IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9))];
        let opts = SweepOptions {
            timeout: Duration::from_millis(50),
            concurrency: 1,
        };
        let outcome = LinkLayerSweep.sweep(&targets, &opts).await;
        assert!(matches!(outcome, StrategyOutcome::Unavailable(_)));
    }
}
