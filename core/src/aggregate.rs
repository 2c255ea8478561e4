//! Result aggregation.
//!
//! Workers never touch shared state. They push results into a channel that a
//! single aggregator task drains into the phase's collection; the collection is
//! handed back only after the phase barrier, once every sender is gone.

use std::collections::BTreeSet;
use std::net::IpAddr;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, trace};

use sweepr_common::ReconError;
use sweepr_common::models::{Banner, HostProbeResult, PortProbeResult};

pub struct Aggregator<T, S> {
    tx: UnboundedSender<T>,
    handle: JoinHandle<S>,
}

impl<T, S> Aggregator<T, S>
where
    T: Send + 'static,
    S: Default + Send + 'static,
{
    /// Spawns the draining task. `merge` folds each result into the state.
    pub fn spawn<F>(mut merge: F) -> Self
    where
        F: FnMut(&mut S, T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        let handle = tokio::spawn(async move {
            let mut state = S::default();
            while let Some(item) = rx.recv().await {
                merge(&mut state, item);
            }
            state
        });
        Self { tx, handle }
    }

    pub fn sink(&self) -> UnboundedSender<T> {
        self.tx.clone()
    }

    /// Closes the channel and waits for the drained state.
    ///
    /// Every cloned sink must already be dropped, otherwise this waits for them.
    pub async fn finish(self) -> S {
        drop(self.tx);
        match self.handle.await {
            Ok(state) => state,
            Err(e) => {
                error!("aggregator task failed: {e}");
                S::default()
            }
        }
    }
}

/// What a discovery worker reports for one host: a verdict, or the probe error.
pub type HostVerdict = Result<HostProbeResult, (IpAddr, ReconError)>;

/// Verdicts of one strategy sweep.
#[derive(Debug, Default)]
pub struct HostTally {
    pub live: BTreeSet<IpAddr>,
    pub probed: usize,
    unsupported: Option<(usize, String)>,
}

impl HostTally {
    fn merge(&mut self, verdict: HostVerdict) {
        self.probed += 1;
        match verdict {
            Ok(result) => {
                if result.live {
                    trace!("{} answered {}", result.addr, result.method);
                    self.live.insert(result.addr);
                }
            }
            Err((_, ReconError::UnsupportedCapability(reason))) => {
                let count = self.unsupported.as_ref().map_or(0, |(n, _)| *n);
                self.unsupported = Some((count + 1, reason));
            }
            Err((addr, e)) => trace!("{addr}: {e}"),
        }
    }

    /// Reason shared by the probes when every single one lacked the capability.
    pub fn unavailable(&self) -> Option<&str> {
        match &self.unsupported {
            Some((count, reason)) if *count == self.probed => Some(reason),
            _ => None,
        }
    }
}

/// Live addresses of a sweep.
pub fn live_hosts() -> Aggregator<HostVerdict, HostTally> {
    Aggregator::spawn(HostTally::merge)
}

/// Open ports of a single host scan.
pub fn open_ports() -> Aggregator<PortProbeResult, BTreeSet<u16>> {
    Aggregator::spawn(|ports: &mut BTreeSet<u16>, result: PortProbeResult| {
        if result.open {
            ports.insert(result.port);
        }
    })
}

/// Banners, ordered host then port.
pub fn banners() -> Aggregator<Banner, BTreeSet<Banner>> {
    Aggregator::spawn(|banners: &mut BTreeSet<Banner>, banner: Banner| {
        banners.insert(banner);
    })
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
    use std::net::Ipv4Addr;
    use sweepr_common::models::DiscoveryMethod;

    fn ip(d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, d))
    }

    #[tokio::test]
    async fn live_hosts_are_sorted_whatever_the_arrival_order() {
        let agg = live_hosts();
        let sink = agg.sink();
        for d in [9, 3, 200, 3, 1, 17] {
            sink.send(Ok(HostProbeResult::up(ip(d), DiscoveryMethod::Echo))).unwrap();
        }
        sink.send(Ok(HostProbeResult::down(ip(4), DiscoveryMethod::Echo))).unwrap();
        sink.send(Err((ip(5), ReconError::ProbeTimeout))).unwrap();
        drop(sink);

        let tally = agg.finish().await;
        assert_eq!(tally.probed, 8);
        assert_eq!(tally.unavailable(), None);
        let hosts: Vec<IpAddr> = tally.live.into_iter().collect();
        assert_eq!(hosts, vec![ip(1), ip(3), ip(9), ip(17), ip(200)]);
    }

    #[tokio::test]
    async fn tally_is_unavailable_only_when_every_host_lacked_the_capability() {
        let missing = || ReconError::UnsupportedCapability("ping missing".into());

        let agg = live_hosts();
        let sink = agg.sink();
        sink.send(Err((ip(1), missing()))).unwrap();
        sink.send(Err((ip(2), missing()))).unwrap();
        drop(sink);
        assert_eq!(agg.finish().await.unavailable(), Some("ping missing"));

        let agg = live_hosts();
        let sink = agg.sink();
        sink.send(Err((ip(1), missing()))).unwrap();
        sink.send(Ok(HostProbeResult::down(ip(2), DiscoveryMethod::Echo))).unwrap();
        drop(sink);
        assert_eq!(agg.finish().await.unavailable(), None);
    }

    #[tokio::test]
    async fn concurrent_senders_merge_into_one_set() {
        let agg = open_ports();
        let mut handles = Vec::new();
        for worker in 0..8u16 {
            let sink = agg.sink();
            handles.push(tokio::spawn(async move {
                for port in (1..=100u16).filter(|p| p % 8 == worker) {
                    let open = port % 10 == 0;
                    sink.send(PortProbeResult { host: ip(1), port, open }).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let ports: Vec<u16> = agg.finish().await.into_iter().collect();
        assert_eq!(ports, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }

    #[tokio::test]
    async fn finishing_without_results_yields_empty_state() {
        let agg = banners();
        assert!(agg.finish().await.is_empty());
    }
}
