use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use sweepr_common::ReconError;
use sweepr_common::models::DiscoveryMethod;

use super::{DiscoveryStrategy, StrategyOutcome, SweepOptions, sweep_hosts};
use crate::network::tcp;

/// Connect-based sweep: a host is live as soon as one of `ports` accepts a connection.
///
/// A refusal or a timeout on one port moves on to the next.
pub struct ConnectSweep {
    ports: Arc<[u16]>,
}

impl ConnectSweep {
    pub fn new(ports: Vec<u16>) -> Self {
        Self { ports: ports.into() }
    }
}

#[async_trait]
impl DiscoveryStrategy for ConnectSweep {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::Connect
    }

    async fn sweep(&self, targets: &[IpAddr], opts: &SweepOptions) -> StrategyOutcome {
        if self.ports.is_empty() {
            return StrategyOutcome::Unavailable("no connect ports configured".into());
        }
        let ports = self.ports.clone();
        let wait = opts.timeout;
        sweep_hosts(targets, opts, DiscoveryMethod::Connect, move |addr| knock_any(addr, ports.clone(), wait)).await
    }
}

async fn knock_any(addr: IpAddr, ports: Arc<[u16]>, wait: Duration) -> Result<bool, ReconError> {
    for port in ports.iter().copied() {
        match tcp::knock(addr, port, wait).await {
            Ok(()) => {
                trace!("{addr}:{port} accepted");
                return Ok(true);
            }
            Err(e @ ReconError::UnsupportedCapability(_)) => return Err(e),
            Err(e) => trace!("{addr}:{port} {e}"),
        }
    }
    Ok(false)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
