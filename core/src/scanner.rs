//! Connect port scanner.
//!
//! One connect attempt per port under a bounded pool. Established means open;
//! refusal, timeout, unreachable and reset all mean closed and only show up in
//! trace output. There are no retries.

use std::net::IpAddr;
use std::time::Duration;

use tracing::{debug, trace};

use sweepr_common::ReconError;
use sweepr_common::config::PortScanConfig;
use sweepr_common::models::{OpenPortSet, PortProbeResult};

use crate::aggregate;
use crate::network::tcp;
use crate::pool::WorkerPool;

/// Scans `ports` on `host`, returning the open ones in ascending order.
pub async fn scan_ports(host: IpAddr, ports: &[u16], timeout: Duration, concurrency: usize) -> OpenPortSet {
    let pool = WorkerPool::new(concurrency);
    let open = aggregate::open_ports();

    pool.run(ports.to_vec(), open.sink(), move |port| probe_port(host, port, timeout))
        .await;

    let open = OpenPortSet::new(host, open.finish().await);
    debug!("{host}: {} of {} ports open", open.len(), ports.len());
    open
}

/// Same as [`scan_ports`], validating the configuration first.
pub async fn scan_with(host: IpAddr, cfg: &PortScanConfig) -> Result<OpenPortSet, ReconError> {
    cfg.validate()?;
    Ok(scan_ports(host, &cfg.ports, cfg.timeout, cfg.concurrency).await)
}

async fn probe_port(host: IpAddr, port: u16, timeout: Duration) -> PortProbeResult {
    let open = match tcp::knock(host, port, timeout).await {
        Ok(()) => true,
        Err(e) => {
            trace!("{host}:{port} closed ({e})");
            false
        }
    };
    PortProbeResult { host, port, open }
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
    use tokio::net::TcpListener;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    async fn listeners(n: usize) -> (Vec<TcpListener>, Vec<u16>) {
        let mut held = Vec::new();
        let mut ports = Vec::new();
        for _ in 0..n {
            let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
            ports.push(listener.local_addr().unwrap().port());
            held.push(listener);
        }
        (held, ports)
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn reports_only_listening_ports_in_ascending_order() {
        let (_held, mut open) = listeners(3).await;
        let closed = closed_port().await;

        let mut requested = open.clone();
        requested.push(closed);
        requested.reverse();

        let result = scan_ports(LOCALHOST, &requested, Duration::from_millis(500), 2).await;

        open.sort_unstable();
        assert_eq!(result.host, LOCALHOST);
        assert_eq!(result.ports(), open.as_slice());
        assert!(!result.contains(closed));
    }

    #[tokio::test]
    async fn nothing_listening_yields_an_empty_set() {
        let closed = closed_port().await;
        let result = scan_ports(LOCALHOST, &[closed], Duration::from_millis(500), 4).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn scan_with_rejects_empty_port_list() {
        let cfg = PortScanConfig {
            ports: Vec::new(),
            ..Default::default()
        };
        let err = scan_with(LOCALHOST, &cfg).await.unwrap_err();
        assert!(matches!(err, ReconError::Configuration(_)));
    }
}
