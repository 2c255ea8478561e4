use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use sweepr_common::ReconError;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Opens a stream connection bounded by `probe_timeout`.
///
/// Failures are classified into the recon taxonomy: a RST is
/// [`ReconError::ProbeRefused`], an expired timer [`ReconError::ProbeTimeout`],
/// anything else (unreachable, reset, ...) [`ReconError::Transport`].
pub async fn connect(addr: IpAddr, port: u16, probe_timeout: Duration) -> Result<TcpStream, ReconError> {
    let socket_addr = SocketAddr::new(addr, port);

    match timeout(probe_timeout, TcpStream::connect(socket_addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(ReconError::from(e)),
        Err(_elapsed) => Err(ReconError::ProbeTimeout),
    }
}

/// Connects and immediately drops the stream.
pub async fn knock(addr: IpAddr, port: u16, probe_timeout: Duration) -> Result<(), ReconError> {
    connect(addr, port, probe_timeout).await.map(drop)
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

    #[tokio::test]
    async fn connect_succeeds_on_listening_port() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(connect(LOCALHOST, port, Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn connect_reports_refusal_on_closed_port() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = knock(LOCALHOST, port, Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(err, ReconError::ProbeRefused);
    }

    #[tokio::test]
    #[ignore]
    async fn connect_times_out_on_unroutable_address() {
        let ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 1));
        let err = knock(ip, 443, Duration::from_millis(100)).await.unwrap_err();
        assert_eq!(err, ReconError::ProbeTimeout);
    }
}
