use std::net::IpAddr;
use std::time::Duration;

use sweepr_common::ReconError;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_native_tls::{TlsConnector, TlsStream};

/// Connector for reconnaissance: certificates and hostnames are never verified,
/// self-signed and unknown-CA endpoints are expected.
pub fn permissive_connector() -> Result<TlsConnector, ReconError> {
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(ReconError::transport)?;
    Ok(TlsConnector::from(connector))
}

/// Runs the TLS handshake over an established stream.
///
/// Every failure here, including the handshake running out of time, is a
/// [`ReconError::Transport`]: the server accepted TCP but would not negotiate.
pub async fn handshake(
    connector: &TlsConnector,
    host: IpAddr,
    stream: TcpStream,
    handshake_timeout: Duration,
) -> Result<TlsStream<TcpStream>, ReconError> {
    let domain = host.to_string();
    match timeout(handshake_timeout, connector.connect(&domain, stream)).await {
        Ok(Ok(tls)) => Ok(tls),
        Ok(Err(e)) => Err(ReconError::transport(format!("tls handshake failed: {e}"))),
        Err(_elapsed) => Err(ReconError::transport("tls handshake timed out")),
    }
}
