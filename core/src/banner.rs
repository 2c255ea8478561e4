//! # Banner Prober
//!
//! Collects the greeting text of open ports. Each attempt walks
//! `Init -> Connecting -> [ProbeSent] -> AwaitingResponse -> Done | Failed`:
//!
//! - Ports in the secure set negotiate TLS first, every other port starts plain.
//! - If negotiation fails after the TCP connection was accepted (TLS handshake,
//!   probe write), the other transport is tried exactly once.
//! - After the probe payload (if any) the prober waits one settle interval and
//!   does a single read of at most `max_bytes`.
//!
//! Nothing escapes this module as an error: failures become error-tagged banners.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_native_tls::TlsConnector;
use tracing::{debug, trace, warn};

use sweepr_common::ReconError;
use sweepr_common::config::validate_phase;
use sweepr_common::models::{Banner, BannerPayload, OpenPortSet, TransportKind};
use sweepr_protocols::probes::{DEFAULT_SECURE_PORTS, ServiceProbe, default_probes};

use crate::aggregate;
use crate::network::{tcp, tls};
use crate::pool::WorkerPool;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_BYTES: usize = 1024;
pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct BannerConfig {
    /// Bounds the connect, the TLS handshake, the probe write and the read, each on its own.
    pub timeout: Duration,
    /// Best-effort pause between the probe and the read.
    pub settle: Duration,
    pub max_bytes: usize,
    pub secure_ports: BTreeSet<u16>,
    pub probes: BTreeMap<u16, ServiceProbe>,
    pub concurrency: usize,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            settle: DEFAULT_SETTLE,
            max_bytes: DEFAULT_MAX_BYTES,
            secure_ports: DEFAULT_SECURE_PORTS.into_iter().collect(),
            probes: default_probes(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl BannerConfig {
    pub fn validate(&self) -> Result<(), ReconError> {
        validate_phase("banner", self.concurrency, self.timeout)?;
        if self.max_bytes == 0 {
            return Err(ReconError::config("banner byte budget must be at least 1"));
        }
        Ok(())
    }

    pub fn first_transport(&self, port: u16) -> TransportKind {
        if self.secure_ports.contains(&port) {
            TransportKind::Secure
        } else {
            TransportKind::Plain
        }
    }

    fn probe_for(&self, port: u16) -> &ServiceProbe {
        self.probes.get(&port).unwrap_or(&ServiceProbe::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Init,
    Connecting,
    ProbeSent,
    AwaitingResponse,
    Done,
    Failed,
}

impl ProbeState {
    pub fn can_advance_to(self, next: ProbeState) -> bool {
        use ProbeState::*;
        matches!(
            (self, next),
            (Init, Connecting)
                | (Connecting, ProbeSent | AwaitingResponse | Failed)
                | (ProbeSent, AwaitingResponse | Failed)
                | (AwaitingResponse, Done | Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProbeState::Done | ProbeState::Failed)
    }
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why an attempt stopped short of a greeting.
enum AttemptError {
    /// The port accepted TCP but the transport could not be negotiated.
    Negotiation(ReconError),
    /// Anything else: no retry.
    Fatal(ReconError),
}

impl AttemptError {
    fn into_inner(self) -> ReconError {
        match self {
            Self::Negotiation(e) | Self::Fatal(e) => e,
        }
    }
}

/// One pass over a single transport.
struct Attempt {
    host: IpAddr,
    port: u16,
    transport: TransportKind,
    state: ProbeState,
}

impl Attempt {
    fn new(host: IpAddr, port: u16, transport: TransportKind) -> Self {
        Self {
            host,
            port,
            transport,
            state: ProbeState::Init,
        }
    }

    fn enter(&mut self, next: ProbeState) {
        debug_assert!(self.state.can_advance_to(next), "{} -> {next}", self.state);
        trace!("{}:{} [{}] {} -> {next}", self.host, self.port, self.transport, self.state);
        self.state = next;
    }

    fn fail(&mut self, err: AttemptError) -> AttemptError {
        self.enter(ProbeState::Failed);
        err
    }
}

#[derive(Clone)]
pub struct BannerProber {
    cfg: Arc<BannerConfig>,
    connector: Result<TlsConnector, ReconError>,
}

impl BannerProber {
    pub fn new(cfg: BannerConfig) -> Self {
        let connector = tls::permissive_connector();
        if let Err(e) = &connector {
            warn!("TLS unavailable, secure ports will be probed in plain text: {e}");
        }
        Self {
            cfg: Arc::new(cfg),
            connector,
        }
    }

    pub fn config(&self) -> &BannerConfig {
        &self.cfg
    }

    /// Greets `host:port`, falling back to the other transport once on negotiation failure.
    pub async fn grab_banner(&self, host: IpAddr, port: u16) -> Banner {
        let first = self.cfg.first_transport(port);
        let (transport, result) = match self.attempt(host, port, first).await {
            Err(AttemptError::Negotiation(e)) => {
                let second = first.other();
                debug!("{host}:{port} {first} negotiation failed ({e}), retrying over {second}");
                (second, self.attempt(host, port, second).await)
            }
            other => (first, other),
        };

        let payload = result.unwrap_or_else(|e| BannerPayload::Error(e.into_inner()));
        Banner {
            host,
            port,
            transport,
            payload,
        }
    }

    /// Grabs every port of `open`, sorted by port.
    ///
    /// Only ports present in the set are ever contacted.
    pub async fn grab_all(&self, open: &OpenPortSet) -> Vec<Banner> {
        let pool = WorkerPool::new(self.cfg.concurrency);
        let banners = aggregate::banners();
        let host = open.host;
        let prober = self.clone();

        pool.run(open.ports().to_vec(), banners.sink(), move |port| {
            let prober = prober.clone();
            async move { prober.grab_banner(host, port).await }
        })
        .await;

        banners.finish().await.into_iter().collect()
    }

    async fn attempt(&self, host: IpAddr, port: u16, transport: TransportKind) -> Result<BannerPayload, AttemptError> {
        let mut attempt = Attempt::new(host, port, transport);
        attempt.enter(ProbeState::Connecting);

        let stream = match tcp::connect(host, port, self.cfg.timeout).await {
            Ok(stream) => stream,
            Err(e) => return Err(attempt.fail(AttemptError::Fatal(e))),
        };

        match transport {
            TransportKind::Plain => self.converse(&mut attempt, stream).await,
            TransportKind::Secure => {
                let connector = match &self.connector {
                    Ok(connector) => connector,
                    Err(e) => return Err(attempt.fail(AttemptError::Negotiation(e.clone()))),
                };
                match tls::handshake(connector, host, stream, self.cfg.timeout).await {
                    Ok(tls_stream) => self.converse(&mut attempt, tls_stream).await,
                    Err(e) => Err(attempt.fail(AttemptError::Negotiation(e))),
                }
            }
        }
    }

    async fn converse<S>(&self, attempt: &mut Attempt, mut stream: S) -> Result<BannerPayload, AttemptError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let probe = self.cfg.probe_for(attempt.port).payload(&attempt.host);
        if !probe.is_empty() {
            match timeout(self.cfg.timeout, stream.write_all(&probe)).await {
                Ok(Ok(())) => attempt.enter(ProbeState::ProbeSent),
                Ok(Err(e)) => {
                    let err = ReconError::transport(format!("probe write failed: {e}"));
                    return Err(attempt.fail(AttemptError::Negotiation(err)));
                }
                Err(_elapsed) => {
                    let err = ReconError::transport("probe write timed out");
                    return Err(attempt.fail(AttemptError::Negotiation(err)));
                }
            }
        }

        attempt.enter(ProbeState::AwaitingResponse);
        tokio::time::sleep(self.cfg.settle).await;

        let mut buffer = vec![0u8; self.cfg.max_bytes];
        let read = match timeout(self.cfg.timeout, stream.read(&mut buffer)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(attempt.fail(AttemptError::Fatal(ReconError::from(e)))),
            Err(_elapsed) => return Err(attempt.fail(AttemptError::Fatal(ReconError::ProbeTimeout))),
        };

        attempt.enter(ProbeState::Done);
        Ok(decode(&buffer[..read]))
    }
}

fn decode(bytes: &[u8]) -> BannerPayload {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        BannerPayload::NoGreeting
    } else {
        BannerPayload::Text(text.to_string())
    }
}

/// Greets `host:port` with the stock probes and a custom timeout.
pub async fn grab_banner(host: IpAddr, port: u16, timeout: Duration) -> Banner {
    let cfg = BannerConfig {
        timeout,
        ..Default::default()
    };
    BannerProber::new(cfg).grab_banner(host, port).await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
