//! # Scan Data Model
//!
//! Values flowing between the phases of the pipeline. Probe results
//! ([`HostProbeResult`], [`PortProbeResult`]) are ephemeral and only live until the
//! aggregator has merged them; the sets ([`LiveHostSet`], [`OpenPortSet`]) and the
//! [`ScanSession`] are what the phases hand to each other.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;
use std::ops::Deref;

use crate::error::ReconError;

/// Text recorded when a port accepted the connection but said nothing.
pub const NO_GREETING: &str = "port open, no greeting produced";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiscoveryMethod {
    /// ARP sweep on a directly attached segment.
    LinkLayer,
    /// One echo round trip per host.
    Echo,
    /// Stream connect to a handful of common ports.
    Connect,
}

impl DiscoveryMethod {
    /// Preference order used when several strategies are available.
    pub const ORDERED: [DiscoveryMethod; 3] = [Self::LinkLayer, Self::Echo, Self::Connect];
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LinkLayer => "arp",
            Self::Echo => "ping",
            Self::Connect => "tcp",
        };
        f.write_str(name)
    }
}

/// How the discovery engine picks between strategy results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryMode {
    /// Walk the strategies in order, stop at the first non-empty result.
    #[default]
    FirstNonEmpty,
    /// Run every strategy and union the results.
    Exhaustive,
    /// Run a single strategy.
    Only(DiscoveryMethod),
}

impl DiscoveryMode {
    pub fn selects(&self, method: DiscoveryMethod) -> bool {
        match self {
            Self::Only(only) => *only == method,
            _ => true,
        }
    }

    pub fn stops_on_first_hit(&self) -> bool {
        matches!(self, Self::FirstNonEmpty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostProbeResult {
    pub addr: IpAddr,
    pub live: bool,
    pub method: DiscoveryMethod,
}

impl HostProbeResult {
    pub fn up(addr: IpAddr, method: DiscoveryMethod) -> Self {
        Self { addr, live: true, method }
    }

    pub fn down(addr: IpAddr, method: DiscoveryMethod) -> Self {
        Self { addr, live: false, method }
    }
}

/// Deduplicated hosts, ascending by numeric address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveHostSet(Vec<IpAddr>);

impl LiveHostSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_vec(self) -> Vec<IpAddr> {
        self.0
    }

    /// Union of two sets, keeping the ordering invariant.
    pub fn union(&self, other: &LiveHostSet) -> LiveHostSet {
        self.0.iter().chain(other.0.iter()).copied().collect()
    }
}

impl FromIterator<IpAddr> for LiveHostSet {
    fn from_iter<I: IntoIterator<Item = IpAddr>>(iter: I) -> Self {
        let unique: BTreeSet<IpAddr> = iter.into_iter().collect();
        Self(unique.into_iter().collect())
    }
}

impl From<BTreeSet<IpAddr>> for LiveHostSet {
    fn from(set: BTreeSet<IpAddr>) -> Self {
        Self(set.into_iter().collect())
    }
}

impl Deref for LiveHostSet {
    type Target = [IpAddr];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a LiveHostSet {
    type Item = &'a IpAddr;
    type IntoIter = std::slice::Iter<'a, IpAddr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortProbeResult {
    pub host: IpAddr,
    pub port: u16,
    pub open: bool,
}

/// Open ports of a single host, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPortSet {
    pub host: IpAddr,
    ports: Vec<u16>,
}

impl OpenPortSet {
    pub fn new(host: IpAddr, ports: impl IntoIterator<Item = u16>) -> Self {
        let unique: BTreeSet<u16> = ports.into_iter().collect();
        Self {
            host,
            ports: unique.into_iter().collect(),
        }
    }

    pub fn empty(host: IpAddr) -> Self {
        Self { host, ports: Vec::new() }
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports.binary_search(&port).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransportKind {
    Plain,
    Secure,
}

impl TransportKind {
    pub fn other(self) -> Self {
        match self {
            Self::Plain => Self::Secure,
            Self::Secure => Self::Plain,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("tcp"),
            Self::Secure => f.write_str("tls"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BannerPayload {
    Text(String),
    NoGreeting,
    Error(ReconError),
}

impl fmt::Display for BannerPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::NoGreeting => f.write_str(NO_GREETING),
            Self::Error(err) => write!(f, "Error: {err}"),
        }
    }
}

/// Greeting collected from one open port. Ordered by host, then port.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Banner {
    pub host: IpAddr,
    pub port: u16,
    pub transport: TransportKind,
    pub payload: BannerPayload,
}

impl Banner {
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            BannerPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, BannerPayload::Error(_))
    }

    /// Best-effort `(product, version)` pair for a vulnerability lookup.
    ///
    /// Recognises `Product/1.2.3` (HTTP `Server:` headers) and `Product_1.2`
    /// (SSH identification strings) tokens. The first match wins.
    pub fn service_hint(&self) -> Option<(String, String)> {
        self.text()?.split_whitespace().find_map(split_product_version)
    }
}

/// Status-line prefixes that look like `Product/version` but name a protocol.
const PROTOCOL_TOKENS: [&str; 3] = ["HTTP", "RTSP", "SIP"];

fn split_product_version(token: &str) -> Option<(String, String)> {
    let (product, version) = token.split_once('/').or_else(|| token.split_once('_'))?;
    let product = product.rsplit(['-', ':']).next().unwrap_or(product);
    let version: String = version
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let version = version.trim_end_matches('.');

    let looks_like_product = !product.is_empty()
        && product.chars().all(|c| c.is_ascii_alphanumeric())
        && !PROTOCOL_TOKENS.iter().any(|p| product.eq_ignore_ascii_case(p));
    let looks_like_version = version.contains('.') && version.starts_with(|c: char| c.is_ascii_digit());

    (looks_like_product && looks_like_version).then(|| (product.to_string(), version.to_string()))
}

/// Per-host slice of a [`ScanSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub open_ports: OpenPortSet,
    pub banners: BTreeMap<u16, Banner>,
}

/// Everything a scan produced, keyed by host then port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSession {
    pub target: String,
    pub ports_scanned: Vec<u16>,
    pub hosts: BTreeMap<IpAddr, HostRecord>,
}

impl ScanSession {
    pub fn new(target: impl Into<String>, ports_scanned: Vec<u16>) -> Self {
        Self {
            target: target.into(),
            ports_scanned,
            hosts: BTreeMap::new(),
        }
    }

    pub fn live_hosts(&self) -> LiveHostSet {
        self.hosts.keys().copied().collect()
    }

    pub fn record_ports(&mut self, open_ports: OpenPortSet) {
        let host = open_ports.host;
        self.hosts
            .entry(host)
            .and_modify(|record| record.open_ports = open_ports.clone())
            .or_insert_with(|| HostRecord {
                open_ports,
                banners: BTreeMap::new(),
            });
    }

    /// Stores a banner. Refused when the port is not in the host's open set.
    pub fn record_banner(&mut self, banner: Banner) -> bool {
        match self.hosts.get_mut(&banner.host) {
            Some(record) if record.open_ports.contains(banner.port) => {
                record.banners.insert(banner.port, banner);
                true
            }
            _ => false,
        }
    }

    pub fn banners(&self) -> impl Iterator<Item = &Banner> {
        self.hosts.values().flat_map(|record| record.banners.values())
    }

    pub fn hosts_with_open_ports(&self) -> usize {
        self.hosts
            .values()
            .filter(|record| !record.open_ports.is_empty())
            .count()
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
