pub mod banner;
pub mod discover;
pub mod scan;

use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use sweepr_common::ReconError;
use sweepr_common::config::{DEFAULT_CONNECT_PORTS, DEFAULT_SCAN_PORTS, DiscoveryConfig, PortScanConfig};
use sweepr_common::models::{DiscoveryMethod, DiscoveryMode};
use sweepr_common::network::ports::parse_port_spec;
use sweepr_common::network::target::{MAX_EXPANSION, Target};
use sweepr_core::ScanConfig;
use sweepr_core::banner::{self as banner_cfg, BannerConfig};

#[derive(Parser)]
#[command(name = "sweepr")]
#[command(version, about = "A concurrent network recon pipeline.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Less output (-q hides headers, -qq also hides the per-host trees)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Skip the start-up banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find live hosts in a range
    #[command(alias = "d")]
    Discover {
        target: Target,
        #[command(flatten)]
        sweep: SweepArgs,
    },
    /// Discover, port scan and grab banners
    #[command(alias = "s")]
    Scan {
        target: Target,
        #[command(flatten)]
        sweep: SweepArgs,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Grab the banner of a single port
    #[command(alias = "b")]
    Banner {
        host: IpAddr,
        port: u16,
        /// Connect, handshake and read timeout in milliseconds
        #[arg(short, long, default_value_t = 5000)]
        timeout: u64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Discovery strategy: first, all, arp, ping or tcp
    #[arg(short, long, default_value = "first", value_parser = parse_mode)]
    pub mode: DiscoveryMode,

    /// Per-probe timeout in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    pub timeout: u64,

    /// Probes in flight at once
    #[arg(short, long, default_value_t = 50)]
    pub concurrency: usize,

    /// Refuse targets that expand to more addresses than this
    #[arg(long, default_value_t = MAX_EXPANSION)]
    pub max_hosts: u64,
}

impl SweepArgs {
    pub fn to_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            mode: self.mode,
            timeout: Duration::from_millis(self.timeout),
            concurrency: self.concurrency,
            connect_ports: DEFAULT_CONNECT_PORTS.to_vec(),
            max_hosts: self.max_hosts,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Ports to scan, e.g. "22,80,8000-8010"
    #[arg(short, long)]
    pub ports: Option<PortList>,

    /// Connect timeout of the port scan in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub port_timeout: u64,

    /// Banner timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub banner_timeout: u64,

    /// Pause between probe and read in milliseconds
    #[arg(long, default_value_t = 500)]
    pub settle: u64,

    /// Stop after the port scan
    #[arg(long)]
    pub no_banners: bool,
}

impl ScanArgs {
    pub fn to_config(&self, sweep: &SweepArgs) -> ScanConfig {
        let ports = match &self.ports {
            Some(PortList(ports)) => ports.clone(),
            None => DEFAULT_SCAN_PORTS.to_vec(),
        };
        ScanConfig {
            discovery: sweep.to_config(),
            ports: PortScanConfig {
                ports,
                timeout: Duration::from_millis(self.port_timeout),
                concurrency: sweep.concurrency,
            },
            banner: BannerConfig {
                timeout: Duration::from_millis(self.banner_timeout),
                settle: Duration::from_millis(self.settle),
                concurrency: banner_cfg::DEFAULT_CONCURRENCY,
                ..Default::default()
            },
            skip_banners: self.no_banners,
        }
    }
}

/// Sorted, deduplicated port list parsed from a port spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortList(pub Vec<u16>);

impl FromStr for PortList {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_port_spec(s).map(PortList)
    }
}

fn parse_mode(s: &str) -> Result<DiscoveryMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "first" => Ok(DiscoveryMode::FirstNonEmpty),
        "all" => Ok(DiscoveryMode::Exhaustive),
        "arp" => Ok(DiscoveryMode::Only(DiscoveryMethod::LinkLayer)),
        "ping" => Ok(DiscoveryMode::Only(DiscoveryMethod::Echo)),
        "tcp" => Ok(DiscoveryMode::Only(DiscoveryMethod::Connect)),
        other => Err(format!("unknown discovery mode '{other}' (first, all, arp, ping, tcp)")),
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
