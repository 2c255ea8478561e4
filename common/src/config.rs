use std::time::Duration;

use crate::error::{ReconError, Result};
use crate::models::DiscoveryMode;
use crate::network::target::MAX_EXPANSION;

/// Ports scanned when no port list is given.
pub const DEFAULT_SCAN_PORTS: [u16; 10] = [22, 80, 443, 21, 25, 53, 110, 143, 993, 995];

/// Ports tried, in order, by the connect-based discovery sweep.
pub const DEFAULT_CONNECT_PORTS: [u16; 5] = [80, 443, 22, 21, 25];

/// Presentation switches, filled from the command line.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Hides the headers (1) and the per-host trees (2).
    pub quiet: u8,
    /// Raises the log level (1 = debug, 2+ = trace).
    pub verbose: u8,
    pub no_banner: bool,
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub mode: DiscoveryMode,
    /// Upper bound for a single probe (echo round trip, connect, ARP listen window).
    pub timeout: Duration,
    pub concurrency: usize,
    pub connect_ports: Vec<u16>,
    /// Largest number of candidate addresses a target may expand to.
    pub max_hosts: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            mode: DiscoveryMode::FirstNonEmpty,
            timeout: Duration::from_secs(1),
            concurrency: 50,
            connect_ports: DEFAULT_CONNECT_PORTS.to_vec(),
            max_hosts: MAX_EXPANSION,
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<()> {
        validate_phase("discovery", self.concurrency, self.timeout)?;
        if self.max_hosts == 0 {
            return Err(ReconError::config("discovery host limit must be at least 1"));
        }
        if self.connect_ports.contains(&0) {
            return Err(ReconError::config("discovery connect ports must not contain 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PortScanConfig {
    pub ports: Vec<u16>,
    pub timeout: Duration,
    pub concurrency: usize,
}

impl Default for PortScanConfig {
    fn default() -> Self {
        Self {
            ports: DEFAULT_SCAN_PORTS.to_vec(),
            timeout: Duration::from_secs(1),
            concurrency: 50,
        }
    }
}

impl PortScanConfig {
    pub fn validate(&self) -> Result<()> {
        validate_phase("port scan", self.concurrency, self.timeout)?;
        if self.ports.is_empty() {
            return Err(ReconError::config("port list is empty"));
        }
        if self.ports.contains(&0) {
            return Err(ReconError::config("port 0 cannot be scanned"));
        }
        Ok(())
    }
}

/// Checks the knobs every bounded pool shares.
pub fn validate_phase(phase: &str, concurrency: usize, timeout: Duration) -> Result<()> {
    if concurrency == 0 {
        return Err(ReconError::config(format!("{phase} concurrency must be at least 1")));
    }
    if timeout.is_zero() {
        return Err(ReconError::config(format!("{phase} timeout must be greater than zero")));
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
