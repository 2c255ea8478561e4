//! # Scan Session
//!
//! Drives the full pipeline: expand, discover, scan, grab banners. Every phase
//! completes for every host before the next phase starts. Past configuration
//! validation, the session always returns whatever it managed to collect.

use std::net::IpAddr;

use tracing::{debug, info, warn};

use sweepr_common::ReconError;
use sweepr_common::config::{DiscoveryConfig, PortScanConfig};
use sweepr_common::models::{LiveHostSet, OpenPortSet, ScanSession};
use sweepr_common::network::target::Target;

use crate::banner::{BannerConfig, BannerProber};
use crate::discovery::{DiscoveryEngine, SweepOptions};
use crate::scanner;

/// Settings of every phase. Each phase sizes its own worker pool.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    pub discovery: DiscoveryConfig,
    pub ports: PortScanConfig,
    pub banner: BannerConfig,
    /// Stop after the port scan.
    pub skip_banners: bool,
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ReconError> {
        self.discovery.validate()?;
        self.ports.validate()?;
        self.banner.validate()
    }
}

pub struct Session {
    cfg: ScanConfig,
    engine: DiscoveryEngine,
}

impl Session {
    pub fn new(cfg: ScanConfig) -> Self {
        let engine = DiscoveryEngine::new(cfg.discovery.connect_ports.clone());
        Self { cfg, engine }
    }

    /// Uses a caller-supplied engine, e.g. one with a simulated echo capability.
    pub fn with_engine(cfg: ScanConfig, engine: DiscoveryEngine) -> Self {
        Self { cfg, engine }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.cfg
    }

    pub async fn run(&self, target: &Target) -> Result<ScanSession, ReconError> {
        self.cfg.validate()?;
        let candidates = target.expand_within(self.cfg.discovery.max_hosts)?;

        let mut session = ScanSession::new(target.to_string(), self.cfg.ports.ports.clone());

        let live = self.discover(&candidates).await;
        if live.is_empty() {
            warn!("No live hosts among {} candidates", candidates.len());
            return Ok(session);
        }

        let open = self.scan(&live).await;
        for ports in &open {
            session.record_ports(ports.clone());
        }

        if self.cfg.skip_banners {
            return Ok(session);
        }

        let prober = BannerProber::new(self.cfg.banner.clone());
        for ports in open.iter().filter(|ports| !ports.is_empty()) {
            for banner in prober.grab_all(ports).await {
                if !session.record_banner(banner) {
                    warn!("Dropped a banner for a port outside the open set");
                }
            }
        }
        info!("Collected {} banners", session.banners().count());

        Ok(session)
    }

    async fn discover(&self, candidates: &[IpAddr]) -> LiveHostSet {
        info!("Discovering hosts among {} candidates", candidates.len());
        let opts = SweepOptions::from(&self.cfg.discovery);
        let report = self.engine.run(candidates, self.cfg.discovery.mode, &opts).await;
        for (method, outcome) in &report.outcomes {
            debug!("{method}: {outcome}");
        }
        info!("{} hosts up", report.live.len());
        report.live
    }

    async fn scan(&self, live: &LiveHostSet) -> Vec<OpenPortSet> {
        let ports = &self.cfg.ports;
        let mut open = Vec::with_capacity(live.len());
        for host in live {
            open.push(scanner::scan_ports(*host, &ports.ports, ports.timeout, ports.concurrency).await);
        }
        info!(
            "{} of {} hosts have open ports",
            open.iter().filter(|ports| !ports.is_empty()).count(),
            live.len()
        );
        open
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_config_fails_before_any_phase() {
        let mut cfg = ScanConfig::default();
        cfg.ports.ports.clear();
        let target: Target = "127.0.0.1".parse().unwrap();

        let err = Session::new(cfg).run(&target).await.unwrap_err();
        assert!(matches!(err, ReconError::Configuration(_)));
    }

    #[test]
    fn zero_banner_concurrency_is_rejected() {
        let mut cfg = ScanConfig::default();
        cfg.banner.concurrency = 0;
        assert!(cfg.validate().is_err());
    }

    #[tokio::test]
    async fn host_limit_comes_from_the_discovery_config() {
        let target: Target = "10.0.0.0/30".parse().unwrap();
        let mut cfg = ScanConfig::default();
        cfg.discovery.max_hosts = 1;
        let engine = || DiscoveryEngine::with_strategies(Vec::new());

        let err = Session::with_engine(cfg.clone(), engine()).run(&target).await.unwrap_err();
        assert!(matches!(err, ReconError::Configuration(_)));

        cfg.discovery.max_hosts = 2;
        assert!(Session::with_engine(cfg, engine()).run(&target).await.is_ok());
    }

    #[tokio::test]
    async fn no_strategies_means_an_empty_session() {
        let target: Target = "10.0.0.0/30".parse().unwrap();
        let session = Session::with_engine(ScanConfig::default(), DiscoveryEngine::with_strategies(Vec::new()))
            .run(&target)
            .await
            .unwrap();

        assert!(session.hosts.is_empty());
        assert_eq!(session.target, "10.0.0.0/30");
    }
}
