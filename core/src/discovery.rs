//! # Host Discovery
//!
//! Runs an ordered list of [`DiscoveryStrategy`] implementations over the
//! expanded target list. Every strategy reports an explicit [`StrategyOutcome`];
//! the [`DiscoveryMode`] decides which outcomes make it into the final
//! [`LiveHostSet`].
//!
//! Strategies, in preference order:
//! - [`link::LinkLayerSweep`]: ARP on a directly attached segment, root only.
//! - [`echo::EchoSweep`]: one echo round trip per host through an [`echo::EchoCapability`].
//! - [`connect::ConnectSweep`]: stream connects to a few common ports.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use sweepr_common::ReconError;
use sweepr_common::config::{DEFAULT_CONNECT_PORTS, DiscoveryConfig};
use sweepr_common::models::{DiscoveryMethod, DiscoveryMode, HostProbeResult, LiveHostSet};
use sweepr_common::network::target::Target;

use crate::aggregate::{self, HostTally};
use crate::pool::WorkerPool;

pub mod connect;
pub mod echo;
pub mod link;

use connect::ConnectSweep;
use echo::{EchoSweep, SystemPing};
use link::LinkLayerSweep;

/// Knobs shared by every strategy of one discovery run.
#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    pub timeout: Duration,
    pub concurrency: usize,
}

impl From<&DiscoveryConfig> for SweepOptions {
    fn from(cfg: &DiscoveryConfig) -> Self {
        Self {
            timeout: cfg.timeout,
            concurrency: cfg.concurrency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Found(BTreeSet<IpAddr>),
    /// The strategy ran and nobody answered.
    Empty,
    /// The strategy could not run here (privileges, missing capability, ...).
    Unavailable(String),
}

impl StrategyOutcome {
    fn from_live(live: BTreeSet<IpAddr>) -> Self {
        if live.is_empty() { Self::Empty } else { Self::Found(live) }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl fmt::Display for StrategyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(live) => write!(f, "found {}", live.len()),
            Self::Empty => f.write_str("empty"),
            Self::Unavailable(reason) => write!(f, "unavailable ({reason})"),
        }
    }
}

#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    fn method(&self) -> DiscoveryMethod;

    /// Sweeps `targets` once. Failures are folded into the outcome, never returned.
    async fn sweep(&self, targets: &[IpAddr], opts: &SweepOptions) -> StrategyOutcome;
}

/// What a discovery run found, with the outcome of every strategy that ran.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub live: LiveHostSet,
    /// The first strategy, in preference order, that found each live host.
    pub found_by: BTreeMap<IpAddr, DiscoveryMethod>,
    pub outcomes: Vec<(DiscoveryMethod, StrategyOutcome)>,
}

pub struct DiscoveryEngine {
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl Default for DiscoveryEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_PORTS.to_vec())
    }
}

impl DiscoveryEngine {
    /// Engine with the stock strategies: ARP, system ping, then connect on `connect_ports`.
    pub fn new(connect_ports: Vec<u16>) -> Self {
        Self::with_strategies(vec![
            Box::new(LinkLayerSweep),
            Box::new(EchoSweep::new(SystemPing)),
            Box::new(ConnectSweep::new(connect_ports)),
        ])
    }

    /// Strategies are kept in preference order whatever order they are given in.
    pub fn with_strategies(mut strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        strategies.sort_by_key(|s| preference(s.method()));
        Self { strategies }
    }

    pub async fn run(&self, targets: &[IpAddr], mode: DiscoveryMode, opts: &SweepOptions) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        if targets.is_empty() {
            return report;
        }

        for strategy in self.strategies.iter().filter(|s| mode.selects(s.method())) {
            let method = strategy.method();
            let outcome = strategy.sweep(targets, opts).await;
            debug!("{method} sweep over {} targets: {outcome}", targets.len());

            let hit = outcome.is_found();
            if let StrategyOutcome::Found(found) = &outcome {
                for addr in found {
                    report.found_by.entry(*addr).or_insert(method);
                }
                report.live = report.live.union(&found.iter().copied().collect());
            }
            report.outcomes.push((method, outcome));

            if hit && mode.stops_on_first_hit() {
                break;
            }
        }

        if report.outcomes.is_empty() {
            warn!("no discovery strategy matches mode {mode:?}");
        }

        report
    }
}

fn preference(method: DiscoveryMethod) -> usize {
    DiscoveryMethod::ORDERED
        .iter()
        .position(|m| *m == method)
        .unwrap_or(DiscoveryMethod::ORDERED.len())
}

/// Expands `target` and runs the stock strategies over it.
///
/// Only a malformed target is an error; everything else ends up as a smaller set.
pub async fn discover(
    target: &Target,
    mode: DiscoveryMode,
    timeout: Duration,
    concurrency: usize,
) -> Result<LiveHostSet, ReconError> {
    let cfg = DiscoveryConfig {
        mode,
        timeout,
        concurrency,
        ..Default::default()
    };
    cfg.validate()?;

    let targets = target.expand_within(cfg.max_hosts)?;
    info!("Sweeping {} candidate hosts", targets.len());
    let report = DiscoveryEngine::new(cfg.connect_ports.clone())
        .run(&targets, mode, &SweepOptions::from(&cfg))
        .await;
    Ok(report.live)
}

impl From<HostTally> for StrategyOutcome {
    fn from(tally: HostTally) -> Self {
        if let Some(reason) = tally.unavailable() {
            return Self::Unavailable(reason.to_string());
        }
        Self::from_live(tally.live)
    }
}

/// Probes every target through one bounded pool and folds the verdicts.
///
/// Each verdict travels to the aggregator as a [`HostProbeResult`] tagged with
/// `method`. If every single probe reported an unsupported capability, the
/// strategy is considered unavailable rather than empty.
pub(crate) async fn sweep_hosts<F, Fut>(
    targets: &[IpAddr],
    opts: &SweepOptions,
    method: DiscoveryMethod,
    probe: F,
) -> StrategyOutcome
where
    F: Fn(IpAddr) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, ReconError>> + Send + 'static,
{
    let pool = WorkerPool::new(opts.concurrency);
    let tally = aggregate::live_hosts();

    pool.run(targets.to_vec(), tally.sink(), move |addr| {
        let verdict = probe(addr);
        async move {
            match verdict.await {
                Ok(true) => Ok(HostProbeResult::up(addr, method)),
                Ok(false) => Ok(HostProbeResult::down(addr, method)),
                Err(e) => Err((addr, e)),
            }
        }
    })
    .await;

    StrategyOutcome::from(tally.finish().await)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
