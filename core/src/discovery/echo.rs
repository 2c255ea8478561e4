//! Echo-request sweep.
//!
//! The round trip itself is delegated to an [`EchoCapability`]. The stock one
//! shells out to the system `ping`, which already holds whatever privilege raw
//! ICMP needs on the platform.

use std::net::IpAddr;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use sweepr_common::ReconError;
use sweepr_common::models::DiscoveryMethod;

use super::{DiscoveryStrategy, StrategyOutcome, SweepOptions, sweep_hosts};

/// Slack given to the ping process on top of its own wait time.
const PROCESS_GRACE: Duration = Duration::from_secs(2);

#[async_trait]
pub trait EchoCapability: Send + Sync + 'static {
    /// `Ok(true)` if `addr` answered within `timeout`.
    ///
    /// [`ReconError::UnsupportedCapability`] means the facility itself is missing.
    async fn echo(&self, addr: IpAddr, timeout: Duration) -> Result<bool, ReconError>;
}

/// The operating system's `ping` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPing;

impl SystemPing {
    fn command(addr: IpAddr, wait: Duration) -> Command {
        let mut cmd = Command::new("ping");

        #[cfg(windows)]
        cmd.args(["-n", "1", "-w", &wait.as_millis().max(1).to_string()]);

        #[cfg(target_os = "macos")]
        cmd.args(["-c", "1", "-W", &wait.as_millis().max(1).to_string()]);

        #[cfg(all(unix, not(target_os = "macos")))]
        cmd.args(["-c", "1", "-W", &whole_seconds(wait).to_string()]);

        cmd.arg(addr.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

/// `-W` of Linux and BSD pings takes whole seconds. The wait is rounded up, so
/// a sub-second timeout still waits one full second for the reply.
#[cfg_attr(any(windows, target_os = "macos"), allow(dead_code))]
fn whole_seconds(wait: Duration) -> u64 {
    (wait.as_secs_f64().ceil() as u64).max(1)
}

#[async_trait]
impl EchoCapability for SystemPing {
    async fn echo(&self, addr: IpAddr, wait: Duration) -> Result<bool, ReconError> {
        let mut cmd = Self::command(addr, wait);
        match timeout(wait + PROCESS_GRACE, cmd.status()).await {
            Ok(Ok(status)) => Ok(status.success()),
            Ok(Err(e)) => Err(ReconError::from(e)),
            Err(_elapsed) => Err(ReconError::ProbeTimeout),
        }
    }
}

pub struct EchoSweep<E> {
    capability: Arc<E>,
}

impl<E: EchoCapability> EchoSweep<E> {
    pub fn new(capability: E) -> Self {
        Self {
            capability: Arc::new(capability),
        }
    }
}

#[async_trait]
impl<E: EchoCapability> DiscoveryStrategy for EchoSweep<E> {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::Echo
    }

    async fn sweep(&self, targets: &[IpAddr], opts: &SweepOptions) -> StrategyOutcome {
        let capability = self.capability.clone();
        let wait = opts.timeout;
        sweep_hosts(targets, opts, DiscoveryMethod::Echo, move |addr| {
            let capability = capability.clone();
            async move { capability.echo(addr, wait).await }
        })
        .await
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
