//! Error taxonomy shared by every phase of the pipeline.
//!
//! Only [`ReconError::Configuration`] ever aborts anything. Every other variant is
//! produced by a single probe and ends up stored as data (a missing host, a closed
//! port or an error-tagged banner).

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconError>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
pub enum ReconError {
    /// Malformed range, port list or tunable. Raised before any phase starts.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A single unit (discovery probe, connect, banner read) ran out of time.
    #[error("probe timed out")]
    ProbeTimeout,

    /// The target actively rejected the attempt.
    #[error("connection refused")]
    ProbeRefused,

    /// Plain or secure transport could not be established.
    #[error("transport error: {0}")]
    Transport(String),

    /// A discovery capability is missing or lacks privileges.
    #[error("capability unavailable: {0}")]
    UnsupportedCapability(String),
}

impl ReconError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn transport(msg: impl ToString) -> Self {
        Self::Transport(msg.to_string())
    }
}

impl From<io::Error> for ReconError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::ProbeRefused,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::ProbeTimeout,
            io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound | io::ErrorKind::Unsupported => {
                Self::UnsupportedCapability(err.to_string())
            }
            _ => Self::Transport(err.to_string()),
        }
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
