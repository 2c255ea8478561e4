//! Bounded worker pool.
//!
//! One pool is created per phase invocation. A slot is acquired *before* a probe
//! task is spawned, so the number of in-flight probes never exceeds the cap, and a
//! slow target only holds the slot it occupies.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{JoinError, JoinSet};
use tracing::error;

pub struct WorkerPool {
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    /// A cap of zero is treated as one.
    pub fn new(cap: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(cap.max(1))),
        }
    }

    /// Runs `probe` once per item and pushes every result into `sink`.
    ///
    /// Returns once all probes have finished. A probe that panics loses its
    /// result and is logged, the remaining probes keep running.
    pub async fn run<I, T, F, Fut>(&self, items: I, sink: UnboundedSender<T>, probe: F)
    where
        I: IntoIterator,
        I::Item: Send + 'static,
        T: Send + 'static,
        F: Fn(I::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let probe = Arc::new(probe);
        let mut tasks: JoinSet<()> = JoinSet::new();

        for item in items {
            let Ok(permit) = self.permits.clone().acquire_owned().await else {
                break;
            };
            let probe = probe.clone();
            let sink = sink.clone();

            tasks.spawn(async move {
                let result = probe(item).await;
                let _ = sink.send(result);
                drop(permit);
            });

            while let Some(joined) = tasks.try_join_next() {
                log_join_error(joined);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            log_join_error(joined);
        }
    }
}

fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        error!("probe task failed: {e}");
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
