//! Periodic metrics flushing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::{Metrics, MetricsError, MetricsSink};

/// Background task pushing snapshots to a sink on a fixed period.
pub struct MetricsReporter;

impl MetricsReporter {
    /// Spawn the reporter. The first push happens one `period` after start.
    ///
    /// Push failures are logged and never stop the loop.
    #[must_use]
    pub fn start<S: MetricsSink>(metrics: Metrics, sink: S, period: Duration) -> ReporterHandle<S> {
        let sink = Arc::new(sink);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(metrics.clone(), Arc::clone(&sink), period, shutdown_rx));

        ReporterHandle {
            metrics,
            sink,
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Owner of a running [`MetricsReporter`].
pub struct ReporterHandle<S> {
    metrics: Metrics,
    sink: Arc<S>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<S: MetricsSink> ReporterHandle<S> {
    /// Push the current snapshot immediately.
    ///
    /// # Errors
    ///
    /// Returns the sink's error.
    pub async fn flush(&self) -> Result<(), MetricsError> {
        self.sink.push(&self.metrics.snapshot()).await
    }

    /// Stop the loop after a final push and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Metrics reporter task failed");
        }
    }
}

async fn run<S: MetricsSink>(
    metrics: Metrics,
    sink: Arc<S>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = time::interval_at(time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                // A dropped sender also means shutdown
                let stop = changed.is_err() || *shutdown.borrow();
                if stop {
                    push(&metrics, sink.as_ref()).await;
                    return;
                }
            }
            _ = interval.tick() => {
                push(&metrics, sink.as_ref()).await;
            }
        }
    }
}

async fn push<S: MetricsSink>(metrics: &Metrics, sink: &S) {
    if let Err(e) = sink.push(&metrics.snapshot()).await {
        tracing::warn!(error = %e, "Failed to push metrics");
    }
}
