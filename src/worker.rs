// Background poll worker. Collection runs in the worker; printing runs in a
// dedicated record writer task (channel). Cycles never overlap: the tick
// interval skips while a cycle is still running, and a failed cycle is
// logged and skipped so the next tick retries.

use crate::emit::{self, EmitOptions};
use crate::models::MetricRecord;
use crate::report::ReportCollector;
use crate::vhosts::VhostRegistry;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::sync::mpsc;
use tokio::time::{Duration, interval};
use tracing::instrument;

/// Channel capacity for the record writer (a few cycles of slack).
pub const WRITER_CHANNEL_CAPACITY: usize = 8;

/// Collaborators, channels, and shutdown for the worker.
pub struct WorkerDeps {
    pub collector: Arc<ReportCollector>,
    pub registry: Arc<VhostRegistry>,
    pub record_tx: mpsc::Sender<Vec<MetricRecord>>,
    pub records_emitted_total: Arc<AtomicU64>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Worker timing and emission config.
pub struct WorkerConfig {
    pub poll_interval_ms: u64,
    /// How often to log worker stats (real seconds).
    pub stats_log_interval_secs: u64,
    pub emit: EmitOptions,
}

/// Spawns the task that prints record batches to stdout, one line per record.
/// When the worker drops its sender, this task drains and exits.
pub fn spawn_record_writer(
    mut record_rx: mpsc::Receiver<Vec<MetricRecord>>,
    records_emitted_total: Arc<AtomicU64>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(batch) = record_rx.recv().await {
            for record in &batch {
                println!("{record}");
            }
            records_emitted_total
                .fetch_add(batch.len() as u64, std::sync::atomic::Ordering::Relaxed);
        }
        tracing::debug!("record writer shutting down");
    })
}

/// Spawns the poll worker. Returns a join handle.
pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(deps, config).await;
    })
}

#[instrument(skip(deps, config), fields(poll_interval_ms = config.poll_interval_ms))]
async fn run(deps: WorkerDeps, config: WorkerConfig) {
    let WorkerDeps {
        collector,
        registry,
        record_tx,
        records_emitted_total,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        poll_interval_ms,
        stats_log_interval_secs,
        emit: options,
    } = config;

    let mut tick = interval(Duration::from_millis(poll_interval_ms));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
    stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut cycles_total: u64 = 0;
    let mut cycles_failed: u64 = 0;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                cycles_total += 1;
                let snapshot = match collector.collect(&registry).await {
                    Ok(s) => s,
                    Err(e) => {
                        cycles_failed += 1;
                        tracing::warn!(
                            error = %e,
                            operation = "collect",
                            "poll cycle failed; skipping"
                        );
                        continue;
                    }
                };
                let records = emit::render_metrics(&snapshot, &registry, &options);
                if record_tx.send(records).await.is_err() {
                    tracing::debug!("record writer channel closed");
                    break;
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("worker shutting down");
                break;
            }
            _ = stats_log_tick.tick() => {
                tracing::info!(
                    cycles_total,
                    cycles_failed,
                    records_emitted_total =
                        records_emitted_total.load(std::sync::atomic::Ordering::Relaxed),
                    "worker stats"
                );
            }
        }
    }
}
