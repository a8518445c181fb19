use anyhow::Result;
use rtmetrics::*;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the metric lines.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app_config = config::AppConfig::load()?;
    let registry = Arc::new(vhosts::VhostRegistry::from_filter(
        &app_config.vhosts.filter,
        app_config.vhosts.auto_limit,
    )?);

    let source = host::metric_source(&app_config.source);
    let cpu_count = host::logical_cpu_count();
    let collector = Arc::new(report::ReportCollector::discover(
        Path::new(&app_config.report.path),
        cpu_count,
    ));
    if collector.file_count() == 0 {
        tracing::warn!(
            path = %app_config.report.path,
            "no report files found; cycles will emit empty snapshots until the server writes one"
        );
    }

    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        source = %source,
        report_files = collector.file_count(),
        poll_interval_ms = app_config.polling.interval_ms,
        auto_vhosts = registry.auto_mode(),
        "starting collector"
    );

    let records_emitted_total = Arc::new(AtomicU64::new(0));
    let (record_tx, record_rx) = tokio::sync::mpsc::channel(worker::WRITER_CHANNEL_CAPACITY);
    let writer_handle = worker::spawn_record_writer(record_rx, records_emitted_total.clone());

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            collector,
            registry,
            record_tx,
            records_emitted_total,
            shutdown_rx,
        },
        worker::WorkerConfig {
            poll_interval_ms: app_config.polling.interval_ms,
            stats_log_interval_secs: app_config.polling.stats_log_interval_secs,
            emit: emit::EmitOptions {
                source,
                vhost_requests: app_config.vhosts.enable_requests,
                vhost_extapps: app_config.vhosts.enable_extapps,
            },
        },
    );

    wait_for_shutdown().await;
    tracing::info!("received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = worker_handle.await;
    let _ = writer_handle.await;

    Ok(())
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
