use anyhow::Result;
use hostmon::config::AppConfig;
use hostmon::formatter::LineFormatter;
use hostmon::scheduler::{self, Scheduler, SchedulerConfig};
use hostmon::sender::{InfluxEndpoint, InfluxSender, MetricSink};
use hostmon::sources::{DockerSource, ProcessSource, SampleSource, SystemSource};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

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
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = AppConfig::load()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        container = %app_config.container_name,
        "Running host monitor"
    );

    let source_timeout = Duration::from_secs(app_config.sampling.source_timeout_secs);
    let mut sources: Vec<Arc<dyn SampleSource>> = vec![
        Arc::new(SystemSource::new(
            &app_config.container_name,
            &app_config.sampling.disk_mount,
        )),
        Arc::new(DockerSource::connect(
            &app_config.sampling.docker_bin,
            source_timeout,
        )),
    ];
    if app_config.sampling.send_self_stats {
        sources.push(Arc::new(ProcessSource::new(
            app_config.sampling.process.clone(),
        )));
    }

    let sink: Arc<dyn MetricSink> = Arc::new(InfluxSender::new(
        InfluxEndpoint {
            url: app_config.backend.url.clone(),
            username: app_config.backend.username.clone(),
            api_key: app_config.backend.api_key.clone(),
        },
        Duration::from_secs(app_config.backend.send_timeout_secs),
    )?);
    let formatter = LineFormatter::new(
        &app_config.output.measurement_prefix,
        &app_config.container_name,
        &app_config.output.metric_keys,
    );
    if formatter.fields().is_empty() {
        tracing::warn!(
            metric_keys = ?app_config.output.metric_keys,
            "METRIC_KEYS names no known field; lines will carry no values"
        );
    }

    let scheduler = Scheduler::new(
        sources,
        formatter,
        sink,
        SchedulerConfig {
            sample_interval: app_config.sample_interval(),
            flush_interval: app_config.flush_interval(),
            pause_between_sources: Duration::from_millis(
                app_config.sampling.sleep_between_fetches_ms,
            ),
            source_timeout,
        },
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = scheduler::spawn(scheduler, shutdown_rx);

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = handle.await;
    Ok(())
}
