// Sampling/flush loop. One task owns the stats store; both timers drive the same
// select! loop, so ingest and drain never overlap.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

use crate::aggregator::StatsStore;
use crate::error::SampleError;
use crate::formatter::LineFormatter;
use crate::sender::MetricSink;
use crate::sources::SampleSource;

/// Timing for the loop; resolved once at startup.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub sample_interval: Duration,
    pub flush_interval: Duration,
    /// Pause between two sources of the same tick, so their commands don't overlap.
    pub pause_between_sources: Duration,
    /// Upper bound for a single source fetch.
    pub source_timeout: Duration,
}

/// Result of one flush.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub records: usize,
    pub sent: usize,
    pub failed: usize,
}

pub struct Scheduler {
    /// Fixed order: system, container, process.
    sources: Vec<Arc<dyn SampleSource>>,
    formatter: LineFormatter,
    sink: Arc<dyn MetricSink>,
    store: StatsStore,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        sources: Vec<Arc<dyn SampleSource>>,
        formatter: LineFormatter,
        sink: Arc<dyn MetricSink>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            sources,
            formatter,
            sink,
            store: StatsStore::new(),
            config,
        }
    }

    pub fn store(&self) -> &StatsStore {
        &self.store
    }

    /// Fetches every source in order and folds each successful snapshot.
    /// A failed or timed-out source is skipped for this tick only.
    pub async fn sample_tick(&mut self) {
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 && !self.config.pause_between_sources.is_zero() {
                tokio::time::sleep(self.config.pause_between_sources).await;
            }
            let kind = source.kind();
            let fetched = tokio::time::timeout(self.config.source_timeout, source.fetch()).await;
            let result = match fetched {
                Ok(r) => r,
                Err(_) => Err(SampleError::Timeout {
                    kind,
                    after: self.config.source_timeout,
                }),
            };
            match result {
                Ok(snapshot) => {
                    let report = self.store.ingest(&snapshot);
                    debug!(
                        source = %kind,
                        ingested = report.ingested,
                        skipped = report.skipped,
                        "snapshot folded"
                    );
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        source = %kind,
                        operation = "fetch",
                        "source skipped this tick"
                    );
                }
            }
        }
    }

    /// Drains the store and sends each record as one line. Failed sends are logged and dropped.
    pub async fn flush(&mut self) -> FlushReport {
        let records = self.store.drain();
        let mut report = FlushReport {
            records: records.len(),
            ..Default::default()
        };
        for record in &records {
            if let Ok(json) = serde_json::to_string(record) {
                debug!(record = %json, "flushing record");
            }
            let line = self.formatter.format(record);
            match self.sink.send(&line).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(error = %e, id = %record.id, operation = "send", "record dropped");
                }
            }
        }
        info!(
            records = report.records,
            sent = report.sent,
            failed = report.failed,
            "stats flushed"
        );
        report
    }

    /// Runs until `shutdown` fires, then flushes the current window once more.
    #[instrument(name = "scheduler", skip_all)]
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        info!(
            sample_interval_ms = self.config.sample_interval.as_millis() as u64,
            flush_interval_ms = self.config.flush_interval.as_millis() as u64,
            sources = self.sources.len(),
            "Scheduler started"
        );
        let mut sample_tick = interval(self.config.sample_interval);
        sample_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut flush_tick = interval(self.config.flush_interval);
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval fires immediately; the first flush belongs one period later
        flush_tick.tick().await;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Scheduler shutting down");
                    break;
                }
                _ = flush_tick.tick() => {
                    self.flush().await;
                }
                _ = sample_tick.tick() => {
                    self.sample_tick().await;
                }
            }
        }
        if !self.store.is_empty() {
            self.flush().await;
        }
    }
}

/// Spawns the loop on the runtime.
pub fn spawn(
    scheduler: Scheduler,
    shutdown: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(scheduler.run(shutdown))
}
