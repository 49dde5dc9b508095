// Scheduler tests: per-tick source isolation, timeouts, flush/drain, and the timed loop

mod common;

use common::{HungSource, RecordingSink, ScriptedSource, container, process, system};
use hostmon::error::SampleError;
use hostmon::formatter::LineFormatter;
use hostmon::models::*;
use hostmon::scheduler::{FlushReport, Scheduler, SchedulerConfig, spawn};
use hostmon::sources::SampleSource;
use std::sync::Arc;
use std::time::Duration;

fn config() -> SchedulerConfig {
    SchedulerConfig {
        sample_interval: Duration::from_secs(5),
        flush_interval: Duration::from_secs(60),
        pause_between_sources: Duration::from_millis(100),
        source_timeout: Duration::from_secs(2),
    }
}

fn formatter() -> LineFormatter {
    let keys: Vec<String> = ["cpu_avg_perc", "disk_mb"].iter().map(|k| k.to_string()).collect();
    LineFormatter::new("gomon", "edge-1", &keys)
}

#[tokio::test(start_paused = true)]
async fn failing_source_does_not_block_others() {
    let sources: Vec<Arc<dyn SampleSource>> = vec![
        Arc::new(ScriptedSource::new(
            SourceKind::System,
            vec![Ok(system(10.0, 100.0, 5.0, 1.0))],
        )),
        Arc::new(ScriptedSource::new(
            SourceKind::Container,
            vec![Err(SampleError::unavailable(SourceKind::Container, "docker missing"))],
        )),
        Arc::new(ScriptedSource::new(
            SourceKind::Process,
            vec![Ok(process(77, 1.0, 2.0, 0.1))],
        )),
    ];
    let sink = Arc::new(RecordingSink::default());
    let mut scheduler = Scheduler::new(sources, formatter(), sink.clone(), config());

    scheduler.sample_tick().await;

    assert!(scheduler.store().get(SYSTEM_ID).is_some());
    assert!(scheduler.store().get("77").is_some());
    assert_eq!(scheduler.store().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn hung_source_is_bounded_by_timeout() {
    let sources: Vec<Arc<dyn SampleSource>> = vec![
        Arc::new(HungSource),
        Arc::new(ScriptedSource::new(
            SourceKind::Process,
            vec![Ok(process(1, 1.0, 1.0, 1.0))],
        )),
    ];
    let sink = Arc::new(RecordingSink::default());
    let mut scheduler = Scheduler::new(sources, formatter(), sink, config());

    let started = tokio::time::Instant::now();
    scheduler.sample_tick().await;

    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(scheduler.store().get("1").is_some());
}

#[tokio::test(start_paused = true)]
async fn flush_sends_each_record_and_resets() {
    let sources: Vec<Arc<dyn SampleSource>> = vec![
        Arc::new(ScriptedSource::new(
            SourceKind::System,
            vec![
                Ok(system(10.0, 100.0, 5.0, 1.0)),
                Ok(system(30.0, 200.0, 15.0, 2.0)),
            ],
        )),
        Arc::new(ScriptedSource::new(
            SourceKind::Container,
            vec![Ok(Snapshot::Containers(vec![container("c1", 4.0, 8.0, 1.0, 3.0)]))],
        )),
    ];
    let sink = Arc::new(RecordingSink::default());
    let mut scheduler = Scheduler::new(sources, formatter(), sink.clone(), config());

    scheduler.sample_tick().await;
    scheduler.sample_tick().await;
    let report = scheduler.flush().await;

    assert_eq!(
        report,
        FlushReport {
            records: 2,
            sent: 2,
            failed: 0
        }
    );
    assert_eq!(
        sink.lines(),
        vec![
            "gomon,cont=edge-1,group=docker,id=c1,name=c1-name cpu_avg_perc=4.00,disk_mb=3.00",
            "gomon,cont=edge-1,group=system,id=system,name=host cpu_avg_perc=20.00,disk_mb=2.00",
        ]
    );
    assert!(scheduler.store().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_send_drops_record_without_retry() {
    let sources: Vec<Arc<dyn SampleSource>> = vec![Arc::new(ScriptedSource::new(
        SourceKind::Container,
        vec![Ok(Snapshot::Containers(vec![
            container("keep", 1.0, 1.0, 1.0, 1.0),
            container("lose", 1.0, 1.0, 1.0, 1.0),
        ]))],
    ))];
    let sink = Arc::new(RecordingSink {
        reject: Some("id=lose".into()),
        ..Default::default()
    });
    let mut scheduler = Scheduler::new(sources, formatter(), sink.clone(), config());

    scheduler.sample_tick().await;
    let report = scheduler.flush().await;
    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 1);

    let second = scheduler.flush().await;
    assert_eq!(second.records, 0);
    assert_eq!(sink.lines().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn loop_samples_flushes_and_final_flush_on_shutdown() {
    let script: Vec<_> = (0..20)
        .map(|i| Ok(system(i as f64, 100.0, 10.0, i as f64)))
        .collect();
    let sources: Vec<Arc<dyn SampleSource>> =
        vec![Arc::new(ScriptedSource::new(SourceKind::System, script))];
    let sink = Arc::new(RecordingSink::default());
    let cfg = SchedulerConfig {
        sample_interval: Duration::from_secs(1),
        flush_interval: Duration::from_secs(5),
        pause_between_sources: Duration::ZERO,
        source_timeout: Duration::from_secs(1),
    };
    let scheduler = Scheduler::new(sources, formatter(), sink.clone(), cfg);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = spawn(scheduler, shutdown_rx);

    // one full flush window, then part of the next one
    tokio::time::sleep(Duration::from_millis(7500)).await;
    let _ = shutdown_tx.send(());
    handle.await.unwrap();

    let lines = sink.lines();
    assert_eq!(lines.len(), 2, "{:?}", lines);
    assert!(lines.iter().all(|l| l.contains("id=system")));
}
