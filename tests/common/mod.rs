// Shared test helpers: sample builders, scripted sources and a recording sink

#![allow(dead_code)]

use async_trait::async_trait;
use hostmon::error::{SampleError, TransmissionError};
use hostmon::models::*;
use hostmon::sender::MetricSink;
use hostmon::sources::SampleSource;
use std::collections::VecDeque;
use std::sync::Mutex;

pub fn system(cpu: f64, mem_mb: f64, mem_pct: f64, disk_mb: f64) -> Snapshot {
    Snapshot::System(SystemSample {
        name: "host".into(),
        cpu_percent: cpu,
        mem_mb,
        mem_percent: mem_pct,
        disk_mb,
    })
}

pub fn container(id: &str, cpu: f64, mem_mb: f64, mem_pct: f64, disk_mb: f64) -> ContainerSample {
    ContainerSample {
        id: id.into(),
        name: format!("{}-name", id),
        cpu_percent: cpu,
        mem_mb,
        mem_percent: mem_pct,
        net_in_mb: 0.0,
        net_out_mb: 0.0,
        block_in_mb: 0.0,
        block_out_mb: 0.0,
        pids: 1,
        disk_mb,
    }
}

pub fn process(pid: u32, cpu: f64, mem_mb: f64, mem_pct: f64) -> Snapshot {
    Snapshot::Process(ProcessSample {
        pid,
        name: "hostmon".into(),
        cpu_percent: cpu,
        mem_mb,
        mem_percent: mem_pct,
    })
}

/// Replays one scripted result per fetch; once exhausted it keeps failing.
pub struct ScriptedSource {
    kind: SourceKind,
    script: Mutex<VecDeque<Result<Snapshot, SampleError>>>,
}

impl ScriptedSource {
    pub fn new(kind: SourceKind, script: Vec<Result<Snapshot, SampleError>>) -> Self {
        Self {
            kind,
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl SampleSource for ScriptedSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self) -> Result<Snapshot, SampleError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SampleError::unavailable(self.kind, "script exhausted")))
    }
}

/// Never answers.
pub struct HungSource;

#[async_trait]
impl SampleSource for HungSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Container
    }

    async fn fetch(&self) -> Result<Snapshot, SampleError> {
        std::future::pending().await
    }
}

/// Records every line; rejects lines containing `reject` when set.
#[derive(Default)]
pub struct RecordingSink {
    pub lines: Mutex<Vec<String>>,
    pub reject: Option<String>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricSink for RecordingSink {
    async fn send(&self, line: &str) -> Result<(), TransmissionError> {
        if let Some(r) = &self.reject
            && line.contains(r.as_str())
        {
            return Err(TransmissionError::Status {
                status: 500,
                body: "rejected".into(),
            });
        }
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}
