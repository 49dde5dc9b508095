// Aggregation engine: folds snapshots into per-entity running stats and drains them at flush.
// The store is owned by a single task (the scheduler loop); ingest and drain both take
// `&mut self`, so a drain can never interleave with an ingest.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::SampleError;
use crate::models::{Reading, RunningStats, Snapshot, SourceKind};

/// Outcome of folding one snapshot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub ingested: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct StatsStore {
    records: BTreeMap<String, RunningStats>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RunningStats> {
        self.records.get(id)
    }

    /// Returns the record for `id`, seeding it from `reading` when this is the first sample
    /// of the window. The flag is `true` when the record was just created.
    pub fn get_or_create(
        &mut self,
        id: &str,
        name: &str,
        kind: SourceKind,
        reading: &Reading,
    ) -> (&mut RunningStats, bool) {
        let mut created = false;
        let record = self.records.entry(id.to_string()).or_insert_with(|| {
            created = true;
            RunningStats::seed(id, name, kind.group(), reading)
        });
        (record, created)
    }

    /// Folds a single reading into its record.
    pub fn ingest_reading(
        &mut self,
        kind: SourceKind,
        id: &str,
        name: &str,
        reading: &Reading,
    ) -> Result<(), SampleError> {
        if id.is_empty() {
            return Err(SampleError::malformed(name, "empty identity"));
        }
        if !reading.is_finite() {
            return Err(SampleError::malformed(id, "non-finite value"));
        }
        let (record, created) = self.get_or_create(id, name, kind, reading);
        if !created {
            record.fold(reading);
        }
        Ok(())
    }

    /// Folds every record of `snapshot`. Malformed records are logged and skipped
    /// individually; the rest still apply. Identities missing from the snapshot keep
    /// their current aggregate until the next drain.
    pub fn ingest(&mut self, snapshot: &Snapshot) -> IngestReport {
        let kind = snapshot.kind();
        let mut report = IngestReport::default();
        for (id, name, reading) in snapshot.readings() {
            match self.ingest_reading(kind, &id, &name, &reading) {
                Ok(()) => report.ingested += 1,
                Err(e) => {
                    warn!(error = %e, source = %kind, "skipping sample");
                    report.skipped += 1;
                }
            }
        }
        report
    }

    /// Takes every record accumulated since the previous drain, ordered by identity,
    /// and leaves the store empty.
    pub fn drain(&mut self) -> Vec<RunningStats> {
        std::mem::take(&mut self.records).into_values().collect()
    }
}
