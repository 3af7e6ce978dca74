use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Service-wide ingest counters backing `GET /stats`. Plain mutex-guarded
/// state, mirroring the extraction gate's counter design (§5) — reads take
/// a consistent snapshot under the lock rather than racing individual
/// atomics.
#[derive(Default)]
pub struct PipelineStats {
    inner: Mutex<Inner>,
}

#[derive(Default, Clone)]
struct Inner {
    documents_processed: u64,
    entities_total: u64,
    relationships_total: u64,
    total_processing_ms: u64,
    failed_count: u64,
    last_processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineStatsSnapshot {
    pub documents_processed: u64,
    pub entities_total: u64,
    pub relationships_total: u64,
    pub mean_processing_ms: f64,
    pub failed_count: u64,
    pub last_processed_at: Option<DateTime<Utc>>,
}

impl PipelineStats {
    pub fn record_success(&self, entities: u64, relationships: u64, elapsed_ms: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.documents_processed += 1;
        inner.entities_total += entities;
        inner.relationships_total += relationships;
        inner.total_processing_ms += elapsed_ms;
        inner.last_processed_at = Some(Utc::now());
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.failed_count += 1;
    }

    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let mean_processing_ms = if inner.documents_processed > 0 {
            inner.total_processing_ms as f64 / inner.documents_processed as f64
        } else {
            0.0
        };
        PipelineStatsSnapshot {
            documents_processed: inner.documents_processed,
            entities_total: inner.entities_total,
            relationships_total: inner.relationships_total,
            mean_processing_ms,
            failed_count: inner.failed_count,
            last_processed_at: inner.last_processed_at,
        }
    }
}
