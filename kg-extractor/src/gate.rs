//! The process-wide concurrency gate described in §4.3/§5: bounds the
//! number of simultaneous in-flight LLM extractions so unbounded fan-in
//! from overlapping ingest requests never overwhelms the inference
//! server. FIFO fairness comes from [`tokio::sync::Semaphore`] itself.

use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone, Copy, Default)]
struct GateCounters {
    active: usize,
    queued: usize,
    completed: u64,
    failed: u64,
}

/// Live metrics backing `GET /api/v1/extraction/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionStatus {
    pub active: usize,
    pub queued: usize,
    pub completed: u64,
    pub failed: u64,
    pub max_concurrent: usize,
    pub slots_available: usize,
    pub at_capacity: bool,
}

pub struct ExtractionGate {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    counters: Mutex<GateCounters>,
}

impl ExtractionGate {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            counters: Mutex::new(GateCounters::default()),
        }
    }

    /// Blocks (cooperatively, not by rejecting) until a slot is free, then
    /// returns a guard that releases the slot on drop regardless of
    /// whether the caller finishes, errors, or is cancelled mid-`.await`.
    pub async fn acquire(self: &Arc<Self>) -> GateGuard {
        {
            let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
            counters.queued += 1;
        }

        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore is never closed");

        {
            let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
            counters.queued -= 1;
            counters.active += 1;
        }

        GateGuard {
            gate: Arc::clone(self),
            permit: Some(permit),
            succeeded: false,
        }
    }

    pub fn status(&self) -> ExtractionStatus {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        ExtractionStatus {
            active: counters.active,
            queued: counters.queued,
            completed: counters.completed,
            failed: counters.failed,
            max_concurrent: self.max_concurrent,
            slots_available: self.max_concurrent.saturating_sub(counters.active),
            at_capacity: counters.active >= self.max_concurrent,
        }
    }
}

/// An acquired extraction slot. Call [`GateGuard::mark_succeeded`] once the
/// extraction call returns successfully; otherwise the slot is counted as
/// failed on drop. Every exit path (normal return, early `?`, panic,
/// cancellation) goes through `Drop`, so the slot is never leaked.
pub struct GateGuard {
    gate: Arc<ExtractionGate>,
    permit: Option<OwnedSemaphorePermit>,
    succeeded: bool,
}

impl GateGuard {
    pub fn mark_succeeded(&mut self) {
        self.succeeded = true;
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        let mut counters = self.gate.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.active = counters.active.saturating_sub(1);
        if self.succeeded {
            counters.completed += 1;
        } else {
            counters.failed += 1;
        }
        drop(self.permit.take());
    }
}
