//! Result sink trait and implementations.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::dispatcher::CycleSummary;
use crate::models::FetchResult;

/// Trait for receiving fetch results.
///
/// Called from the dispatcher's single consumer task, one result at a time,
/// in completion order.
///
/// # Design Rules
///
/// - Calls must return promptly; a blocked sink stalls delivery for the cycle
/// - Failure to deliver must not affect fetching (best-effort)
pub trait ResultSink: Send + Sync {
    /// Deliver one result.
    fn on_result(&self, result: FetchResult);

    /// Deliver the aggregates of a finished cycle, after its last result.
    fn on_cycle_summary(&self, _summary: CycleSummary) {}
}

/// No-op implementation for contexts that don't need results.
#[derive(Clone, Default)]
pub struct NoOpResultSink;

impl ResultSink for NoOpResultSink {
    fn on_result(&self, _result: FetchResult) {}
}

/// Writes every result as one log line.
#[derive(Clone, Default)]
pub struct LogResultSink;

impl ResultSink for LogResultSink {
    fn on_result(&self, result: FetchResult) {
        info!(
            "{} {} | price {} | reference {} | {} [{}] | {}",
            result.code,
            result.name,
            result.price_status,
            result.reference_status,
            result.status,
            result.tag,
            result.data_source
        );
    }

    fn on_cycle_summary(&self, summary: CycleSummary) {
        info!("Cycle {}: {}", summary.cycle_id, summary);
    }
}

/// Mock sink for testing - collects deliveries.
#[derive(Clone, Default)]
pub struct MockResultSink {
    results: Arc<Mutex<Vec<FetchResult>>>,
    summaries: Arc<Mutex<Vec<CycleSummary>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Result sink mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

impl MockResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all delivered results, in delivery order.
    pub fn results(&self) -> Vec<FetchResult> {
        lock(&self.results).clone()
    }

    /// Returns all delivered cycle summaries.
    pub fn summaries(&self) -> Vec<CycleSummary> {
        lock(&self.summaries).clone()
    }

    /// Clears everything collected so far.
    pub fn clear(&self) {
        lock(&self.results).clear();
        lock(&self.summaries).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.results).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.results).is_empty()
    }
}

impl ResultSink for MockResultSink {
    fn on_result(&self, result: FetchResult) {
        lock(&self.results).push(result);
    }

    fn on_cycle_summary(&self, summary: CycleSummary) {
        lock(&self.summaries).push(summary);
    }
}
