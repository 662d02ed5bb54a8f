use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{FetchResult, Tag};

/// Aggregates reported once per dispatch cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Instruments submitted.
    pub total: usize,
    /// Results delivered to the sink.
    pub completed: usize,
    pub price_success: usize,
    pub reference_success: usize,
    /// Results tagged `high`.
    pub high_count: usize,
    /// Codes whose run exceeded the per-instrument ceiling.
    pub timed_out: Vec<String>,
    /// Codes whose run died before producing a result.
    pub failed: Vec<String>,
    /// Runs still outstanding when the cycle deadline passed.
    pub abandoned: usize,
    /// Alert threshold in percent used for `high_count`.
    pub threshold: Decimal,
    pub elapsed_ms: u64,
}

impl CycleSummary {
    pub fn new(total: usize, threshold: Decimal) -> Self {
        Self {
            cycle_id: Uuid::now_v7(),
            started_at: Utc::now(),
            total,
            completed: 0,
            price_success: 0,
            reference_success: 0,
            high_count: 0,
            timed_out: Vec::new(),
            failed: Vec::new(),
            abandoned: 0,
            threshold,
            elapsed_ms: 0,
        }
    }

    pub fn empty(threshold: Decimal) -> Self {
        Self::new(0, threshold)
    }

    pub(crate) fn record(&mut self, result: &FetchResult) {
        self.completed += 1;
        if result.has_price() {
            self.price_success += 1;
        }
        if result.has_reference() {
            self.reference_success += 1;
        }
        if result.tag == Tag::High {
            self.high_count += 1;
        }
    }

    /// Runs that ended one way or another before the deadline.
    pub fn settled(&self) -> usize {
        self.completed + self.timed_out.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "completed {}/{} | price {}/{} | reference {}/{} | high (>{}%): {}",
            self.completed,
            self.total,
            self.price_success,
            self.total,
            self.reference_success,
            self.total,
            self.threshold.normalize(),
            self.high_count
        )?;
        if !self.timed_out.is_empty() {
            write!(f, " | timed out: {}", self.timed_out.join(", "))?;
        }
        if !self.failed.is_empty() {
            write!(f, " | failed: {}", self.failed.join(", "))?;
        }
        if self.abandoned > 0 {
            write!(f, " | abandoned: {}", self.abandoned)?;
        }
        Ok(())
    }
}
