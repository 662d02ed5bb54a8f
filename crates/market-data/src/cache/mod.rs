//! TTL cache store.
//!
//! Holds the most recent live observation per `(instrument, kind)` plus the
//! last combined [`FetchResult`] snapshot per instrument. Entries are never
//! evicted: staleness is judged at read time against the kind's TTL, so an
//! expired entry stays available to callers that explicitly accept stale
//! data.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, warn};
use serde::Serialize;

use crate::models::{DataKind, FetchResult, Observation};

/// Freshness windows per cached payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheTtl {
    pub price: Duration,
    pub reference: Duration,
    pub snapshot: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            price: Duration::from_secs(300),
            reference: Duration::from_secs(3600),
            snapshot: Duration::from_secs(600),
        }
    }
}

impl CacheTtl {
    pub fn for_kind(&self, kind: DataKind) -> Duration {
        match kind {
            DataKind::Price => self.price,
            DataKind::Reference => self.reference,
        }
    }
}

/// A cached observation and where it originally came from.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub observation: Observation,
    /// Display name of the live source that produced the observation.
    pub source: String,
    pub captured_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct Snapshot {
    result: FetchResult,
    captured_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct InstrumentSlots {
    price: Option<CacheEntry>,
    reference: Option<CacheEntry>,
    snapshot: Option<Snapshot>,
}

impl InstrumentSlots {
    fn slot(&self, kind: DataKind) -> &Option<CacheEntry> {
        match kind {
            DataKind::Price => &self.price,
            DataKind::Reference => &self.reference,
        }
    }

    fn slot_mut(&mut self, kind: DataKind) -> &mut Option<CacheEntry> {
        match kind {
            DataKind::Price => &mut self.price,
            DataKind::Reference => &mut self.reference,
        }
    }
}

fn is_fresh(captured_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    // Entries stamped in the future count as age zero
    let age = (now - captured_at).to_std().unwrap_or(Duration::ZERO);
    age <= ttl
}

/// Next capture stamp: `at`, or just after the previous stamp if `at` does not advance it.
fn advance(previous: Option<DateTime<Utc>>, at: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if prev >= at => prev + ChronoDuration::nanoseconds(1),
        _ => at,
    }
}

/// Thread-safe cache shared by every in-flight orchestration run.
///
/// A single reader-writer lock guards the whole store. Entries are
/// independent, so no cross-entry atomicity is offered.
pub struct TtlCacheStore {
    slots: RwLock<HashMap<String, InstrumentSlots>>,
    ttl: CacheTtl,
}

impl TtlCacheStore {
    pub fn new() -> Self {
        Self::with_ttl(CacheTtl::default())
    }

    pub fn with_ttl(ttl: CacheTtl) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> &CacheTtl {
        &self.ttl
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, InstrumentSlots>> {
        self.slots.read().unwrap_or_else(|poisoned| {
            warn!("Cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, InstrumentSlots>> {
        self.slots.write().unwrap_or_else(|poisoned| {
            warn!("Cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Fresh entry for `(code, kind)`, if any.
    pub fn get(&self, code: &str, kind: DataKind) -> Option<CacheEntry> {
        self.get_at(code, kind, Utc::now())
    }

    /// Fresh entry for `(code, kind)` as judged at `now`.
    pub fn get_at(&self, code: &str, kind: DataKind, now: DateTime<Utc>) -> Option<CacheEntry> {
        let ttl = self.ttl.for_kind(kind);
        self.read()
            .get(code)
            .and_then(|slots| slots.slot(kind).as_ref())
            .filter(|entry| is_fresh(entry.captured_at, now, ttl))
            .cloned()
    }

    /// Entry for `(code, kind)` regardless of age.
    pub fn get_any(&self, code: &str, kind: DataKind) -> Option<CacheEntry> {
        self.read()
            .get(code)
            .and_then(|slots| slots.slot(kind).clone())
    }

    /// Overwrite the entry for `(code, kind)`; returns the new capture time.
    pub fn put(
        &self,
        code: &str,
        kind: DataKind,
        observation: Observation,
        source: impl Into<String>,
    ) -> DateTime<Utc> {
        self.put_at(code, kind, observation, source, Utc::now())
    }

    /// Overwrite the entry for `(code, kind)`, stamping it at `at`.
    ///
    /// The capture time always moves forward: if `at` is not after the
    /// previous stamp the entry is stamped one nanosecond after it.
    pub fn put_at(
        &self,
        code: &str,
        kind: DataKind,
        observation: Observation,
        source: impl Into<String>,
        at: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let mut table = self.write();
        let slot = table.entry(code.to_string()).or_default().slot_mut(kind);
        let captured_at = advance(slot.as_ref().map(|e| e.captured_at), at);
        *slot = Some(CacheEntry {
            observation,
            source: source.into(),
            captured_at,
        });
        debug!("Cached {} for {} at {}", kind, code, captured_at);
        captured_at
    }

    /// Fresh combined snapshot for `code`, if any.
    pub fn snapshot(&self, code: &str) -> Option<FetchResult> {
        self.snapshot_at(code, Utc::now())
    }

    pub fn snapshot_at(&self, code: &str, now: DateTime<Utc>) -> Option<FetchResult> {
        self.read()
            .get(code)
            .and_then(|slots| slots.snapshot.as_ref())
            .filter(|s| is_fresh(s.captured_at, now, self.ttl.snapshot))
            .map(|s| s.result.clone())
    }

    pub fn put_snapshot(&self, result: FetchResult) -> DateTime<Utc> {
        self.put_snapshot_at(result, Utc::now())
    }

    pub fn put_snapshot_at(&self, result: FetchResult, at: DateTime<Utc>) -> DateTime<Utc> {
        let mut table = self.write();
        let slots = table.entry(result.code.clone()).or_default();
        let captured_at = advance(slots.snapshot.as_ref().map(|s| s.captured_at), at);
        slots.snapshot = Some(Snapshot { result, captured_at });
        captured_at
    }

    /// Number of instruments with at least one cached payload.
    pub fn instrument_count(&self) -> usize {
        self.read().len()
    }
}

impl Default for TtlCacheStore {
    fn default() -> Self {
        Self::new()
    }
}
