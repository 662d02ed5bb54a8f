//! Per-attempt diagnostics recorded while walking a fallback chain.

use crate::models::SourceId;

/// Why a source was passed over without producing a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Circuit breaker is open for this source.
    CircuitBreakerOpen,

    /// The cache holds nothing for this instrument and kind.
    CacheMiss,

    /// The cache entry is older than the kind's TTL.
    CacheExpired,
}

/// Record of a single source attempt during a resolution.
#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub source: SourceId,
    pub skipped: Option<SkipReason>,
    pub error: Option<String>,
    pub success: bool,
}

/// Ordered attempts of one resolution.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_skip(&mut self, source: SourceId, reason: SkipReason) {
        self.attempts.push(ProviderAttempt {
            source,
            skipped: Some(reason),
            error: None,
            success: false,
        });
    }

    pub fn record_error(&mut self, source: SourceId, error: String) {
        self.attempts.push(ProviderAttempt {
            source,
            skipped: None,
            error: Some(error),
            success: false,
        });
    }

    pub fn record_success(&mut self, source: SourceId) {
        self.attempts.push(ProviderAttempt {
            source,
            skipped: None,
            error: None,
            success: true,
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| {
                if a.success {
                    format!("{}: SUCCESS", a.source)
                } else if let Some(skip) = &a.skipped {
                    format!("{}: SKIPPED ({:?})", a.source, skip)
                } else if let Some(err) = &a.error {
                    format!("{}: ERROR ({})", a.source, err)
                } else {
                    format!("{}: UNKNOWN", a.source)
                }
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn has_success(&self) -> bool {
        self.attempts.iter().any(|a| a.success)
    }

    /// All errors, in attempt order.
    pub fn errors(&self) -> Vec<(&SourceId, &str)> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_ref().map(|e| (&a.source, e.as_str())))
            .collect()
    }
}
