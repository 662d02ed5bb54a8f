//! Source registry module.
//!
//! This module provides the static side of source selection:
//! - Source descriptors and priority-ordered fallback chains
//! - Circuit breaking for sources that keep failing
//! - Per-attempt diagnostics
//! - A status report of the configured chains

mod circuit_breaker;
mod skip_reason;
mod source_registry;
mod status;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use skip_reason::{FetchDiagnostics, ProviderAttempt, SkipReason};
pub use source_registry::{
    ChainEntry, SourceDescriptor, SourceRegistry, CACHE_SOURCE_ID, CACHE_SOURCE_NAME,
};
pub use status::SourceStatusReport;
