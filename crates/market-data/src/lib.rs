//! Fundwatch Market Data Crate
//!
//! This crate aggregates live prices and reference values for tracked
//! instruments from several unreliable providers, derives the relative
//! difference between the two and classifies it.
//!
//! # Overview
//!
//! The engine supports:
//! - Priority-ordered fallback chains per data kind, with the cache last
//! - Per-kind TTL caching and an optional stale tier
//! - Circuit breaking for sources that keep failing
//! - A bounded worker pool with single-consumer result delivery
//! - A cancellable interval-driven monitor loop
//!
//! # Architecture
//!
//! ```text
//!                          +------------------+
//!                          |     Monitor      |  (interval loop, stop flag)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+     +------------------+
//!                          |    Dispatcher    | --> |    ResultSink    |  (single consumer)
//!                          +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   Orchestrator   |  (price + reference, metric, tag)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+     +------------------+
//!                          | FallbackResolver | --> |  TtlCacheStore   |  (last resort)
//!                          +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |     Provider     |  (Tencent, Sina, East Money)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Instrument`] - Tracked instrument code and display name
//! - [`Observation`] - One value reported by one source
//! - [`FetchResult`] - Combined per-instrument record delivered to sinks
//! - [`Tag`] - Classification bucket of the derived metric
//! - [`CycleSummary`] - Aggregates of one dispatch cycle
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fundwatch_market_data::{
//!     default_providers, DispatchConfig, FallbackResolver, FetchDispatcher, FetchOrchestrator,
//!     InstrumentRegistry, LogResultSink, Monitor, OrchestratorConfig, SourceRegistry,
//!     TtlCacheStore,
//! };
//!
//! # async fn run() {
//! let cache = Arc::new(TtlCacheStore::new());
//! let sources = Arc::new(SourceRegistry::new(default_providers()));
//! let resolver = Arc::new(FallbackResolver::new(sources, cache));
//! let orchestrator = Arc::new(FetchOrchestrator::new(resolver, OrchestratorConfig::default()));
//! let dispatcher = Arc::new(FetchDispatcher::new(orchestrator, DispatchConfig::default()));
//!
//! let instruments = Arc::new(InstrumentRegistry::with_default_seed());
//! let monitor = Monitor::new(dispatcher, instruments, Arc::new(LogResultSink));
//! monitor.start();
//! # }
//! ```

pub mod cache;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod instruments;
pub mod models;
pub mod monitor;
pub mod orchestrator;
pub mod provider;
pub mod registry;
pub mod resolver;

#[cfg(test)]
mod testing;

// Re-export all public types from models
pub use models::{
    classify, DataKind, FetchResult, Instrument, Market, MissingData, Observation, SourceId,
    SourceName, Tag, DEFAULT_ALERT_THRESHOLD_PCT,
};

pub use cache::{CacheEntry, CacheTtl, TtlCacheStore};
pub use dispatcher::{CycleSummary, DispatchConfig, FetchDispatcher};
pub use errors::{ConfigError, FetchError, RegistryError, RetryClass};
pub use events::{LogResultSink, MockResultSink, NoOpResultSink, ResultSink};
pub use instruments::{add_instrument_checked, InstrumentRegistry, ValidationWarning};
pub use monitor::{Monitor, MonitorState, ALLOWED_INTERVAL_SECS};
pub use orchestrator::{FetchOrchestrator, OrchestratorConfig};
pub use resolver::{FallbackResolver, Resolution, ResolvedValue, ResolverOptions, ValueOrigin};

// Re-export provider types
pub use provider::eastmoney::{EastmoneyEstimateProvider, EastmoneyNavProvider};
pub use provider::eastmoney_history::EastmoneyHistoryProvider;
pub use provider::sina::SinaProvider;
pub use provider::tencent::TencentProvider;
pub use provider::{default_providers, MarketDataProvider};

// Re-export registry types
pub use registry::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, FetchDiagnostics, ProviderAttempt,
    SkipReason, SourceDescriptor, SourceRegistry, SourceStatusReport,
};
