use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::cache::TtlCacheStore;
use crate::errors::{FetchError, RetryClass};
use crate::models::{DataKind, Observation, SourceId};
use crate::provider::MarketDataProvider;
use crate::registry::{
    ChainEntry, CircuitBreaker, FetchDiagnostics, SkipReason, SourceDescriptor, SourceRegistry,
};

/// Resolver behavior switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Accept an expired cache entry once every fresher source has failed.
    pub stale_fallback: bool,
}

/// Where a resolved value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueOrigin {
    Live,
    FreshCache,
    StaleCache,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedValue {
    pub observation: Observation,
    /// Id of the chain entry that answered (`CACHE` for cache hits).
    pub source_id: SourceId,
    /// Display label: `"Tencent"`, `"Tencent (cached)"` or `"Tencent (stale)"`.
    pub source_name: String,
    pub origin: ValueOrigin,
}

impl ResolvedValue {
    pub fn is_live(&self) -> bool {
        self.origin == ValueOrigin::Live
    }
}

/// Outcome of walking one chain.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub kind: DataKind,
    pub value: Option<ResolvedValue>,
    /// Display names of every chain entry reached, in trial order.
    pub tried: Vec<String>,
    pub diagnostics: FetchDiagnostics,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    /// `"A, B, Cache"`.
    pub fn tried_display(&self) -> String {
        self.tried.join(", ")
    }
}

/// Resolves one `(instrument, kind)` pair against the registry's chain.
///
/// Adapter failures never escape: they are recorded in the diagnostics and
/// the walk moves on to the next entry.
pub struct FallbackResolver {
    sources: Arc<SourceRegistry>,
    cache: Arc<TtlCacheStore>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
    options: ResolverOptions,
}

impl FallbackResolver {
    pub fn new(sources: Arc<SourceRegistry>, cache: Arc<TtlCacheStore>) -> Self {
        Self {
            sources,
            cache,
            circuit_breaker: None,
            options: ResolverOptions::default(),
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = Some(circuit_breaker);
        self
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn cache(&self) -> &TtlCacheStore {
        &self.cache
    }

    pub async fn resolve(&self, code: &str, kind: DataKind) -> Resolution {
        self.resolve_at(code, kind, Utc::now()).await
    }

    /// Resolve, judging cache freshness at `now`.
    pub async fn resolve_at(&self, code: &str, kind: DataKind, now: DateTime<Utc>) -> Resolution {
        let mut tried = Vec::new();
        let mut diagnostics = FetchDiagnostics::new();
        let mut value = None;

        for entry in self.sources.chain(kind) {
            let descriptor = entry.descriptor();
            tried.push(descriptor.display_name.to_string());

            let found = match entry {
                ChainEntry::Provider { provider, .. } => {
                    self.try_provider(provider.as_ref(), descriptor, code, &mut diagnostics)
                        .await
                }
                ChainEntry::Cache { .. } => self.try_cache(descriptor, code, kind, now, &mut diagnostics),
            };

            if found.is_some() {
                value = found;
                break;
            }
        }

        match &value {
            Some(resolved) => debug!(
                "Resolved {} for {} from '{}': {}",
                kind,
                code,
                resolved.source_name,
                diagnostics.summary()
            ),
            None => warn!(
                "No {} for {} after trying {}: {}",
                kind,
                code,
                tried.join(", "),
                diagnostics.summary()
            ),
        }

        Resolution {
            kind,
            value,
            tried,
            diagnostics,
        }
    }

    async fn try_provider(
        &self,
        provider: &dyn MarketDataProvider,
        descriptor: &SourceDescriptor,
        code: &str,
        diagnostics: &mut FetchDiagnostics,
    ) -> Option<ResolvedValue> {
        let source_id = descriptor.id.clone();

        if let Some(breaker) = &self.circuit_breaker {
            if !breaker.allows(&source_id) {
                debug!("Circuit breaker open for '{}', skipping", source_id);
                diagnostics.record_skip(source_id, SkipReason::CircuitBreakerOpen);
                return None;
            }
        }

        let outcome = provider.fetch(code).await.and_then(|observation| {
            if observation.is_usable() {
                Ok(observation)
            } else {
                Err(FetchError::InvalidValue {
                    provider: source_id.to_string(),
                    value: observation.value.to_string(),
                })
            }
        });

        match outcome {
            Ok(observation) => {
                if let Some(breaker) = &self.circuit_breaker {
                    breaker.record_success(&source_id);
                }
                diagnostics.record_success(source_id.clone());
                Some(ResolvedValue {
                    observation,
                    source_id,
                    source_name: descriptor.display_name.to_string(),
                    origin: ValueOrigin::Live,
                })
            }
            Err(e) => {
                match e.retry_class() {
                    RetryClass::FailoverWithPenalty => {
                        if let Some(breaker) = &self.circuit_breaker {
                            breaker.record_failure(&source_id);
                        }
                        warn!("Source '{}' failed for {}: {}, falling back", source_id, code, e);
                    }
                    RetryClass::NextProvider => {
                        info!("Source '{}' had no usable value for {}: {}", source_id, code, e);
                    }
                }
                diagnostics.record_error(source_id, e.to_string());
                None
            }
        }
    }

    fn try_cache(
        &self,
        descriptor: &SourceDescriptor,
        code: &str,
        kind: DataKind,
        now: DateTime<Utc>,
        diagnostics: &mut FetchDiagnostics,
    ) -> Option<ResolvedValue> {
        let source_id = descriptor.id.clone();

        if let Some(entry) = self.cache.get_at(code, kind, now) {
            debug!("Using cached {} for {} from '{}'", kind, code, entry.source);
            diagnostics.record_success(source_id.clone());
            return Some(ResolvedValue {
                source_name: format!("{} (cached)", entry.source),
                observation: entry.observation,
                source_id,
                origin: ValueOrigin::FreshCache,
            });
        }

        let expired = self.cache.get_any(code, kind);
        match expired {
            Some(entry) if self.options.stale_fallback => {
                info!(
                    "Using stale {} for {} from '{}' captured at {}",
                    kind, code, entry.source, entry.captured_at
                );
                diagnostics.record_success(source_id.clone());
                Some(ResolvedValue {
                    source_name: format!("{} (stale)", entry.source),
                    observation: entry.observation,
                    source_id,
                    origin: ValueOrigin::StaleCache,
                })
            }
            Some(_) => {
                diagnostics.record_skip(source_id, SkipReason::CacheExpired);
                None
            }
            None => {
                diagnostics.record_skip(source_id, SkipReason::CacheMiss);
                None
            }
        }
    }
}
