//! Priority-ordered source chains per data kind.

use std::borrow::Cow;
use std::sync::Arc;

use serde::Serialize;

use crate::models::{DataKind, SourceId, SourceName};
use crate::provider::MarketDataProvider;

/// Identifier of the cache pseudo-source.
pub const CACHE_SOURCE_ID: &str = "CACHE";

/// Display name of the cache pseudo-source.
pub const CACHE_SOURCE_NAME: &str = "Cache";

/// Static description of one source in a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub display_name: SourceName,
    pub priority: u8,
    pub kind: DataKind,
}

impl SourceDescriptor {
    pub fn is_cache(&self) -> bool {
        self.id == CACHE_SOURCE_ID
    }

    fn cache(kind: DataKind) -> Self {
        Self {
            id: Cow::Borrowed(CACHE_SOURCE_ID),
            display_name: Cow::Borrowed(CACHE_SOURCE_NAME),
            priority: u8::MAX,
            kind,
        }
    }

    fn for_provider(provider: &dyn MarketDataProvider) -> Self {
        Self {
            id: Cow::Borrowed(provider.id()),
            display_name: Cow::Borrowed(provider.display_name()),
            priority: provider.priority(),
            kind: provider.kind(),
        }
    }
}

/// One step of a fallback chain.
#[derive(Clone)]
pub enum ChainEntry {
    Provider {
        descriptor: SourceDescriptor,
        provider: Arc<dyn MarketDataProvider>,
    },
    Cache {
        descriptor: SourceDescriptor,
    },
}

impl ChainEntry {
    pub fn descriptor(&self) -> &SourceDescriptor {
        match self {
            Self::Provider { descriptor, .. } | Self::Cache { descriptor } => descriptor,
        }
    }
}

impl std::fmt::Debug for ChainEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ChainEntry").field(self.descriptor()).finish()
    }
}

/// Immutable registry of sources, built once at startup.
///
/// Providers are grouped by kind and sorted by ascending priority, keeping
/// registration order for ties. The cache pseudo-source, when enabled, is
/// always the last entry of each chain regardless of priorities.
pub struct SourceRegistry {
    price: Vec<ChainEntry>,
    reference: Vec<ChainEntry>,
}

impl SourceRegistry {
    /// Build chains with the cache appended as the final fallback.
    pub fn new(providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        Self::build(providers, true)
    }

    /// Build chains made of live providers only.
    pub fn without_cache(providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        Self::build(providers, false)
    }

    fn build(providers: Vec<Arc<dyn MarketDataProvider>>, cache_fallback: bool) -> Self {
        let chain_for = |kind: DataKind| {
            let mut entries: Vec<ChainEntry> = providers
                .iter()
                .filter(|p| p.kind() == kind)
                .map(|p| ChainEntry::Provider {
                    descriptor: SourceDescriptor::for_provider(p.as_ref()),
                    provider: Arc::clone(p),
                })
                .collect();
            entries.sort_by_key(|e| e.descriptor().priority);
            if cache_fallback {
                entries.push(ChainEntry::Cache {
                    descriptor: SourceDescriptor::cache(kind),
                });
            }
            entries
        };

        Self {
            price: chain_for(DataKind::Price),
            reference: chain_for(DataKind::Reference),
        }
    }

    /// The fallback chain for `kind`, in trial order.
    pub fn chain(&self, kind: DataKind) -> &[ChainEntry] {
        match kind {
            DataKind::Price => &self.price,
            DataKind::Reference => &self.reference,
        }
    }

    /// Descriptors for `kind`, in trial order.
    pub fn descriptors(&self, kind: DataKind) -> Vec<SourceDescriptor> {
        self.chain(kind)
            .iter()
            .map(|e| e.descriptor().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;

    fn ids(registry: &SourceRegistry, kind: DataKind) -> Vec<String> {
        registry
            .descriptors(kind)
            .into_iter()
            .map(|d| d.id.to_string())
            .collect()
    }

    #[test]
    fn test_chains_sorted_by_priority_with_cache_last() {
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![
            Arc::new(MockProvider::failing("LOW", DataKind::Price, 20)),
            Arc::new(MockProvider::failing("HIGH", DataKind::Price, 1)),
            Arc::new(MockProvider::failing("NAV", DataKind::Reference, 1)),
            Arc::new(MockProvider::failing("MID", DataKind::Price, 5)),
        ];
        let registry = SourceRegistry::new(providers);

        assert_eq!(ids(&registry, DataKind::Price), ["HIGH", "MID", "LOW", "CACHE"]);
        assert_eq!(ids(&registry, DataKind::Reference), ["NAV", "CACHE"]);
    }

    #[test]
    fn test_cache_stays_last_even_below_max_priority() {
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![Arc::new(MockProvider::failing(
            "LAST",
            DataKind::Price,
            u8::MAX,
        ))];
        let registry = SourceRegistry::new(providers);
        let chain = registry.chain(DataKind::Price);
        assert!(chain.last().map(|e| e.descriptor().is_cache()).unwrap_or(false));
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![
            Arc::new(MockProvider::failing("FIRST", DataKind::Price, 3)),
            Arc::new(MockProvider::failing("SECOND", DataKind::Price, 3)),
        ];
        let registry = SourceRegistry::without_cache(providers);
        assert_eq!(ids(&registry, DataKind::Price), ["FIRST", "SECOND"]);
    }
}
