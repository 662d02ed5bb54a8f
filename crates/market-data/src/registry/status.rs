//! Human-readable overview of the configured sources and cache.

use std::fmt;

use serde::Serialize;

use super::{SourceDescriptor, SourceRegistry};
use crate::cache::{CacheTtl, TtlCacheStore};
use crate::models::DataKind;

/// Snapshot of source priorities, TTLs and cache occupancy.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatusReport {
    pub price_sources: Vec<SourceDescriptor>,
    pub reference_sources: Vec<SourceDescriptor>,
    pub ttl: CacheTtl,
    pub cached_instruments: usize,
}

impl SourceStatusReport {
    pub fn collect(sources: &SourceRegistry, cache: &TtlCacheStore) -> Self {
        Self {
            price_sources: sources.descriptors(DataKind::Price),
            reference_sources: sources.descriptors(DataKind::Reference),
            ttl: cache.ttl().clone(),
            cached_instruments: cache.instrument_count(),
        }
    }
}

fn write_chain(f: &mut fmt::Formatter<'_>, label: &str, chain: &[SourceDescriptor]) -> fmt::Result {
    writeln!(f, "{} priority:", label)?;
    for (i, source) in chain.iter().enumerate() {
        writeln!(f, "  {}. {}", i + 1, source.display_name)?;
    }
    Ok(())
}

impl fmt::Display for SourceStatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_chain(f, "Price", &self.price_sources)?;
        write_chain(f, "Reference", &self.reference_sources)?;
        writeln!(f, "Cache TTLs:")?;
        writeln!(f, "  price: {}s", self.ttl.price.as_secs())?;
        writeln!(f, "  reference: {}s", self.ttl.reference.as_secs())?;
        writeln!(f, "  snapshot: {}s", self.ttl.snapshot.as_secs())?;
        write!(f, "Cached instruments: {}", self.cached_instruments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use crate::provider::MarketDataProvider;
    use crate::testing::MockProvider;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[test]
    fn test_report_lists_chains_in_order() {
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![
            Arc::new(MockProvider::failing("B", DataKind::Price, 2)),
            Arc::new(MockProvider::failing("A", DataKind::Price, 1)),
            Arc::new(MockProvider::failing("NAV", DataKind::Reference, 1)),
        ];
        let sources = SourceRegistry::new(providers);
        let cache = TtlCacheStore::new();
        cache.put("161226", DataKind::Price, Observation::new(dec!(1)), "A");

        let report = SourceStatusReport::collect(&sources, &cache);
        assert_eq!(report.cached_instruments, 1);

        let text = report.to_string();
        assert!(text.contains("Price priority:\n  1. A\n  2. B\n  3. Cache\n"));
        assert!(text.contains("Reference priority:\n  1. NAV\n  2. Cache\n"));
        assert!(text.contains("price: 300s"));
        assert!(text.ends_with("Cached instruments: 1"));
    }
}
