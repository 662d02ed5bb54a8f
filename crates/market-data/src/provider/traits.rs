//! Provider adapter trait definition.
//!
//! This module defines the `MarketDataProvider` trait that every source
//! adapter implements.

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::{DataKind, Observation};

/// Trait for market data source adapters.
///
/// Implement this trait to add a new source. The source registry orders
/// adapters of the same [`DataKind`] by priority and the resolver walks
/// them until one succeeds.
///
/// Adapters apply a bounded timeout to their own network call and never
/// retry; fallback is the resolver's job.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use fundwatch_market_data::errors::FetchError;
/// use fundwatch_market_data::models::{DataKind, Observation};
/// use fundwatch_market_data::provider::MarketDataProvider;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn kind(&self) -> DataKind {
///         DataKind::Price
///     }
///
///     async fn fetch(&self, code: &str) -> Result<Observation, FetchError> {
///         // ... call the upstream API
///     }
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "TENCENT". Used for logging,
    /// diagnostics and circuit breaker tracking.
    fn id(&self) -> &'static str;

    /// Name shown in statuses and tried lists. Defaults to the id.
    fn display_name(&self) -> &'static str {
        self.id()
    }

    /// The quantity this provider reports.
    fn kind(&self) -> DataKind;

    /// Provider priority for ordering.
    ///
    /// Lower values = higher priority. Default is 10.
    fn priority(&self) -> u8 {
        10
    }

    /// Fetch the current value for an instrument code.
    ///
    /// Returns a strictly positive observation or a typed failure.
    async fn fetch(&self, code: &str) -> Result<Observation, FetchError>;
}
