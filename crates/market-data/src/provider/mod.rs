//! Source adapters.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all adapters implement
//! - Shared HTTP helpers (client construction, payload parsing)
//! - Concrete adapters for the live quote and fund value endpoints
//!
//! Each adapter answers exactly one [`DataKind`](crate::models::DataKind)
//! and reports its own priority; the source registry does the ordering.

mod http;
mod traits;

pub mod eastmoney;
pub mod eastmoney_history;
pub mod sina;
pub mod tencent;

use std::sync::Arc;

pub use traits::MarketDataProvider;

use eastmoney::{EastmoneyEstimateProvider, EastmoneyNavProvider};
use eastmoney_history::EastmoneyHistoryProvider;
use sina::SinaProvider;
use tencent::TencentProvider;

/// All live adapters, price and reference alike.
pub fn default_providers() -> Vec<Arc<dyn MarketDataProvider>> {
    vec![
        Arc::new(TencentProvider::new()),
        Arc::new(SinaProvider::new()),
        Arc::new(EastmoneyEstimateProvider::new()),
        Arc::new(EastmoneyNavProvider::new()),
        Arc::new(EastmoneyHistoryProvider::new()),
    ]
}
