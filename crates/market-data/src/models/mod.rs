//! Market data models
//!
//! This module contains the core data types for the aggregation engine:
//! - `types` - Type aliases for source identifiers
//! - `kind` - The two fetched quantities (price, reference)
//! - `instrument` - Tracked instrument identity and exchange prefix
//! - `observation` - A value reported by one source
//! - `tag` - Metric classification buckets
//! - `fetch_result` - The per-instrument record delivered to sinks

mod fetch_result;
mod instrument;
mod kind;
mod observation;
mod tag;
mod types;

pub use fetch_result::{
    format_fixed, format_signed_percent, FetchResult, MissingData, METRIC_UNAVAILABLE_STATUS,
};
pub use instrument::{placeholder_name, Instrument, Market};
pub use kind::DataKind;
pub use observation::Observation;
pub use tag::{classify, Tag, DEFAULT_ALERT_THRESHOLD_PCT};
pub use types::{SourceId, SourceName};
