use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::tag::Tag;

/// Outcome of one orchestration run for one instrument.
///
/// Built once and never mutated afterwards. `metric` is present only when
/// both `price` and `reference` are present and strictly positive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    pub code: String,
    pub name: String,

    pub price: Option<Decimal>,
    pub reference: Option<Decimal>,

    /// `"1.234"`, `"1.234 (cached)"` or `"missing (tried: ...)"`.
    pub price_status: String,
    pub reference_status: String,

    /// `(price - reference) / reference`, as a fraction.
    pub metric: Option<Decimal>,

    /// Signed percentage such as `"+5.00%"`, or the missing-data status.
    pub status: String,

    /// `price - reference`.
    pub premium_amount: Option<Decimal>,

    pub tag: Tag,

    pub price_source: Option<String>,
    pub reference_source: Option<String>,
    pub price_tried: Vec<String>,
    pub reference_tried: Vec<String>,

    /// Combined `"<price source>/<reference source>"` display.
    pub data_source: String,

    pub change_percent: Option<Decimal>,
    pub volume: Option<Decimal>,

    pub timestamp: DateTime<Utc>,
}

impl FetchResult {
    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// The metric in percent.
    pub fn metric_percent(&self) -> Option<Decimal> {
        self.metric
            .and_then(|m| m.checked_mul(Decimal::ONE_HUNDRED))
    }

    pub fn missing_data(&self) -> Option<MissingData> {
        MissingData::from_presence(self.has_price(), self.has_reference())
    }
}

/// Status when both sides are present but the premium does not fit a decimal.
pub const METRIC_UNAVAILABLE_STATUS: &str = "premium out of range";

/// Which side of a result could not be obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingData {
    PriceAndReference,
    Price,
    Reference,
}

impl MissingData {
    pub fn from_presence(has_price: bool, has_reference: bool) -> Option<Self> {
        match (has_price, has_reference) {
            (true, true) => None,
            (false, false) => Some(Self::PriceAndReference),
            (false, true) => Some(Self::Price),
            (true, false) => Some(Self::Reference),
        }
    }

    pub fn as_status(&self) -> &'static str {
        match self {
            Self::PriceAndReference => "price and reference missing",
            Self::Price => "price missing",
            Self::Reference => "reference missing",
        }
    }
}

/// Format with exactly `dp` decimal places, rounding half away from zero.
pub fn format_fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.rescale(dp);
    rounded.to_string()
}

/// Format a percentage with an explicit sign, e.g. `"+5.00%"` or `"-1.25%"`.
pub fn format_signed_percent(pct: Decimal) -> String {
    let body = format_fixed(pct, 2);
    if body.starts_with('-') {
        format!("{}%", body)
    } else {
        format!("+{}%", body)
    }
}
