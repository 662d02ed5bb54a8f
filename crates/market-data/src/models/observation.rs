use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single value reported by a source, plus optional ancillary fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Strictly positive value.
    pub value: Decimal,

    /// Instrument name as reported by the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Daily change in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<Decimal>,

    /// Traded volume in units of 10,000.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}

impl Observation {
    pub fn new(value: Decimal) -> Self {
        Self {
            value,
            name: None,
            change_percent: None,
            volume: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_change_percent(mut self, change_percent: Decimal) -> Self {
        self.change_percent = Some(change_percent);
        self
    }

    pub fn with_volume(mut self, volume: Decimal) -> Self {
        self.volume = Some(volume);
        self
    }

    /// True when the value can take part in the derived metric.
    pub fn is_usable(&self) -> bool {
        self.value > Decimal::ZERO
    }
}
