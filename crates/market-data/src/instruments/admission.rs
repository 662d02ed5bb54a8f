use std::fmt;

use log::info;

use super::InstrumentRegistry;
use crate::errors::RegistryError;
use crate::models::{FetchResult, Instrument, MissingData};
use crate::orchestrator::FetchOrchestrator;

/// What the validation fetch of a new instrument could not find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationWarning {
    PriceAndReferenceMissing,
    PriceMissing,
    ReferenceMissing,
}

impl ValidationWarning {
    pub fn from_result(result: &FetchResult) -> Option<Self> {
        result.missing_data().map(|missing| match missing {
            MissingData::PriceAndReference => Self::PriceAndReferenceMissing,
            MissingData::Price => Self::PriceMissing,
            MissingData::Reference => Self::ReferenceMissing,
        })
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::PriceAndReferenceMissing => "no source returned a price or a reference value",
            Self::PriceMissing => "no source returned a price",
            Self::ReferenceMissing => "no source returned a reference value",
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Add `code` after one validation run through `orchestrator`.
///
/// Format and duplicate checks happen before any network call. When the
/// validation run misses data, `confirm` decides whether the instrument is
/// added anyway; declining yields [`RegistryError::Declined`].
pub async fn add_instrument_checked<F>(
    registry: &InstrumentRegistry,
    orchestrator: &FetchOrchestrator,
    code: &str,
    name: Option<&str>,
    confirm: F,
) -> Result<Instrument, RegistryError>
where
    F: FnOnce(&str, ValidationWarning) -> bool,
{
    let code = registry.check_candidate(code)?;
    let candidate = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => Instrument::with_name(code.as_str(), name),
        None => Instrument::new(code.as_str()),
    };

    let probe = orchestrator.run(&candidate).await;
    if let Some(warning) = ValidationWarning::from_result(&probe) {
        if !confirm(&code, warning) {
            info!("Declined {}: {}", code, warning);
            return Err(RegistryError::Declined {
                code,
                reason: warning.to_string(),
            });
        }
    }

    let display_name = if candidate.has_placeholder_name() {
        probe.name
    } else {
        candidate.display_name
    };
    registry.add_instrument(&code, Some(&display_name))
}
