use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::errors::ConfigError;
use crate::instruments::InstrumentRegistry;
use crate::models::{
    classify, format_fixed, format_signed_percent, DataKind, FetchResult, Instrument,
    MissingData, Tag, DEFAULT_ALERT_THRESHOLD_PCT, METRIC_UNAVAILABLE_STATUS,
};
use crate::resolver::{FallbackResolver, Resolution, ValueOrigin};

/// `dataSource` of a result served from the combined snapshot.
pub const SNAPSHOT_DATA_SOURCE: &str = "snapshot cache";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Alert threshold in percent.
    pub alert_threshold: Decimal,
    /// Serve a fresh combined snapshot instead of resolving again.
    pub reuse_snapshot: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            alert_threshold: DEFAULT_ALERT_THRESHOLD_PCT,
            reuse_snapshot: false,
        }
    }
}

impl OrchestratorConfig {
    /// Default config with `alert_threshold`, which must be positive.
    pub fn with_threshold(alert_threshold: Decimal) -> Result<Self, ConfigError> {
        if alert_threshold <= Decimal::ZERO {
            return Err(ConfigError::InvalidThreshold(alert_threshold));
        }
        Ok(Self {
            alert_threshold,
            ..Self::default()
        })
    }
}

/// Turns one instrument into one [`FetchResult`].
///
/// A run never fails: every missing side degrades to a status string.
pub struct FetchOrchestrator {
    resolver: Arc<FallbackResolver>,
    instruments: Option<Arc<InstrumentRegistry>>,
    config: OrchestratorConfig,
}

impl FetchOrchestrator {
    pub fn new(resolver: Arc<FallbackResolver>, config: OrchestratorConfig) -> Self {
        Self {
            resolver,
            instruments: None,
            config,
        }
    }

    /// Write provider-supplied names back to instruments still carrying a placeholder.
    pub fn with_instrument_registry(mut self, instruments: Arc<InstrumentRegistry>) -> Self {
        self.instruments = Some(instruments);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &FallbackResolver {
        &self.resolver
    }

    pub async fn run(&self, instrument: &Instrument) -> FetchResult {
        let code = instrument.code.as_str();
        let cache = self.resolver.cache();

        if self.config.reuse_snapshot {
            if let Some(mut snapshot) = cache.snapshot(code) {
                debug!("Serving {} from snapshot cache", code);
                snapshot.data_source = SNAPSHOT_DATA_SOURCE.to_string();
                return snapshot;
            }
        }

        let (price, reference) = tokio::join!(
            self.resolver.resolve(code, DataKind::Price),
            self.resolver.resolve(code, DataKind::Reference),
        );

        for resolution in [&price, &reference] {
            if let Some(value) = resolution.value.as_ref().filter(|v| v.is_live()) {
                cache.put(
                    code,
                    resolution.kind,
                    value.observation.clone(),
                    value.source_name.clone(),
                );
            }
        }

        let result = build_result(
            instrument,
            &price,
            &reference,
            self.config.alert_threshold,
            Utc::now(),
        );
        cache.put_snapshot(result.clone());

        if let Some(instruments) = &self.instruments {
            if instrument.has_placeholder_name()
                && result.name != instrument.display_name
                && instruments.learn_name(code, &result.name)
            {
                info!("Learned name '{}' for {}", result.name, code);
            }
        }

        debug!(
            "{} {}: {} [{}] via {}",
            code, result.name, result.status, result.tag, result.data_source
        );
        result
    }
}

fn side_status(resolution: &Resolution) -> String {
    match &resolution.value {
        Some(value) => {
            let number = format_fixed(value.observation.value, 3);
            match value.origin {
                ValueOrigin::Live => number,
                ValueOrigin::FreshCache => format!("{} (cached)", number),
                ValueOrigin::StaleCache => format!("{} (stale)", number),
            }
        }
        None => format!("missing (tried: {})", resolution.tried_display()),
    }
}

fn data_source(price: Option<&str>, reference: Option<&str>) -> String {
    match (price, reference) {
        (Some(p), Some(r)) => format!("{}/{}", p, r),
        (Some(p), None) => format!("{}/reference missing", p),
        (None, Some(r)) => format!("price missing/{}", r),
        (None, None) => "data missing".to_string(),
    }
}

/// Combine two resolutions into a result record.
///
/// The metric is computed only when both values are strictly positive;
/// otherwise the tag stays `normal` and `status` names the missing side.
pub fn build_result(
    instrument: &Instrument,
    price: &Resolution,
    reference: &Resolution,
    alert_threshold: Decimal,
    timestamp: DateTime<Utc>,
) -> FetchResult {
    let price_obs = price.value.as_ref().map(|v| &v.observation);
    let reference_obs = reference.value.as_ref().map(|v| &v.observation);

    let price_value = price_obs.map(|o| o.value).filter(|v| *v > Decimal::ZERO);
    let reference_value = reference_obs.map(|o| o.value).filter(|v| *v > Decimal::ZERO);

    let (metric, premium_amount) = match (price_value, reference_value) {
        (Some(p), Some(r)) => {
            let premium = p.checked_sub(r);
            (premium.and_then(|d| d.checked_div(r)), premium)
        }
        _ => (None, None),
    };

    let metric_pct = metric.and_then(|m| m.checked_mul(Decimal::ONE_HUNDRED));
    let (status, tag) = match metric_pct {
        Some(pct) => (format_signed_percent(pct), classify(pct, alert_threshold)),
        None => match MissingData::from_presence(price_value.is_some(), reference_value.is_some()) {
            Some(missing) => (missing.as_status().to_string(), Tag::Normal),
            None => {
                warn!("Premium for {} is out of decimal range", instrument.code);
                (METRIC_UNAVAILABLE_STATUS.to_string(), Tag::Normal)
            }
        },
    };

    let name = reference_obs
        .and_then(|o| o.name.clone())
        .or_else(|| price_obs.and_then(|o| o.name.clone()))
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| instrument.display_name.clone());

    let price_source = price.value.as_ref().map(|v| v.source_name.clone());
    let reference_source = reference.value.as_ref().map(|v| v.source_name.clone());

    FetchResult {
        code: instrument.code.clone(),
        name,
        price: price_value,
        reference: reference_value,
        price_status: side_status(price),
        reference_status: side_status(reference),
        metric,
        status,
        premium_amount,
        tag,
        data_source: data_source(price_source.as_deref(), reference_source.as_deref()),
        price_source,
        reference_source,
        price_tried: price.tried.clone(),
        reference_tried: reference.tried.clone(),
        change_percent: price_obs.and_then(|o| o.change_percent),
        volume: price_obs.and_then(|o| o.volume),
        timestamp,
    }
}
