use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use fundwatch_market_data::instruments::DEFAULT_SEED_CODES;
use fundwatch_market_data::monitor::{validate_interval, DEFAULT_INTERVAL_SECS};
use fundwatch_market_data::{ConfigError, DispatchConfig, DEFAULT_ALERT_THRESHOLD_PCT};
use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub interval_secs: u64,
    pub alert_threshold: Decimal,
    pub pool_size: usize,
    pub run_timeout: Duration,
    pub cycle_timeout: Duration,
    pub codes: Vec<String>,
    pub add_codes: Vec<String>,
    pub add_require_data: bool,
    pub stale_fallback: bool,
    pub reuse_snapshot: bool,
    pub run_once: bool,
    pub output_format: OutputFormat,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let flag = |key: &str| -> bool {
            lookup(key)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };
        let list = |key: &str| -> Option<Vec<String>> {
            lookup(key).map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
        };

        let interval_secs = validate_interval(number("FW_INTERVAL_SECS", DEFAULT_INTERVAL_SECS))
            .context("Invalid FW_INTERVAL_SECS")?;

        let alert_threshold = lookup("FW_ALERT_THRESHOLD")
            .and_then(|v| Decimal::from_str(v.trim()).ok())
            .unwrap_or(DEFAULT_ALERT_THRESHOLD_PCT);
        if alert_threshold <= Decimal::ZERO {
            return Err(ConfigError::InvalidThreshold(alert_threshold)).context("Invalid FW_ALERT_THRESHOLD");
        }

        let defaults = DispatchConfig::default();
        let dispatch = DispatchConfig {
            pool_size: usize::try_from(number("FW_POOL_SIZE", defaults.pool_size as u64))
                .unwrap_or(defaults.pool_size),
            run_timeout: Duration::from_millis(number(
                "FW_RUN_TIMEOUT_MS",
                defaults.run_timeout.as_millis() as u64,
            )),
            cycle_timeout: Duration::from_millis(number(
                "FW_CYCLE_TIMEOUT_MS",
                defaults.cycle_timeout.as_millis() as u64,
            )),
        };
        dispatch.validate().context("Invalid FW_POOL_SIZE")?;

        let output_format = match lookup("FW_OUTPUT_FORMAT") {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        };

        Ok(Self {
            interval_secs,
            alert_threshold,
            pool_size: dispatch.pool_size,
            run_timeout: dispatch.run_timeout,
            cycle_timeout: dispatch.cycle_timeout,
            codes: list("FW_CODES")
                .filter(|codes| !codes.is_empty())
                .unwrap_or_else(|| DEFAULT_SEED_CODES.iter().map(|c| c.to_string()).collect()),
            add_codes: list("FW_ADD_CODES").unwrap_or_default(),
            add_require_data: flag("FW_ADD_REQUIRE_DATA"),
            stale_fallback: flag("FW_STALE_FALLBACK"),
            reuse_snapshot: flag("FW_REUSE_SNAPSHOT"),
            run_once: flag("FW_RUN_ONCE"),
            output_format,
            log_format: lookup("FW_LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
        })
    }

    pub fn dispatch(&self) -> DispatchConfig {
        DispatchConfig {
            pool_size: self.pool_size,
            run_timeout: self.run_timeout,
            cycle_timeout: self.cycle_timeout,
        }
    }
}
