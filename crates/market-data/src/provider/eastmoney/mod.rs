//! East Money fund estimate endpoint.
//!
//! One JSONP document feeds two providers:
//! - [`EastmoneyNavProvider`]: last published net asset value (`dwjz`),
//!   the primary reference value.
//! - [`EastmoneyEstimateProvider`]: intraday estimate (`gsz`), the last
//!   live price fallback before the cache.

mod models;

use std::borrow::Cow;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;

use super::http::{build_client, get_text, non_empty, parse_optional, parse_positive};
use crate::errors::FetchError;
use crate::models::{DataKind, Observation};
use crate::provider::MarketDataProvider;

use models::FundEstimate;

const NAV_PROVIDER_ID: &str = "EASTMONEY";
const ESTIMATE_PROVIDER_ID: &str = "EASTMONEY_ESTIMATE";
const BASE_URL: &str = "https://fundgz.1234567.com.cn/js/";
const REFERER: &str = "https://fund.eastmoney.com/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

const JSONP_PREFIX: &str = "jsonpgz(";
const JSONP_SUFFIX: &str = ");";

lazy_static! {
    static ref TRAILING_COMMA_REGEX: Regex =
        Regex::new(r",\s*([}\]])").expect("Invalid regex pattern");
}

/// Unwrap and decode the `jsonpgz({...});` body.
pub(crate) fn parse_estimate(provider: &str, text: &str) -> Result<FundEstimate, FetchError> {
    let text = text.trim();
    let json = text
        .strip_prefix(JSONP_PREFIX)
        .and_then(|t| t.strip_suffix(JSONP_SUFFIX))
        .ok_or_else(|| FetchError::MalformedResponse {
            provider: provider.to_string(),
            message: "not a jsonpgz response".to_string(),
        })?;

    serde_json::from_str(json)
        .or_else(|_| serde_json::from_str(&strip_trailing_commas(json)))
        .map_err(|e| FetchError::MalformedResponse {
            provider: provider.to_string(),
            message: e.to_string(),
        })
}

/// Remove commas that directly precede a closing brace or bracket.
fn strip_trailing_commas(json: &str) -> Cow<'_, str> {
    TRAILING_COMMA_REGEX.replace_all(json, "$1")
}

async fn fetch_estimate(
    client: &Client,
    provider: &str,
    code: &str,
) -> Result<FundEstimate, FetchError> {
    let cache_buster = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let url = format!("{}{}.js?rt={}", BASE_URL, code, cache_buster);
    let text = get_text(client, provider, &url, REFERER).await?;
    parse_estimate(provider, &text)
}

fn nav_observation(estimate: &FundEstimate) -> Result<Observation, FetchError> {
    let raw = estimate.dwjz.as_deref().unwrap_or_default();
    let nav = parse_positive(NAV_PROVIDER_ID, "dwjz", raw)?;
    let mut observation = Observation::new(nav);
    if let Some(name) = estimate.name.as_deref().and_then(non_empty) {
        observation = observation.with_name(name);
    }
    Ok(observation)
}

fn estimate_observation(estimate: &FundEstimate) -> Result<Observation, FetchError> {
    let raw = estimate.gsz.as_deref().unwrap_or_default();
    let value = parse_positive(ESTIMATE_PROVIDER_ID, "gsz", raw)?;
    let mut observation = Observation::new(value);
    if let Some(name) = estimate.name.as_deref().and_then(non_empty) {
        observation = observation.with_name(name);
    }
    if let Some(change) = estimate.gszzl.as_deref().and_then(parse_optional) {
        observation = observation.with_change_percent(change);
    }
    Ok(observation)
}

/// Published net asset value from East Money.
pub struct EastmoneyNavProvider {
    client: Client,
}

impl EastmoneyNavProvider {
    pub fn new() -> Self {
        Self {
            client: build_client(REQUEST_TIMEOUT),
        }
    }
}

impl Default for EastmoneyNavProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for EastmoneyNavProvider {
    fn id(&self) -> &'static str {
        NAV_PROVIDER_ID
    }

    fn display_name(&self) -> &'static str {
        "East Money NAV"
    }

    fn kind(&self) -> DataKind {
        DataKind::Reference
    }

    fn priority(&self) -> u8 {
        1
    }

    async fn fetch(&self, code: &str) -> Result<Observation, FetchError> {
        let estimate = fetch_estimate(&self.client, NAV_PROVIDER_ID, code).await?;
        nav_observation(&estimate)
    }
}

/// Intraday estimated value from East Money, used as a price of last resort.
pub struct EastmoneyEstimateProvider {
    client: Client,
}

impl EastmoneyEstimateProvider {
    pub fn new() -> Self {
        Self {
            client: build_client(REQUEST_TIMEOUT),
        }
    }
}

impl Default for EastmoneyEstimateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for EastmoneyEstimateProvider {
    fn id(&self) -> &'static str {
        ESTIMATE_PROVIDER_ID
    }

    fn display_name(&self) -> &'static str {
        "East Money estimate"
    }

    fn kind(&self) -> DataKind {
        DataKind::Price
    }

    fn priority(&self) -> u8 {
        3
    }

    async fn fetch(&self, code: &str) -> Result<Observation, FetchError> {
        let estimate = fetch_estimate(&self.client, ESTIMATE_PROVIDER_ID, code).await?;
        estimate_observation(&estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const BODY: &str = r#"jsonpgz({"fundcode":"161226","name":"SILVER LOF","jzrq":"2024-05-10","dwjz":"1.1520","gsz":"1.1688","gszzl":"1.46","gztime":"2024-05-13 15:00"});"#;

    #[test]
    fn test_nav_from_estimate_document() {
        let estimate = parse_estimate(NAV_PROVIDER_ID, BODY).unwrap();
        let observation = nav_observation(&estimate).unwrap();
        assert_eq!(observation.value, dec!(1.1520));
        assert_eq!(observation.name.as_deref(), Some("SILVER LOF"));
    }

    #[test]
    fn test_estimate_from_estimate_document() {
        let estimate = parse_estimate(ESTIMATE_PROVIDER_ID, BODY).unwrap();
        let observation = estimate_observation(&estimate).unwrap();
        assert_eq!(observation.value, dec!(1.1688));
        assert_eq!(observation.change_percent, Some(dec!(1.46)));
    }

    #[test]
    fn test_tolerates_trailing_commas() {
        let body = r#"jsonpgz({"fundcode":"161226","dwjz":"1.1520",});"#;
        let estimate = parse_estimate(NAV_PROVIDER_ID, body).unwrap();
        assert_eq!(estimate.dwjz.as_deref(), Some("1.1520"));
    }

    #[test]
    fn test_rejects_non_jsonp() {
        assert!(matches!(
            parse_estimate(NAV_PROVIDER_ID, "<html>blocked</html>"),
            Err(FetchError::MalformedResponse { .. })
        ));
        // Unknown funds come back as an empty callback
        assert!(matches!(
            parse_estimate(NAV_PROVIDER_ID, "jsonpgz();"),
            Err(FetchError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_missing_nav_field() {
        let estimate = parse_estimate(NAV_PROVIDER_ID, r#"jsonpgz({"name":"X"});"#).unwrap();
        assert!(matches!(
            nav_observation(&estimate),
            Err(FetchError::MissingField { .. })
        ));
    }

    #[test]
    fn test_strip_trailing_commas() {
        assert_eq!(strip_trailing_commas(r#"{"a":1, }"#), r#"{"a":1}"#);
        assert_eq!(strip_trailing_commas(r#"[1,2,]"#), r#"[1,2]"#);
        assert_eq!(strip_trailing_commas(r#"{"a":1,"b":2}"#), r#"{"a":1,"b":2}"#);
        assert_eq!(
            strip_trailing_commas("{\"a\":[1,\n],\n}"),
            "{\"a\":[1]}"
        );
    }

    #[test]
    fn test_provider_metadata() {
        let nav = EastmoneyNavProvider::new();
        assert_eq!(nav.kind(), DataKind::Reference);
        assert_eq!(nav.priority(), 1);

        let estimate = EastmoneyEstimateProvider::new();
        assert_eq!(estimate.kind(), DataKind::Price);
        assert_eq!(estimate.priority(), 3);
    }
}
