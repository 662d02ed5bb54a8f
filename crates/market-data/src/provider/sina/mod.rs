//! Sina Finance real-time quote provider (price fallback).
//!
//! The payload is comma-separated: field 0 is the name, 2 the previous
//! close and 3 the last price. Sina does not report a usable volume for
//! these instruments, and the daily change is derived from the previous
//! close.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;

use super::http::{build_client, get_text, non_empty, parse_optional, parse_positive, quoted_payload};
use crate::errors::FetchError;
use crate::models::{DataKind, Market, Observation};
use crate::provider::MarketDataProvider;

const PROVIDER_ID: &str = "SINA";
const DISPLAY_NAME: &str = "Sina";
const BASE_URL: &str = "http://hq.sinajs.cn/list=";
const REFERER: &str = "http://finance.sina.com.cn/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const MIN_FIELDS: usize = 30;

/// Sina Finance price provider.
pub struct SinaProvider {
    client: Client,
}

impl SinaProvider {
    pub fn new() -> Self {
        Self {
            client: build_client(REQUEST_TIMEOUT),
        }
    }
}

impl Default for SinaProvider {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_quote(text: &str) -> Result<Observation, FetchError> {
    let payload = quoted_payload(PROVIDER_ID, text)?;
    let fields: Vec<&str> = payload.split(',').collect();

    if fields.len() < MIN_FIELDS {
        return Err(FetchError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message: format!("incomplete data: {} fields", fields.len()),
        });
    }

    let price = parse_positive(PROVIDER_ID, "price", fields[3])?;
    let mut observation = Observation::new(price);

    if let Some(name) = non_empty(fields[0]) {
        observation = observation.with_name(name);
    }

    let previous_close = parse_optional(fields[2]).filter(|p| *p > Decimal::ZERO);
    if let Some(change) = previous_close.and_then(|prev| {
        (price - prev)
            .checked_div(prev)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
    }) {
        observation = observation.with_change_percent(change.round_dp(2));
    }

    Ok(observation)
}

#[async_trait]
impl MarketDataProvider for SinaProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    fn kind(&self) -> DataKind {
        DataKind::Price
    }

    fn priority(&self) -> u8 {
        2
    }

    async fn fetch(&self, code: &str) -> Result<Observation, FetchError> {
        let url = format!("{}{}{}", BASE_URL, Market::for_code(code).prefix(), code);
        let text = get_text(&self.client, PROVIDER_ID, &url, REFERER).await?;
        parse_quote(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fixture(prev_close: &str, price: &str) -> String {
        let mut fields = vec!["0"; 33];
        fields[0] = "OIL LOF";
        fields[1] = "0.800";
        fields[2] = prev_close;
        fields[3] = price;
        format!("var hq_str_sz162411=\"{}\";", fields.join(","))
    }

    #[test]
    fn test_parse_quote_derives_change() {
        let observation = parse_quote(&fixture("0.800", "0.820")).unwrap();
        assert_eq!(observation.value, dec!(0.820));
        assert_eq!(observation.name.as_deref(), Some("OIL LOF"));
        assert_eq!(observation.change_percent, Some(dec!(2.50)));
        assert_eq!(observation.volume, None);
    }

    #[test]
    fn test_missing_previous_close_skips_change() {
        let observation = parse_quote(&fixture("", "0.820")).unwrap();
        assert_eq!(observation.change_percent, None);
    }

    #[test]
    fn test_empty_quote_is_malformed() {
        assert!(matches!(
            parse_quote("var hq_str_sz162411=\"\";"),
            Err(FetchError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_provider_metadata() {
        let provider = SinaProvider::new();
        assert_eq!(provider.id(), "SINA");
        assert_eq!(provider.kind(), DataKind::Price);
        assert_eq!(provider.priority(), 2);
    }
}
