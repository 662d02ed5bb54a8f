//! Tencent Finance real-time quote provider.
//!
//! Quotes come back as a single JavaScript assignment whose payload is a
//! `~`-separated field list:
//!
//! ```text
//! v_sz161226="51~SILVER LOF~161226~1.234~1.220~...";
//! ```
//!
//! Field 1 is the name, 3 the last price, 6 the volume in lots and 32 the
//! daily change in percent.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;

use super::http::{build_client, get_text, non_empty, parse_optional, parse_positive, quoted_payload};
use crate::errors::FetchError;
use crate::models::{DataKind, Market, Observation};
use crate::provider::MarketDataProvider;

const PROVIDER_ID: &str = "TENCENT";
const DISPLAY_NAME: &str = "Tencent";
const BASE_URL: &str = "http://qt.gtimg.cn/q=";
const REFERER: &str = "https://gu.qq.com/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Responses with fewer fields are treated as incomplete.
const MIN_FIELDS: usize = 40;

const NAME_FIELD: usize = 1;
const PRICE_FIELD: usize = 3;
const VOLUME_FIELD: usize = 6;
const CHANGE_PERCENT_FIELD: usize = 32;

/// Volume is reported in units of 10,000.
const VOLUME_UNIT: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Tencent Finance price provider.
pub struct TencentProvider {
    client: Client,
}

impl TencentProvider {
    pub fn new() -> Self {
        Self {
            client: build_client(REQUEST_TIMEOUT),
        }
    }
}

impl Default for TencentProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a Tencent quote body into an observation.
pub(crate) fn parse_quote(text: &str) -> Result<Observation, FetchError> {
    let payload = quoted_payload(PROVIDER_ID, text)?;
    let fields: Vec<&str> = payload.split('~').collect();

    if fields.len() < MIN_FIELDS {
        return Err(FetchError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message: format!("incomplete data: {} fields", fields.len()),
        });
    }

    let price = parse_positive(PROVIDER_ID, "price", fields[PRICE_FIELD])?;
    let mut observation = Observation::new(price);

    if let Some(name) = non_empty(fields[NAME_FIELD]) {
        observation = observation.with_name(name);
    }
    if let Some(change) = parse_optional(fields[CHANGE_PERCENT_FIELD]) {
        observation = observation.with_change_percent(change);
    }
    if let Some(volume) = parse_optional(fields[VOLUME_FIELD]) {
        if let Some(scaled) = volume.checked_div(VOLUME_UNIT) {
            observation = observation.with_volume(scaled);
        }
    }

    Ok(observation)
}

#[async_trait]
impl MarketDataProvider for TencentProvider {
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
        1
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

    fn fixture(price: &str) -> String {
        let mut fields = vec![""; 45];
        fields[0] = "51";
        fields[NAME_FIELD] = "SILVER LOF";
        fields[2] = "161226";
        fields[PRICE_FIELD] = price;
        fields[VOLUME_FIELD] = "123450";
        fields[CHANGE_PERCENT_FIELD] = "1.20";
        format!("v_sz161226=\"{}\";\n", fields.join("~"))
    }

    #[test]
    fn test_parse_quote() {
        let observation = parse_quote(&fixture("1.234")).unwrap();
        assert_eq!(observation.value, dec!(1.234));
        assert_eq!(observation.name.as_deref(), Some("SILVER LOF"));
        assert_eq!(observation.change_percent, Some(dec!(1.20)));
        assert_eq!(observation.volume, Some(dec!(12.345)));
    }

    #[test]
    fn test_rejects_incomplete_payload() {
        let result = parse_quote("v_sz161226=\"51~SILVER LOF~161226~1.234\";");
        assert!(matches!(result, Err(FetchError::MalformedResponse { .. })));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        assert!(matches!(
            parse_quote(&fixture("0.000")),
            Err(FetchError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_quote(&fixture("")),
            Err(FetchError::MissingField { .. })
        ));
    }

    #[test]
    fn test_provider_metadata() {
        let provider = TencentProvider::new();
        assert_eq!(provider.id(), "TENCENT");
        assert_eq!(provider.display_name(), "Tencent");
        assert_eq!(provider.kind(), DataKind::Price);
        assert_eq!(provider.priority(), 1);
    }
}
