//! East Money historical net asset value provider (reference fallback).
//!
//! Queries the last seven days of published values and takes the most
//! recent row.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::http::{build_client, get_text, parse_positive};
use crate::errors::FetchError;
use crate::models::{DataKind, Observation};
use crate::provider::MarketDataProvider;

const PROVIDER_ID: &str = "EASTMONEY_HISTORY";
const BASE_URL: &str = "https://api.fund.eastmoney.com/f10/lsjz";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const LOOKBACK_DAYS: i64 = 7;
const PAGE_SIZE: u32 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HistoryResponse {
    err_code: i64,
    data: Option<HistoryData>,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    #[serde(rename = "LSJZList", default)]
    rows: Vec<HistoryRow>,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    /// Unit net asset value.
    #[serde(rename = "DWJZ")]
    nav: Option<String>,
}

/// Historical net asset value provider.
pub struct EastmoneyHistoryProvider {
    client: Client,
}

impl EastmoneyHistoryProvider {
    pub fn new() -> Self {
        Self {
            client: build_client(REQUEST_TIMEOUT),
        }
    }
}

impl Default for EastmoneyHistoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_history(text: &str) -> Result<Observation, FetchError> {
    let response: HistoryResponse =
        serde_json::from_str(text).map_err(|e| FetchError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })?;

    if response.err_code != 0 {
        return Err(FetchError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message: format!("error code {}", response.err_code),
        });
    }

    let latest = response
        .data
        .and_then(|d| d.rows.into_iter().next())
        .ok_or_else(|| FetchError::MissingField {
            provider: PROVIDER_ID.to_string(),
            field: "LSJZList".to_string(),
        })?;

    let nav = parse_positive(PROVIDER_ID, "DWJZ", latest.nav.as_deref().unwrap_or_default())?;
    Ok(Observation::new(nav))
}

#[async_trait]
impl MarketDataProvider for EastmoneyHistoryProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn display_name(&self) -> &'static str {
        "East Money history"
    }

    fn kind(&self) -> DataKind {
        DataKind::Reference
    }

    fn priority(&self) -> u8 {
        2
    }

    async fn fetch(&self, code: &str) -> Result<Observation, FetchError> {
        let end = Utc::now().date_naive();
        let start = end - ChronoDuration::days(LOOKBACK_DAYS);
        let url = format!(
            "{}?fundCode={}&pageIndex=1&pageSize={}&startDate={}&endDate={}",
            BASE_URL,
            code,
            PAGE_SIZE,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
        let referer = format!("https://fundf10.eastmoney.com/jjjz_{}.html", code);
        let text = get_text(&self.client, PROVIDER_ID, &url, &referer).await?;
        parse_history(&text)
    }
}
