//! Shared HTTP plumbing for the live adapters.

use std::str::FromStr;
use std::time::Duration;

use log::debug;
use reqwest::{header, Client};
use rust_decimal::Decimal;

use crate::errors::FetchError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Build a client with the adapter's timeout and browser-like headers.
pub(crate) fn build_client(timeout: Duration) -> Client {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );

    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// GET `url` with a `Referer` header and return the body as text.
///
/// Non-success statuses are reported as network errors.
pub(crate) async fn get_text(
    client: &Client,
    provider: &str,
    url: &str,
    referer: &str,
) -> Result<String, FetchError> {
    debug!("{} request: {}", provider, url);

    let response = client
        .get(url)
        .header(header::REFERER, referer)
        .send()
        .await
        .map_err(|e| FetchError::from_transport(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Network {
            provider: provider.to_string(),
            message: format!("HTTP {}", status),
        });
    }

    response
        .text()
        .await
        .map_err(|e| FetchError::from_transport(provider, &e))
}

/// Extract the payload of a `var name="...";` style assignment.
pub(crate) fn quoted_payload<'a>(provider: &str, text: &'a str) -> Result<&'a str, FetchError> {
    let (_, rest) = text
        .split_once("=\"")
        .ok_or_else(|| FetchError::MalformedResponse {
            provider: provider.to_string(),
            message: "no quoted payload".to_string(),
        })?;
    let payload = rest.split_once("\";").map(|(p, _)| p).unwrap_or(rest);
    Ok(payload.trim_end_matches('"'))
}

/// Parse a required, strictly positive decimal field.
pub(crate) fn parse_positive(provider: &str, field: &str, raw: &str) -> Result<Decimal, FetchError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FetchError::MissingField {
            provider: provider.to_string(),
            field: field.to_string(),
        });
    }

    match Decimal::from_str(raw) {
        Ok(value) if value > Decimal::ZERO => Ok(value),
        _ => Err(FetchError::InvalidValue {
            provider: provider.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Parse an optional decimal field, tolerating a trailing `%`.
pub(crate) fn parse_optional(raw: &str) -> Option<Decimal> {
    let raw = raw.trim().trim_end_matches('%');
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw).ok()
}

/// Non-empty trimmed string, if any.
pub(crate) fn non_empty(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quoted_payload() {
        let text = "v_sz161226=\"51~SILVER LOF~161226~1.234\";\n";
        assert_eq!(
            quoted_payload("TEST", text).unwrap(),
            "51~SILVER LOF~161226~1.234"
        );
        assert!(matches!(
            quoted_payload("TEST", "pv_none_match=1;"),
            Err(FetchError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("TEST", "price", " 1.234 ").unwrap(), dec!(1.234));
        assert!(matches!(
            parse_positive("TEST", "price", ""),
            Err(FetchError::MissingField { .. })
        ));
        assert!(matches!(
            parse_positive("TEST", "price", "0.000"),
            Err(FetchError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_positive("TEST", "price", "n/a"),
            Err(FetchError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(parse_optional("-1.25%"), Some(dec!(-1.25)));
        assert_eq!(parse_optional(""), None);
        assert_eq!(parse_optional("abc"), None);
    }
}
