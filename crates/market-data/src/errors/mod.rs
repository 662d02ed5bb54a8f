//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`FetchError`]: typed failure returned by every provider adapter
//! - [`RegistryError`]: rejection reasons for instrument registry mutations
//! - [`ConfigError`]: out-of-range monitor settings
//! - [`RetryClass`]: classification deciding circuit breaker penalties

mod retry;

pub use retry::RetryClass;

use rust_decimal::Decimal;
use thiserror::Error;

/// Why a provider adapter could not produce a value.
///
/// Adapters never panic or propagate transport errors directly; every
/// failure path ends up as one of these variants. The resolver folds them
/// into diagnostics and status strings, so they never escape the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be completed (connection, DNS, HTTP status).
    #[error("Network error: {provider} - {message}")]
    Network {
        /// The provider that was called
        provider: String,
        /// Transport error description
        message: String,
    },

    /// The request exceeded the adapter's timeout.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The response did not have the expected shape.
    #[error("Malformed response: {provider} - {message}")]
    MalformedResponse {
        /// The provider that answered
        provider: String,
        /// What was wrong with the payload
        message: String,
    },

    /// The response was well formed but the required field was absent or empty.
    #[error("Missing field: {provider} - {field}")]
    MissingField {
        /// The provider that answered
        provider: String,
        /// Name of the missing field
        field: String,
    },

    /// The numeric field could not be parsed or was not strictly positive.
    #[error("Invalid value: {provider} - {value:?}")]
    InvalidValue {
        /// The provider that answered
        provider: String,
        /// The raw value as received
        value: String,
    },
}

impl FetchError {
    /// Map a transport error from `reqwest`, keeping timeouts distinct.
    pub fn from_transport(provider: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else {
            Self::Network {
                provider: provider.to_string(),
                message: error.to_string(),
            }
        }
    }

    /// The provider that produced this failure.
    pub fn provider(&self) -> &str {
        match self {
            Self::Network { provider, .. }
            | Self::Timeout { provider }
            | Self::MalformedResponse { provider, .. }
            | Self::MissingField { provider, .. }
            | Self::InvalidValue { provider, .. } => provider,
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use fundwatch_market_data::errors::{FetchError, RetryClass};
    ///
    /// let error = FetchError::Timeout { provider: "TENCENT".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    ///
    /// let error = FetchError::MissingField {
    ///     provider: "SINA".to_string(),
    ///     field: "price".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => RetryClass::FailoverWithPenalty,
            Self::MalformedResponse { .. } | Self::MissingField { .. } | Self::InvalidValue { .. } => {
                RetryClass::NextProvider
            }
        }
    }
}

/// Rejection reasons for instrument registry mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The code is not made of exactly `expected` ASCII digits.
    #[error("Invalid instrument code {code:?}: expected {expected} digits")]
    InvalidCode { code: String, expected: usize },

    /// The code is already tracked.
    #[error("Instrument {0} is already tracked")]
    Duplicate(String),

    /// The validation fetch found missing data and the caller declined.
    #[error("Instrument {code} was not added: {reason}")]
    Declined { code: String, reason: String },
}

/// Monitor settings outside their allowed range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Interval {0}s is not one of 30, 60, 120, 300, 600")]
    InvalidInterval(u64),

    #[error("Alert threshold must be positive, got {0}")]
    InvalidThreshold(Decimal),

    #[error("Worker pool size must be at least 1")]
    EmptyPool,
}
