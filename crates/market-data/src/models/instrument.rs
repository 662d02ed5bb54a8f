use serde::{Deserialize, Serialize};

/// A tracked instrument.
///
/// `display_name` starts out as a placeholder derived from the code and is
/// replaced by the first name a provider reports.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub code: String,
    pub display_name: String,
}

impl Instrument {
    /// Create an instrument with the placeholder display name.
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let display_name = placeholder_name(&code);
        Self { code, display_name }
    }

    /// Create an instrument with an explicit display name.
    pub fn with_name(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
        }
    }

    /// True while no provider or caller has supplied a real name.
    pub fn has_placeholder_name(&self) -> bool {
        self.display_name == placeholder_name(&self.code)
    }

    pub fn market(&self) -> Market {
        Market::for_code(&self.code)
    }
}

/// Placeholder display name used until a provider reports one.
pub fn placeholder_name(code: &str) -> String {
    format!("Fund {}", code)
}

/// Exchange an instrument code is listed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Market {
    Shenzhen,
    Shanghai,
}

impl Market {
    /// Derive the exchange from the code prefix.
    ///
    /// Codes starting with `15`/`16` trade in Shenzhen and `50`/`51` in
    /// Shanghai; anything else is assumed to be Shenzhen.
    pub fn for_code(code: &str) -> Self {
        if code.starts_with("50") || code.starts_with("51") {
            Self::Shanghai
        } else {
            Self::Shenzhen
        }
    }

    /// Prefix used by quote endpoints, e.g. `sz161226`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Shenzhen => "sz",
            Self::Shanghai => "sh",
        }
    }
}
