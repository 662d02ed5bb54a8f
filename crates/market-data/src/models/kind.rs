use std::fmt;

use serde::{Deserialize, Serialize};

/// The two independent quantities fetched per instrument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Live traded price.
    Price,
    /// Reference value the price is compared against (net asset value).
    Reference,
}

impl DataKind {
    pub const ALL: [DataKind; 2] = [DataKind::Price, DataKind::Reference];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
