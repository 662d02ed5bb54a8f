use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{info, warn};

use crate::errors::RegistryError;
use crate::models::{placeholder_name, Instrument};

/// Number of digits in an instrument code.
pub const CODE_LENGTH: usize = 6;

/// Instruments tracked when no seed list is configured.
pub const DEFAULT_SEED_CODES: &[&str] = &[
    "161226", "162411", "160216", "162719", "501018", "501025", "168204", "165525", "160723",
];

/// Mutable list of tracked instruments, in insertion order.
///
/// Readers get a cloned snapshot so a dispatch cycle never holds the lock
/// while fetching.
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    instruments: RwLock<Vec<Instrument>>,
}

impl InstrumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded from `codes`. Duplicate seeds are skipped.
    pub fn with_codes<I, S>(codes: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::new();
        for code in codes {
            match registry.add_instrument(code.as_ref(), None) {
                Ok(_) => {}
                Err(RegistryError::Duplicate(code)) => {
                    warn!("Skipping duplicate seed code {}", code);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(registry)
    }

    pub fn with_default_seed() -> Self {
        let instruments = DEFAULT_SEED_CODES.iter().map(|c| Instrument::new(*c)).collect();
        Self {
            instruments: RwLock::new(instruments),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Instrument>> {
        self.instruments.read().unwrap_or_else(|poisoned| {
            warn!("Instrument registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Instrument>> {
        self.instruments.write().unwrap_or_else(|poisoned| {
            warn!("Instrument registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Trim `code` and check it is exactly [`CODE_LENGTH`] ASCII digits.
    pub fn validate_code(code: &str) -> Result<String, RegistryError> {
        let code = code.trim();
        if code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit()) {
            Ok(code.to_string())
        } else {
            Err(RegistryError::InvalidCode {
                code: code.to_string(),
                expected: CODE_LENGTH,
            })
        }
    }

    /// Validate `code` and make sure it is not tracked yet.
    pub fn check_candidate(&self, code: &str) -> Result<String, RegistryError> {
        let code = Self::validate_code(code)?;
        if self.contains(&code) {
            return Err(RegistryError::Duplicate(code));
        }
        Ok(code)
    }

    /// Append an instrument. `name` defaults to the placeholder.
    pub fn add_instrument(&self, code: &str, name: Option<&str>) -> Result<Instrument, RegistryError> {
        let code = Self::validate_code(code)?;
        let instrument = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Instrument::with_name(code.as_str(), name),
            None => Instrument::new(code.as_str()),
        };

        let mut instruments = self.write();
        if instruments.iter().any(|i| i.code == code) {
            return Err(RegistryError::Duplicate(code));
        }
        instruments.push(instrument.clone());
        info!("Tracking {} ({})", instrument.code, instrument.display_name);
        Ok(instrument)
    }

    pub fn remove(&self, code: &str) -> bool {
        let mut instruments = self.write();
        let before = instruments.len();
        instruments.retain(|i| i.code != code);
        instruments.len() != before
    }

    /// Replace a placeholder display name; real names are left alone.
    pub fn learn_name(&self, code: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let mut instruments = self.write();
        match instruments.iter_mut().find(|i| i.code == code) {
            Some(instrument) if instrument.display_name == placeholder_name(code) => {
                instrument.display_name = name.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, code: &str) -> Option<Instrument> {
        self.read().iter().find(|i| i.code == code).cloned()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.read().iter().any(|i| i.code == code)
    }

    pub fn snapshot(&self) -> Vec<Instrument> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
