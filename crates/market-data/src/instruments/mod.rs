//! Tracked instruments.
//!
//! - `registry` - The runtime instrument list shared with the worker pool
//! - `admission` - Adding an instrument after a one-shot validation fetch

mod admission;
mod registry;

pub use admission::{add_instrument_checked, ValidationWarning};
pub use registry::{InstrumentRegistry, CODE_LENGTH, DEFAULT_SEED_CODES};
