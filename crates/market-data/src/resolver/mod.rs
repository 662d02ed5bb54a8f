//! Fallback resolution.
//!
//! Walks one kind's source chain for one instrument, live providers first and
//! the cache pseudo-source last, stopping at the first usable value.

mod fallback;

#[cfg(test)]
mod fallback_tests;

pub use fallback::{FallbackResolver, Resolution, ResolvedValue, ResolverOptions, ValueOrigin};
