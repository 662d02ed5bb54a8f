//! Result delivery.
//!
//! Provides the sink trait the dispatcher's consumer forwards results to.
//! Runtime adapters (log lines, JSON on stdout, a UI) implement the sink.

mod sink;

pub use sink::*;
