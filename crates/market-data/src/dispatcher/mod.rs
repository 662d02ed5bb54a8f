//! Concurrent fetch dispatch.
//!
//! Runs the orchestrator for every tracked instrument on a bounded worker
//! pool and streams completed results through a single consumer to the sink.

mod fetch_dispatcher;
mod summary;

pub use fetch_dispatcher::{DispatchConfig, FetchDispatcher};
pub use summary::CycleSummary;
