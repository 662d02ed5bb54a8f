//! Per-instrument orchestration.
//!
//! One run resolves price and reference concurrently, refreshes the cache
//! with live values, derives the metric and classifies it.

mod fetch_orchestrator;


pub use fetch_orchestrator::{build_result, FetchOrchestrator, OrchestratorConfig, SNAPSHOT_DATA_SOURCE};
