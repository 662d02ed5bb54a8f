use std::sync::Arc;

use fundwatch_market_data::{
    add_instrument_checked, default_providers, CircuitBreaker, FallbackResolver, FetchDispatcher,
    FetchOrchestrator, InstrumentRegistry, LogResultSink, Monitor, OrchestratorConfig,
    ResolverOptions, ResultSink, SourceRegistry, SourceStatusReport, TtlCacheStore,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, OutputFormat};
use crate::sink::JsonLinesSink;

pub struct AppState {
    pub sources: Arc<SourceRegistry>,
    pub cache: Arc<TtlCacheStore>,
    pub instruments: Arc<InstrumentRegistry>,
    pub orchestrator: Arc<FetchOrchestrator>,
    pub monitor: Monitor,
}

impl AppState {
    pub fn status_report(&self) -> SourceStatusReport {
        SourceStatusReport::collect(&self.sources, &self.cache)
    }
}

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let cache = Arc::new(TtlCacheStore::new());
    let sources = Arc::new(SourceRegistry::new(default_providers()));
    let resolver = FallbackResolver::new(Arc::clone(&sources), Arc::clone(&cache))
        .with_circuit_breaker(Arc::new(CircuitBreaker::new()))
        .with_options(ResolverOptions {
            stale_fallback: config.stale_fallback,
        });

    let instruments = Arc::new(InstrumentRegistry::with_codes(&config.codes)?);
    tracing::info!("Tracking {} instruments", instruments.len());

    let orchestrator_config = OrchestratorConfig {
        reuse_snapshot: config.reuse_snapshot,
        ..OrchestratorConfig::with_threshold(config.alert_threshold)?
    };
    let orchestrator = Arc::new(
        FetchOrchestrator::new(Arc::new(resolver), orchestrator_config)
            .with_instrument_registry(Arc::clone(&instruments)),
    );
    let dispatcher = Arc::new(FetchDispatcher::new(Arc::clone(&orchestrator), config.dispatch()));

    let sink: Arc<dyn ResultSink> = match config.output_format {
        OutputFormat::Json => Arc::new(JsonLinesSink),
        OutputFormat::Text => Arc::new(LogResultSink),
    };
    let monitor = Monitor::new(dispatcher, Arc::clone(&instruments), sink)
        .with_interval(config.interval_secs)?;

    Ok(Arc::new(AppState {
        sources,
        cache,
        instruments,
        orchestrator,
        monitor,
    }))
}

/// Add `FW_ADD_CODES` through the validated admission path.
pub async fn add_configured_codes(state: &AppState, config: &Config) {
    for code in &config.add_codes {
        let outcome = add_instrument_checked(
            &state.instruments,
            &state.orchestrator,
            code,
            None,
            |code, warning| {
                if config.add_require_data {
                    tracing::warn!("Declining {}: {}", code, warning);
                    false
                } else {
                    tracing::warn!("Adding {} despite incomplete data: {}", code, warning);
                    true
                }
            },
        )
        .await;

        match outcome {
            Ok(instrument) => tracing::info!("Added {} ({})", instrument.code, instrument.display_name),
            Err(e) => tracing::warn!("Could not add {}: {}", code, e),
        }
    }
}
