//! Per-source circuit breaker.
//!
//! A source that keeps failing at the transport level is taken out of its
//! chain for a cooldown period instead of costing every run a full
//! adapter timeout:
//!
//! - **Closed**: calls go through; consecutive failures are counted.
//! - **Open**: the source is skipped until the cooldown elapses.
//! - **HalfOpen**: probe calls go through; enough successes close the
//!   circuit, any failure reopens it.
//!
//! State lives in memory only.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

/// Circuit breaker state for one source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Closed => "Closed",
            Self::Open => "Open",
            Self::HalfOpen => "HalfOpen",
        };
        f.write_str(label)
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long an open circuit stays open.
    pub cooldown: Duration,
    /// Probe successes needed to close a half-open circuit.
    pub half_open_successes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
            half_open_successes: 2,
        }
    }
}

#[derive(Debug)]
struct SourceHealth {
    state: CircuitState,
    consecutive_failures: u32,
    probe_successes: u32,
    opened_at: Option<Instant>,
}

impl Default for SourceHealth {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            probe_successes: 0,
            opened_at: None,
        }
    }
}

impl SourceHealth {
    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.probe_successes = 0;
    }
}

/// Thread-safe circuit breaker keyed by source id.
pub struct CircuitBreaker {
    health: Mutex<HashMap<String, SourceHealth>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            health: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Lock the health table, recovering from poison.
    ///
    /// A poisoned table can at worst hold a slightly wrong failure count.
    fn lock_health(&self) -> MutexGuard<'_, HashMap<String, SourceHealth>> {
        self.health.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether a call to `source` may go ahead.
    ///
    /// Moves an open circuit to HalfOpen once its cooldown has elapsed.
    pub fn allows(&self, source: &str) -> bool {
        let mut table = self.lock_health();
        let Some(health) = table.get_mut(source) else {
            return true;
        };

        match health.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = health
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.cooldown)
                    .unwrap_or(true);
                if cooled_down {
                    info!("Circuit for '{}' half-open, probing", source);
                    health.state = CircuitState::HalfOpen;
                    health.probe_successes = 0;
                }
                cooled_down
            }
        }
    }

    pub fn record_success(&self, source: &str) {
        let mut table = self.lock_health();
        let health = table.entry(source.to_string()).or_default();

        health.consecutive_failures = 0;
        if health.state == CircuitState::HalfOpen {
            health.probe_successes += 1;
            if health.probe_successes >= self.config.half_open_successes {
                info!("Circuit for '{}' closed after recovery", source);
                *health = SourceHealth::default();
            }
        }
    }

    pub fn record_failure(&self, source: &str) {
        let mut table = self.lock_health();
        let health = table.entry(source.to_string()).or_default();

        health.consecutive_failures += 1;
        match health.state {
            CircuitState::Closed => {
                if health.consecutive_failures >= self.config.failure_threshold {
                    info!(
                        "Circuit for '{}' opened after {} consecutive failures",
                        source, health.consecutive_failures
                    );
                    health.open();
                } else {
                    debug!(
                        "Circuit for '{}': failure {}/{}",
                        source, health.consecutive_failures, self.config.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                info!("Circuit for '{}' reopened, probe failed", source);
                health.open();
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self, source: &str) -> CircuitState {
        self.lock_health()
            .get(source)
            .map(|h| h.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn reset(&self, source: &str) {
        self.lock_health().remove(source);
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
