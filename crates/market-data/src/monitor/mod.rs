//! Interval-driven monitor loop.
//!
//! State machine: `Idle -> Running -> Stopping -> Idle`. The loop runs one
//! dispatch cycle, then sleeps for `max(1s, interval - elapsed)` while
//! checking the stop flag every second.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use crate::dispatcher::{CycleSummary, FetchDispatcher};
use crate::errors::ConfigError;
use crate::events::ResultSink;
use crate::instruments::InstrumentRegistry;

/// Intervals the monitor accepts, in seconds.
pub const ALLOWED_INTERVAL_SECS: [u64; 5] = [30, 60, 120, 300, 600];

pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Granularity of stop checks.
const STOP_POLL: Duration = Duration::from_secs(1);

/// Shortest pause between two cycles.
const MIN_PAUSE: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Running,
    Stopping,
}

/// Check `secs` against [`ALLOWED_INTERVAL_SECS`].
pub fn validate_interval(secs: u64) -> Result<u64, ConfigError> {
    if ALLOWED_INTERVAL_SECS.contains(&secs) {
        Ok(secs)
    } else {
        Err(ConfigError::InvalidInterval(secs))
    }
}

struct MonitorInner {
    dispatcher: Arc<FetchDispatcher>,
    instruments: Arc<InstrumentRegistry>,
    sink: Arc<dyn ResultSink>,
    state: Mutex<MonitorState>,
    stop_requested: AtomicBool,
    interval_secs: AtomicU64,
    cycles: AtomicU64,
}

impl MonitorInner {
    fn lock_state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Monitor state mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.load(Ordering::SeqCst))
    }

    async fn run_cycle(&self) -> CycleSummary {
        let summary = self
            .dispatcher
            .dispatch_cycle(self.instruments.snapshot(), Arc::clone(&self.sink))
            .await;
        self.cycles.fetch_add(1, Ordering::SeqCst);
        summary
    }

    /// Resolves once a stop has been requested.
    async fn wait_for_stop(&self) {
        while !self.stop_requested() {
            sleep(STOP_POLL).await;
        }
    }

    /// Sleep for `duration`; returns false if a stop interrupted it.
    async fn pause(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.stop_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            sleep(STOP_POLL.min(deadline - now)).await;
        }
    }
}

/// Puts the monitor back to Idle when the loop task ends, panics included.
struct IdleOnExit(Arc<MonitorInner>);

impl Drop for IdleOnExit {
    fn drop(&mut self) {
        let mut state = self.0.lock_state();
        *state = MonitorState::Idle;
        self.0.stop_requested.store(false, Ordering::SeqCst);
        info!("Monitor stopped");
    }
}

async fn run_loop(inner: Arc<MonitorInner>) {
    let _idle = IdleOnExit(Arc::clone(&inner));
    info!("Monitor started, interval {:?}", inner.interval());

    while !inner.stop_requested() {
        let started = Instant::now();
        tokio::select! {
            _ = inner.run_cycle() => {}
            _ = inner.wait_for_stop() => {
                info!("Stop requested during a cycle, dropping its remaining results");
                break;
            }
        }

        let pause = inner.interval().saturating_sub(started.elapsed()).max(MIN_PAUSE);
        debug!("Next cycle in {:?}", pause);
        if !inner.pause(pause).await {
            break;
        }
    }
}

/// Cancellable scheduler around a [`FetchDispatcher`].
///
/// `start` and `stop` are idempotent: starting a running monitor or
/// stopping an idle one changes nothing and returns `false`.
pub struct Monitor {
    inner: Arc<MonitorInner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Monitor {
    pub fn new(
        dispatcher: Arc<FetchDispatcher>,
        instruments: Arc<InstrumentRegistry>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                dispatcher,
                instruments,
                sink,
                state: Mutex::new(MonitorState::Idle),
                stop_requested: AtomicBool::new(false),
                interval_secs: AtomicU64::new(DEFAULT_INTERVAL_SECS),
                cycles: AtomicU64::new(0),
            }),
            handle: Mutex::new(None),
        }
    }

    pub fn with_interval(self, secs: u64) -> Result<Self, ConfigError> {
        self.set_interval(secs)?;
        Ok(self)
    }

    /// Change the interval; takes effect at the next pause.
    pub fn set_interval(&self, secs: u64) -> Result<(), ConfigError> {
        let secs = validate_interval(secs)?;
        self.inner.interval_secs.store(secs, Ordering::SeqCst);
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval()
    }

    pub fn state(&self) -> MonitorState {
        *self.inner.lock_state()
    }

    /// Number of dispatch cycles finished by the loop or `run_once`.
    pub fn cycles_completed(&self) -> u64 {
        self.inner.cycles.load(Ordering::SeqCst)
    }

    fn lock_handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(|poisoned| {
            warn!("Monitor handle mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Idle -> Running. Must be called within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut state = self.inner.lock_state();
        if *state != MonitorState::Idle {
            debug!("Monitor already {:?}, start ignored", *state);
            return false;
        }
        *state = MonitorState::Running;
        self.inner.stop_requested.store(false, Ordering::SeqCst);
        let handle = tokio::spawn(run_loop(Arc::clone(&self.inner)));
        *self.lock_handle() = Some(handle);
        true
    }

    /// Running -> Stopping. The loop reaches Idle within about a second.
    pub fn stop(&self) -> bool {
        let mut state = self.inner.lock_state();
        if *state != MonitorState::Running {
            debug!("Monitor {:?}, stop ignored", *state);
            return false;
        }
        *state = MonitorState::Stopping;
        self.inner.stop_requested.store(true, Ordering::SeqCst);
        info!("Monitor stopping");
        true
    }

    /// Wait for the loop task to finish.
    pub async fn join(&self) {
        let handle = self.lock_handle().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Monitor loop ended abnormally: {}", e);
            }
        }
    }

    /// Run one cycle on the caller's task, independent of the loop state.
    pub async fn run_once(&self) -> CycleSummary {
        self.inner.run_cycle().await
    }
}
