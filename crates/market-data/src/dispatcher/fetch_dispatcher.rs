use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};

use super::CycleSummary;
use crate::errors::ConfigError;
use crate::events::ResultSink;
use crate::models::{FetchResult, Instrument};
use crate::orchestrator::FetchOrchestrator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Orchestrator runs in flight at once.
    pub pool_size: usize,
    /// Hard ceiling for one instrument's run.
    pub run_timeout: Duration,
    /// Overall deadline after which outstanding runs are abandoned.
    pub cycle_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            run_timeout: Duration::from_secs(15),
            cycle_timeout: Duration::from_secs(30),
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        Ok(())
    }
}

enum RunOutcome {
    Completed(Box<FetchResult>),
    TimedOut(String),
    Failed(String),
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Fans one cycle out over a bounded pool of orchestrator runs.
///
/// The pool is shared by every cycle, so a laggard run from an earlier
/// cycle keeps its slot until it really ends.
pub struct FetchDispatcher {
    orchestrator: Arc<FetchOrchestrator>,
    config: DispatchConfig,
    pool: Arc<Semaphore>,
}

impl FetchDispatcher {
    pub fn new(orchestrator: Arc<FetchOrchestrator>, config: DispatchConfig) -> Self {
        Self {
            orchestrator,
            config,
            pool: Arc::new(Semaphore::new(config.pool_size.max(1))),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<FetchOrchestrator> {
        &self.orchestrator
    }

    /// Run one cycle over `instruments`, streaming results to `sink`.
    ///
    /// Results reach the sink in completion order, followed by the cycle
    /// summary. Returns once every run has settled or the cycle deadline
    /// passed. Runs already started at that point keep their pool slot until
    /// they finish and their results are dropped; runs still waiting for a
    /// slot never start. Dropping the returned future stops delivery
    /// immediately.
    pub async fn dispatch_cycle(
        &self,
        instruments: Vec<Instrument>,
        sink: Arc<dyn ResultSink>,
    ) -> CycleSummary {
        let started = Instant::now();
        let deadline = started + self.config.cycle_timeout;
        let summary = CycleSummary::new(instruments.len(), self.orchestrator.config().alert_threshold);
        info!(
            "Cycle {} started: {} instruments, pool size {}",
            summary.cycle_id,
            instruments.len(),
            self.config.pool_size
        );

        let (tx, rx) = mpsc::channel::<RunOutcome>(self.config.pool_size.max(1));

        let mut consumer = AbortOnDrop(tokio::spawn(delivery_worker(
            rx,
            Arc::clone(&sink),
            started,
            deadline,
            summary.clone(),
        )));

        for instrument in instruments {
            let pool = Arc::clone(&self.pool);
            let tx = tx.clone();
            let orchestrator = Arc::clone(&self.orchestrator);
            let run_timeout = self.config.run_timeout;

            tokio::spawn(async move {
                let Ok(permit) = pool.acquire_owned().await else {
                    return;
                };
                // The cycle this run belonged to is already over.
                if tx.is_closed() {
                    return;
                }
                let code = instrument.code.clone();
                let run = tokio::spawn(async move {
                    let _permit = permit;
                    orchestrator.run(&instrument).await
                });

                let outcome = match timeout(run_timeout, run).await {
                    Ok(Ok(result)) => RunOutcome::Completed(Box::new(result)),
                    Ok(Err(e)) => {
                        warn!("Run for {} failed: {}", code, e);
                        RunOutcome::Failed(code)
                    }
                    Err(_) => {
                        warn!("Run for {} exceeded {:?}, abandoning for this cycle", code, run_timeout);
                        RunOutcome::TimedOut(code)
                    }
                };

                if tx.send(outcome).await.is_err() {
                    debug!("Delivery queue closed, dropping late result");
                }
            });
        }
        drop(tx);

        let summary = match (&mut consumer.0).await {
            Ok(done) => done,
            Err(e) => {
                warn!("Delivery worker stopped: {}", e);
                let mut partial = summary;
                partial.abandoned = partial.total;
                partial.elapsed_ms = elapsed_ms(started);
                partial
            }
        };
        info!("Cycle {} finished in {} ms: {}", summary.cycle_id, summary.elapsed_ms, summary);
        summary
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Single consumer: forwards outcomes to the sink until every run has
/// settled or `deadline` passes, then delivers the summary.
async fn delivery_worker(
    mut rx: mpsc::Receiver<RunOutcome>,
    sink: Arc<dyn ResultSink>,
    started: Instant,
    deadline: Instant,
    mut summary: CycleSummary,
) -> CycleSummary {
    loop {
        tokio::select! {
            outcome = rx.recv() => match outcome {
                Some(RunOutcome::Completed(result)) => {
                    summary.record(&result);
                    sink.on_result(*result);
                }
                Some(RunOutcome::TimedOut(code)) => summary.timed_out.push(code),
                Some(RunOutcome::Failed(code)) => summary.failed.push(code),
                None => break,
            },
            _ = sleep_until(deadline) => {
                warn!(
                    "Cycle {} deadline reached with {}/{} runs settled",
                    summary.cycle_id,
                    summary.settled(),
                    summary.total
                );
                break;
            }
        }
    }

    summary.abandoned = summary.total.saturating_sub(summary.settled());
    summary.elapsed_ms = elapsed_ms(started);
    sink.on_cycle_summary(summary.clone());
    summary
}
