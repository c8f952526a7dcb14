// src/services/statistics_service.rs
//
// Statistics Service - supervises background aggregation runs
//
// CRITICAL RULES:
// - At most one run in flight per service; a second request is dropped
// - A run executes on its own blocking worker, never on the caller
// - Events reach the caller in emission order, over one channel
// - Every started run ends with exactly one terminal event

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::{StatisticsRecord, StatsEvent, StatsFailure, StatsSnapshot};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, StatisticsRebuilt, StatisticsRunFailed};
use crate::repositories::StatisticsRepository;
use crate::services::stats_task::{StatsOptions, StatsSources, StatsTask};

/// Receives the events of a run
pub trait StatsObserver: Send + Sync {
    fn on_stats_event(&self, event: &StatsEvent);
}

impl<F> StatsObserver for F
where
    F: Fn(&StatsEvent) + Send + Sync,
{
    fn on_stats_event(&self, event: &StatsEvent) {
        self(event)
    }
}

/// Clears the in-flight flag when the worker is done, even on unwind
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Handle to one statistics run.
///
/// Dropping the handle cancels the run.
pub struct StatsRun {
    events: mpsc::UnboundedReceiver<StatsEvent>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
    last_snapshot: StatsSnapshot,
    finished: bool,
}

impl StatsRun {
    /// Next event of the run, `None` once the terminal event was returned
    pub async fn next_event(&mut self) -> Option<StatsEvent> {
        if self.finished {
            return None;
        }

        match self.events.recv().await {
            Some(event) => {
                self.last_snapshot = *event.snapshot();
                self.finished = event.is_final();
                Some(event)
            }
            None => {
                // The worker went away without reporting, e.g. runtime shutdown
                self.finished = true;
                log::error!("Stats worker exited without a terminal event");
                Some(StatsEvent::Failed {
                    snapshot: self.last_snapshot,
                    failure: StatsFailure::WorkerPanicked,
                })
            }
        }
    }

    /// Ask the worker to stop at its next cancellation check
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the worker thread has returned
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Skip intermediate events and return the terminal one
    pub async fn wait_final(mut self) -> StatsEvent {
        self.forward(None).await
    }

    /// Deliver every event to `observer`, in order, and return the terminal one
    pub async fn forward_to(mut self, observer: &dyn StatsObserver) -> StatsEvent {
        self.forward(Some(observer)).await
    }

    async fn forward(&mut self, observer: Option<&dyn StatsObserver>) -> StatsEvent {
        loop {
            let event = match self.next_event().await {
                Some(event) => event,
                None => {
                    return StatsEvent::Failed {
                        snapshot: self.last_snapshot,
                        failure: StatsFailure::WorkerPanicked,
                    }
                }
            };
            if let Some(observer) = observer {
                observer.on_stats_event(&event);
            }
            if event.is_final() {
                return event;
            }
        }
    }
}

impl Drop for StatsRun {
    fn drop(&mut self) {
        if !self.finished {
            self.cancel.cancel();
        }
    }
}

/// The last persisted snapshot and whether the library moved on since
#[derive(Debug, Clone)]
pub struct CachedStatistics {
    pub record: StatisticsRecord,
    pub stale: bool,
}

pub struct StatisticsService {
    sources: StatsSources,
    statistics_repo: Arc<dyn StatisticsRepository>,
    event_bus: Arc<EventBus>,
    options: StatsOptions,
    in_flight: Arc<AtomicBool>,
}

impl StatisticsService {
    pub fn new(
        sources: StatsSources,
        statistics_repo: Arc<dyn StatisticsRepository>,
        event_bus: Arc<EventBus>,
        options: StatsOptions,
    ) -> Self {
        Self {
            sources,
            statistics_repo,
            event_bus,
            options,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn options(&self) -> StatsOptions {
        self.options
    }

    /// Start a run with the service's options.
    ///
    /// Returns `Ok(None)` when a run is already in flight; the request is dropped.
    /// Must be called from within a Tokio runtime.
    pub fn start_run(&self) -> AppResult<Option<StatsRun>> {
        self.start_run_with(self.options)
    }

    pub fn start_run_with(&self, options: StatsOptions) -> AppResult<Option<StatsRun>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::Other(format!("Statistics need a Tokio runtime: {}", e)))?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("Stats run already in flight, dropping request");
            return Ok(None);
        }
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = StatsTask::new(self.sources.clone(), options, cancel.clone());
        let statistics_repo = Arc::clone(&self.statistics_repo);
        let event_bus = Arc::clone(&self.event_bus);

        log::info!(
            "Starting stats run (exclude_specials: {})",
            options.exclude_specials
        );

        let worker = runtime.spawn_blocking(move || {
            let mut last_snapshot = StatsSnapshot::empty();
            let mut revision = None;

            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                // Read before any count, so writes during the run leave the record stale
                revision = statistics_repo
                    .library_revision()
                    .map_err(|e| log::warn!("Could not read library revision: {}", e))
                    .ok();

                task.run(&mut |event| {
                    last_snapshot = *event.snapshot();
                    // A closed channel only means nobody listens anymore
                    let _ = tx.send(event);
                })
            }));

            let terminal = outcome.unwrap_or_else(|panic| {
                log::error!("Stats worker panicked: {:?}", panic);
                StatsEvent::Failed {
                    snapshot: last_snapshot,
                    failure: StatsFailure::WorkerPanicked,
                }
            });

            record_outcome(&terminal, revision, statistics_repo.as_ref(), &event_bus);

            drop(guard);
            let _ = tx.send(terminal);
        });

        Ok(Some(StatsRun {
            events: rx,
            cancel,
            worker,
            last_snapshot: StatsSnapshot::empty(),
            finished: false,
        }))
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Last successful snapshot, if any run ever finished.
    ///
    /// Staleness comes from the store, so it holds across processes.
    pub fn cached_statistics(&self) -> AppResult<Option<CachedStatistics>> {
        let Some(record) = self.statistics_repo.latest_record()? else {
            return Ok(None);
        };
        let current = self.statistics_repo.library_revision()?;

        Ok(Some(CachedStatistics {
            stale: record.is_stale(current),
            record,
        }))
    }
}

/// Persist a successful snapshot and announce how the run ended
fn record_outcome(
    terminal: &StatsEvent,
    revision: Option<i64>,
    statistics_repo: &dyn StatisticsRepository,
    event_bus: &EventBus,
) {
    match terminal {
        StatsEvent::Finished { snapshot } => {
            match revision {
                Some(revision) => {
                    let record = StatisticsRecord::new(*snapshot, revision);
                    if let Err(e) = statistics_repo.save_record(&record) {
                        log::warn!("Could not persist statistics snapshot: {}", e);
                    }
                }
                None => log::warn!("Statistics snapshot not persisted, library revision unknown"),
            }
            event_bus.emit(StatisticsRebuilt::new(*snapshot));
        }
        StatsEvent::Failed { failure, .. } => {
            event_bus.emit(StatisticsRunFailed::new(*failure));
        }
        StatsEvent::Progress { .. } => {}
    }
}
