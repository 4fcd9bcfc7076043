//! Polling controller
//!
//! Owns the monitoring lifecycle: the recurring sample-and-score cycle, the
//! cancellable task handle, and the stop-on-error transition. The controller
//! is the only writer of [`MonitoringState`].
//!
//! Cycles are serialized: the next tick is not processed until the previous
//! fetch completes, so out-of-order writes cannot occur. Stopping cancels
//! the pending schedule, and an in-flight fetch that resolves after `stop()`
//! is discarded without touching session state.

use crate::error::EngineError;
use crate::history::HistoryStore;
use crate::scoring::ScoringPolicy;
use crate::sensor::SensorClient;
use crate::session::SessionState;
use crate::types::{HistoryEntry, MonitoringState, UserProfile};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default period of the sample-and-score cycle
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Shortest accepted poll period. A zero period would panic the interval
/// timer inside the spawned task, leaving the session stuck in Running.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Owned handle to a running poll loop
struct PollTask {
    handle: JoinHandle<()>,
    cancel: watch::Sender<bool>,
}

/// Start/stop state machine driving the acquisition loop
pub struct PollingController {
    sensor: Arc<dyn SensorClient>,
    session: SessionState,
    history: HistoryStore,
    policy: ScoringPolicy,
    profile: UserProfile,
    poll_interval: Duration,
    task: Option<PollTask>,
}

impl PollingController {
    pub fn new(
        sensor: Arc<dyn SensorClient>,
        session: SessionState,
        history: HistoryStore,
        policy: ScoringPolicy,
        profile: UserProfile,
        poll_interval: Duration,
    ) -> Self {
        Self {
            sensor,
            session,
            history,
            policy,
            profile,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            task: None,
        }
    }

    /// Begin the recurring sample-and-score cycle.
    ///
    /// Fails fast with [`EngineError::NotConnected`] unless the session has
    /// an active device connection. Returns the id of the new monitoring run.
    pub fn start(&mut self) -> Result<Uuid, EngineError> {
        if !self.session.connection().is_connected() {
            return Err(EngineError::NotConnected);
        }
        if self.session.monitoring() == MonitoringState::Running {
            return Err(EngineError::AlreadyRunning);
        }

        // A finished loop (stopped on error) may still hold a stale task
        self.cancel_task();

        let session_id = Uuid::new_v4();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        self.session.begin_run(session_id);
        debug!(%session_id, source = %self.sensor.describe(), "monitoring started");

        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.sensor),
            self.session.clone(),
            self.history.clone(),
            self.policy,
            self.profile.clone(),
            self.poll_interval,
            cancel_rx,
        ));

        self.task = Some(PollTask {
            handle,
            cancel: cancel_tx,
        });
        Ok(session_id)
    }

    /// Cancel the recurring schedule and return to Idle.
    ///
    /// Idempotent: stopping an idle controller is a no-op.
    pub fn stop(&mut self) {
        self.cancel_task();
        if self.session.monitoring() != MonitoringState::Idle {
            self.session.set_monitoring(MonitoringState::Idle);
            debug!("monitoring stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.monitoring() == MonitoringState::Running
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            // Signal first so a blocked cycle unwinds cleanly, then abort
            // whatever remains
            let _ = task.cancel.send(true);
            task.handle.abort();
        }
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        // A schedule must never outlive its owning session
        self.cancel_task();
    }
}

async fn poll_loop(
    sensor: Arc<dyn SensorClient>,
    session: SessionState,
    history: HistoryStore,
    policy: ScoringPolicy,
    profile: UserProfile,
    poll_interval: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    // Serialize cycles: a slow fetch delays the next tick instead of
    // letting ticks pile up
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.changed() => return,
        }

        // Race the fetch against cancellation: a result that arrives after
        // stop() must not mutate session state
        let fetched = tokio::select! {
            result = sensor.fetch_sample() => result,
            _ = cancel.changed() => return,
        };

        match fetched {
            Ok(sample) => {
                let reading = policy.score(sample);
                if *cancel.borrow() {
                    return;
                }
                debug!(score = reading.score, band = reading.band.as_str(), "sample scored");
                session.record_reading(reading);
                history.append(HistoryEntry {
                    user_name: profile.name.clone(),
                    timestamp: reading.observed_at,
                    stress_score: reading.score.round() as u32,
                });
            }
            Err(e) => {
                // No auto-retry: the user must reconnect and restart
                warn!(error = %e, "sample cycle failed; monitoring halted");
                session.record_failure(e.to_string());
                return;
            }
        }
    }
}
