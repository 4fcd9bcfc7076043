//! Session state
//!
//! In-memory aggregate of the current readings, connection status, and
//! monitoring status, consumed read-only by the presentation layer.
//! Consumers always receive a cloned snapshot, so a renderer can never
//! observe a torn update.

use crate::types::{
    ConnectionState, MetricAnalysis, MetricKind, MonitoringState, StressBand, StressReading,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// Number of recent readings retained for display and analysis
pub const RECENT_WINDOW: usize = 10;

/// Shared handle to the session aggregate.
///
/// Cheap to clone; all clones view the same state.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<RwLock<SessionInner>>,
}

struct SessionInner {
    connection: ConnectionState,
    monitoring: MonitoringState,
    session_id: Option<Uuid>,
    latest: Option<StressReading>,
    recent: VecDeque<StressReading>,
    samples_seen: u64,
    last_error: Option<String>,
}

/// Value-type view of the session handed to renderers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub monitoring: MonitoringState,
    /// Identifier of the current monitoring run, if one has started
    pub session_id: Option<Uuid>,
    /// Most recent scored reading
    pub latest: Option<StressReading>,
    /// Last readings, oldest first
    pub recent: Vec<StressReading>,
    /// Total samples scored since the session began
    pub samples_seen: u64,
    /// Diagnostic from the most recent failure, if any
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// Band of the latest reading, defaulting to Normal before any sample
    pub fn current_band(&self) -> StressBand {
        self.latest.map(|r| r.band).unwrap_or(StressBand::Normal)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionInner {
                connection: ConnectionState::Disconnected,
                monitoring: MonitoringState::Idle,
                session_id: None,
                latest: None,
                recent: VecDeque::with_capacity(RECENT_WINDOW),
                samples_seen: 0,
                last_error: None,
            })),
        }
    }

    /// Record a scored reading, evicting the oldest beyond the window
    pub fn record_reading(&self, reading: StressReading) {
        let mut inner = self.inner.write();
        inner.recent.push_back(reading);
        while inner.recent.len() > RECENT_WINDOW {
            inner.recent.pop_front();
        }
        inner.latest = Some(reading);
        inner.samples_seen += 1;
        inner.last_error = None;
    }

    pub fn set_connection(&self, state: ConnectionState) {
        self.inner.write().connection = state;
    }

    pub fn set_monitoring(&self, state: MonitoringState) {
        self.inner.write().monitoring = state;
    }

    /// Mark the start of a monitoring run
    pub fn begin_run(&self, session_id: Uuid) {
        let mut inner = self.inner.write();
        inner.session_id = Some(session_id);
        inner.monitoring = MonitoringState::Running;
        inner.last_error = None;
    }

    /// Record a fatal cycle failure.
    ///
    /// Drops the connection along with the monitoring run: recovery is
    /// always an explicit reconnect followed by a restart.
    pub fn record_failure(&self, diagnostic: String) {
        let mut inner = self.inner.write();
        inner.monitoring = MonitoringState::StoppedOnError;
        inner.connection = ConnectionState::Failed(diagnostic.clone());
        inner.last_error = Some(diagnostic);
    }

    pub fn connection(&self) -> ConnectionState {
        self.inner.read().connection.clone()
    }

    pub fn monitoring(&self) -> MonitoringState {
        self.inner.read().monitoring
    }

    /// Atomic view of the whole aggregate
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.read();
        SessionSnapshot {
            connection: inner.connection.clone(),
            monitoring: inner.monitoring,
            session_id: inner.session_id,
            latest: inner.latest,
            recent: inner.recent.iter().copied().collect(),
            samples_seen: inner.samples_seen,
            last_error: inner.last_error.clone(),
        }
    }

    /// Summarize one metric over the recent window
    pub fn analyze(&self, metric: MetricKind) -> MetricAnalysis {
        let inner = self.inner.read();
        let values: Vec<f64> = inner.recent.iter().map(|r| metric_value(r, metric)).collect();

        let min = values.iter().copied().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |m| m.min(v)))
        });
        let max = values.iter().copied().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |m| m.max(v)))
        });
        let mean = if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        };

        MetricAnalysis {
            metric,
            samples: values.len(),
            latest: values.last().copied(),
            min,
            max,
            mean,
        }
    }
}

/// Extract the analyzed value for a metric from a reading.
/// Exhaustive over the closed metric set.
fn metric_value(reading: &StressReading, metric: MetricKind) -> f64 {
    match metric {
        MetricKind::Stress => reading.score,
        MetricKind::Temperature => reading.sample.temperature_c,
        MetricKind::Hrv => reading.sample.hrv_ms,
    }
}
