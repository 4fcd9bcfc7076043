//! Engine facade
//!
//! The presentation boundary of the crate: one stateful front door that
//! wires the sensor client, scoring policy, session state, history log, and
//! polling controller together. The UI forwards intents (connect, start,
//! stop, select-metric) into this type and renders whatever it reads back;
//! it never computes scores itself.

use crate::controller::{PollingController, DEFAULT_POLL_INTERVAL};
use crate::error::EngineError;
use crate::history::HistoryStore;
use crate::scoring::ScoringPolicy;
use crate::sensor::SensorClient;
use crate::session::{SessionSnapshot, SessionState};
use crate::storage::KeyValueStore;
use crate::types::{ConnectionState, HistoryEntry, MetricAnalysis, MetricKind, UserProfile};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Engine configuration
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Period of the sample-and-score cycle
    pub poll_interval: Duration,
    /// Scoring policy (weights, reference ranges, thresholds)
    pub policy: ScoringPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            policy: ScoringPolicy::primary(),
        }
    }
}

/// Biometric acquisition and scoring engine.
///
/// The sample source is injected behind [`SensorClient`], so live HTTP and
/// simulated operation are indistinguishable from here on down.
pub struct StressEngine {
    sensor: Arc<dyn SensorClient>,
    session: SessionState,
    history: HistoryStore,
    controller: PollingController,
}

impl StressEngine {
    pub fn new(
        sensor: Arc<dyn SensorClient>,
        store: Arc<dyn KeyValueStore>,
        profile: UserProfile,
        config: EngineConfig,
    ) -> Self {
        let session = SessionState::new();
        let history = HistoryStore::new(store);
        let controller = PollingController::new(
            Arc::clone(&sensor),
            session.clone(),
            history.clone(),
            config.policy,
            profile,
            config.poll_interval,
        );

        Self {
            sensor,
            session,
            history,
            controller,
        }
    }

    /// Probe the configured sample source and record the outcome.
    ///
    /// One probe per call; reconnecting after a failure is always an
    /// explicit user action.
    pub async fn connect(&self) -> Result<(), EngineError> {
        self.session.set_connection(ConnectionState::Connecting);

        match self.sensor.probe().await {
            Ok(()) => {
                info!(source = %self.sensor.describe(), "connection verified");
                self.session.set_connection(ConnectionState::Connected);
                Ok(())
            }
            Err(e) => {
                let diagnostic = e.to_string();
                self.session
                    .set_connection(ConnectionState::Failed(diagnostic.clone()));
                Err(EngineError::ConnectionUnreachable(diagnostic))
            }
        }
    }

    /// Start the recurring monitoring cycle; requires a prior successful
    /// connect. Returns the id of the new monitoring run.
    pub fn start_monitoring(&mut self) -> Result<Uuid, EngineError> {
        self.controller.start()
    }

    /// Stop monitoring. Idempotent.
    pub fn stop_monitoring(&mut self) {
        self.controller.stop();
    }

    pub fn is_monitoring(&self) -> bool {
        self.controller.is_running()
    }

    /// Atomic view of the current session for rendering
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Durable history, oldest first. The caller reverses for display.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.load_all()
    }

    /// Summarize one metric over the recent window
    pub fn analyze_metric(&self, metric: MetricKind) -> MetricAnalysis {
        self.session.analyze(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SimulatedSensor;
    use crate::storage::MemoryStore;
    use crate::types::{MonitoringState, RawSample};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use pretty_assertions::assert_eq;

    fn make_engine(sensor: Arc<dyn SensorClient>, interval_ms: u64) -> StressEngine {
        StressEngine::new(
            sensor,
            Arc::new(MemoryStore::new()),
            UserProfile::new("ada", "34"),
            EngineConfig {
                poll_interval: Duration::from_millis(interval_ms),
                policy: ScoringPolicy::primary(),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_monitor_and_analyze() {
        let mut engine = make_engine(Arc::new(SimulatedSensor::new(3)), 10);

        engine.connect().await.unwrap();
        assert_eq!(engine.snapshot().connection, ConnectionState::Connected);

        engine.start_monitoring().unwrap();
        assert!(engine.is_monitoring());

        tokio::time::sleep(Duration::from_millis(45)).await;
        engine.stop_monitoring();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.monitoring, MonitoringState::Idle);
        assert!(snapshot.samples_seen >= 2);

        // Every component of the boundary reflects the same run
        let history = engine.history();
        assert_eq!(history.len() as u64, snapshot.samples_seen);
        assert!(history.iter().all(|e| e.user_name == "ada"));

        let analysis = engine.analyze_metric(MetricKind::Stress);
        assert_eq!(analysis.samples, snapshot.recent.len());
        assert!(analysis.latest.is_some());
        assert!(analysis.mean.unwrap() >= 0.0 && analysis.mean.unwrap() <= 100.0);
    }

    #[tokio::test]
    async fn test_start_without_connect_fails() {
        let mut engine = make_engine(Arc::new(SimulatedSensor::new(3)), 10);
        let err = engine.start_monitoring().unwrap_err();
        assert!(matches!(err, EngineError::NotConnected));
    }

    /// Sensor whose probe always fails
    struct UnreachableSensor;

    impl SensorClient for UnreachableSensor {
        fn probe(&self) -> BoxFuture<'_, Result<(), EngineError>> {
            async {
                Err(EngineError::ConnectionUnreachable(
                    "request timed out".to_string(),
                ))
            }
            .boxed()
        }

        fn fetch_sample(&self) -> BoxFuture<'_, Result<RawSample, EngineError>> {
            async {
                Err(EngineError::ConnectionUnreachable(
                    "request timed out".to_string(),
                ))
            }
            .boxed()
        }

        fn describe(&self) -> String {
            "unreachable sensor".to_string()
        }
    }

    #[tokio::test]
    async fn test_failed_probe_records_diagnostic() {
        let engine = make_engine(Arc::new(UnreachableSensor), 10);

        let err = engine.connect().await.unwrap_err();
        assert!(matches!(err, EngineError::ConnectionUnreachable(_)));

        match engine.snapshot().connection {
            ConnectionState::Failed(diagnostic) => {
                assert!(diagnostic.contains("timed out"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_survives_engine_restart() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        {
            let mut engine = StressEngine::new(
                Arc::new(SimulatedSensor::new(5)),
                Arc::clone(&store),
                UserProfile::new("ada", "34"),
                EngineConfig {
                    poll_interval: Duration::from_millis(5),
                    policy: ScoringPolicy::primary(),
                },
            );
            engine.connect().await.unwrap();
            engine.start_monitoring().unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            engine.stop_monitoring();
            assert!(!engine.history().is_empty());
        }

        // A new engine over the same store sees the earlier entries
        let engine = StressEngine::new(
            Arc::new(SimulatedSensor::new(6)),
            store,
            UserProfile::new("ada", "34"),
            EngineConfig::default(),
        );
        assert!(!engine.history().is_empty());
    }
}
