//! Stressmon - biometric acquisition and scoring engine
//!
//! Stressmon polls a networked sensor device for raw physiological signals
//! (GSR, skin temperature, HRV), fuses them into a composite stress score
//! through a deterministic pipeline, and keeps a durable per-user history:
//! sensor fetch → normalization → weighted fusion → band classification →
//! session update + history append.
//!
//! ## Modules
//!
//! - **Sensor clients**: live HTTP device polling and a simulated source
//! - **Scoring**: configurable normalization, fusion, and classification
//! - **Polling controller**: cancellable fixed-interval acquisition loop
//! - **Session & history**: renderer-facing state and the append-only log

pub mod controller;
pub mod engine;
pub mod error;
pub mod history;
pub mod scoring;
pub mod sensor;
pub mod session;
pub mod storage;
pub mod types;

pub use controller::{PollingController, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use engine::{EngineConfig, StressEngine};
pub use error::EngineError;
pub use history::{HistoryStore, HISTORY_KEY};
pub use scoring::ScoringPolicy;
pub use sensor::{HttpSensorClient, SensorClient, SimulatedSensor};
pub use session::{SessionSnapshot, SessionState, RECENT_WINDOW};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::{
    ConnectionState, HistoryEntry, MetricAnalysis, MetricKind, MonitoringState, NormalizedMetrics,
    RawSample, StressBand, StressReading, UserProfile,
};

/// Engine version embedded in diagnostics
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name used in logs and CLI output
pub const PRODUCER_NAME: &str = "stressmon";
