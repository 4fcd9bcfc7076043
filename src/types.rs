//! Core types for the stressmon engine
//!
//! This module defines the data structures that flow through each stage of the
//! acquisition pipeline: raw device samples, normalized metrics, scored
//! readings, and the durable history record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw physiological sample as reported by the sensor device.
///
/// Ephemeral: samples are scored and then discarded; only the resulting
/// score is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Galvanic skin response in device ADC units (0-1023)
    pub gsr: f64,
    /// Skin temperature (celsius)
    pub temperature_c: f64,
    /// Heart rate variability (ms between beats)
    pub hrv_ms: f64,
}

/// Sub-scores derived from a raw sample before fusion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetrics {
    /// GSR as a percentage of the ADC range (0-100)
    pub gsr_pct: f64,
    /// HRV mapped onto the stress reference range (0-100)
    pub hrv_stress_pct: f64,
    /// Score-point penalty for deviation from euthermic baseline (>= 0)
    pub temp_deviation: f64,
}

/// Qualitative classification of a composite stress score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressBand {
    Normal,
    Moderate,
    High,
}

impl StressBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressBand::Normal => "normal",
            StressBand::Moderate => "moderate",
            StressBand::High => "high",
        }
    }
}

/// A fully scored sample: the raw signals, their normalized sub-scores, and
/// the fused composite with its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressReading {
    /// The raw sample this reading was derived from
    pub sample: RawSample,
    /// Normalized sub-scores
    pub metrics: NormalizedMetrics,
    /// Composite stress score, always within [0, 100]
    pub score: f64,
    /// Band classification of the score
    pub band: StressBand,
    /// When the sample was scored (UTC)
    pub observed_at: DateTime<Utc>,
}

/// Connection lifecycle of the sensor device.
///
/// Written by the engine during connect attempts; the presentation layer
/// only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Probe failed; carries a human-readable diagnostic
    Failed(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Monitoring lifecycle, owned exclusively by the polling controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringState {
    Idle,
    Running,
    /// A cycle failed; monitoring halted and requires an explicit restart
    StoppedOnError,
}

/// One durable history row.
///
/// Immutable once appended; the engine never mutates or prunes entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Profile name the session was tagged with
    pub user_name: String,
    /// When the sample was scored (UTC, RFC 3339 on disk)
    pub timestamp: DateTime<Utc>,
    /// Composite score rounded to the nearest point
    pub stress_score: u32,
}

/// Session owner identity, created once at session start and used only to
/// tag history entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: String,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, age: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: age.into(),
        }
    }
}

/// Closed set of metrics the presentation layer can select for analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Stress,
    Temperature,
    Hrv,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Stress => "stress",
            MetricKind::Temperature => "temperature",
            MetricKind::Hrv => "hrv",
        }
    }
}

/// Summary statistics for one selected metric over the recent window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricAnalysis {
    pub metric: MetricKind,
    /// Number of readings the summary covers
    pub samples: usize,
    pub latest: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}
