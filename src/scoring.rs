//! Stress scoring
//!
//! Pure, deterministic mapping from raw samples to composite stress scores:
//! - Per-signal normalization onto 0-100 sub-scores
//! - Weighted fusion, clamped to [0, 100]
//! - Band classification with fixed breakpoints
//!
//! Weights, reference ranges, and thresholds are carried as data so the
//! divergent fusion variants observed in the field are parameter choices,
//! not duplicated code paths.

use crate::types::{NormalizedMetrics, RawSample, StressBand, StressReading};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Full-scale reading of the device GSR ADC
pub const GSR_ADC_FULL_SCALE: f64 = 1023.0;

/// Scoring configuration: fusion weights, reference ranges, and band
/// thresholds.
///
/// Every function on this type is total: out-of-range inputs clamp, never
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Weight of the GSR sub-score in the fusion
    pub gsr_weight: f64,
    /// Weight of the inverted HRV sub-score in the fusion
    pub hrv_weight: f64,
    /// Weight of the temperature contribution in the fusion
    pub temp_weight: f64,
    /// HRV range (ms) mapped linearly onto 0-100; values outside clamp
    pub hrv_range_ms: (f64, f64),
    /// Euthermic baseline temperature (celsius)
    pub temp_baseline_c: f64,
    /// Score-point penalty per degree of deviation from baseline
    pub temp_penalty_per_degree: f64,
    /// Scores above this are at least Moderate
    pub moderate_threshold: f64,
    /// Scores above this are High
    pub high_threshold: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::primary()
    }
}

impl ScoringPolicy {
    /// Primary fusion: 0.2 GSR / 0.5 inverted HRV / 0.3 temperature
    pub fn primary() -> Self {
        Self {
            gsr_weight: 0.2,
            hrv_weight: 0.5,
            temp_weight: 0.3,
            hrv_range_ms: (0.0, 100.0),
            temp_baseline_c: 37.0,
            temp_penalty_per_degree: 20.0,
            moderate_threshold: 40.0,
            high_threshold: 70.0,
        }
    }

    /// "Overall stress" fusion variant: 0.6 GSR / 0.2 HRV deficit /
    /// 0.2 temperature deviation, same ranges and thresholds
    pub fn overall() -> Self {
        Self {
            gsr_weight: 0.6,
            hrv_weight: 0.2,
            temp_weight: 0.2,
            ..Self::primary()
        }
    }

    /// Normalize GSR from ADC units to 0-100
    pub fn normalize_gsr(&self, gsr: f64) -> f64 {
        (gsr / GSR_ADC_FULL_SCALE * 100.0).clamp(0.0, 100.0)
    }

    /// Map HRV linearly over the configured stress reference range to 0-100.
    /// Values outside the range clamp rather than extrapolate.
    pub fn normalize_hrv_for_stress(&self, hrv_ms: f64) -> f64 {
        let (lo, hi) = self.hrv_range_ms;
        if hi <= lo {
            return 0.0;
        }
        ((hrv_ms - lo) / (hi - lo) * 100.0).clamp(0.0, 100.0)
    }

    /// Score-point penalty for deviation from the euthermic baseline.
    /// Not clamped before fusion; the fused score clamps.
    pub fn temperature_contribution(&self, temp_c: f64) -> f64 {
        (temp_c - self.temp_baseline_c).abs() * self.temp_penalty_per_degree
    }

    /// Weighted fusion of the sub-scores, clamped to [0, 100].
    ///
    /// Higher HRV correlates with lower stress, so the HRV term contributes
    /// the complement of its sub-score.
    pub fn fuse(&self, gsr_pct: f64, hrv_stress_pct: f64, temp_contribution: f64) -> f64 {
        let raw = self.gsr_weight * gsr_pct
            + self.hrv_weight * (100.0 - hrv_stress_pct)
            + self.temp_weight * temp_contribution;
        raw.clamp(0.0, 100.0)
    }

    /// Classify a score into a band. Total: every f64 maps to exactly one
    /// band (NaN falls through to Normal).
    pub fn classify(&self, score: f64) -> StressBand {
        if score > self.high_threshold {
            StressBand::High
        } else if score > self.moderate_threshold {
            StressBand::Moderate
        } else {
            StressBand::Normal
        }
    }

    /// Derive the normalized sub-scores for a raw sample
    pub fn normalize(&self, sample: &RawSample) -> NormalizedMetrics {
        NormalizedMetrics {
            gsr_pct: self.normalize_gsr(sample.gsr),
            hrv_stress_pct: self.normalize_hrv_for_stress(sample.hrv_ms),
            temp_deviation: self.temperature_contribution(sample.temperature_c),
        }
    }

    /// Run the full scoring stage on one sample
    pub fn score(&self, sample: RawSample) -> StressReading {
        let metrics = self.normalize(&sample);
        let score = self.fuse(metrics.gsr_pct, metrics.hrv_stress_pct, metrics.temp_deviation);
        StressReading {
            sample,
            metrics,
            score,
            band: self.classify(score),
            observed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_sample(gsr: f64, temp: f64, hrv: f64) -> RawSample {
        RawSample {
            gsr,
            temperature_c: temp,
            hrv_ms: hrv,
        }
    }

    #[test]
    fn test_normalize_gsr_range_and_monotonicity() {
        let policy = ScoringPolicy::primary();

        let mut prev = -1.0;
        for gsr in (0..=1023).step_by(93) {
            let pct = policy.normalize_gsr(gsr as f64);
            assert!((0.0..=100.0).contains(&pct));
            assert!(pct >= prev);
            prev = pct;
        }

        // Extremes clamp instead of extrapolating
        assert_eq!(policy.normalize_gsr(-50.0), 0.0);
        assert_eq!(policy.normalize_gsr(5000.0), 100.0);
    }

    #[test]
    fn test_normalize_hrv_clamps_outside_range() {
        let policy = ScoringPolicy::primary();
        assert_eq!(policy.normalize_hrv_for_stress(-10.0), 0.0);
        assert_eq!(policy.normalize_hrv_for_stress(0.0), 0.0);
        assert_eq!(policy.normalize_hrv_for_stress(50.0), 50.0);
        assert_eq!(policy.normalize_hrv_for_stress(100.0), 100.0);
        assert_eq!(policy.normalize_hrv_for_stress(250.0), 100.0);
    }

    #[test]
    fn test_temperature_contribution_is_symmetric() {
        let policy = ScoringPolicy::primary();
        assert_eq!(policy.temperature_contribution(37.0), 0.0);
        assert!((policy.temperature_contribution(38.5) - 30.0).abs() < 1e-9);
        assert!((policy.temperature_contribution(35.5) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_fuse_always_within_bounds() {
        let policy = ScoringPolicy::primary();
        // Temperature contribution well past 100 before fusion
        let fused = policy.fuse(100.0, 0.0, 400.0);
        assert_eq!(fused, 100.0);
        let fused = policy.fuse(0.0, 100.0, 0.0);
        assert_eq!(fused, 0.0);
    }

    #[test]
    fn test_classify_boundaries() {
        let policy = ScoringPolicy::primary();
        assert_eq!(policy.classify(40.0), StressBand::Normal);
        assert_eq!(policy.classify(41.0), StressBand::Moderate);
        assert_eq!(policy.classify(70.0), StressBand::Moderate);
        assert_eq!(policy.classify(71.0), StressBand::High);
    }

    #[test]
    fn test_classify_is_total() {
        let policy = ScoringPolicy::primary();
        assert_eq!(policy.classify(f64::NEG_INFINITY), StressBand::Normal);
        assert_eq!(policy.classify(f64::INFINITY), StressBand::High);
        assert_eq!(policy.classify(f64::NAN), StressBand::Normal);
    }

    #[test]
    fn test_resting_sample_scores_normal() {
        let policy = ScoringPolicy::primary();
        let reading = policy.score(make_sample(512.0, 37.0, 50.0));

        assert!((reading.metrics.gsr_pct - 50.05).abs() < 0.01);
        assert!((reading.metrics.hrv_stress_pct - 50.0).abs() < 1e-9);
        assert_eq!(reading.metrics.temp_deviation, 0.0);
        // 0.2 * 50.05 + 0.5 * 50 + 0.3 * 0
        assert!((reading.score - 35.01).abs() < 0.01);
        assert_eq!(reading.band, StressBand::Normal);
    }

    #[test]
    fn test_extreme_sample_scores_high() {
        let policy = ScoringPolicy::primary();
        let reading = policy.score(make_sample(1023.0, 39.0, 0.0));

        assert_eq!(reading.metrics.gsr_pct, 100.0);
        assert_eq!(reading.metrics.hrv_stress_pct, 0.0);
        assert!((reading.metrics.temp_deviation - 40.0).abs() < 1e-9);
        // 0.2 * 100 + 0.5 * 100 + 0.3 * 40 = 82
        assert!((reading.score - 82.0).abs() < 1e-9);
        assert_eq!(reading.band, StressBand::High);
    }

    #[test]
    fn test_overall_variant_weighting() {
        let policy = ScoringPolicy::overall();
        // 0.6 * 100 + 0.2 * 100 + 0.2 * 40 = 88
        let fused = policy.fuse(100.0, 0.0, 40.0);
        assert!((fused - 88.0).abs() < 1e-9);
    }

    #[test]
    fn test_policy_serialization_round_trip() {
        let policy = ScoringPolicy::overall();
        let json = serde_json::to_string(&policy).unwrap();
        let back: ScoringPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
