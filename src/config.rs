use serde::{Deserialize, Serialize};

use crate::constants::analysis::{DEFAULT_ALPHA, DEFAULT_POST_DAYS, DEFAULT_PRE_DAYS};
use crate::constants::events::{
    DEFAULT_MAX_DEPTH_KM, DEFAULT_MIN_DEPTH_KM, DEFAULT_MIN_MAGNITUDE, DEFAULT_RETURN_THRESHOLD,
};
use crate::errors::PipelineError;

/// How repeated entries in the entity to group listing are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentPolicy {
    /// The last listed group for an entity wins; overridden entries are logged.
    #[default]
    LastWins,
    /// Two different groups for the same entity fail the load.
    RejectConflicts,
}

/// Controls how raw observations are mapped and standardized.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Duplicate resolution rule for the region assignment listing.
    pub assignment_policy: AssignmentPolicy,
}

/// Magnitude and depth filter for the seismic catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeismicThresholds {
    /// Minimum magnitude (inclusive).
    pub min_magnitude: f64,
    /// Minimum depth in km (inclusive).
    pub min_depth_km: f64,
    /// Maximum depth in km (inclusive).
    pub max_depth_km: f64,
}

impl Default for SeismicThresholds {
    fn default() -> Self {
        Self {
            min_magnitude: DEFAULT_MIN_MAGNITUDE,
            min_depth_km: DEFAULT_MIN_DEPTH_KM,
            max_depth_km: DEFAULT_MAX_DEPTH_KM,
        }
    }
}

/// Log-return filter for the price series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnShockThresholds {
    /// Strict lower bound on `|ln(p_t) - ln(p_{t-1})|`.
    pub abs_log_return: f64,
}

impl Default for ReturnShockThresholds {
    fn default() -> Self {
        Self {
            abs_log_return: DEFAULT_RETURN_THRESHOLD,
        }
    }
}

/// Thresholds for both event rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Seismic rule thresholds.
    pub seismic: SeismicThresholds,
    /// Return-shock rule thresholds.
    pub returns: ReturnShockThresholds,
}

/// Calendar-day window sizes around each event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Days in `[event - pre_days, event)`.
    pub pre_days: u32,
    /// Days in `[event, event + post_days]`.
    pub post_days: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            pre_days: DEFAULT_PRE_DAYS,
            post_days: DEFAULT_POST_DAYS,
        }
    }
}

/// Settings for the group-difference test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Significance level; the null is rejected when `p < alpha`.
    pub alpha: f64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

/// Top-level configuration for one pipeline run.
///
/// Every stage receives the slice of this struct it needs, so several runs with
/// different parameters can execute side by side.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Region mapping and standardization settings.
    pub normalizer: NormalizerConfig,
    /// Event rule thresholds.
    pub events: EventConfig,
    /// Event window sizes.
    pub window: WindowConfig,
    /// Hypothesis test settings.
    pub test: TestConfig,
    /// Run per-group standardization and per-pair windowing on the rayon pool.
    ///
    /// Output is identical to the sequential path.
    pub parallel: bool,
}

impl PipelineConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that would make a stage meaningless.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let seismic = &self.events.seismic;
        for (name, value) in [
            ("min_magnitude", seismic.min_magnitude),
            ("min_depth_km", seismic.min_depth_km),
            ("max_depth_km", seismic.max_depth_km),
            ("abs_log_return", self.events.returns.abs_log_return),
        ] {
            if !value.is_finite() {
                return Err(PipelineError::Configuration(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if seismic.min_depth_km > seismic.max_depth_km {
            return Err(PipelineError::Configuration(format!(
                "min_depth_km ({}) exceeds max_depth_km ({})",
                seismic.min_depth_km, seismic.max_depth_km
            )));
        }
        if self.events.returns.abs_log_return < 0.0 {
            return Err(PipelineError::Configuration(format!(
                "abs_log_return must be non-negative, got {}",
                self.events.returns.abs_log_return
            )));
        }
        let alpha = self.test.alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(PipelineError::Configuration(format!(
                "alpha must lie in (0, 1), got {alpha}"
            )));
        }
        Ok(())
    }
}
