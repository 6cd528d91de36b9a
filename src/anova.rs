//! One-way ANOVA over panel deltas grouped by region.

use std::collections::BTreeMap;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use tracing::{info, warn};

use crate::config::TestConfig;
use crate::data::PanelRow;
use crate::errors::PipelineError;
use crate::types::EntityGroup;
use crate::utils::{all_equal, mean};

/// How the decision was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AnovaOutcome {
    /// F statistic computed and compared against alpha.
    Tested,
    /// Every delta was identical; no F statistic exists and the null is kept.
    NoVariation,
}

/// Result of the group-difference test.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnovaDecision {
    /// Whether an F statistic could be formed.
    pub outcome: AnovaOutcome,
    /// `None` when `outcome` is `NoVariation`.
    pub p_value: Option<f64>,
    /// `p_value < alpha`; always false for `NoVariation`.
    pub reject_null: bool,
    /// `+inf` when groups differ but every group is internally constant.
    pub f_statistic: Option<f64>,
    /// Significance level the decision used.
    pub alpha: f64,
    /// Deltas that entered the test.
    pub n_observations: usize,
    /// Groups with at least one delta.
    pub n_groups: usize,
    /// Panel rows skipped because their delta was missing.
    pub n_excluded: usize,
    /// Groups present in the panel whose deltas were all missing.
    pub empty_groups: Vec<EntityGroup>,
    /// Groups minus one.
    pub df_between: usize,
    /// Observations minus groups.
    pub df_within: usize,
    /// Between-group sum of squares.
    pub ss_between: f64,
    /// Within-group sum of squares.
    pub ss_within: f64,
}

/// Test whether mean `delta` differs across regions.
///
/// Rows with a missing delta are excluded and counted. Groups left with no
/// deltas drop out of the test.
pub fn group_difference_test(
    panel: &[PanelRow],
    config: &TestConfig,
) -> Result<AnovaDecision, PipelineError> {
    let mut groups: BTreeMap<EntityGroup, Vec<f64>> = BTreeMap::new();
    let mut n_excluded = 0usize;
    for row in panel {
        let deltas = groups.entry(row.entity_group.clone()).or_default();
        match row.delta.filter(|delta| delta.is_finite()) {
            Some(delta) => deltas.push(delta),
            None => n_excluded += 1,
        }
    }
    if n_excluded > 0 {
        info!(
            "[shock_response:anova] excluded {} of {} panel rows with a missing delta",
            n_excluded,
            panel.len()
        );
    }

    let mut decision = one_way_anova(&groups, config)?;
    decision.n_excluded = n_excluded;
    Ok(decision)
}

/// One-way ANOVA on pre-grouped samples.
///
/// Needs at least two non-empty groups and more observations than groups.
pub fn one_way_anova(
    groups: &BTreeMap<EntityGroup, Vec<f64>>,
    config: &TestConfig,
) -> Result<AnovaDecision, PipelineError> {
    let empty_groups: Vec<EntityGroup> = groups
        .iter()
        .filter(|(_, values)| values.is_empty())
        .map(|(group, _)| group.clone())
        .collect();
    if !empty_groups.is_empty() {
        warn!(
            "[shock_response:anova] groups with no complete deltas left out of the test: {}",
            empty_groups.join(", ")
        );
    }

    let samples: Vec<&Vec<f64>> = groups.values().filter(|values| !values.is_empty()).collect();
    let n_groups = samples.len();
    let n_observations: usize = samples.iter().map(|values| values.len()).sum();
    if n_groups < 2 {
        return Err(PipelineError::InsufficientData {
            observations: n_observations,
            groups: n_groups,
            details: "at least two groups with a complete delta are required".to_string(),
        });
    }
    if n_observations <= n_groups {
        return Err(PipelineError::InsufficientData {
            observations: n_observations,
            groups: n_groups,
            details: "no within-group degrees of freedom; every group has a single delta"
                .to_string(),
        });
    }

    let all: Vec<f64> = samples.iter().flat_map(|values| values.iter().copied()).collect();
    let grand_mean = mean(&all).unwrap_or(0.0);
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for values in &samples {
        let group_mean = mean(values).unwrap_or(grand_mean);
        ss_between += values.len() as f64 * (group_mean - grand_mean).powi(2);
        ss_within += values
            .iter()
            .map(|value| (value - group_mean).powi(2))
            .sum::<f64>();
    }
    let df_between = n_groups - 1;
    let df_within = n_observations - n_groups;

    let mut decision = AnovaDecision {
        outcome: AnovaOutcome::Tested,
        p_value: None,
        reject_null: false,
        f_statistic: None,
        alpha: config.alpha,
        n_observations,
        n_groups,
        n_excluded: 0,
        empty_groups,
        df_between,
        df_within,
        ss_between,
        ss_within,
    };

    if all_equal(&all) {
        decision.outcome = AnovaOutcome::NoVariation;
        decision.ss_between = 0.0;
        decision.ss_within = 0.0;
        info!(
            "[shock_response:anova] all {} deltas are identical; no test performed",
            n_observations
        );
        return Ok(decision);
    }

    let (f_statistic, p_value) = if samples.iter().all(|values| all_equal(values)) {
        (f64::INFINITY, 0.0)
    } else {
        let f = (ss_between / df_between as f64) / (ss_within / df_within as f64);
        let distribution = FisherSnedecor::new(df_between as f64, df_within as f64)
            .map_err(|err| PipelineError::Configuration(format!("F distribution: {err}")))?;
        (f, distribution.sf(f).clamp(0.0, 1.0))
    };
    decision.f_statistic = Some(f_statistic);
    decision.p_value = Some(p_value);
    decision.reject_null = p_value < config.alpha;
    info!(
        "[shock_response:anova] F({}, {}) = {:.4}, p = {:.4e}, alpha = {} -> {}",
        df_between,
        df_within,
        f_statistic,
        p_value,
        config.alpha,
        if decision.reject_null {
            "reject H0"
        } else {
            "fail to reject H0"
        }
    );
    Ok(decision)
}
