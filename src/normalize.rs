//! Index normalizer: raw keyword interest to a regional stress index.
//!
//! Each `(entity_id, keyword)` series is standardized independently over its
//! whole observed range, then standardized values are averaged per
//! `(date, entity_group)`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::assignment::RegionAssignment;
use crate::data::{NormalizedObservation, RawObservation, RegionalIndex, RegionalIndexRow};
use crate::source::utilities::grouping::{group_by_key, transform_groups};
use crate::types::{EntityGroup, EntityId, Keyword};
use crate::utils::{all_equal, mean, population_std};

/// Standardized observations plus the bookkeeping of what was left out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Standardized {
    /// One row per kept raw observation, in input order.
    pub observations: Vec<NormalizedObservation>,
    /// Rows dropped because the score was missing or non-finite.
    pub dropped_missing_score: usize,
    /// Rows dropped because no group could be resolved for the entity.
    pub dropped_unassigned: usize,
    /// `(entity, keyword)` series with fewer than two values or no variation.
    pub constant_series: usize,
}

/// Output of `build_regional_index`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexBuild {
    /// Standardization result the index was aggregated from.
    pub standardized: Standardized,
    /// The regional stress index.
    pub index: RegionalIndex,
}

/// Population z-scores for one series.
///
/// Series with fewer than two values or zero variance map to all zeros.
pub fn zscores(values: &[f64]) -> Vec<f64> {
    if all_equal(values) {
        return vec![0.0; values.len()];
    }
    let (Some(mu), Some(sigma)) = (mean(values), population_std(values)) else {
        return vec![0.0; values.len()];
    };
    if !(sigma.is_finite() && sigma > 0.0) {
        return vec![0.0; values.len()];
    }
    values.iter().map(|value| (value - mu) / sigma).collect()
}

/// Standardize every group independently: `key -> values` to `key -> z-scores`.
pub fn standardize_groups<K>(groups: BTreeMap<K, Vec<f64>>, parallel: bool) -> BTreeMap<K, Vec<f64>>
where
    K: Ord + Send,
{
    transform_groups(groups, parallel, |_, values| zscores(&values))
}

/// Resolve groups, drop unusable scores, and standardize per `(entity, keyword)`.
///
/// The assignment takes precedence over a group carried on the row; rows with
/// neither are dropped.
pub fn standardize(
    observations: &[RawObservation],
    assignment: &RegionAssignment,
    parallel: bool,
) -> Standardized {
    let mut dropped_missing_score = 0usize;
    let mut dropped_unassigned = 0usize;
    let mut kept: Vec<(&RawObservation, EntityGroup, f64)> = Vec::new();
    for observation in observations {
        let Some(score) = observation.raw_score.filter(|score| score.is_finite()) else {
            dropped_missing_score += 1;
            continue;
        };
        let group = assignment
            .group_for(&observation.entity_id)
            .map(str::to_string)
            .or_else(|| observation.entity_group.clone());
        let Some(group) = group else {
            dropped_unassigned += 1;
            continue;
        };
        kept.push((observation, group, score));
    }

    let positions: BTreeMap<(EntityId, Keyword), Vec<usize>> =
        group_by_key(0..kept.len(), |&pos| {
            let observation = kept[pos].0;
            (observation.entity_id.clone(), observation.keyword.clone())
        });
    let values: BTreeMap<(EntityId, Keyword), Vec<f64>> = positions
        .iter()
        .map(|(key, members)| (key.clone(), members.iter().map(|&pos| kept[pos].2).collect()))
        .collect();
    let constant_series = values.values().filter(|series| all_equal(series)).count();
    let standardized = standardize_groups(values, parallel);

    let mut z = vec![0.0; kept.len()];
    for (members, series) in positions.values().zip(standardized.values()) {
        for (&pos, &value) in members.iter().zip(series) {
            z[pos] = value;
        }
    }

    let observations = kept
        .into_iter()
        .zip(z)
        .map(|((observation, group, _), z_score)| NormalizedObservation {
            date: observation.date,
            entity_id: observation.entity_id.clone(),
            entity_group: group,
            keyword: observation.keyword.clone(),
            z_score,
        })
        .collect();

    Standardized {
        observations,
        dropped_missing_score,
        dropped_unassigned,
        constant_series,
    }
}

/// Average standardized values per `(date, entity_group)`.
///
/// Pairs without observations get no row.
pub fn aggregate_index(observations: &[NormalizedObservation]) -> RegionalIndex {
    let grouped: BTreeMap<(EntityGroup, NaiveDate), Vec<&NormalizedObservation>> =
        group_by_key(observations, |observation| {
            (observation.entity_group.clone(), observation.date)
        });
    let rows = grouped
        .into_iter()
        .filter_map(|((entity_group, date), members)| {
            let values: Vec<f64> = members.iter().map(|member| member.z_score).collect();
            mean(&values).map(|stress_index| RegionalIndexRow {
                date,
                entity_group,
                stress_index,
            })
        })
        .collect();
    RegionalIndex::from_rows(rows)
}

/// Standardize raw observations and aggregate them into the regional index.
pub fn build_regional_index(
    observations: &[RawObservation],
    assignment: &RegionAssignment,
    parallel: bool,
) -> IndexBuild {
    let standardized = standardize(observations, assignment, parallel);
    if standardized.dropped_missing_score > 0 || standardized.dropped_unassigned > 0 {
        info!(
            "[shock_response:normalize] dropped {} rows with missing scores and {} rows without a region",
            standardized.dropped_missing_score, standardized.dropped_unassigned
        );
    }
    if standardized.constant_series > 0 {
        debug!(
            "[shock_response:normalize] {} series had no variation and standardize to zero",
            standardized.constant_series
        );
    }
    let index = aggregate_index(&standardized.observations);
    info!(
        "[shock_response:normalize] built stress index: rows={} regions={} from observations={}",
        index.len(),
        index.groups().len(),
        standardized.observations.len()
    );
    IndexBuild {
        standardized,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssignmentPolicy;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn obs(d: u32, entity: &str, group: Option<&str>, keyword: &str, score: Option<f64>) -> RawObservation {
        RawObservation {
            date: day(d),
            entity_id: entity.to_string(),
            entity_group: group.map(str::to_string),
            keyword: keyword.to_string(),
            raw_score: score,
        }
    }

    #[test]
    fn zscores_have_zero_mean_and_unit_population_std() {
        let z = zscores(&[10.0, 20.0, 30.0, 45.0, 70.0]);
        let mu = mean(&z).unwrap();
        let sigma = population_std(&z).unwrap();
        assert!(mu.abs() < 1e-12);
        assert!((sigma - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_and_singleton_series_standardize_to_zero() {
        assert_eq!(zscores(&[0.1, 0.1, 0.1]), vec![0.0, 0.0, 0.0]);
        assert_eq!(zscores(&[42.0]), vec![0.0]);
        assert!(zscores(&[]).is_empty());
    }

    #[test]
    fn standardize_groups_keeps_keys() {
        let mut groups = BTreeMap::new();
        groups.insert("a", vec![1.0, 3.0]);
        groups.insert("b", vec![5.0]);
        let out = standardize_groups(groups, false);
        assert_eq!(out["a"], vec![-1.0, 1.0]);
        assert_eq!(out["b"], vec![0.0]);
    }

    #[test]
    fn missing_scores_are_dropped_not_zeroed() {
        let observations = vec![
            obs(1, "TR-06", Some("İç Anadolu"), "stres", Some(10.0)),
            obs(2, "TR-06", Some("İç Anadolu"), "stres", None),
            obs(3, "TR-06", Some("İç Anadolu"), "stres", Some(30.0)),
            obs(4, "TR-06", Some("İç Anadolu"), "stres", Some(f64::NAN)),
        ];
        let out = standardize(&observations, &RegionAssignment::new(), false);
        assert_eq!(out.dropped_missing_score, 2);
        let z: Vec<f64> = out.observations.iter().map(|o| o.z_score).collect();
        assert_eq!(z, vec![-1.0, 1.0]);
    }

    #[test]
    fn assignment_overrides_row_group_and_unresolved_rows_drop() {
        let assignment =
            RegionAssignment::from_pairs([("TR-10", "Marmara")], AssignmentPolicy::LastWins)
                .unwrap();
        let observations = vec![
            obs(1, "TR-10", Some("Ege"), "stres", Some(1.0)),
            obs(1, "TR-99", None, "stres", Some(1.0)),
        ];
        let out = standardize(&observations, &assignment, false);
        assert_eq!(out.observations.len(), 1);
        assert_eq!(out.observations[0].entity_group, "Marmara");
        assert_eq!(out.dropped_unassigned, 1);
    }

    #[test]
    fn index_averages_across_entities_and_keywords() {
        let observations = vec![
            obs(1, "A", Some("East"), "stres", Some(0.0)),
            obs(2, "A", Some("East"), "stres", Some(10.0)),
            obs(1, "B", Some("East"), "anksiyete", Some(5.0)),
            obs(2, "B", Some("East"), "anksiyete", Some(5.0)),
            obs(1, "C", Some("West"), "stres", Some(3.0)),
        ];
        let build = build_regional_index(&observations, &RegionAssignment::new(), false);
        assert_eq!(build.standardized.constant_series, 2);
        let rows = build.index.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].entity_group, "East");
        assert_eq!(rows[0].date, day(1));
        assert_eq!(rows[0].stress_index, -0.5);
        assert_eq!(rows[1].stress_index, 0.5);
        assert_eq!(rows[2].entity_group, "West");
        assert_eq!(rows[2].stress_index, 0.0);
        assert_eq!(build.index.groups(), vec!["East".to_string(), "West".to_string()]);
    }

    #[test]
    fn parallel_standardization_matches_sequential() {
        let mut observations = Vec::new();
        for entity in 0..12 {
            for d in 1..=20u32 {
                let score = f64::from((d * 7 + entity * 13) % 29);
                observations.push(obs(
                    d,
                    &format!("E{entity}"),
                    Some(if entity % 2 == 0 { "North" } else { "South" }),
                    "stres",
                    Some(score),
                ));
            }
        }
        let sequential = build_regional_index(&observations, &RegionAssignment::new(), false);
        let parallel = build_regional_index(&observations, &RegionAssignment::new(), true);
        assert_eq!(sequential, parallel);
    }
}
