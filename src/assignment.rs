//! Entity to region assignment.
//!
//! Source listings may name the same entity more than once. Resolution is
//! explicit: under `LastWins` the final entry for an entity replaces earlier
//! ones (each override with a different group is logged), under
//! `RejectConflicts` an entity listed with two different groups fails the load.
//! Repeating an identical entry is accepted under both policies.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::warn;

use crate::config::AssignmentPolicy;
use crate::constants::columns::{ASSIGNMENT_CODE, TRENDS_PROVINCE_CODE, TRENDS_REGION};
use crate::data::RawObservation;
use crate::errors::PipelineError;
use crate::source::RawTable;
use crate::types::{EntityGroup, EntityId};

/// Resolved many-to-one mapping from entity id to group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionAssignment {
    groups: IndexMap<EntityId, EntityGroup>,
    overridden: usize,
}

impl RegionAssignment {
    /// Create an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(entity, group)` pairs in listing order.
    pub fn from_pairs<I, E, G>(pairs: I, policy: AssignmentPolicy) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = (E, G)>,
        E: Into<EntityId>,
        G: Into<EntityGroup>,
    {
        let mut assignment = Self::new();
        for (entity, group) in pairs {
            assignment.insert(entity, group, policy)?;
        }
        Ok(assignment)
    }

    /// Build from a listing table with a code column (`code` or `province_code`)
    /// and a `region7` column. Rows with an empty code or region are ignored.
    pub fn from_table(table: &RawTable, policy: AssignmentPolicy) -> Result<Self, PipelineError> {
        let code_col = match table.column_index(ASSIGNMENT_CODE) {
            Some(idx) => idx,
            None => table.require_column(TRENDS_PROVINCE_CODE)?,
        };
        let group_col = table.require_column(TRENDS_REGION)?;
        let pairs = table
            .rows()
            .iter()
            .map(|row| {
                (
                    RawTable::cell(row, code_col),
                    RawTable::cell(row, group_col),
                )
            })
            .filter(|(code, group)| !code.is_empty() && !group.is_empty());
        Self::from_pairs(pairs, policy)
    }

    /// Build from the groups carried on observation rows, in row order.
    pub fn from_observations(
        observations: &[RawObservation],
        policy: AssignmentPolicy,
    ) -> Result<Self, PipelineError> {
        let pairs = observations.iter().filter_map(|observation| {
            observation
                .entity_group
                .as_deref()
                .map(|group| (observation.entity_id.as_str(), group))
        });
        Self::from_pairs(pairs, policy)
    }

    /// Record one listing entry. Returns the group it replaced, if any.
    pub fn insert(
        &mut self,
        entity: impl Into<EntityId>,
        group: impl Into<EntityGroup>,
        policy: AssignmentPolicy,
    ) -> Result<Option<EntityGroup>, PipelineError> {
        let entity = entity.into();
        let group = group.into();
        if let Some(existing) = self.groups.get(&entity) {
            if *existing == group {
                return Ok(None);
            }
            if policy == AssignmentPolicy::RejectConflicts {
                return Err(PipelineError::ConflictingAssignment {
                    entity_id: entity,
                    existing: existing.clone(),
                    conflicting: group,
                });
            }
            warn!(
                "[shock_response:assignment] entity '{}' reassigned from '{}' to '{}' (last entry wins)",
                entity, existing, group
            );
            self.overridden += 1;
        }
        Ok(self.groups.insert(entity, group))
    }

    /// Group for `entity`, if listed.
    pub fn group_for(&self, entity: &str) -> Option<&str> {
        self.groups.get(entity).map(String::as_str)
    }

    /// Number of distinct entities.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no entity is listed.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Distinct groups, sorted.
    pub fn groups(&self) -> BTreeSet<&str> {
        self.groups.values().map(String::as_str).collect()
    }

    /// How many entries replaced an earlier, different group.
    pub fn overridden(&self) -> usize {
        self.overridden
    }

    /// Entries in first-listed order with their resolved group.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.groups
            .iter()
            .map(|(entity, group)| (entity.as_str(), group.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_assignment_wins_by_default() {
        let assignment = RegionAssignment::from_pairs(
            [
                ("TR-10", "Marmara"),
                ("TR-06", "İç Anadolu"),
                ("TR-10", "Ege"),
            ],
            AssignmentPolicy::LastWins,
        )
        .unwrap();
        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.group_for("TR-10"), Some("Ege"));
        assert_eq!(assignment.overridden(), 1);
        let order: Vec<&str> = assignment.iter().map(|(entity, _)| entity).collect();
        assert_eq!(order, vec!["TR-10", "TR-06"]);
    }

    #[test]
    fn strict_policy_rejects_true_conflicts_only() {
        let repeated = RegionAssignment::from_pairs(
            [("TR-10", "Marmara"), ("TR-10", "Marmara")],
            AssignmentPolicy::RejectConflicts,
        )
        .unwrap();
        assert_eq!(repeated.overridden(), 0);

        let err = RegionAssignment::from_pairs(
            [("TR-10", "Marmara"), ("TR-10", "Ege")],
            AssignmentPolicy::RejectConflicts,
        )
        .unwrap_err();
        match err {
            PipelineError::ConflictingAssignment {
                entity_id,
                existing,
                conflicting,
            } => {
                assert_eq!(entity_id, "TR-10");
                assert_eq!(existing, "Marmara");
                assert_eq!(conflicting, "Ege");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_table_accepts_either_code_header() {
        let table = RawTable::from_str_rows(
            "assignments",
            &["province_code", "province", "region7"],
            [
                ["TR-01", "Adana", "Akdeniz"],
                ["", "Unknown", "Akdeniz"],
                ["TR-35", "İzmir", "Ege"],
            ],
        );
        let assignment = RegionAssignment::from_table(&table, AssignmentPolicy::LastWins).unwrap();
        assert_eq!(assignment.len(), 2);
        assert_eq!(
            assignment.groups().into_iter().collect::<Vec<_>>(),
            vec!["Akdeniz", "Ege"]
        );

        let missing = RawTable::from_str_rows("assignments", &["province"], [["Adana"]]);
        assert!(RegionAssignment::from_table(&missing, AssignmentPolicy::LastWins).is_err());
    }
}
