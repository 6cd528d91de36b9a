use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::constants::events::{EVENT_TYPE_EARTHQUAKE, EVENT_TYPE_FX_SHOCK};

pub use crate::types::{EntityGroup, EntityId, Keyword};

/// One keyword search-interest reading for one entity on one date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub date: NaiveDate,
    pub entity_id: EntityId,
    /// Group carried by the source row; the region assignment overrides it.
    pub entity_group: Option<EntityGroup>,
    pub keyword: Keyword,
    /// `None` when the source cell was empty or unparseable.
    pub raw_score: Option<f64>,
}

/// A raw observation after per-(entity, keyword) standardization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedObservation {
    pub date: NaiveDate,
    pub entity_id: EntityId,
    pub entity_group: EntityGroup,
    pub keyword: Keyword,
    pub z_score: f64,
}

/// Mean standardized interest for one region on one date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionalIndexRow {
    pub date: NaiveDate,
    #[serde(rename = "region7")]
    pub entity_group: EntityGroup,
    pub stress_index: f64,
}

/// Which rule produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Seismic magnitude/depth rule.
    #[serde(rename = "earthquake")]
    Earthquake,
    /// Currency log-return rule.
    #[serde(rename = "fx_shock")]
    FxShock,
}

impl EventType {
    /// Stable label used in outputs and summaries.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::Earthquake => EVENT_TYPE_EARTHQUAKE,
            EventType::FxShock => EVENT_TYPE_FX_SHOCK,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar date flagged as a shock by one rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_date: NaiveDate,
    pub event_type: EventType,
}

/// One seismic catalog entry.
#[derive(Clone, Debug, PartialEq)]
pub struct SeismicRecord {
    pub timestamp: NaiveDateTime,
    pub magnitude: f64,
    pub depth_km: f64,
}

/// One price series entry before numeric coercion.
///
/// `price` stays as text so coercion failures drop the row inside the
/// extractor rather than at load time.
#[derive(Clone, Debug, PartialEq)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price: String,
}

/// Pre/post window means for one (event, region) pair.
///
/// `None` marks an empty window. Zero is a valid stress value, so a missing
/// window is never reported as `0.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    pub event_date: NaiveDate,
    pub event_type: EventType,
    #[serde(rename = "region7")]
    pub entity_group: EntityGroup,
    pub pre_mean: Option<f64>,
    pub post_mean: Option<f64>,
    #[serde(rename = "delta_stress")]
    pub delta: Option<f64>,
}

impl PanelRow {
    /// Whether both windows had data.
    pub fn is_complete(&self) -> bool {
        self.delta.is_some()
    }
}

/// Regional stress index table, sorted by `(entity_group, date)`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionalIndex {
    rows: Vec<RegionalIndexRow>,
}

impl RegionalIndex {
    /// Build from rows in any order; rows are sorted by `(entity_group, date)`.
    pub fn from_rows(mut rows: Vec<RegionalIndexRow>) -> Self {
        rows.sort_by(|a, b| {
            a.entity_group
                .cmp(&b.entity_group)
                .then_with(|| a.date.cmp(&b.date))
        });
        Self { rows }
    }

    /// Rows sorted by `(entity_group, date)`.
    pub fn rows(&self) -> &[RegionalIndexRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the index has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct groups in ascending order.
    pub fn groups(&self) -> Vec<EntityGroup> {
        let mut groups: Vec<EntityGroup> = Vec::new();
        for row in &self.rows {
            if groups.last() != Some(&row.entity_group) {
                groups.push(row.entity_group.clone());
            }
        }
        groups
    }

    /// Earliest and latest dates covered, if any.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.iter().map(|row| row.date).min()?;
        let last = self.rows.iter().map(|row| row.date).max()?;
        Some((first, last))
    }
}
