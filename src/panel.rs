//! Event-window panel builder.
//!
//! For every event and every region in the index (full cross product) the
//! builder averages the stress index over
//! - the pre window `[event - pre_days, event)` and
//! - the post window `[event, event + post_days]`.
//!
//! An empty window yields `None`, and so does the delta that depends on it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::info;

use crate::config::WindowConfig;
use crate::data::{Event, PanelRow, RegionalIndex};
use crate::source::parsing::date_helpers::{days_after, days_before};
use crate::source::utilities::grouping::group_by_key;
use crate::types::EntityGroup;
use crate::utils::mean;

/// One region's index values sorted by date.
#[derive(Clone, Debug, Default)]
struct RegionSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl RegionSeries {
    /// Number of rows dated strictly before `date`.
    fn count_before(&self, date: NaiveDate) -> usize {
        self.dates.partition_point(|d| *d < date)
    }

    /// Number of rows dated on or before `date`.
    fn count_through(&self, date: NaiveDate) -> usize {
        self.dates.partition_point(|d| *d <= date)
    }

    fn mean_between(&self, lo: usize, hi: usize) -> Option<f64> {
        if lo >= hi {
            return None;
        }
        mean(&self.values[lo..hi])
    }

    fn pre_mean(&self, event_date: NaiveDate, pre_days: u32) -> Option<f64> {
        let lo = self.count_before(days_before(event_date, pre_days));
        let hi = self.count_before(event_date);
        self.mean_between(lo, hi)
    }

    fn post_mean(&self, event_date: NaiveDate, post_days: u32) -> Option<f64> {
        let lo = self.count_before(event_date);
        let hi = self.count_through(days_after(event_date, post_days));
        self.mean_between(lo, hi)
    }
}

/// Date-sorted per-region lookup built once from the index.
#[derive(Clone, Debug, Default)]
pub struct WindowIndex {
    regions: BTreeMap<EntityGroup, RegionSeries>,
}

impl WindowIndex {
    /// Index rows by region; every region in the index is kept.
    pub fn new(index: &RegionalIndex) -> Self {
        let grouped = group_by_key(index.rows(), |row| row.entity_group.clone());
        let regions = grouped
            .into_iter()
            .map(|(group, mut rows)| {
                rows.sort_by_key(|row| row.date);
                let series = RegionSeries {
                    dates: rows.iter().map(|row| row.date).collect(),
                    values: rows.iter().map(|row| row.stress_index).collect(),
                };
                (group, series)
            })
            .collect();
        Self { regions }
    }

    /// Panel rows for one event, one per region in ascending order.
    pub fn rows_for_event(&self, event: &Event, window: &WindowConfig) -> Vec<PanelRow> {
        self.regions
            .iter()
            .map(|(group, series)| {
                let pre_mean = series.pre_mean(event.event_date, window.pre_days);
                let post_mean = series.post_mean(event.event_date, window.post_days);
                let delta = match (pre_mean, post_mean) {
                    (Some(pre), Some(post)) => Some(post - pre),
                    _ => None,
                };
                PanelRow {
                    event_date: event.event_date,
                    event_type: event.event_type,
                    entity_group: group.clone(),
                    pre_mean,
                    post_mean,
                    delta,
                }
            })
            .collect()
    }
}

/// Build the event x region panel.
///
/// Rows come out ordered by event date (input order among equal dates), then
/// region. With `parallel` set, events are processed on the rayon pool; the
/// output is identical.
pub fn build_panel(
    index: &RegionalIndex,
    events: &[Event],
    window: &WindowConfig,
    parallel: bool,
) -> Vec<PanelRow> {
    let lookup = WindowIndex::new(index);
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|event| event.event_date);

    let per_event: Vec<Vec<PanelRow>> = if parallel {
        ordered
            .par_iter()
            .map(|event| lookup.rows_for_event(event, window))
            .collect()
    } else {
        ordered
            .iter()
            .map(|event| lookup.rows_for_event(event, window))
            .collect()
    };
    let panel: Vec<PanelRow> = per_event.into_iter().flatten().collect();

    let complete = panel.iter().filter(|row| row.is_complete()).count();
    info!(
        "[shock_response:panel] built panel: events={} regions={} rows={} complete={} missing={} (pre_days={}, post_days={})",
        ordered.len(),
        lookup.regions.len(),
        panel.len(),
        complete,
        panel.len() - complete,
        window.pre_days,
        window.post_days
    );
    panel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EventType, RegionalIndexRow};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn row(d: u32, group: &str, value: f64) -> RegionalIndexRow {
        RegionalIndexRow {
            date: day(d),
            entity_group: group.to_string(),
            stress_index: value,
        }
    }

    fn event(d: u32, event_type: EventType) -> Event {
        Event {
            event_date: day(d),
            event_type,
        }
    }

    fn step_index() -> RegionalIndex {
        RegionalIndex::from_rows(
            (1..=10)
                .map(|d| row(d, "East", if d < 5 { 1.0 } else { 2.0 }))
                .collect(),
        )
    }

    #[test]
    fn windows_respect_exclusive_pre_and_inclusive_post_bounds() {
        let window = WindowConfig {
            pre_days: 4,
            post_days: 2,
        };
        let panel = build_panel(
            &step_index(),
            &[event(5, EventType::Earthquake)],
            &window,
            false,
        );
        assert_eq!(panel.len(), 1);
        assert_eq!(panel[0].pre_mean, Some(1.0));
        assert_eq!(panel[0].post_mean, Some(2.0));
        assert_eq!(panel[0].delta, Some(1.0));
    }

    #[test]
    fn zero_day_windows_keep_only_the_event_day() {
        let window = WindowConfig {
            pre_days: 0,
            post_days: 0,
        };
        let panel = build_panel(&step_index(), &[event(5, EventType::FxShock)], &window, false);
        assert_eq!(panel[0].pre_mean, None);
        assert_eq!(panel[0].post_mean, Some(2.0));
        assert_eq!(panel[0].delta, None);
    }

    #[test]
    fn empty_windows_are_missing_not_zero() {
        let window = WindowConfig {
            pre_days: 3,
            post_days: 3,
        };
        let panel = build_panel(
            &step_index(),
            &[event(1, EventType::Earthquake), event(20, EventType::Earthquake)],
            &window,
            false,
        );
        assert_eq!(panel[0].pre_mean, None);
        assert_eq!(panel[0].post_mean, Some(1.0));
        assert_eq!(panel[0].delta, None);
        assert_eq!(panel[1].pre_mean, None);
        assert_eq!(panel[1].post_mean, None);
        assert!(!panel[1].is_complete());
    }

    #[test]
    fn every_event_meets_every_region_in_order() {
        let mut rows: Vec<RegionalIndexRow> = (1..=10).map(|d| row(d, "West", 0.0)).collect();
        rows.push(row(9, "East", 4.0));
        rows.push(row(2, "Central", -1.0));
        let index = RegionalIndex::from_rows(rows);
        let events = vec![
            event(8, EventType::FxShock),
            event(3, EventType::Earthquake),
            event(3, EventType::FxShock),
        ];
        let panel = build_panel(&index, &events, &WindowConfig::default(), false);
        assert_eq!(panel.len(), 9);
        let keys: Vec<(u32, EventType, &str)> = panel
            .iter()
            .map(|r| {
                (
                    chrono::Datelike::day(&r.event_date),
                    r.event_type,
                    r.entity_group.as_str(),
                )
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                (3, EventType::Earthquake, "Central"),
                (3, EventType::Earthquake, "East"),
                (3, EventType::Earthquake, "West"),
                (3, EventType::FxShock, "Central"),
                (3, EventType::FxShock, "East"),
                (3, EventType::FxShock, "West"),
                (8, EventType::FxShock, "Central"),
                (8, EventType::FxShock, "East"),
                (8, EventType::FxShock, "West"),
            ]
        );
        // Central only has day 2: in the pre window of day 3, and of day 8.
        assert_eq!(panel[0].pre_mean, Some(-1.0));
        assert_eq!(panel[0].post_mean, None);
        // East only has day 9, which is in the post window of day 8.
        assert_eq!(panel[7].pre_mean, None);
        assert_eq!(panel[7].post_mean, Some(4.0));
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let mut rows = Vec::new();
        for d in 1..=28u32 {
            rows.push(row(d, "A", f64::from(d)));
            rows.push(row(d, "B", f64::from(d % 5)));
        }
        let index = RegionalIndex::from_rows(rows);
        let events: Vec<Event> = (1..=28)
            .step_by(3)
            .map(|d| event(d, EventType::Earthquake))
            .collect();
        let window = WindowConfig {
            pre_days: 5,
            post_days: 4,
        };
        assert_eq!(
            build_panel(&index, &events, &window, false),
            build_panel(&index, &events, &window, true)
        );
    }
}
