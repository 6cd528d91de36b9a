//! Event extractor: threshold rules over the seismic catalog and price series.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::info;

use crate::config::{EventConfig, ReturnShockThresholds, SeismicThresholds};
use crate::data::{Event, EventType, PricePoint, SeismicRecord};
use crate::utils::parse_numeric;

/// Per-rule extraction counts alongside the events it produced.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionReport {
    /// Rule that produced these events.
    pub event_type: EventType,
    /// Records offered to the rule.
    pub candidates: usize,
    /// Records discarded before the threshold test (e.g. non-numeric price).
    pub dropped: usize,
    /// Records (or returns) that passed the threshold.
    pub selected: usize,
    /// Distinct event dates, ascending.
    pub events: Vec<Event>,
}

impl ExtractionReport {
    fn from_dates(
        event_type: EventType,
        candidates: usize,
        dropped: usize,
        selected: usize,
        dates: BTreeSet<NaiveDate>,
    ) -> Self {
        let events = dates
            .into_iter()
            .map(|event_date| Event {
                event_date,
                event_type,
            })
            .collect::<Vec<_>>();
        info!(
            "[shock_response:events] {} rule: candidates={} dropped={} selected={} event_days={}",
            event_type,
            candidates,
            dropped,
            selected,
            events.len()
        );
        Self {
            event_type,
            candidates,
            dropped,
            selected,
            events,
        }
    }
}

/// Seismic rule: `magnitude >= min` and `min_depth <= depth <= max_depth`.
///
/// Qualifying timestamps collapse to one event per calendar date.
pub fn seismic_events(records: &[SeismicRecord], thresholds: &SeismicThresholds) -> ExtractionReport {
    let mut selected = 0usize;
    let mut dates = BTreeSet::new();
    for record in records {
        let strong = record.magnitude >= thresholds.min_magnitude;
        let shallow =
            record.depth_km >= thresholds.min_depth_km && record.depth_km <= thresholds.max_depth_km;
        if strong && shallow {
            selected += 1;
            dates.insert(record.timestamp.date());
        }
    }
    ExtractionReport::from_dates(EventType::Earthquake, records.len(), 0, selected, dates)
}

/// Return-shock rule: `|ln(p_t) - ln(p_{t-1})| > threshold`.
///
/// Points are sorted by timestamp first (input order is not trusted). Prices
/// that are non-numeric or non-positive are dropped before returns are taken,
/// so each return spans two consecutive surviving points. The first surviving
/// point has no return.
pub fn return_shock_events(
    points: &[PricePoint],
    thresholds: &ReturnShockThresholds,
) -> ExtractionReport {
    let mut ordered: Vec<&PricePoint> = points.iter().collect();
    ordered.sort_by_key(|point| point.timestamp);

    let mut dropped = 0usize;
    let mut series = Vec::with_capacity(ordered.len());
    for point in ordered {
        match parse_numeric(&point.price).filter(|price| *price > 0.0) {
            Some(price) => series.push((point.timestamp.date(), price.ln())),
            None => dropped += 1,
        }
    }

    let mut selected = 0usize;
    let mut dates = BTreeSet::new();
    for pair in series.windows(2) {
        let (_, previous) = pair[0];
        let (date, current) = pair[1];
        if (current - previous).abs() > thresholds.abs_log_return {
            selected += 1;
            dates.insert(date);
        }
    }
    ExtractionReport::from_dates(EventType::FxShock, points.len(), dropped, selected, dates)
}

/// Concatenate per-rule events and sort by date.
///
/// No cross-source deduplication: a date flagged by both rules yields one
/// event per rule. Equal dates keep their input order.
pub fn union_events<I>(sources: I) -> Vec<Event>
where
    I: IntoIterator<Item = Vec<Event>>,
{
    let mut events: Vec<Event> = sources.into_iter().flatten().collect();
    events.sort_by_key(|event| event.event_date);
    events
}

/// Run both rules and union the results.
pub fn extract_events(
    seismic: &[SeismicRecord],
    prices: &[PricePoint],
    config: &EventConfig,
) -> Vec<Event> {
    union_events([
        seismic_events(seismic, &config.seismic).events,
        return_shock_events(prices, &config.returns).events,
    ])
}
