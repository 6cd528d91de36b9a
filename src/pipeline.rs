//! End-to-end run: trends -> regional index, seismic + prices -> events,
//! index x events -> panel, panel -> group-difference decision.
//!
//! Event sources fail independently: a source that cannot be loaded or parsed
//! is recorded in `PipelineReport::source_failures` and the remaining source
//! still contributes events. A trends source that yields no index aborts the
//! run, since nothing downstream can be computed.

use tracing::{info, warn};

use crate::anova::{AnovaDecision, group_difference_test};
use crate::assignment::RegionAssignment;
use crate::config::PipelineConfig;
use crate::constants::DEFAULT_KEYWORDS;
use crate::data::{Event, PanelRow, RegionalIndex};
use crate::errors::PipelineError;
use crate::events::{ExtractionReport, return_shock_events, seismic_events, union_events};
use crate::normalize::{IndexBuild, Standardized, build_regional_index};
use crate::panel::build_panel;
use crate::source::TableSource;
use crate::source::parsing::prices::parse_price_series;
use crate::source::parsing::seismic::parse_seismic_catalog;
use crate::source::parsing::trends::parse_observations;
use crate::types::{Keyword, SourceId};

type DynSource = Box<dyn TableSource + 'static>;
type EventLoader = fn(&dyn TableSource, &PipelineConfig) -> Result<ExtractionReport, PipelineError>;

/// Table sources for one run.
pub struct PipelineInputs {
    trends: DynSource,
    assignments: Option<DynSource>,
    seismic: Option<DynSource>,
    prices: Option<DynSource>,
    keywords: Vec<Keyword>,
}

impl PipelineInputs {
    /// Inputs with a trends source, the default keywords, and no event sources.
    pub fn new(trends: impl TableSource + 'static) -> Self {
        Self {
            trends: Box::new(trends),
            assignments: None,
            seismic: None,
            prices: None,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Explicit entity -> region listing. Without one, groups carried on the
    /// trends rows are used.
    pub fn with_assignments(mut self, source: impl TableSource + 'static) -> Self {
        self.assignments = Some(Box::new(source));
        self
    }

    /// Seismic catalog feeding the earthquake rule.
    pub fn with_seismic(mut self, source: impl TableSource + 'static) -> Self {
        self.seismic = Some(Box::new(source));
        self
    }

    /// Price series feeding the return-shock rule.
    pub fn with_prices(mut self, source: impl TableSource + 'static) -> Self {
        self.prices = Some(Box::new(source));
        self
    }

    /// Keyword columns to read from a wide trends export.
    pub fn with_keywords<I, K>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Keyword>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

/// An event source that contributed nothing because it failed.
#[derive(Debug)]
pub struct SourceFailure {
    /// Id of the source that failed.
    pub source_id: SourceId,
    /// Why it failed.
    pub error: PipelineError,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// Regional stress index, one row per (date, region).
    pub index: RegionalIndex,
    /// Per-observation z-scores with drop counts.
    pub standardized: Standardized,
    /// Trend rows dropped at parse time (unparseable date).
    pub skipped_trend_rows: usize,
    /// Entities whose region was replaced by a later listing entry.
    pub overridden_assignments: usize,
    /// One report per event source that loaded.
    pub extraction: Vec<ExtractionReport>,
    /// Union of every loaded source's events, sorted by date.
    pub events: Vec<Event>,
    /// One row per (event, region).
    pub panel: Vec<PanelRow>,
    /// `InsufficientData` lands here so the tables above stay available.
    pub decision: Result<AnovaDecision, PipelineError>,
    /// Event sources that failed, in load order.
    pub source_failures: Vec<SourceFailure>,
}

fn load_seismic(
    source: &dyn TableSource,
    config: &PipelineConfig,
) -> Result<ExtractionReport, PipelineError> {
    let table = source.load()?;
    let parsed = parse_seismic_catalog(&table)?;
    let mut report = seismic_events(&parsed.records, &config.events.seismic);
    report.candidates += parsed.skipped;
    report.dropped += parsed.skipped;
    Ok(report)
}

fn load_prices(
    source: &dyn TableSource,
    config: &PipelineConfig,
) -> Result<ExtractionReport, PipelineError> {
    let table = source.load()?;
    let parsed = parse_price_series(&table)?;
    let mut report = return_shock_events(&parsed.records, &config.events.returns);
    report.candidates += parsed.skipped;
    report.dropped += parsed.skipped;
    if report.candidates > 0 && report.dropped == report.candidates {
        return Err(PipelineError::malformed(
            source.id(),
            format!(
                "none of the {} rows carried a positive numeric price",
                report.candidates
            ),
        ));
    }
    Ok(report)
}

/// Run every stage over `inputs`.
///
/// Errors returned here are fatal for the run: invalid configuration, an
/// unusable trends or assignment source, a conflicting assignment under
/// `RejectConflicts`, or an empty index.
pub fn run_pipeline(
    inputs: &PipelineInputs,
    config: &PipelineConfig,
) -> Result<PipelineReport, PipelineError> {
    config.validate()?;
    let policy = config.normalizer.assignment_policy;

    let trends_table = inputs.trends.load()?;
    let observations = parse_observations(&trends_table, &inputs.keywords)?;
    let assignment = match &inputs.assignments {
        Some(source) => RegionAssignment::from_table(&source.load()?, policy)?,
        None => RegionAssignment::from_observations(&observations.records, policy)?,
    };
    info!(
        "[shock_response:pipeline] {} entities assigned to {} regions",
        assignment.len(),
        assignment.groups().len()
    );

    let IndexBuild {
        standardized,
        index,
    } = build_regional_index(&observations.records, &assignment, config.parallel);
    if index.is_empty() {
        return Err(PipelineError::malformed(
            inputs.trends.id(),
            "no observation survived normalization; the stress index is empty",
        ));
    }

    let mut extraction = Vec::new();
    let mut source_failures = Vec::new();
    let event_sources: [(Option<&DynSource>, EventLoader); 2] = [
        (inputs.seismic.as_ref(), load_seismic),
        (inputs.prices.as_ref(), load_prices),
    ];
    for (source, load) in event_sources {
        let Some(source) = source else {
            continue;
        };
        match load(source.as_ref(), config) {
            Ok(report) => extraction.push(report),
            Err(error) => {
                warn!(
                    "[shock_response:pipeline] event source '{}' failed and contributes no events: {}",
                    source.id(),
                    error
                );
                source_failures.push(SourceFailure {
                    source_id: source.id().to_string(),
                    error,
                });
            }
        }
    }
    let events = union_events(extraction.iter().map(|report| report.events.clone()));

    let panel = build_panel(&index, &events, &config.window, config.parallel);
    let decision = group_difference_test(&panel, &config.test);
    if let Err(error) = &decision {
        warn!("[shock_response:pipeline] group-difference test not performed: {error}");
    }

    Ok(PipelineReport {
        index,
        standardized,
        skipped_trend_rows: observations.skipped,
        overridden_assignments: assignment.overridden(),
        extraction,
        events,
        panel,
        decision,
        source_failures,
    })
}
