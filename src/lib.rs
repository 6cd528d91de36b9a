#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// One-way ANOVA over panel deltas.
pub mod anova;
/// Entity to region assignment with duplicate handling.
pub mod assignment;
/// Run configuration types.
pub mod config;
/// Centralized defaults, column names, and output filenames.
pub mod constants;
/// Observation, index, event, and panel record types.
pub mod data;
/// Threshold rules that turn raw feeds into dated events.
pub mod events;
/// Reusable command-line runners.
pub mod example_apps;
/// Descriptive summaries of the index and panel deltas.
pub mod metrics;
/// Per-series standardization and regional aggregation.
pub mod normalize;
/// Event-window panel builder.
pub mod panel;
/// End-to-end orchestration over table sources.
pub mod pipeline;
/// Table source traits and typed row parsers.
pub mod source;
/// Flat-file inputs and outputs.
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Numeric helpers.
pub mod utils;

mod errors;

pub use anova::{AnovaDecision, AnovaOutcome, group_difference_test, one_way_anova};
pub use assignment::RegionAssignment;
pub use config::{
    AssignmentPolicy, EventConfig, NormalizerConfig, PipelineConfig, ReturnShockThresholds,
    SeismicThresholds, TestConfig, WindowConfig,
};
pub use data::{
    Event, EventType, NormalizedObservation, PanelRow, PricePoint, RawObservation,
    RegionalIndex, RegionalIndexRow, SeismicRecord,
};
pub use errors::PipelineError;
pub use events::{ExtractionReport, extract_events, return_shock_events, seismic_events};
pub use normalize::{IndexBuild, build_regional_index};
pub use panel::build_panel;
pub use pipeline::{PipelineInputs, PipelineReport, SourceFailure, run_pipeline};
pub use source::{InMemorySource, RawTable, TableSource};
pub use types::{CellValue, ColumnName, EntityGroup, EntityId, Keyword, SourceId};
