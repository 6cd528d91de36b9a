use std::io;

use thiserror::Error;

use crate::types::{EntityGroup, EntityId, SourceId};

/// Error type for malformed inputs, degenerate tests, configuration, and IO failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input source '{source_id}' is malformed: {details}")]
    MalformedInput {
        source_id: SourceId,
        details: String,
    },
    #[error(
        "insufficient data for hypothesis test ({observations} observations across {groups} groups): {details}"
    )]
    InsufficientData {
        observations: usize,
        groups: usize,
        details: String,
    },
    #[error("entity '{entity_id}' is assigned to both '{existing}' and '{conflicting}'")]
    ConflictingAssignment {
        entity_id: EntityId,
        existing: EntityGroup,
        conflicting: EntityGroup,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn malformed(source_id: impl Into<SourceId>, details: impl Into<String>) -> Self {
        Self::MalformedInput {
            source_id: source_id.into(),
            details: details.into(),
        }
    }
}
