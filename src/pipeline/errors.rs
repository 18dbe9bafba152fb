//! Pipeline errors
//!
//! Record-level validation failures are not errors; they are reported per
//! record in the pipeline report. These errors abort a run.

use thiserror::Error;

use crate::record::RowError;
use crate::schema::SchemaError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a pipeline run
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    // Source errors
    #[error("Failed to read records from {0}: {1}")]
    SourceUnreadable(String, String),

    #[error("Malformed record source {0}: {1}")]
    SourceMalformed(String, String),

    #[error("Record '{0}': {1}")]
    InvalidRow(String, RowError),

    #[error("Duplicate record id: {0}")]
    DuplicateRecord(String),

    #[error("Source columns do not match the field dictionary, missing: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    // Configuration
    #[error("{0}")]
    Schema(#[from] SchemaError),

    // Output errors
    #[error("Failed to write {0}: {1}")]
    WriteFailed(String, String),
}

impl PipelineError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::SourceUnreadable(..) => "WF_SOURCE_UNREADABLE",
            PipelineError::SourceMalformed(..) => "WF_SOURCE_MALFORMED",
            PipelineError::InvalidRow(..) => "WF_SOURCE_INVALID_ROW",
            PipelineError::DuplicateRecord(_) => "WF_SOURCE_DUPLICATE_RECORD",
            PipelineError::MissingColumns(_) => "WF_SOURCE_MISSING_COLUMNS",
            PipelineError::Schema(e) => e.code().code(),
            PipelineError::WriteFailed(..) => "WF_EXPORT_WRITE_FAILED",
        }
    }
}
