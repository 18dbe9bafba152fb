//! Observable events
//!
//! Events are explicit and typed; the string form is what appears in the
//! `event` key of a log line.

use std::fmt;

use super::logger::Severity;

/// Observable events in a whiteflag run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,
    /// Field schema constructed
    SchemaLoaded,
    /// Dictionary names a field the formal schema does not declare
    SchemaDrift,

    // Pipeline
    /// Pipeline run begins
    PipelineStart,
    /// Source is missing dictionary columns
    ColumnsMissing,
    /// Record passed validation
    RecordAccepted,
    /// Record failed validation
    RecordRejected,
    /// Export file written
    ExportWritten,
    /// Pipeline run complete
    PipelineComplete,
    /// Pipeline run aborted
    PipelineFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::SchemaDrift => "SCHEMA_DRIFT",
            Event::PipelineStart => "PIPELINE_START",
            Event::ColumnsMissing => "COLUMNS_MISSING",
            Event::RecordAccepted => "RECORD_ACCEPTED",
            Event::RecordRejected => "RECORD_REJECTED",
            Event::ExportWritten => "EXPORT_WRITTEN",
            Event::PipelineComplete => "PIPELINE_COMPLETE",
            Event::PipelineFailed => "PIPELINE_FAILED",
        }
    }

    /// Severity an event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RecordAccepted => Severity::Trace,
            Event::SchemaDrift | Event::ColumnsMissing | Event::RecordRejected => Severity::Warn,
            Event::PipelineFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
