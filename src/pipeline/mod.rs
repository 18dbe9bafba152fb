//! Record pipeline
//!
//! Source records → cleaning → assembly → compliance check → export and
//! write-back updates. Records are keyed by external column names until
//! assembly resolves them through the field dictionary.

pub mod cleaning;
pub mod driver;
mod errors;
pub mod export;
pub mod source;

pub use cleaning::{CleaningRules, NoteMerge, PhoneColumns};
pub use driver::{Pipeline, PipelineReport, RecordOutcome, SCHEMA_ERROR_COLUMN};
pub use errors::{PipelineError, PipelineResult};
pub use export::{write_export, ExportPaths};
pub use source::{JsonFileSource, RecordSource, SourceRecord};
