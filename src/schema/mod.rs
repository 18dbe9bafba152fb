//! Field schema subsystem
//!
//! The document layout is configuration, not code:
//! - a field dictionary maps external column labels to canonical names,
//!   per section
//! - a formal schema (JSON Schema draft 6) decides which fields are
//!   required and which values are allowed
//!
//! # Design Principles
//!
//! - Built once, read-only afterwards, shareable across threads
//! - Incomplete configuration fails construction; no partial schema
//! - Record-level violations are data (an issue string), never errors
//! - Deterministic validation output

mod errors;
mod loader;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use loader::{FieldDictionary, FieldSchema, SchemaLoader, BOOKKEEPING_FIELD, RECORD_ID_FIELD};
pub use types::{ExportDictionary, FieldMapping, Section, SectionMap};
pub use validator::{literal, ComplianceReport, ComplianceValidator, ISSUE_SEPARATOR};
