//! Schema configuration errors
//!
//! Error codes:
//! - WF_SCHEMA_SOURCE (FATAL): a schema or dictionary source could not be read or parsed
//! - WF_SCHEMA_CONFIG (FATAL): a source was read but is structurally incomplete
//!
//! Validation problems in records are never errors; they are returned as
//! issue strings by the compliance validator.

use std::fmt;

/// Schema error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Source file missing, unreadable or not JSON
    WfSchemaSource,
    /// Required definition missing, dictionary invariant broken, or the
    /// formal schema does not compile
    WfSchemaConfig,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::WfSchemaSource => "WF_SCHEMA_SOURCE",
            SchemaErrorCode::WfSchemaConfig => "WF_SCHEMA_CONFIG",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error raised while constructing a [`FieldSchema`](super::FieldSchema).
///
/// Every schema error is fatal to construction; no partial schema exists.
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    /// Path or label of the offending source, if known
    origin: Option<String>,
}

impl SchemaError {
    /// A source could not be read
    pub fn unreadable(origin: impl Into<String>, reason: impl fmt::Display) -> Self {
        let origin = origin.into();
        Self {
            code: SchemaErrorCode::WfSchemaSource,
            message: format!("Failed to read '{}': {}", origin, reason),
            origin: Some(origin),
        }
    }

    /// A source is not valid JSON
    pub fn malformed(origin: impl Into<String>, reason: impl fmt::Display) -> Self {
        let origin = origin.into();
        Self {
            code: SchemaErrorCode::WfSchemaSource,
            message: format!("Invalid JSON in '{}': {}", origin, reason),
            origin: Some(origin),
        }
    }

    /// A `definitions.<section>` object is missing from the schema source
    pub fn missing_definition(section: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::WfSchemaConfig,
            message: format!("Schema is missing required definition 'definitions.{}'", section),
            origin: None,
        }
    }

    /// The formal schema is not a valid draft 6 schema
    pub fn invalid_schema(reason: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::WfSchemaConfig,
            message: format!("Schema does not compile: {}", reason),
            origin: None,
        }
    }

    /// The field dictionary breaks one of its invariants
    pub fn invalid_dictionary(reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::WfSchemaConfig,
            message: format!("Invalid field dictionary: {}", reason.into()),
            origin: None,
        }
    }

    /// Attaches the source the error was found in
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending source, if known
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code, self.message)?;
        if let Some(origin) = &self.origin {
            if !self.message.contains(origin.as_str()) {
                write!(f, " (in {})", origin)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;
