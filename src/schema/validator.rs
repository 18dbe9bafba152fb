//! Compliance validation of assembled documents
//!
//! Validation semantics:
//! - The document is wrapped in a one-element array and checked against the
//!   formal schema, whose root expects an array of records
//! - A compliant document yields an empty issue string
//! - Otherwise every violation in the document is collected, rendered in a
//!   fixed phrasing, sorted, and joined with ", "
//!
//! Violations are data, never errors: the caller decides what to do with a
//! non-empty issue string.

use std::fmt;

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::{ValidationError, Validator};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::loader::FieldSchema;
use crate::record::Document;

/// Separator between issues in the aggregated message
pub const ISSUE_SEPARATOR: &str = ", ";

/// Validates documents against the formal schema of a [`FieldSchema`].
///
/// The compiled validator is immutable and `Send + Sync`; one instance can
/// serve any number of threads.
pub struct ComplianceValidator {
    validator: Validator,
}

impl ComplianceValidator {
    /// Compiles the formal schema (JSON Schema draft 6).
    ///
    /// # Errors
    ///
    /// `WF_SCHEMA_CONFIG` if the schema document does not compile.
    pub fn new(schema: &FieldSchema) -> SchemaResult<Self> {
        let validator =
            jsonschema::draft6::new(schema.document()).map_err(SchemaError::invalid_schema)?;
        Ok(Self { validator })
    }

    /// Validates an unwrapped document; returns "" when compliant, otherwise
    /// every issue joined by ", "
    pub fn validate(&self, document: &Value) -> String {
        self.check(document).to_string()
    }

    /// Validates an assembled [`Document`]
    pub fn validate_document(&self, document: &Document) -> String {
        self.validate(&document.to_value())
    }

    /// Validates an unwrapped document and returns the individual issues
    pub fn check(&self, document: &Value) -> ComplianceReport {
        let wrapped = Value::Array(vec![document.clone()]);

        if self.validator.is_valid(&wrapped) {
            return ComplianceReport::default();
        }

        let mut issues: Vec<String> = self
            .validator
            .iter_errors(&wrapped)
            .map(|e| describe(&e))
            .collect();
        issues.sort();
        ComplianceReport { issues }
    }
}

impl fmt::Debug for ComplianceValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplianceValidator").finish_non_exhaustive()
    }
}

/// Outcome of a compliance check.
///
/// Displays as the aggregated issue string ("" when compliant).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplianceReport {
    issues: Vec<String>,
}

impl ComplianceReport {
    pub fn is_compliant(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issue messages in sorted order
    pub fn issues(&self) -> &[String] {
        &self.issues
    }
}

impl fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.issues.join(ISSUE_SEPARATOR))
    }
}

/// Renders one violation in the fixed human-readable phrasing
fn describe(error: &ValidationError<'_>) -> String {
    let instance = literal(&error.instance);

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            format!("{} is a required property", literal(property))
        }
        ValidationErrorKind::Enum { options } => {
            format!("{} is not one of {}", instance, literal(options))
        }
        ValidationErrorKind::Type {
            kind: TypeKind::Single(expected),
        } => format!("{} is not of type '{}'", instance, expected),
        ValidationErrorKind::Pattern { pattern } => {
            format!("{} does not match {}", instance, quote(pattern))
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            let names: Vec<String> = unexpected.iter().map(|name| quote(name)).collect();
            let verb = if names.len() == 1 { "was" } else { "were" };
            format!(
                "Additional properties are not allowed ({} {} unexpected)",
                names.join(", "),
                verb
            )
        }
        _ => error.to_string(),
    }
}

/// Renders a JSON value as a literal: strings quoted with `'`, `True` /
/// `False` / `None`, lists in brackets, objects in braces
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "None".into(),
        Value::Bool(true) => "True".into(),
        Value::Bool(false) => "False".into(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", quote(k), literal(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

/// Quotes a string with `'`, switching to `"` when the text contains `'`
/// but no `"`
fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(delimiter);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> ComplianceValidator {
        ComplianceValidator::new(&FieldSchema::bundled().unwrap()).unwrap()
    }

    fn compliant() -> Value {
        json!({
            "meta": {"recordId": "rec1", "createdDatetime": "1969-07-16T14:32:00.000Z"},
            "contact": {},
            "location": {},
            "resource": {
                "businessName": "Kobis Briyani",
                "accessMethod": ["Self-Service", "Home Delivery"],
                "religiousAffiliation": "Non-Affiliated"
            }
        })
    }

    #[test]
    fn test_compliant_document_has_no_issues() {
        assert_eq!(validator().validate(&compliant()), "");
        assert!(validator().check(&compliant()).is_compliant());
    }

    #[test]
    fn test_missing_sections_are_all_reported_sorted() {
        let mut doc = compliant();
        doc.as_object_mut().unwrap().remove("location");
        doc.as_object_mut().unwrap().remove("contact");
        assert_eq!(
            validator().validate(&doc),
            "'contact' is a required property, 'location' is a required property"
        );
    }

    #[test]
    fn test_enum_violation_lists_options_in_schema_order() {
        let mut doc = compliant();
        doc["resource"]["accessMethod"] = json!(["Self-Service", "Home Delivery", "Jenga"]);
        assert_eq!(
            validator().validate(&doc),
            "'Jenga' is not one of ['Self-Service', 'Arrange Pickup', 'Home Delivery', \
             'Online Only', 'Organisations Only', 'Other']"
        );
    }

    #[test]
    fn test_violations_across_sections_are_aggregated() {
        let mut doc = compliant();
        doc["meta"].as_object_mut().unwrap().remove("recordId");
        doc["location"]["latitude"] = json!("north");
        doc["resource"]["religiousAffiliation"] = json!("Jedi");

        let report = validator().check(&doc);
        assert_eq!(report.issues().len(), 3);
        assert_eq!(
            report.to_string(),
            "'Jedi' is not one of ['Non-Affiliated', 'Muslim', 'Christian', 'Buddhist', \
             'Hindu', 'Sikh', 'Taoist', 'Other'], \
             'north' is not of type 'number', \
             'recordId' is a required property"
        );
    }

    #[test]
    fn test_additional_property_reported() {
        let mut doc = compliant();
        doc["contact"]["fax"] = json!("123");
        assert_eq!(
            validator().validate(&doc),
            "Additional properties are not allowed ('fax' was unexpected)"
        );
    }

    #[test]
    fn test_literal_rendering() {
        assert_eq!(literal(&json!(null)), "None");
        assert_eq!(literal(&json!(true)), "True");
        assert_eq!(literal(&json!(42)), "42");
        assert_eq!(literal(&json!(["a", 1, false])), "['a', 1, False]");
        assert_eq!(literal(&json!({"k": "v"})), "{'k': 'v'}");
        assert_eq!(literal(&json!("it's")), "\"it's\"");
        assert_eq!(literal(&json!("a'b\"c")), "'a\\'b\"c'");
        assert_eq!(literal(&json!("^\\d{5}$")), "'^\\\\d{5}$'");
    }
}
