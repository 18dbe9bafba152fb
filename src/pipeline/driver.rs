//! Pipeline driver
//!
//! For each source record: clean → assemble → validate → branch.
//!
//! - Compliant records are accepted and exported.
//! - Every record that is not already marked validated gets a write-back
//!   update: the cleaned contact fields plus a cleared error for accepted
//!   records, the aggregated issue string for rejected ones.
//!
//! A record that fails validation never aborts the run.

use serde::Serialize;
use serde_json::{Map, Value};

use super::cleaning::CleaningRules;
use super::errors::{PipelineError, PipelineResult};
use super::source::{columns, RecordSource, SourceRecord};
use crate::observability::{log_event, Event};
use crate::phone::PhoneParser;
use crate::record::{assemble_external, Document, FieldValue, Row, Scalar};
use crate::schema::{ComplianceValidator, FieldSchema, Section, BOOKKEEPING_FIELD};

/// Write-back column holding the issue string
pub const SCHEMA_ERROR_COLUMN: &str = "Schema Error";

/// Write-back column for the validated flag when the dictionary does not
/// name one
pub const DEFAULT_VALIDATED_COLUMN: &str = "Schema Validated";

/// Separator used when a list is written back as text
const LIST_SEPARATOR: &str = ", ";

/// Result of processing one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    pub record_id: String,
    pub document: Document,
    /// Aggregated issue string; empty when the document is compliant
    pub issues: String,
    /// Fields to write back to the source, if any
    pub update: Option<Map<String, Value>>,
}

impl RecordOutcome {
    pub fn is_accepted(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Result of a pipeline run, in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub outcomes: Vec<RecordOutcome>,
    /// Dictionary columns the source never supplied
    pub missing_columns: Vec<String>,
}

impl PipelineReport {
    pub fn accepted(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| o.is_accepted())
    }

    pub fn rejected(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| !o.is_accepted())
    }

    /// `(record id, fields)` for every record with a write-back update
    pub fn updates(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.update.as_ref().map(|u| (o.record_id.as_str(), u)))
    }
}

/// Runs source records through cleaning, assembly and validation
#[derive(Debug)]
pub struct Pipeline {
    schema: FieldSchema,
    validator: ComplianceValidator,
    rules: CleaningRules,
    parser: PhoneParser,
    strict_columns: bool,
    validated_column: String,
}

impl Pipeline {
    /// Builds a pipeline; fails if the formal schema does not compile
    pub fn new(schema: FieldSchema, rules: CleaningRules) -> PipelineResult<Self> {
        let validator = ComplianceValidator::new(&schema)?;
        let validated_column = schema
            .dictionary()
            .section(Section::Meta)
            .iter()
            .find(|m| m.canonical == BOOKKEEPING_FIELD)
            .map(|m| m.external.clone())
            .unwrap_or_else(|| DEFAULT_VALIDATED_COLUMN.to_string());

        Ok(Self {
            schema,
            validator,
            rules,
            parser: PhoneParser::new(),
            strict_columns: false,
            validated_column,
        })
    }

    /// Fail the run when the source lacks dictionary columns
    pub fn with_strict_columns(mut self, strict: bool) -> Self {
        self.strict_columns = strict;
        self
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn validator(&self) -> &ComplianceValidator {
        &self.validator
    }

    /// Processes every record of `source`
    pub fn run(&self, source: &dyn RecordSource) -> PipelineResult<PipelineReport> {
        let origin = source.describe();
        log_event(Event::PipelineStart, &[("source", origin.as_str())]);

        let records = source.records().inspect_err(|e| fail(&origin, e))?;

        let missing_columns = self.missing_columns(&records);
        if !missing_columns.is_empty() {
            let err = PipelineError::MissingColumns(missing_columns.clone());
            if self.strict_columns {
                fail(&origin, &err);
                return Err(err);
            }
            log_event(Event::ColumnsMissing, &[("columns", missing_columns.join(", ").as_str())]);
        }

        let outcomes: Vec<RecordOutcome> =
            records.iter().map(|record| self.process(record)).collect();
        let report = PipelineReport { outcomes, missing_columns };

        let total = report.outcomes.len().to_string();
        let accepted = report.accepted().count().to_string();
        let rejected = report.rejected().count().to_string();
        log_event(
            Event::PipelineComplete,
            &[
                ("records", total.as_str()),
                ("accepted", accepted.as_str()),
                ("rejected", rejected.as_str()),
            ],
        );

        Ok(report)
    }

    /// Cleans, assembles and validates one record
    pub fn process(&self, record: &SourceRecord) -> RecordOutcome {
        let cleaned = self.rules.apply(&record.fields, &self.parser);
        let document = assemble_external(&record.id, &self.schema, &cleaned);
        let issues = self.validator.validate_document(&document);

        let update = if issues.is_empty() {
            log_event(Event::RecordAccepted, &[("record_id", record.id.as_str())]);
            if is_truthy(cleaned.get(&self.validated_column)) {
                None
            } else {
                Some(self.accepted_update(&cleaned))
            }
        } else {
            log_event(
                Event::RecordRejected,
                &[("record_id", record.id.as_str()), ("issues", issues.as_str())],
            );
            Some(self.rejected_update(&issues))
        };

        RecordOutcome {
            record_id: record.id.clone(),
            document,
            issues,
            update,
        }
    }

    /// Dictionary columns absent from every record, in dictionary order
    pub fn missing_columns(&self, records: &[SourceRecord]) -> Vec<String> {
        let present = columns(records);
        let expected = self.schema.external_names_by_section();

        let missing: Vec<String> = expected
            .iter()
            .flat_map(|(_, names)| names.iter())
            .filter(|name| !present.contains(name.as_str()))
            .cloned()
            .collect();
        missing
    }

    fn accepted_update(&self, cleaned: &Row) -> Map<String, Value> {
        let mut fields = Map::new();
        for column in &self.rules.write_back {
            match cleaned.get(column) {
                FieldValue::Absent => {}
                FieldValue::List(items) => {
                    let joined: Vec<String> = items.iter().map(scalar_text).collect();
                    fields.insert(column.clone(), Value::from(joined.join(LIST_SEPARATOR)));
                }
                value => {
                    fields.insert(column.clone(), value.to_value());
                }
            }
        }
        fields.insert(SCHEMA_ERROR_COLUMN.to_string(), Value::from(""));
        fields.insert(self.validated_column.clone(), Value::Bool(true));
        fields
    }

    fn rejected_update(&self, issues: &str) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(SCHEMA_ERROR_COLUMN.to_string(), Value::from(issues));
        fields.insert(self.validated_column.clone(), Value::Bool(false));
        fields
    }
}

fn fail(origin: &str, err: &PipelineError) {
    log_event(
        Event::PipelineFailed,
        &[("source", origin), ("code", err.code()), ("error", err.to_string().as_str())],
    );
}

fn scalar_text(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Text(s) => s.clone(),
        Scalar::Number(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }
}

fn is_truthy(value: &FieldValue) -> bool {
    match value {
        FieldValue::Absent => false,
        FieldValue::Scalar(Scalar::Bool(b)) => *b,
        FieldValue::Scalar(Scalar::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        FieldValue::Scalar(Scalar::Text(s)) => !s.is_empty(),
        FieldValue::List(items) => !items.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::new(FieldSchema::bundled().unwrap(), CleaningRules::default()).unwrap()
    }

    fn compliant_fields() -> Row {
        Row::new()
            .with("Resource Name", "Kobis Briyani")
            .with("Access Method", FieldValue::text_list(["Self-Service", "Home Delivery"]))
            .with("Contact Number(s)", "0377212345 (En Pai Ton)")
            .with("Postcode", 8000_i64)
    }

    #[test]
    fn test_process_accepts_compliant_record() {
        let outcome = pipeline().process(&SourceRecord::new("rec1", compliant_fields()));

        assert!(outcome.is_accepted());
        assert_eq!(outcome.document.record_id(), Some("rec1"));
        assert_eq!(
            outcome.document.section(Section::Contact)["phone"],
            serde_json::json!(["+6037-721-2345"])
        );
        assert_eq!(outcome.document.section(Section::Location)["postcode"], "08000");
        assert_eq!(
            outcome.document.section(Section::Resource)["religiousAffiliation"],
            "Non-Affiliated"
        );

        let update = outcome.update.unwrap();
        assert_eq!(update["Contact Number(s)"], "+6037-721-2345");
        assert_eq!(update["Contact Freeform Info"], "En Pai Ton");
        assert_eq!(update["Postcode"], "08000");
        assert_eq!(update["Religious Organisation?"], "Non-Affiliated");
        assert_eq!(update["Schema Error"], "");
        assert_eq!(update["Schema Validated"], true);
    }

    #[test]
    fn test_process_skips_update_for_validated_record() {
        let fields = compliant_fields().with("Schema Validated", true);
        let outcome = pipeline().process(&SourceRecord::new("rec1", fields));
        assert!(outcome.is_accepted());
        assert_eq!(outcome.update, None);
    }

    #[test]
    fn test_process_rejects_with_issue_string() {
        let fields = compliant_fields().with(
            "Access Method",
            FieldValue::text_list(["Self-Service", "Jenga"]),
        );
        let record = SourceRecord::new("rec2", fields.with("Schema Validated", true));
        let outcome = pipeline().process(&record);

        assert!(!outcome.is_accepted());
        assert_eq!(
            outcome.issues,
            "'Jenga' is not one of ['Self-Service', 'Arrange Pickup', 'Home Delivery', \
             'Online Only', 'Organisations Only', 'Other']"
        );

        let update = outcome.update.unwrap();
        assert_eq!(update.len(), 2);
        assert_eq!(update["Schema Error"], outcome.issues.as_str());
        assert_eq!(update["Schema Validated"], false);
    }

    #[test]
    fn test_run_branches_and_reports_missing_columns() {
        let records = vec![
            SourceRecord::new("ok", compliant_fields()),
            SourceRecord::new("bad", Row::new().with("City", "Ipoh")),
        ];

        let report = pipeline().run(&records).unwrap();
        let accepted: Vec<&str> = report.accepted().map(|o| o.record_id.as_str()).collect();
        let rejected: Vec<&str> = report.rejected().map(|o| o.record_id.as_str()).collect();
        assert_eq!(accepted, vec!["ok"]);
        assert_eq!(rejected, vec!["bad"]);
        assert_eq!(
            report.rejected().next().unwrap().issues,
            "'businessName' is a required property"
        );
        assert_eq!(report.updates().count(), 2);
        assert!(report.missing_columns.contains(&"Operating Hours".to_string()));
        assert!(!report.missing_columns.contains(&"Resource Name".to_string()));
    }

    #[test]
    fn test_strict_columns_fail_run() {
        let records = vec![SourceRecord::new("ok", compliant_fields())];
        let result = pipeline().with_strict_columns(true).run(&records);
        assert!(matches!(result, Err(PipelineError::MissingColumns(_))));
    }

    #[test]
    fn test_strict_columns_pass_when_all_present() {
        let schema = FieldSchema::bundled().unwrap();
        let mut fields = compliant_fields();
        for (_, names) in schema.external_names_by_section().iter() {
            for name in names {
                if !fields.contains(name) {
                    fields.insert(name.clone(), "?");
                }
            }
        }

        let records = vec![SourceRecord::new("ok", fields)];
        let report = pipeline().with_strict_columns(true).run(&records).unwrap();
        assert!(report.missing_columns.is_empty());
        assert_eq!(report.accepted().count(), 1);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&FieldValue::Absent));
        assert!(is_truthy(&FieldValue::from(true)));
        assert!(!is_truthy(&FieldValue::from(0_i64)));
        assert!(is_truthy(&FieldValue::from("checked")));
        assert!(!is_truthy(&FieldValue::from("")));
    }
}
