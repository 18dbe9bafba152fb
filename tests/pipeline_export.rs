//! Pipeline Export Tests
//!
//! - Compliant records are exported, non-compliant ones are not
//! - Every record not already validated gets a write-back update
//! - The export file is a JSON array with one document per line

use std::fs;

use chrono::{Local, TimeZone};
use serde_json::{json, Value};
use tempfile::TempDir;
use whiteflag::pipeline::{write_export, CleaningRules, JsonFileSource, Pipeline, PipelineError};
use whiteflag::schema::FieldSchema;

// =============================================================================
// Helper Functions
// =============================================================================

fn pipeline() -> Pipeline {
    Pipeline::new(FieldSchema::bundled().unwrap(), CleaningRules::default()).unwrap()
}

fn write_records(dir: &TempDir, records: Value) -> JsonFileSource {
    let path = dir.path().join("records.json");
    fs::write(&path, records.to_string()).unwrap();
    JsonFileSource::new(path)
}

fn sample_records() -> Value {
    json!([
        {
            "id": "recGood",
            "fields": {
                "Resource Name": "Kobis Briyani",
                "Contact Number(s)": "Anna: 0341512345, Quon Da: 01134512395",
                "Contact Freeform Info": "N/A",
                "Postcode": 8000,
                "State/WP": "Selangor",
                "Access Method": ["Self-Service", "Home Delivery"],
                "Resource Freeform Notes": "nasi lemak",
                "Freeform Update Notes": "restocked Friday"
            }
        },
        {
            "id": "recDone",
            "fields": {
                "Resource Name": "Kedai Runcit",
                "Schema Validated": true
            }
        },
        {
            "id": "recBad",
            "fields": {
                "Resource Name": "Jenga Hub",
                "Access Method": ["Jenga"],
                "State/WP": "Atlantis"
            }
        }
    ])
}

// =============================================================================
// Branching
// =============================================================================

#[test]
fn test_records_branch_on_compliance() {
    let dir = TempDir::new().unwrap();
    let source = write_records(&dir, sample_records());

    let report = pipeline().run(&source).unwrap();

    let accepted: Vec<&str> = report.accepted().map(|o| o.record_id.as_str()).collect();
    let rejected: Vec<&str> = report.rejected().map(|o| o.record_id.as_str()).collect();
    assert_eq!(accepted, vec!["recGood", "recDone"]);
    assert_eq!(rejected, vec!["recBad"]);

    let bad = report.rejected().next().unwrap();
    assert!(bad.issues.contains("'Jenga' is not one of"));
    assert!(bad.issues.contains("'Atlantis' is not one of"));
}

#[test]
fn test_cleaned_document_contents() {
    let dir = TempDir::new().unwrap();
    let report = pipeline().run(&write_records(&dir, sample_records())).unwrap();
    let good = &report.outcomes[0];

    assert_eq!(
        good.document.to_value(),
        json!({
            "meta": {"recordId": "recGood", "inactive": false},
            "contact": {
                "phone": ["+6034-151-2345", "+6011-345-12395"],
                "additionalNotes": "Anna, Quon Da"
            },
            "location": {"postcode": "08000", "state": "Selangor", "coversArea": false},
            "resource": {
                "businessName": "Kobis Briyani",
                "mustContactFirst": false,
                "accessMethod": ["Self-Service", "Home Delivery"],
                "additionalNotes": "nasi lemak; restocked Friday",
                "religiousAffiliation": "Non-Affiliated"
            }
        })
    );
}

// =============================================================================
// Write-back Updates
// =============================================================================

#[test]
fn test_write_back_updates() {
    let dir = TempDir::new().unwrap();
    let report = pipeline().run(&write_records(&dir, sample_records())).unwrap();

    let updates: Vec<(&str, Value)> = report
        .updates()
        .map(|(id, fields)| (id, Value::Object(fields.clone())))
        .collect();

    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].0, "recGood");
    assert_eq!(
        updates[0].1,
        json!({
            "Contact Number(s)": "+6034-151-2345, +6011-345-12395",
            "Contact Freeform Info": "Anna, Quon Da",
            "Postcode": "08000",
            "Religious Organisation?": "Non-Affiliated",
            "Schema Error": "",
            "Schema Validated": true
        })
    );

    assert_eq!(updates[1].0, "recBad");
    assert_eq!(updates[1].1["Schema Validated"], false);
    assert_eq!(updates[1].1["Schema Error"], report.outcomes[2].issues.as_str());
}

// =============================================================================
// Export File
// =============================================================================

#[test]
fn test_export_file_holds_accepted_documents_only() {
    let dir = TempDir::new().unwrap();
    let report = pipeline().run(&write_records(&dir, sample_records())).unwrap();

    let out = dir.path().join("json_output");
    let at = Local.with_ymd_and_hms(2021, 7, 4, 9, 5, 3).unwrap();
    let paths = write_export(&out, &report, &at).unwrap();

    assert_eq!(paths.data, out.join("2021-07-04-09-05-03-data.json"));
    assert_eq!(paths.updates, out.join("2021-07-04-09-05-03-updates.json"));

    let text = fs::read_to_string(&paths.data).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(r#"[{"meta": {"recordId": "recGood""#));
    assert!(lines[1].starts_with(r#"{"meta": {"recordId": "recDone""#));
    assert!(!text.contains("recBad"));

    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);

    let updates = fs::read_to_string(&paths.updates).unwrap();
    let updates: Value = serde_json::from_str(&updates).unwrap();
    assert_eq!(updates[0]["id"], "recGood");
    assert_eq!(updates[1]["id"], "recBad");
}

// =============================================================================
// Source Errors
// =============================================================================

#[test]
fn test_malformed_source_aborts_run() {
    let dir = TempDir::new().unwrap();
    let source = write_records(&dir, json!({"records": []}));
    assert!(matches!(pipeline().run(&source), Err(PipelineError::SourceMalformed(..))));
}
