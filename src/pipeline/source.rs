//! Record sources
//!
//! A source yields identified raw rows keyed by external column names. The
//! file format is the spreadsheet service's export shape:
//!
//! ```json
//! [{"id": "rec1", "fields": {"Resource Name": "Kedai Runcit", "City": "Ipoh"}}]
//! ```

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::errors::{PipelineError, PipelineResult};
use crate::record::Row;

/// One identified raw row
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: String,
    pub fields: Row,
}

impl SourceRecord {
    pub fn new(id: impl Into<String>, fields: Row) -> Self {
        Self { id: id.into(), fields }
    }
}

/// Anything that can hand the pipeline a batch of records
pub trait RecordSource {
    /// Label used in errors and logs
    fn describe(&self) -> String;

    /// Loads every record. Record ids are unique.
    fn records(&self) -> PipelineResult<Vec<SourceRecord>>;
}

impl RecordSource for Vec<SourceRecord> {
    fn describe(&self) -> String {
        "<memory>".to_string()
    }

    fn records(&self) -> PipelineResult<Vec<SourceRecord>> {
        check_unique(self)?;
        Ok(self.clone())
    }
}

/// Records stored in a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn records(&self) -> PipelineResult<Vec<SourceRecord>> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| PipelineError::SourceUnreadable(self.describe(), e.to_string()))?;
        parse_records(&self.describe(), &text)
    }
}

/// Parses the `[{"id", "fields"}]` export shape
pub fn parse_records(origin: &str, text: &str) -> PipelineResult<Vec<SourceRecord>> {
    let malformed = |message: String| PipelineError::SourceMalformed(origin.to_string(), message);

    let value: Value = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
    let entries = value
        .as_array()
        .ok_or_else(|| malformed("expected an array of records".to_string()))?;

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let id = entry
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(format!("record {} has no string 'id'", index)))?;

        let fields = match entry.get("fields") {
            None | Some(Value::Null) => Row::new(),
            Some(fields) => Row::from_json(fields)
                .map_err(|e| PipelineError::InvalidRow(id.to_string(), e))?,
        };

        records.push(SourceRecord::new(id, fields));
    }

    check_unique(&records)?;
    Ok(records)
}

/// Union of every column name seen across `records`
pub fn columns(records: &[SourceRecord]) -> BTreeSet<String> {
    records
        .iter()
        .flat_map(|record| record.fields.names().map(str::to_string))
        .collect()
}

fn check_unique(records: &[SourceRecord]) -> PipelineResult<()> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(PipelineError::DuplicateRecord(record.id.clone()));
        }
    }
    Ok(())
}
