//! Export sink
//!
//! A run writes two files into the output directory, sharing one local
//! timestamp:
//! - `<stamp>-data.json`: accepted documents, `[doc,\ndoc,...]`
//! - `<stamp>-updates.json`: write-back field updates per record id

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{json, Value};

use super::driver::PipelineReport;
use super::errors::{PipelineError, PipelineResult};
use crate::observability::{log_event, Event};
use crate::record::Document;

/// Timestamp format used in export file names
pub const STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Files written by one export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPaths {
    pub data: PathBuf,
    pub updates: PathBuf,
}

pub fn export_stamp(at: &DateTime<Local>) -> String {
    at.format(STAMP_FORMAT).to_string()
}

/// Renders documents as a JSON array, one document per line
pub fn render_documents<'a, I>(documents: I) -> PipelineResult<String>
where
    I: IntoIterator<Item = &'a Document>,
{
    let rendered = documents
        .into_iter()
        .map(|doc| {
            doc.to_json_string()
                .map_err(|e| PipelineError::WriteFailed("document".to_string(), e.to_string()))
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    Ok(format!("[{}]", rendered.join(",\n")))
}

/// Writes the accepted documents and the write-back updates of `report`
pub fn write_export(
    dir: &Path,
    report: &PipelineReport,
    at: &DateTime<Local>,
) -> PipelineResult<ExportPaths> {
    fs::create_dir_all(dir).map_err(|e| write_failed(dir, e))?;

    let stamp = export_stamp(at);
    let paths = ExportPaths {
        data: dir.join(format!("{}-data.json", stamp)),
        updates: dir.join(format!("{}-updates.json", stamp)),
    };

    let data = render_documents(report.accepted().map(|outcome| &outcome.document))?;
    write_file(&paths.data, &data)?;

    let updates: Vec<Value> = report
        .updates()
        .map(|(id, fields)| json!({"id": id, "fields": fields}))
        .collect();
    let updates = serde_json::to_string_pretty(&updates)
        .map_err(|e| write_failed(&paths.updates, e))?;
    write_file(&paths.updates, &updates)?;

    let path = paths.data.display().to_string();
    let documents = report.accepted().count().to_string();
    let update_count = report.updates().count().to_string();
    log_event(
        Event::ExportWritten,
        &[
            ("path", path.as_str()),
            ("documents", documents.as_str()),
            ("updates", update_count.as_str()),
        ],
    );

    Ok(paths)
}

fn write_file(path: &Path, content: &str) -> PipelineResult<()> {
    fs::write(path, content).map_err(|e| write_failed(path, e))
}

fn write_failed(path: &Path, reason: impl ToString) -> PipelineError {
    PipelineError::WriteFailed(path.display().to_string(), reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_export_stamp_format() {
        let at = Local.with_ymd_and_hms(2021, 7, 4, 9, 5, 3).unwrap();
        assert_eq!(export_stamp(&at), "2021-07-04-09-05-03");
    }

    #[test]
    fn test_render_documents_layout() {
        assert_eq!(render_documents(&[]).unwrap(), "[]");

        let a = Document::default();
        let b = Document::default();
        let text = render_documents([&a, &b]).unwrap();
        assert_eq!(
            text,
            concat!(
                r#"[{"meta": {}, "contact": {}, "location": {}, "resource": {}},"#,
                "\n",
                r#"{"meta": {}, "contact": {}, "location": {}, "resource": {}}]"#
            )
        );
    }
}
