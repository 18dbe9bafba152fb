//! CLI command implementations
//!
//! Each command computes a JSON value; `run_command` writes it to stdout as
//! `{"status": "ok", "data": ...}`, or writes `{"status": "error", ...}`
//! and returns the error so the process exits non-zero.

use std::path::Path;

use chrono::Local;
use serde_json::{json, Map, Value};

use crate::observability::Logger;
use crate::phone::PhoneParser;
use crate::pipeline::{write_export, JsonFileSource, Pipeline};
use crate::schema::ComplianceValidator;

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_input, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = match cmd {
        Command::Phone { text } => Ok(phone(&text)),
        Command::Fields { config } => fields(config.as_deref()),
        Command::Validate { config, input } => validate(config.as_deref(), input.as_deref()),
        Command::Export {
            config,
            input,
            strict_columns,
            output_dir,
        } => export(config.as_deref(), &input, strict_columns, output_dir.as_deref()),
    };

    match result {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Parse a free-text phone field
pub fn phone(text: &str) -> Value {
    let parsed = PhoneParser::new().parse(text);
    json!({
        "numbers": parsed.numbers,
        "residual": parsed.residual,
    })
}

/// External field names by section, in dictionary order
pub fn fields(config_path: Option<&Path>) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let schema = config.load_schema()?;

    let mut sections = Map::new();
    for (section, names) in schema.external_names_by_section().iter() {
        sections.insert(section.as_str().to_string(), json!(names));
    }
    Ok(Value::Object(sections))
}

/// Validate one document or an array of documents
pub fn validate(config_path: Option<&Path>, input: Option<&Path>) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let schema = config.load_schema()?;
    let validator = ComplianceValidator::new(&schema)?;

    let documents = match read_input(input)? {
        Value::Array(documents) => documents,
        document @ Value::Object(_) => vec![document],
        _ => {
            return Err(CliError::input_error(
                "Expected a document object or an array of documents",
            ))
        }
    };

    let results: Vec<Value> = documents
        .iter()
        .map(|document| {
            let issues = validator.validate(document);
            json!({
                "recordId": document.pointer("/meta/recordId").cloned().unwrap_or(Value::Null),
                "compliant": issues.is_empty(),
                "issues": issues,
            })
        })
        .collect();

    let compliant = results.iter().filter(|r| r["compliant"] == true).count();
    Ok(json!({
        "documents": results.len(),
        "compliant": compliant,
        "results": results,
    }))
}

/// Run the pipeline over a record file and write the export files
pub fn export(
    config_path: Option<&Path>,
    input: &Path,
    strict_columns: bool,
    output_dir: Option<&Path>,
) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let schema = config.load_schema()?;

    let pipeline = Pipeline::new(schema, config.cleaning.clone())?
        .with_strict_columns(strict_columns || config.strict_columns);
    let report = pipeline.run(&JsonFileSource::new(input))?;

    let dir = output_dir.unwrap_or_else(|| config.output_path());
    let paths = write_export(dir, &report, &Local::now())?;

    let rejected: Vec<Value> = report
        .rejected()
        .map(|o| json!({"id": o.record_id, "issues": o.issues}))
        .collect();

    Ok(json!({
        "records": report.outcomes.len(),
        "accepted": report.accepted().count(),
        "rejected": rejected,
        "missing_columns": report.missing_columns,
        "data_file": paths.data.display().to_string(),
        "updates_file": paths.updates.display().to_string(),
    }))
}

fn load_config(path: Option<&Path>) -> CliResult<Config> {
    let config = Config::load_or_default(path)?;
    Logger::set_min_severity(config.severity()?);
    Ok(config)
}
