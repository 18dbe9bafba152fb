//! CLI configuration file
//!
//! ```json
//! {
//!     "schema_path": "./config/schema.json",
//!     "fields_path": "./config/fields.json",
//!     "output_dir": "./json_output",
//!     "log_level": "info",
//!     "strict_columns": false,
//!     "cleaning": {"placeholders": ["?", "N/A", ""]}
//! }
//! ```
//!
//! Every key is optional. Omitted schema and dictionary paths fall back to
//! the bundled sources.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::observability::{log_event, Event, Severity};
use crate::pipeline::CleaningRules;
use crate::schema::{FieldSchema, SchemaLoader};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Formal schema file (optional, bundled when absent)
    #[serde(default)]
    pub schema_path: Option<String>,

    /// Field dictionary file (optional, bundled when absent)
    #[serde(default)]
    pub fields_path: Option<String>,

    /// Export directory (optional, default "./json_output")
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Fail exports when the source lacks dictionary columns
    #[serde(default)]
    pub strict_columns: bool,

    /// Column cleaning rules (optional, deployment defaults)
    #[serde(default)]
    pub cleaning: CleaningRules,
}

fn default_output_dir() -> String {
    "./json_output".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_path: None,
            fields_path: None,
            output_dir: default_output_dir(),
            log_level: default_log_level(),
            strict_columns: false,
            cleaning: CleaningRules::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        log_event(Event::ConfigLoaded, &[("path", path.display().to_string().as_str())]);
        Ok(config)
    }

    /// Load from `path`, or use the defaults when no path is given
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        self.severity()?;

        if self.output_dir.trim().is_empty() {
            return Err(CliError::config_error("output_dir must not be empty"));
        }

        let paths = [("schema_path", &self.schema_path), ("fields_path", &self.fields_path)];
        for (key, value) in paths {
            if value.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(CliError::config_error(format!("{} must not be empty", key)));
            }
        }

        if let Some(phone) = &self.cleaning.phone {
            if phone.numbers == phone.notes {
                return Err(CliError::config_error(
                    "cleaning.phone.numbers and cleaning.phone.notes must name different columns",
                ));
            }
        }

        Ok(())
    }

    /// Minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    /// Output directory as Path
    pub fn output_path(&self) -> &Path {
        Path::new(&self.output_dir)
    }

    /// Builds the field schema from the configured sources
    pub fn load_schema(&self) -> CliResult<FieldSchema> {
        let mut loader = SchemaLoader::new();
        if let Some(path) = &self.schema_path {
            loader = loader.with_schema_file(path);
        }
        if let Some(path) = &self.fields_path {
            loader = loader.with_fields_file(path);
        }
        Ok(loader.load()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, value: serde_json::Value) -> std::path::PathBuf {
        let path = dir.path().join("whiteflag.json");
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_config_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({}));

        let config = Config::load(&path).unwrap();
        assert_eq!(config.output_dir, "./json_output");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.schema_path, None);
        assert!(!config.strict_columns);
        assert_eq!(config.cleaning, CleaningRules::default());
    }

    #[test]
    fn test_config_validates_log_level() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({"log_level": "loud"}));

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.code_str(), "WF_CLI_CONFIG_ERROR");
        assert!(err.message().contains("loud"));
    }

    #[test]
    fn test_config_rejects_empty_paths() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({"fields_path": " "}));
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_config_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("whiteflag.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load(&path).unwrap_err().message().starts_with("Invalid config JSON"));
    }

    #[test]
    fn test_config_partial_cleaning_override() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({"cleaning": {"list_only": []}}));

        let config = Config::load(&path).unwrap();
        assert!(config.cleaning.list_only.is_empty());
        assert_eq!(config.cleaning.placeholders, CleaningRules::default().placeholders);
    }

    #[test]
    fn test_load_schema_from_files() {
        let dir = TempDir::new().unwrap();
        let fields = dir.path().join("fields.json");
        fs::write(
            &fields,
            json!({
                "meta": {},
                "contact": {"Contact Name": "name"},
                "location": {},
                "resource": {"Resource Name": "businessName"}
            })
            .to_string(),
        )
        .unwrap();

        let config = Config {
            fields_path: Some(fields.display().to_string()),
            ..Config::default()
        };
        let schema = config.load_schema().unwrap();
        assert_eq!(schema.external_names_by_section().contact, vec!["Contact Name"]);
    }

    #[test]
    fn test_load_schema_missing_file() {
        let config = Config {
            schema_path: Some("/nonexistent/schema.json".into()),
            ..Config::default()
        };
        assert_eq!(config.load_schema().unwrap_err().code_str(), "WF_SCHEMA_SOURCE");
    }
}
