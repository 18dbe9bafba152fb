//! Field dictionary and field schema construction
//!
//! A [`FieldSchema`] is built once from two declarative sources:
//! - the formal schema document (JSON Schema draft 6) with
//!   `definitions.meta|contact|location|resource`
//! - the field dictionary, `{"<section>": {"<external>": "<canonical>", ...}}`
//!
//! Both are bundled into the binary and can be overridden from disk with
//! [`SchemaLoader`]. Nothing is mutated after construction.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::{ExportDictionary, FieldMapping, Section, SectionMap};
use crate::observability::{log_event, Event};

/// Canonical name of the record identifier injected into `meta`
pub const RECORD_ID_FIELD: &str = "recordId";

/// Canonical name of the internal "already validated" flag.
///
/// It lives in the dictionary so collaborators can request the column,
/// but it is never exported.
pub const BOOKKEEPING_FIELD: &str = "validated";

const BUNDLED_SCHEMA: &str = include_str!("../../config/schema.json");
const BUNDLED_FIELDS: &str = include_str!("../../config/fields.json");

/// Ordered external → canonical mapping for all four sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDictionary {
    sections: SectionMap<Vec<FieldMapping>>,
}

impl FieldDictionary {
    /// Builds a dictionary from per-section mappings, checking its invariants:
    /// - an external name appears in at most one section
    /// - a canonical name appears at most once within a section
    /// - no name is empty and `recordId` is not used as a canonical name
    pub fn new(sections: SectionMap<Vec<FieldMapping>>) -> SchemaResult<Self> {
        check_invariants(&sections)?;
        Ok(Self { sections })
    }

    /// Parses the JSON form, preserving key order within each section
    pub fn from_value(value: &Value) -> SchemaResult<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| SchemaError::invalid_dictionary("root must be an object"))?;

        for key in root.keys() {
            if Section::from_key(key).is_none() {
                return Err(SchemaError::invalid_dictionary(format!(
                    "unknown section '{}'",
                    key
                )));
            }
        }

        let sections = SectionMap::try_from_fn(|section| {
            let entries = root
                .get(section.as_str())
                .ok_or_else(|| {
                    SchemaError::invalid_dictionary(format!("missing section '{}'", section))
                })?
                .as_object()
                .ok_or_else(|| {
                    SchemaError::invalid_dictionary(format!(
                        "section '{}' must be an object",
                        section
                    ))
                })?;

            entries
                .iter()
                .map(|(external, canonical)| {
                    let canonical = canonical.as_str().ok_or_else(|| {
                        SchemaError::invalid_dictionary(format!(
                            "'{}' in section '{}' must map to a string",
                            external, section
                        ))
                    })?;
                    Ok(FieldMapping::new(external.clone(), canonical))
                })
                .collect::<SchemaResult<Vec<_>>>()
        })?;

        Self::new(sections)
    }

    /// Parses the JSON text form
    pub fn from_json_str(text: &str) -> SchemaResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SchemaError::malformed("<field dictionary>", e))?;
        Self::from_value(&value)
    }

    /// The deployment's dictionary compiled into the binary
    pub fn bundled() -> SchemaResult<Self> {
        Self::from_json_str(BUNDLED_FIELDS).map_err(|e| e.with_origin("<bundled fields.json>"))
    }

    /// Mappings of one section, in dictionary order
    pub fn section(&self, section: Section) -> &[FieldMapping] {
        self.sections.get(section)
    }

    /// Mappings of all sections
    pub fn sections(&self) -> &SectionMap<Vec<FieldMapping>> {
        &self.sections
    }
}

/// Static description of the document: four sections, the field dictionary
/// and the formal validation schema.
///
/// Read-only after construction and safe to share across threads.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    dictionary: FieldDictionary,
    document: Value,
}

impl FieldSchema {
    /// Builds a field schema from a formal schema document and a dictionary.
    ///
    /// # Errors
    ///
    /// `WF_SCHEMA_CONFIG` if any of `definitions.meta|contact|location|resource`
    /// is missing or not an object, or if the document does not compile as a
    /// draft 6 schema.
    pub fn new(document: Value, dictionary: FieldDictionary) -> SchemaResult<Self> {
        for section in Section::ALL {
            let definition = document
                .get("definitions")
                .and_then(|defs| defs.get(section.as_str()));
            if !definition.is_some_and(Value::is_object) {
                return Err(SchemaError::missing_definition(section));
            }
        }
        jsonschema::draft6::new(&document).map_err(SchemaError::invalid_schema)?;

        let schema = Self { dictionary, document };
        schema.report_drift();
        Ok(schema)
    }

    /// Bundled schema document and dictionary
    pub fn bundled() -> SchemaResult<Self> {
        let document: Value = serde_json::from_str(BUNDLED_SCHEMA)
            .map_err(|e| SchemaError::malformed("<bundled schema.json>", e))?;
        Self::new(document, FieldDictionary::bundled()?)
    }

    /// Section names in document order
    pub fn section_names(&self) -> [Section; 4] {
        Section::ALL
    }

    /// Per-section external → canonical mapping
    pub fn external_to_canonical(&self) -> &SectionMap<Vec<FieldMapping>> {
        self.dictionary.sections()
    }

    /// Per-section canonical names for assembly, with the bookkeeping field
    /// removed from `meta`
    pub fn canonical_names_for_export(&self) -> ExportDictionary {
        self.dictionary.sections().map(|section, mappings| {
            mappings
                .iter()
                .filter(|m| !(section == Section::Meta && m.canonical == BOOKKEEPING_FIELD))
                .map(|m| m.canonical.clone())
                .collect()
        })
    }

    /// Per-section external names, for collaborators deciding which
    /// columns to request and clean
    pub fn external_names_by_section(&self) -> SectionMap<Vec<String>> {
        self.dictionary
            .sections()
            .map(|_, mappings| mappings.iter().map(|m| m.external.clone()).collect())
    }

    /// All four sections merged into one external → canonical mapping.
    ///
    /// External names are unique across sections, so no entry shadows another.
    pub fn flattened_external_to_canonical(&self) -> BTreeMap<String, String> {
        self.dictionary
            .sections()
            .iter()
            .flat_map(|(_, mappings)| mappings.iter())
            .map(|m| (m.external.clone(), m.canonical.clone()))
            .collect()
    }

    /// The dictionary this schema was built with
    pub fn dictionary(&self) -> &FieldDictionary {
        &self.dictionary
    }

    /// The formal schema document
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The `definitions.<section>` object of the formal schema
    pub fn definition(&self, section: Section) -> &Value {
        &self.document["definitions"][section.as_str()]
    }

    /// Canonical names the dictionary exports but the formal schema does
    /// not declare under the section's `properties`
    pub fn undeclared_fields(&self) -> Vec<(Section, String)> {
        let export = self.canonical_names_for_export();
        let mut undeclared = Vec::new();

        for (section, names) in export.iter() {
            let properties = self.definition(section).get("properties");
            for name in names {
                let declared = properties.is_some_and(|p| p.get(name).is_some());
                if !declared {
                    undeclared.push((section, name.clone()));
                }
            }
        }

        undeclared
    }

    fn report_drift(&self) {
        for (section, field) in self.undeclared_fields() {
            log_event(
                Event::SchemaDrift,
                &[("section", section.as_str()), ("field", field.as_str())],
            );
        }
    }
}

/// Reads the schema document and field dictionary from disk.
///
/// Either path may be omitted, in which case the bundled source is used.
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    schema_path: Option<PathBuf>,
    fields_path: Option<PathBuf>,
}

impl SchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a formal schema file instead of the bundled one
    pub fn with_schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    /// Use a field dictionary file instead of the bundled one
    pub fn with_fields_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.fields_path = Some(path.into());
        self
    }

    /// Loads both sources and constructs the field schema
    pub fn load(&self) -> SchemaResult<FieldSchema> {
        let document = match &self.schema_path {
            Some(path) => read_json(path)?,
            None => serde_json::from_str(BUNDLED_SCHEMA)
                .map_err(|e| SchemaError::malformed("<bundled schema.json>", e))?,
        };

        let dictionary = match &self.fields_path {
            Some(path) => FieldDictionary::from_value(&read_json(path)?)
                .map_err(|e| e.with_origin(path.display().to_string()))?,
            None => FieldDictionary::bundled()?,
        };

        let origin = self
            .schema_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<bundled schema.json>".into());
        let schema = FieldSchema::new(document, dictionary)
            .map_err(|e| e.with_origin(origin.clone()))?;

        log_event(Event::SchemaLoaded, &[("schema", origin.as_str())]);
        Ok(schema)
    }
}

fn check_invariants(sections: &SectionMap<Vec<FieldMapping>>) -> SchemaResult<()> {
    let mut external_owner: HashMap<&str, Section> = HashMap::new();

    for (section, mappings) in sections.iter() {
        let mut canonical_seen: HashMap<&str, &str> = HashMap::new();

        for mapping in mappings {
            if mapping.external.is_empty() || mapping.canonical.is_empty() {
                return Err(SchemaError::invalid_dictionary(format!(
                    "empty field name in section '{}'",
                    section
                )));
            }

            if mapping.canonical == RECORD_ID_FIELD {
                return Err(SchemaError::invalid_dictionary(format!(
                    "'{}' is reserved and cannot be mapped from '{}'",
                    RECORD_ID_FIELD, mapping.external
                )));
            }

            if let Some(first) = external_owner.insert(&mapping.external, section) {
                return Err(SchemaError::invalid_dictionary(format!(
                    "external field '{}' appears in both '{}' and '{}'",
                    mapping.external, first, section
                )));
            }

            if let Some(other) = canonical_seen.insert(&mapping.canonical, &mapping.external) {
                return Err(SchemaError::invalid_dictionary(format!(
                    "'{}' and '{}' both map to '{}' in section '{}'",
                    other, mapping.external, mapping.canonical, section
                )));
            }
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> SchemaResult<Value> {
    let origin = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| SchemaError::unreadable(origin.clone(), e))?;
    serde_json::from_str(&content).map_err(|e| SchemaError::malformed(origin, e))
}
