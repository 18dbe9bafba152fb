//! Record assembly: flat row → nested four-section document
//!
//! - Sections are always emitted in the order meta, contact, location, resource
//! - Within a section, fields follow dictionary order
//! - Absent values are omitted, never written as null
//! - `meta.recordId` is always the first key of `meta`
//!
//! Assembly is a pure function of its inputs.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};

use super::value::Row;
use crate::schema::{
    ExportDictionary, FieldSchema, Section, SectionMap, BOOKKEEPING_FIELD, RECORD_ID_FIELD,
};

/// An assembled document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document {
    sections: SectionMap<Map<String, Value>>,
}

impl Document {
    /// Fields of one section, in insertion order
    pub fn section(&self, section: Section) -> &Map<String, Value> {
        self.sections.get(section)
    }

    /// The record identifier injected into `meta`
    pub fn record_id(&self) -> Option<&str> {
        self.sections.meta.get(RECORD_ID_FIELD).and_then(Value::as_str)
    }

    /// JSON value form, keys in document order
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        for (section, fields) in self.sections.iter() {
            root.insert(section.as_str().to_string(), Value::Object(fields.clone()));
        }
        Value::Object(root)
    }

    /// Deterministic text form: `", "` and `": "` separators, no other
    /// whitespace, DEL and non-ASCII characters escaped as `\uXXXX`.
    ///
    /// Identical documents always produce identical bytes.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        to_spaced_json(self)
    }
}

/// Assembles a document from a row already keyed by canonical names.
///
/// Only fields listed in `export` are taken; fields whose value is absent
/// are left out.
pub fn assemble(record_id: &str, export: &ExportDictionary, row: &Row) -> Document {
    let sections = export.map(|section, names| {
        let mut fields = Map::new();
        if section == Section::Meta {
            fields.insert(RECORD_ID_FIELD.to_string(), Value::from(record_id));
        }
        for name in names {
            let value = row.get(name);
            if value.is_present() {
                fields.insert(name.clone(), value.to_value());
            }
        }
        fields
    });

    Document { sections }
}

/// Assembles a document from a row keyed by external names.
///
/// Each section is resolved through its own external → canonical mapping,
/// so two sections may share a canonical name without their values
/// colliding. The bookkeeping field is never exported.
pub fn assemble_external(record_id: &str, schema: &FieldSchema, row: &Row) -> Document {
    let sections = schema.external_to_canonical().map(|section, mappings| {
        let mut fields = Map::new();
        if section == Section::Meta {
            fields.insert(RECORD_ID_FIELD.to_string(), Value::from(record_id));
        }
        for mapping in mappings {
            if section == Section::Meta && mapping.canonical == BOOKKEEPING_FIELD {
                continue;
            }
            let value = row.get(&mapping.external);
            if value.is_present() {
                fields.insert(mapping.canonical.clone(), value.to_value());
            }
        }
        fields
    });

    Document { sections }
}

/// Serializes any value with the document text format
pub fn to_spaced_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buffer = Vec::with_capacity(256);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buffer)
        .map_err(|e| serde_json::Error::io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Compact JSON with a single space after every `,` and `:`.
///
/// Strings are printable ASCII only: DEL and non-ASCII characters become
/// `\uXXXX` escapes. Numbers keep serde_json's shortest form, so large
/// floats print as `1e16` rather than `1e+16`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.bytes().all(|b| b.is_ascii() && b != 0x7f) {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() && c != '\x7f' {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
