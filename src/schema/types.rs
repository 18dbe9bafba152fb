//! Section and field-mapping types shared by the dictionary, the assembler
//! and the validator.
//!
//! Every output document has exactly four sections, always in the order
//! meta, contact, location, resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level grouping of an assembled document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Record bookkeeping (identifier, timestamps, flags)
    Meta,
    /// How to reach the resource
    Contact,
    /// Where the resource is
    Location,
    /// What is offered
    Resource,
}

impl Section {
    /// All sections in document order
    pub const ALL: [Section; 4] = [
        Section::Meta,
        Section::Contact,
        Section::Location,
        Section::Resource,
    ];

    /// Returns the key used for this section in documents and schemas
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Meta => "meta",
            Section::Contact => "contact",
            Section::Location => "location",
            Section::Resource => "resource",
        }
    }

    /// Parses a section key
    pub fn from_key(key: &str) -> Option<Self> {
        Section::ALL.into_iter().find(|s| s.as_str() == key)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One value per section.
///
/// Serializes as an object with the sections in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMap<T> {
    pub meta: T,
    pub contact: T,
    pub location: T,
    pub resource: T,
}

impl<T> SectionMap<T> {
    /// Builds a map by evaluating `f` once per section, in document order
    pub fn from_fn(mut f: impl FnMut(Section) -> T) -> Self {
        Self {
            meta: f(Section::Meta),
            contact: f(Section::Contact),
            location: f(Section::Location),
            resource: f(Section::Resource),
        }
    }

    /// Fallible variant of [`SectionMap::from_fn`]; stops at the first error
    pub fn try_from_fn<E>(mut f: impl FnMut(Section) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            meta: f(Section::Meta)?,
            contact: f(Section::Contact)?,
            location: f(Section::Location)?,
            resource: f(Section::Resource)?,
        })
    }

    pub fn get(&self, section: Section) -> &T {
        match section {
            Section::Meta => &self.meta,
            Section::Contact => &self.contact,
            Section::Location => &self.location,
            Section::Resource => &self.resource,
        }
    }

    pub fn get_mut(&mut self, section: Section) -> &mut T {
        match section {
            Section::Meta => &mut self.meta,
            Section::Contact => &mut self.contact,
            Section::Location => &mut self.location,
            Section::Resource => &mut self.resource,
        }
    }

    /// Iterates `(section, value)` pairs in document order
    pub fn iter(&self) -> impl Iterator<Item = (Section, &T)> {
        Section::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    /// Applies `f` to every section value
    pub fn map<U>(&self, mut f: impl FnMut(Section, &T) -> U) -> SectionMap<U> {
        SectionMap::from_fn(|s| f(s, self.get(s)))
    }
}

/// One entry of the field dictionary: an external column label and the
/// canonical name it is stored under in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Label used by the record source
    pub external: String,
    /// Name used inside the assembled document
    pub canonical: String,
}

impl FieldMapping {
    pub fn new(external: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            external: external.into(),
            canonical: canonical.into(),
        }
    }
}

/// Canonical field names per section, in dictionary order.
///
/// This is the projection the assembler consumes.
pub type ExportDictionary = SectionMap<Vec<String>>;
