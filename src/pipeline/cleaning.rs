//! Column cleaning applied to raw rows before assembly
//!
//! Rows arrive keyed by external column names as typed into the
//! spreadsheet. Cleaning is declarative: every rule names the columns it
//! touches, and the defaults reproduce the deployed cleaning.
//!
//! Rules run in a fixed order:
//! 1. placeholder values become absent
//! 2. presence flags become booleans
//! 3. the phone column is split into numbers and notes
//! 4. postcodes are zero-padded
//! 5. boolean columns default to false
//! 6. remaining defaults are filled in
//! 7. list-only columns drop non-list values
//! 8. free-form note columns are merged

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::phone::PhoneParser;
use crate::record::{FieldValue, Row, Scalar};

/// Separator between merged free-form notes
pub const NOTE_SEPARATOR: &str = "; ";

/// Width of a padded postcode
pub const POSTCODE_WIDTH: usize = 5;

/// Columns the phone parser reads and writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneColumns {
    /// Free-text numbers; replaced by the normalized list
    pub numbers: String,
    /// Contact notes; parser residual is prefixed here
    pub notes: String,
}

/// Several note columns folded into one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMerge {
    pub target: String,
    pub sources: Vec<String>,
}

/// Declarative cleaning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningRules {
    /// Text values treated as "no value"
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,

    /// Columns reduced to `true` when present, `false` when absent
    #[serde(default = "default_presence_flags")]
    pub presence_flags: Vec<String>,

    /// Columns set to `false` when absent
    #[serde(default = "default_false_columns")]
    pub default_false: Vec<String>,

    /// Values filled into absent columns
    #[serde(default = "default_values")]
    pub defaults: BTreeMap<String, Scalar>,

    /// Columns that only accept lists
    #[serde(default = "default_list_only")]
    pub list_only: Vec<String>,

    /// Postcode columns
    #[serde(default = "default_postcode_fields")]
    pub postcode_fields: Vec<String>,

    #[serde(default = "default_phone")]
    pub phone: Option<PhoneColumns>,

    #[serde(default = "default_merge_notes")]
    pub merge_notes: Option<NoteMerge>,

    /// Columns written back for newly validated records
    #[serde(default = "default_write_back")]
    pub write_back: Vec<String>,
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn default_placeholders() -> Vec<String> {
    strings(&["?", "N/A", ""])
}
fn default_presence_flags() -> Vec<String> {
    strings(&["Inactive?", "Must Contact First?"])
}
fn default_false_columns() -> Vec<String> {
    strings(&["Covers Area?"])
}
fn default_values() -> BTreeMap<String, Scalar> {
    BTreeMap::from([("Religious Organisation?".to_string(), Scalar::from("Non-Affiliated"))])
}
fn default_list_only() -> Vec<String> {
    strings(&["Other Limits", "Launch URL Language"])
}
fn default_postcode_fields() -> Vec<String> {
    strings(&["Postcode"])
}
fn default_phone() -> Option<PhoneColumns> {
    Some(PhoneColumns {
        numbers: "Contact Number(s)".to_string(),
        notes: "Contact Freeform Info".to_string(),
    })
}
fn default_merge_notes() -> Option<NoteMerge> {
    Some(NoteMerge {
        target: "Freeform Notes Misc".to_string(),
        sources: strings(&[
            "Resource Freeform Notes",
            "Freeform Notes Misc",
            "Freeform Update Notes",
        ]),
    })
}
fn default_write_back() -> Vec<String> {
    strings(&[
        "Contact Number(s)",
        "Contact Freeform Info",
        "Postcode",
        "Religious Organisation?",
    ])
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            placeholders: default_placeholders(),
            presence_flags: default_presence_flags(),
            default_false: default_false_columns(),
            defaults: default_values(),
            list_only: default_list_only(),
            postcode_fields: default_postcode_fields(),
            phone: default_phone(),
            merge_notes: default_merge_notes(),
            write_back: default_write_back(),
        }
    }
}

impl CleaningRules {
    /// Rules that leave every row untouched
    pub fn none() -> Self {
        Self {
            placeholders: Vec::new(),
            presence_flags: Vec::new(),
            default_false: Vec::new(),
            defaults: BTreeMap::new(),
            list_only: Vec::new(),
            postcode_fields: Vec::new(),
            phone: None,
            merge_notes: None,
            write_back: Vec::new(),
        }
    }

    /// Returns a cleaned copy of `row`
    pub fn apply(&self, row: &Row, parser: &PhoneParser) -> Row {
        let mut row = row.clone();

        self.blank_placeholders(&mut row);

        for name in &self.presence_flags {
            let present = row.get(name).is_present();
            row.insert(name.clone(), present);
        }

        if let Some(columns) = &self.phone {
            split_phone(&mut row, columns, parser);
        }

        for name in &self.postcode_fields {
            if let Some(padded) = pad_postcode(row.get(name)) {
                row.insert(name.clone(), padded);
            }
        }

        for name in &self.default_false {
            if row.get(name).is_absent() {
                row.insert(name.clone(), false);
            }
        }

        for (name, value) in &self.defaults {
            if row.get(name).is_absent() {
                row.insert(name.clone(), value.clone());
            }
        }

        for name in &self.list_only {
            if !matches!(row.get(name), FieldValue::List(_) | FieldValue::Absent) {
                row.insert(name.clone(), FieldValue::Absent);
            }
        }

        if let Some(merge) = &self.merge_notes {
            merge_notes(&mut row, merge);
        }

        row
    }

    fn blank_placeholders(&self, row: &mut Row) {
        if self.placeholders.is_empty() {
            return;
        }

        let blanked: Vec<String> = row
            .names()
            .filter(|name| {
                row.get(name)
                    .as_str()
                    .is_some_and(|text| self.placeholders.iter().any(|p| p == text))
            })
            .map(str::to_string)
            .collect();

        for name in blanked {
            row.insert(name, FieldValue::Absent);
        }
    }
}

fn split_phone(row: &mut Row, columns: &PhoneColumns, parser: &PhoneParser) {
    let raw = row.get(&columns.numbers);
    if raw.is_absent() {
        return;
    }

    let parsed = parser.parse_value(raw);
    row.insert(columns.numbers.clone(), parsed.numbers_value());

    if let Some(residual) = parsed.residual {
        let notes = match row.get(&columns.notes).as_text() {
            Some(existing) => format!("{}{}{}", residual, NOTE_SEPARATOR, existing),
            None => residual,
        };
        row.insert(columns.notes.clone(), notes);
    }
}

/// Zero-padded postcode for an integer or digit-string value
fn pad_postcode(value: &FieldValue) -> Option<String> {
    let code = match value {
        FieldValue::Scalar(Scalar::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))?,
        FieldValue::Scalar(Scalar::Text(text)) => {
            let text = text.trim();
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            text.parse().ok()?
        }
        _ => return None,
    };

    Some(format!("{:0width$}", code, width = POSTCODE_WIDTH))
}

fn merge_notes(row: &mut Row, merge: &NoteMerge) {
    let pieces: Vec<String> = merge
        .sources
        .iter()
        .filter_map(|name| row.get(name).as_text().map(str::to_string))
        .collect();

    if pieces.is_empty() {
        row.insert(merge.target.clone(), FieldValue::Absent);
    } else {
        row.insert(merge.target.clone(), pieces.join(NOTE_SEPARATOR));
    }
}
