//! Raw record values
//!
//! A row handed to the core is a flat map whose values are absent, a
//! scalar, or a list of scalars. Nested objects are rejected at the boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// Errors raised when turning arbitrary JSON into a [`Row`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Row must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Field '{0}' holds a nested object")]
    NestedObject(String),

    #[error("Field '{0}' holds a list containing {1}")]
    NestedList(String, &'static str),
}

/// A single scalar: string, number or boolean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl Scalar {
    /// Returns the text of a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

/// Value of one field in a raw row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value; never emitted into a document
    #[default]
    Absent,
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    /// Returns the text of a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    /// Returns the text of a non-empty string value
    pub fn as_text(&self) -> Option<&str> {
        self.as_str().filter(|s| !s.is_empty())
    }

    /// Builds a list of strings, or `Absent` for an empty iterator
    pub fn text_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<Scalar> = items.into_iter().map(|s| Scalar::Text(s.into())).collect();
        if list.is_empty() {
            FieldValue::Absent
        } else {
            FieldValue::List(list)
        }
    }

    /// JSON form; `Absent` becomes `null`
    pub fn to_value(&self) -> Value {
        match self {
            FieldValue::Absent => Value::Null,
            FieldValue::Scalar(s) => s.to_value(),
            FieldValue::List(items) => Value::Array(items.iter().map(Scalar::to_value).collect()),
        }
    }

    /// Converts one JSON value; `field` names the value in errors
    pub fn from_json(field: &str, value: &Value) -> Result<Self, RowError> {
        match value {
            Value::Null => Ok(FieldValue::Absent),
            Value::Bool(b) => Ok(FieldValue::Scalar(Scalar::Bool(*b))),
            Value::Number(n) => Ok(FieldValue::Scalar(Scalar::Number(n.clone()))),
            Value::String(s) => Ok(FieldValue::Scalar(Scalar::Text(s.clone()))),
            Value::Object(_) => Err(RowError::NestedObject(field.to_string())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Bool(b) => Ok(Scalar::Bool(*b)),
                    Value::Number(n) => Ok(Scalar::Number(n.clone())),
                    Value::String(s) => Ok(Scalar::Text(s.clone())),
                    other => Err(RowError::NestedList(field.to_string(), json_type_name(other))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List),
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(s.into())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(s.into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Scalar(b.into())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Scalar(n.into())
    }
}

impl From<Vec<Scalar>> for FieldValue {
    fn from(items: Vec<Scalar>) -> Self {
        FieldValue::List(items)
    }
}

/// A flat record: field name → value.
///
/// Missing keys read as `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: HashMap<String, FieldValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Value of a field; `Absent` when the key is missing
    pub fn get(&self, name: &str) -> &FieldValue {
        static ABSENT: FieldValue = FieldValue::Absent;
        self.fields.get(name).unwrap_or(&ABSENT)
    }

    pub fn remove(&mut self, name: &str) -> FieldValue {
        self.fields.remove(name).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renames keys through `mapping`; keys without a mapping are dropped
    pub fn translate<'a, I>(&self, mapping: I) -> Row
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut out = Row::new();
        for (from, to) in mapping {
            if let Some(value) = self.fields.get(from) {
                out.fields.insert(to.clone(), value.clone());
            }
        }
        out
    }

    /// Builds a row from a JSON object
    pub fn from_json(value: &Value) -> Result<Self, RowError> {
        let object = value
            .as_object()
            .ok_or_else(|| RowError::NotAnObject(json_type_name(value)))?;

        let mut row = Row::new();
        for (name, value) in object {
            row.fields.insert(name.clone(), FieldValue::from_json(name, value)?);
        }
        Ok(row)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_accepts_scalars_and_lists() {
        let row = Row::from_json(&json!({
            "name": "Kedai",
            "count": 3,
            "open": true,
            "tags": ["a", 1],
            "gone": null
        }))
        .unwrap();

        assert_eq!(row.get("name").as_str(), Some("Kedai"));
        assert_eq!(row.get("count"), &FieldValue::Scalar(Scalar::Number(3.into())));
        assert_eq!(row.get("open"), &FieldValue::Scalar(Scalar::Bool(true)));
        assert_eq!(
            row.get("tags"),
            &FieldValue::List(vec![Scalar::from("a"), Scalar::from(1_i64)])
        );
        assert!(row.get("gone").is_absent());
        assert!(row.get("missing").is_absent());
    }

    #[test]
    fn test_from_json_rejects_nesting() {
        assert_eq!(
            Row::from_json(&json!({"a": {"b": 1}})),
            Err(RowError::NestedObject("a".into()))
        );
        assert_eq!(
            Row::from_json(&json!({"a": [[1]]})),
            Err(RowError::NestedList("a".into(), "array"))
        );
        assert_eq!(Row::from_json(&json!([1])), Err(RowError::NotAnObject("array")));
    }

    #[test]
    fn test_deserialize_untagged() {
        let row: Row =
            serde_json::from_str(r#"{"a": null, "b": "x", "c": [true], "d": 1.5}"#).unwrap();
        assert!(row.get("a").is_absent());
        assert_eq!(row.get("b").as_str(), Some("x"));
        assert_eq!(row.get("c"), &FieldValue::List(vec![Scalar::Bool(true)]));
        assert_eq!(row.get("d").to_value(), json!(1.5));
    }

    #[test]
    fn test_translate_renames_and_drops_unmapped() {
        let row = Row::new().with("Contact Name", "Anna").with("Other", "x");
        let mapping = vec![
            ("Contact Name".to_string(), "name".to_string()),
            ("City".to_string(), "city".to_string()),
        ];
        let translated = row.translate(mapping.iter().map(|(a, b)| (a, b)));
        assert_eq!(translated.get("name").as_str(), Some("Anna"));
        assert!(!translated.contains("city"));
        assert!(!translated.contains("Other"));
    }

    #[test]
    fn test_text_list_empty_is_absent() {
        assert!(FieldValue::text_list(Vec::<String>::new()).is_absent());
        assert_eq!(FieldValue::text_list(["a"]).to_value(), json!(["a"]));
    }

    #[test]
    fn test_as_text_skips_empty_strings() {
        assert_eq!(FieldValue::from("").as_text(), None);
        assert_eq!(FieldValue::from("x").as_text(), Some("x"));
        assert_eq!(FieldValue::from(true).as_text(), None);
    }
}
