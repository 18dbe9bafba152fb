//! Free-text phone field parsing
//!
//! A contact's phone field is typed by hand: several numbers, names,
//! parenthesised notes and arbitrary separators. Parsing yields the
//! normalized numbers (`+60XX-XXX-XXXX...`) and whatever annotation text
//! is left once the numbers are gone.
//!
//! Parsing never fails. Input that yields nothing yields `None` for that
//! half of the result.

pub mod passes;

use serde::Serialize;

use crate::record::FieldValue;

/// Result of parsing one phone field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedContact {
    /// Normalized numbers in order of appearance; `None` when none were found
    pub numbers: Option<Vec<String>>,
    /// Annotation text; `None` when nothing meaningful remains
    pub residual: Option<String>,
}

impl ParsedContact {
    pub fn is_empty(&self) -> bool {
        self.numbers.is_none() && self.residual.is_none()
    }

    /// Numbers as a field value: a list of strings, or `Absent`
    pub fn numbers_value(&self) -> FieldValue {
        match &self.numbers {
            Some(numbers) => FieldValue::text_list(numbers.iter().cloned()),
            None => FieldValue::Absent,
        }
    }

    /// Residual text as a field value, or `Absent`
    pub fn residual_value(&self) -> FieldValue {
        match &self.residual {
            Some(text) => FieldValue::from(text.as_str()),
            None => FieldValue::Absent,
        }
    }
}

/// Stateless phone field parser
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneParser;

impl PhoneParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses one free-text phone field
    pub fn parse(&self, text: &str) -> ParsedContact {
        if text.is_empty() {
            return ParsedContact::default();
        }

        ParsedContact {
            numbers: extract_numbers(text),
            residual: extract_residual(text),
        }
    }

    /// Parses a raw field value. Anything other than a string (absent,
    /// numbers, booleans, lists) yields an empty result.
    pub fn parse_value(&self, value: &FieldValue) -> ParsedContact {
        match value.as_str() {
            Some(text) => self.parse(text),
            None => ParsedContact::default(),
        }
    }
}

fn extract_residual(text: &str) -> Option<String> {
    let text = passes::strip_formatting_hyphens(text);
    let text = passes::blank_phone_runs(&text);
    passes::collect_annotations(&text)
}

fn extract_numbers(text: &str) -> Option<Vec<String>> {
    let numbers: Vec<String> = passes::split_entries(text)
        .iter()
        .flat_map(|entry| {
            let stripped = passes::strip_trunk_prefix(entry);
            passes::digit_runs(&stripped)
                .map(passes::format_number)
                .collect::<Vec<_>>()
        })
        .collect();

    if numbers.is_empty() {
        None
    } else {
        Some(numbers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Scalar;
    use proptest::prelude::*;

    fn parse(text: &str) -> ParsedContact {
        PhoneParser::new().parse(text)
    }

    fn numbers(list: &[&str]) -> Option<Vec<String>> {
        Some(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_single_international_number() {
        assert_eq!(
            parse("+60123456789"),
            ParsedContact { numbers: numbers(&["+6012-345-6789"]), residual: None }
        );
    }

    #[test]
    fn test_number_with_parenthesised_note() {
        assert_eq!(
            parse("0377212345 (En Pai Ton)"),
            ParsedContact {
                numbers: numbers(&["+6037-721-2345"]),
                residual: Some("En Pai Ton".into()),
            }
        );
    }

    #[test]
    fn test_named_numbers() {
        assert_eq!(
            parse("Anna: 0341512345, Quon Da: 01134512395"),
            ParsedContact {
                numbers: numbers(&["+6034-151-2345", "+6011-345-12395"]),
                residual: Some("Anna, Quon Da".into()),
            }
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_text_without_numbers() {
        assert_eq!(
            parse("SURE2FAIL"),
            ParsedContact { numbers: None, residual: Some("SURE2FAIL".into()) }
        );
    }

    #[test]
    fn test_slash_separated_and_hyphenated() {
        let parsed = parse("012-345 6789 / 03-2141 1234");
        assert_eq!(parsed.numbers, numbers(&["+6012-345-6789", "+6032-141-1234"]));
        assert_eq!(parsed.residual, None);
    }

    #[test]
    fn test_short_runs_are_not_numbers() {
        let parsed = parse("ext 1234");
        assert_eq!(parsed.numbers, None);
        assert_eq!(parsed.residual, Some("ext".into()));
    }

    #[test]
    fn test_non_string_values_yield_nothing() {
        let parser = PhoneParser::new();
        assert!(parser.parse_value(&FieldValue::Absent).is_empty());
        assert!(parser.parse_value(&FieldValue::List(vec![])).is_empty());
        assert!(parser.parse_value(&FieldValue::from(60123456789_i64)).is_empty());
        assert!(parser
            .parse_value(&FieldValue::List(vec![Scalar::from("0123456789")]))
            .is_empty());
    }

    #[test]
    fn test_parse_value_on_text() {
        let parsed = PhoneParser::new().parse_value(&FieldValue::from("+60123456789"));
        assert_eq!(parsed.numbers_value(), FieldValue::text_list(["+6012-345-6789"]));
        assert!(parsed.residual_value().is_absent());
    }

    proptest! {
        #[test]
        fn prop_normalized_numbers_are_fixed_points(run in "[1-9][0-9]{7,11}") {
            let normalized = passes::format_number(&run);
            let parsed = parse(&normalized);
            prop_assert_eq!(parsed.numbers, Some(vec![normalized]));
            prop_assert_eq!(parsed.residual, None);
        }

        #[test]
        fn prop_one_number_per_named_entry(
            entries in prop::collection::vec(("[A-Za-z]{1,8}", "0[1-9][0-9]{8,9}"), 1..5)
        ) {
            let text = entries
                .iter()
                .map(|(name, digits)| format!("{}: {}", name, digits))
                .collect::<Vec<_>>()
                .join(", ");

            let parsed = parse(&text);
            let found = parsed.numbers.unwrap_or_default();
            prop_assert_eq!(found.len(), entries.len());
            for (number, (_, digits)) in found.iter().zip(&entries) {
                prop_assert_eq!(number.replace('-', ""), format!("+60{}", &digits[1..]));
            }

            let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
            prop_assert_eq!(parsed.residual, Some(names.join(", ")));
        }

        #[test]
        fn prop_parse_never_panics(text in "\\PC{0,40}") {
            let parsed = parse(&text);
            if let Some(numbers) = parsed.numbers {
                prop_assert!(numbers.iter().all(|n| n.starts_with("+60")));
            }
        }
    }
}
