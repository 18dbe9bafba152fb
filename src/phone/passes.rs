//! Lexical passes used by the phone parser.
//!
//! Residual text (annotations left after numbers are removed):
//! 1. [`strip_formatting_hyphens`]
//! 2. [`blank_phone_runs`]
//! 3. [`collect_annotations`]
//!
//! Number extraction:
//! 1. [`split_entries`]
//! 2. [`strip_trunk_prefix`]
//! 3. [`digit_runs`]
//! 4. [`format_number`]
//!
//! Both pipelines start from the original text. Digits are Unicode decimal
//! digits (`\d`); "word" characters are alphanumerics and `_`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Country code prepended to every extracted number
pub const COUNTRY_CODE: &str = "+60";

/// Shortest digit run blanked out of residual text
const MIN_BLANKED_DIGITS: usize = 3;

/// Runs of 2+ whitespace and every colon; deleted from residual text
static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}|:").unwrap());

/// Leading `+60`, `0` or `60`, and any letter or symbol directly before a `0`
static TRUNK_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+60|^0|^60|[A-Za-z\W]0").unwrap());

/// Phone-number-length digit runs
static NUMBER_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{8,}").unwrap());

/// A single decimal digit
static DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d$").unwrap());

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || (!c.is_ascii() && DIGIT_RE.is_match(c.encode_utf8(&mut [0; 4])))
}

fn joins_number(c: char) -> bool {
    c.is_whitespace() || is_digit(c)
}

fn leading_digits(chars: &[char]) -> usize {
    chars.iter().take_while(|&&c| is_digit(c)).count()
}

/// Removes hyphens whose neighbours are both whitespace or digits.
///
/// `012-345 6789` loses its hyphen; `Self-Service` keeps it.
pub fn strip_formatting_hyphens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();

    chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| {
            let formatting = c == '-'
                && i > 0
                && joins_number(chars[i - 1])
                && chars.get(i + 1).is_some_and(|&next| joins_number(next));
            !formatting
        })
        .map(|(_, &c)| c)
        .collect()
}

/// Replaces phone-shaped content and stray symbols with a single space.
///
/// Blanked, scanning left to right:
/// - `+6` followed by one or more digits
/// - an optional whitespace character plus a run of 3+ digits that is not
///   followed by a word character
/// - any other non-word character except `'` and the ASCII range `,`..=`@`
pub fn blank_phone_runs(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let rest = &chars[i..];

        if let Some(len) = country_code_run(rest).or_else(|| bare_digit_run(rest)) {
            out.push(' ');
            i += len;
        } else if is_stray_symbol(rest[0]) {
            out.push(' ');
            i += 1;
        } else {
            out.push(rest[0]);
            i += 1;
        }
    }

    out
}

fn country_code_run(rest: &[char]) -> Option<usize> {
    match rest {
        ['+', '6', tail @ ..] => match leading_digits(tail) {
            0 => None,
            n => Some(2 + n),
        },
        _ => None,
    }
}

fn bare_digit_run(rest: &[char]) -> Option<usize> {
    let start = usize::from(rest.first().is_some_and(|c| c.is_whitespace()));
    let digits = leading_digits(&rest[start..]);
    if digits < MIN_BLANKED_DIGITS {
        return None;
    }

    let end = start + digits;
    match rest.get(end) {
        Some(&next) if is_word(next) => None,
        _ => Some(end),
    }
}

fn is_stray_symbol(c: char) -> bool {
    !is_word(c) && c != '\'' && !(',' ..= '@').contains(&c)
}

/// Deletes whitespace runs and colons, splits on commas and keeps the
/// non-empty pieces other than a lone `/`, joined with `", "`.
pub fn collect_annotations(text: &str) -> Option<String> {
    let squeezed = NOISE_RE.replace_all(text, "");

    let pieces: Vec<&str> = squeezed
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty() && *piece != "/")
        .collect();

    if pieces.is_empty() {
        None
    } else {
        Some(pieces.join(", "))
    }
}

/// Splits text into candidate entries: `/` and `,` both separate entries,
/// whitespace and hyphens are deleted
pub fn split_entries(text: &str) -> Vec<String> {
    let compact: String = text
        .chars()
        .map(|c| if c == '/' { ',' } else { c })
        .filter(|&c| !c.is_whitespace() && c != '-')
        .collect();

    compact.split(',').map(str::to_string).collect()
}

/// Deletes a leading `+60`, `0` or `60`, and every letter or symbol that
/// sits directly before a `0`
pub fn strip_trunk_prefix(entry: &str) -> Cow<'_, str> {
    TRUNK_PREFIX_RE.replace_all(entry, "")
}

/// Maximal runs of 8+ digits, left to right
pub fn digit_runs(entry: &str) -> impl Iterator<Item = &str> {
    NUMBER_RUN_RE.find_iter(entry).map(|m| m.as_str())
}

/// Renders a national number as `+60XX-XXX-XXXX...`.
///
/// Dashes go after the 5th and 8th character, counted in chars.
pub fn format_number(run: &str) -> String {
    let full: Vec<char> = COUNTRY_CODE.chars().chain(run.chars()).collect();
    if full.len() <= 8 {
        return full.into_iter().collect();
    }

    let mut out = String::with_capacity(run.len() + 6);
    out.extend(&full[..5]);
    out.push('-');
    out.extend(&full[5..8]);
    out.push('-');
    out.extend(&full[8..]);
    out
}
