/*!
# Cell Codecs

Primitive encode/decode rules for single OneRoster CSV cells.

Every decoder takes the raw cell (`None` when the column is missing from the
row) and returns `Ok(None)` for an absent value, `Ok(Some(_))` for a valid one,
or the [`FieldErrorKind`] describing why the cell was rejected. Attaching the
column name is left to the row decoder.
*/

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::errors::FieldErrorKind;

pub type CodecResult<T> = Result<Option<T>, FieldErrorKind>;

/// Delimiter used by every multi-value cell in the format.
pub const DEFAULT_DELIMITER: char = ',';

/// Grade codes from the CEDS grade level vocabulary.
pub const GRADE_LEVELS: &[&str] = &[
    "IT", "PR", "PK", "TK", "KG", "01", "02", "03", "04", "05", "06", "07", "08", "09", "10",
    "11", "12", "13", "PS", "UG", "Other",
];

/// Shorthand grade codes still emitted by many SIS exports ("K-5", "3-8").
pub const GRADE_SHORTHAND: &[&str] = &[
    "K", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
];

pub const BOOLEAN_FLAGS: &[&str] = &["true", "false", "yes", "no"];

pub const STRICT_BOOLEANS: &[&str] = &["true", "false"];

// ================================================================================================
// Scalar predicates
// ================================================================================================

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `YYYY-MM-DD`, and the date must exist.
pub fn is_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    if !(all_digits(&value[0..4]) && all_digits(&value[5..7]) && all_digits(&value[8..10])) {
        return false;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SSZ` or `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn is_date_time(value: &str) -> bool {
    if value.len() == 10 {
        return is_date(value);
    }
    if value.len() < 20 || !value.is_char_boundary(10) || !is_date(&value[..10]) {
        return false;
    }

    let rest = &value[10..];
    let Some(time_and_zone) = rest.strip_prefix('T') else {
        return false;
    };
    let Some(time) = time_and_zone.strip_suffix('Z') else {
        return false;
    };

    let (clock, millis) = match time.split_once('.') {
        Some((clock, millis)) => (clock, Some(millis)),
        None => (time, None),
    };
    if let Some(millis) = millis {
        if millis.len() != 3 || !all_digits(millis) {
            return false;
        }
    }

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.len() != 2 || !all_digits(p)) {
        return false;
    }
    NaiveTime::parse_from_str(clock, "%H:%M:%S").is_ok()
}

pub fn is_year(value: &str) -> bool {
    value.len() == 4 && all_digits(value)
}

pub fn is_grade_code(value: &str) -> bool {
    GRADE_LEVELS.contains(&value) || GRADE_SHORTHAND.contains(&value)
}

/// Format a timestamp the way the interchange format mandates: UTC with
/// millisecond resolution, e.g. `2017-04-30T00:00:00.000Z`.
pub fn format_date_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ================================================================================================
// Scalar codecs
// ================================================================================================

fn non_blank(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim).filter(|s| !s.is_empty())
}

/// Free-form strings keep their content untouched; blank cells are absent.
pub fn decode_text(cell: Option<&str>) -> Option<String> {
    cell.filter(|s| !s.trim().is_empty()).map(str::to_string)
}

pub fn decode_enum(cell: Option<&str>, allowed: &[&str]) -> CodecResult<String> {
    match non_blank(cell) {
        None => Ok(None),
        Some(value) if allowed.contains(&value) => Ok(Some(value.to_string())),
        Some(_) => Err(FieldErrorKind::InvalidEnumValue),
    }
}

pub fn decode_date(cell: Option<&str>) -> CodecResult<String> {
    decode_checked(cell, is_date, FieldErrorKind::InvalidDateFormat)
}

pub fn decode_date_time(cell: Option<&str>) -> CodecResult<String> {
    decode_checked(cell, is_date_time, FieldErrorKind::InvalidDateTimeFormat)
}

pub fn decode_year(cell: Option<&str>) -> CodecResult<String> {
    decode_checked(cell, is_year, FieldErrorKind::InvalidYear)
}

/// Flags are case-sensitive: `True` and `1` are rejected.
pub fn decode_boolean_flag(cell: Option<&str>, allowed: &[&str]) -> CodecResult<String> {
    match non_blank(cell) {
        None => Ok(None),
        Some(value) if allowed.contains(&value) => Ok(Some(value.to_string())),
        Some(_) => Err(FieldErrorKind::InvalidBooleanFlag),
    }
}

fn decode_checked(
    cell: Option<&str>,
    check: fn(&str) -> bool,
    error: FieldErrorKind,
) -> CodecResult<String> {
    match non_blank(cell) {
        None => Ok(None),
        Some(value) if check(value) => Ok(Some(value.to_string())),
        Some(_) => Err(error),
    }
}

// ================================================================================================
// List codecs
// ================================================================================================

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Required variant: a blank cell is an empty list.
pub fn decode_list(cell: Option<&str>, delimiter: char) -> Vec<String> {
    let Some(raw) = cell else {
        return Vec::new();
    };
    strip_quotes(raw.trim())
        .split(delimiter)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Optional variant: a blank cell, or one holding only delimiters, is absent.
pub fn decode_list_optional(cell: Option<&str>, delimiter: char) -> Option<Vec<String>> {
    let items = decode_list(cell, delimiter);
    (!items.is_empty()).then_some(items)
}

/// Non-empty lists are always wrapped in double quotes when `quote` is set,
/// even single-element ones.
pub fn encode_list<S: AsRef<str>>(items: &[S], delimiter: char, quote: bool) -> String {
    if items.is_empty() {
        return String::new();
    }
    let joined = items
        .iter()
        .map(|item| item.as_ref())
        .collect::<Vec<&str>>()
        .join(delimiter.to_string().as_str());
    if quote {
        format!("\"{joined}\"")
    } else {
        joined
    }
}

// ================================================================================================
// Grades
// ================================================================================================

/// One entry of a grades cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeToken<'a> {
    Single(&'a str),
    /// Both endpoints are validated; the range is neither expanded nor ordered.
    Range(&'a str, &'a str),
}

pub fn parse_grade_token(token: &str) -> Option<GradeToken<'_>> {
    let token = token.trim();
    match token.split_once('-') {
        Some((start, end)) => {
            (is_grade_code(start) && is_grade_code(end)).then_some(GradeToken::Range(start, end))
        }
        None => is_grade_code(token).then_some(GradeToken::Single(token)),
    }
}

/// Unlike the plain list codecs, an empty token ("09,,10") is an error rather
/// than silently dropped.
pub fn decode_grades(cell: Option<&str>) -> CodecResult<Vec<String>> {
    let Some(raw) = non_blank(cell) else {
        return Ok(None);
    };
    let tokens = strip_quotes(raw)
        .split(DEFAULT_DELIMITER)
        .map(|token| {
            let token = token.trim();
            parse_grade_token(token)
                .map(|_| token.to_string())
                .ok_or(FieldErrorKind::InvalidGradeToken)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(tokens))
}
