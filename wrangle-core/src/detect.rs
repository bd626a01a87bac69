//! Value type inference for raw attribute strings.
//!
//! The audit pass does not trust the export's schema; it looks at every
//! attribute value and classifies it. Classification never fails: a value
//! that parses as nothing more specific is a [`TypeTag::String`].

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Sentinel some exports write for absent values.
pub const NULL_SENTINEL: &str = "NULL";

/// `strftime` pattern of OSM timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Inferred type of a raw attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// Missing, empty, or the `NULL` sentinel.
    Null,
    /// A serialised collection (starts with `{`).
    List,
    /// A base-10 integer.
    Int,
    /// A floating-point number.
    Float,
    /// A `YYYY-MM-DDTHH:MM:SSZ` timestamp.
    Timestamp,
    /// Anything else.
    String,
}

impl TypeTag {
    /// Lower-case name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::List => "list",
            Self::Int => "int",
            Self::Float => "float",
            Self::Timestamp => "timestamp",
            Self::String => "string",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a raw attribute value.
///
/// Rules are tried in order and the first match wins: `NULL`/empty, list,
/// integer, float, timestamp, string.
///
/// # Examples
/// ```
/// use wrangle_core::{TypeTag, detect};
///
/// assert_eq!(detect(""), TypeTag::Null);
/// assert_eq!(detect(" 42 "), TypeTag::Int);
/// assert_eq!(detect("39.91"), TypeTag::Float);
/// assert_eq!(detect("2016-03-01T08:15:00Z"), TypeTag::Timestamp);
/// assert_eq!(detect("Chang'an Avenue"), TypeTag::String);
/// ```
#[must_use]
pub fn detect(raw: &str) -> TypeTag {
    if raw.is_empty() || raw == NULL_SENTINEL {
        TypeTag::Null
    } else if raw.starts_with('{') {
        TypeTag::List
    } else if is_integer(raw) {
        TypeTag::Int
    } else if parse_float(raw).is_some() {
        TypeTag::Float
    } else if parse_timestamp(raw).is_some() {
        TypeTag::Timestamp
    } else {
        TypeTag::String
    }
}

/// Classify an attribute that may be missing; missing values are
/// [`TypeTag::Null`].
#[must_use]
pub fn detect_optional(raw: Option<&str>) -> TypeTag {
    raw.map_or(TypeTag::Null, detect)
}

/// Report whether `raw`, ignoring surrounding whitespace, is a base-10
/// integer with an optional sign. Length is unbounded.
#[must_use]
pub fn is_integer(raw: &str) -> bool {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix(['+', '-'])
        .unwrap_or(trimmed);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

/// Parse an integer that fits in `i64`, ignoring surrounding whitespace.
#[must_use]
pub fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Parse a floating-point number, ignoring surrounding whitespace.
#[must_use]
pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

/// Parse a timestamp in the exact `YYYY-MM-DDTHH:MM:SSZ` shape.
///
/// Single-digit fields and surrounding whitespace are rejected even though
/// `chrono` alone would accept some of them.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    has_timestamp_shape(raw)
        .then(|| NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok())
        .flatten()
}

fn has_timestamp_shape(raw: &str) -> bool {
    const SHAPE: &[u8; 20] = b"dddd-dd-ddTdd:dd:ddZ";
    raw.len() == SHAPE.len()
        && raw
            .bytes()
            .zip(SHAPE.iter())
            .all(|(byte, expected)| match expected {
                b'd' => byte.is_ascii_digit(),
                other => byte == *other,
            })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("NULL", TypeTag::Null)]
    #[case("", TypeTag::Null)]
    #[case("{a,b}", TypeTag::List)]
    #[case("{", TypeTag::List)]
    #[case("12", TypeTag::Int)]
    #[case(" 12\t", TypeTag::Int)]
    #[case("-7", TypeTag::Int)]
    #[case("+7", TypeTag::Int)]
    #[case("123456789012345678901234567890", TypeTag::Int)]
    #[case("1.5", TypeTag::Float)]
    #[case(" 116.4 ", TypeTag::Float)]
    #[case("1e3", TypeTag::Float)]
    #[case("2012-05-01T12:00:00Z", TypeTag::Timestamp)]
    #[case("2012-5-01T12:00:00Z", TypeTag::String)]
    #[case("2012-13-01T12:00:00Z", TypeTag::String)]
    #[case("2012-05-01T12:00:00", TypeTag::String)]
    #[case("12abc", TypeTag::String)]
    #[case("null", TypeTag::String)]
    #[case("-", TypeTag::String)]
    fn classifies_raw_values(#[case] raw: &str, #[case] expected: TypeTag) {
        assert_eq!(detect(raw), expected, "raw value {raw:?}");
    }

    #[rstest]
    fn missing_values_are_null() {
        assert_eq!(detect_optional(None), TypeTag::Null);
        assert_eq!(detect_optional(Some("3")), TypeTag::Int);
    }

    #[rstest]
    fn list_marker_wins_over_numbers() {
        assert_eq!(detect("{1}"), TypeTag::List);
    }

    #[rstest]
    fn timestamp_parsing_rejects_padding() {
        assert!(parse_timestamp("2012-05-01T12:00:00Z").is_some());
        assert!(parse_timestamp(" 2012-05-01T12:00:00Z").is_none());
    }

    proptest! {
        #[test]
        fn padded_integers_are_int(value in any::<i64>(), left in "[ \t]{0,3}", right in "[ \t]{0,3}") {
            let raw = format!("{left}{value}{right}");
            prop_assert_eq!(detect(&raw), TypeTag::Int);
        }

        #[test]
        fn long_digit_runs_are_int(digits in "[0-9]{1,60}") {
            prop_assert_eq!(detect(&digits), TypeTag::Int);
        }

        #[test]
        fn detection_never_panics(raw in ".*") {
            let _ = detect(&raw);
        }
    }
}
