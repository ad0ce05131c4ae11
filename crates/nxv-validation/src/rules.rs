//! Validation rules for leaf values: declared types, value formats,
//! enumerations and node names

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use nxv_tree::{DataType, Value};
use regex::Regex;
use std::sync::LazyLock;

/// Validation rule result
#[derive(Debug, Clone)]
pub struct RuleResult {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl RuleResult {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// NeXus type names this module understands
pub const KNOWN_TYPES: &[&str] = &[
    "NX_CHAR",
    "NX_DATE_TIME",
    "ISO8601",
    "NX_INT",
    "NX_UINT",
    "NX_POSINT",
    "NX_FLOAT",
    "NX_NUMBER",
    "NX_BOOLEAN",
    "NX_BINARY",
    "NX_CHAR_OR_NUMBER",
];

/// Whether a stored type can hold values of a NeXus type
///
/// Returns `None` for type names outside [`KNOWN_TYPES`].
pub fn type_accepts(constraint: &str, dtype: DataType) -> Option<bool> {
    let accepted = match constraint {
        "NX_CHAR" | "NX_DATE_TIME" | "ISO8601" => dtype == DataType::String,
        "NX_INT" | "NX_POSINT" => dtype.is_integer(),
        "NX_UINT" => dtype.is_unsigned_integer(),
        "NX_FLOAT" => dtype.is_float(),
        "NX_NUMBER" => dtype.is_numeric(),
        "NX_BOOLEAN" => matches!(dtype, DataType::Bool | DataType::Int8 | DataType::Uint8),
        "NX_BINARY" => matches!(dtype, DataType::Uint8 | DataType::Int8 | DataType::Opaque),
        "NX_CHAR_OR_NUMBER" => dtype == DataType::String || dtype.is_numeric(),
        _ => return None,
    };
    Some(accepted)
}

/// Validate a stored type against a NeXus type name
#[must_use]
pub fn validate_type(constraint: &str, dtype: DataType) -> RuleResult {
    match type_accepts(constraint, dtype) {
        Some(false) => RuleResult::invalid(format!(
            "Stored type {dtype} is not compatible with {constraint}"
        )),
        _ => RuleResult::valid(),
    }
}

/// Validate value content the stored type alone cannot vouch for
#[must_use]
pub fn validate_value(constraint: &str, value: &Value) -> RuleResult {
    match constraint {
        "NX_DATE_TIME" | "ISO8601" => {
            for leaf in value.leaves() {
                if let Some(text) = leaf.as_text() {
                    if !is_iso8601(text) {
                        return RuleResult::invalid(format!(
                            "Value '{text}' is not an ISO 8601 date/time"
                        ));
                    }
                }
            }
            RuleResult::valid()
        }
        "NX_POSINT" => {
            for leaf in value.leaves() {
                if let Value::Integer(n) = leaf {
                    if *n <= 0 {
                        return RuleResult::invalid(format!("Value {n} is not a positive integer"));
                    }
                }
            }
            RuleResult::valid()
        }
        _ => RuleResult::valid(),
    }
}

/// Whether text is an ISO 8601 date, or date and time
pub fn is_iso8601(text: &str) -> bool {
    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    let text = text.trim();
    DateTime::parse_from_rfc3339(text).is_ok()
        || DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z").is_ok()
        || NAIVE_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(text, fmt).is_ok())
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

/// Validate a scalar value against an enumeration
///
/// Numeric values match items that parse to the same number, so `1.0`
/// satisfies an item written as `1`. Non-scalar values are not checked.
#[must_use]
pub fn validate_enumeration(value: &Value, items: &[String]) -> RuleResult {
    let Some(literal) = value.as_literal() else {
        return RuleResult::valid();
    };
    if items.iter().any(|item| item == &literal) {
        return RuleResult::valid();
    }
    if let Ok(number) = literal.parse::<f64>() {
        let numeric_match = items
            .iter()
            .filter_map(|item| item.parse::<f64>().ok())
            .any(|item| (item - number).abs() < f64::EPSILON);
        if numeric_match {
            return RuleResult::valid();
        }
    }
    RuleResult::invalid(format!(
        "Value '{literal}' is not one of [{}]",
        items.join(", ")
    ))
}

static VALID_NAME: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]([A-Za-z0-9_.]*[A-Za-z0-9_])?$"));

/// Validate a node name against the NeXus naming rule
#[must_use]
pub fn validate_name(name: &str) -> RuleResult {
    let Ok(pattern) = VALID_NAME.as_ref() else {
        return RuleResult::valid();
    };
    if pattern.is_match(name) {
        RuleResult::valid()
    } else {
        RuleResult::invalid(format!(
            "Name '{name}' should contain only letters, digits, underscores and inner periods"
        ))
    }
}
