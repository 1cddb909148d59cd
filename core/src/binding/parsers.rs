#![deny(missing_docs)]

//! # Parse Function Registry
//!
//! One parser per [`ScalarType`]. Parsers receive the raw value together with
//! the context the binder has at hand and either return the parsed value or a
//! [`ParseError`]. Shape mismatches are structure errors; violated
//! [`Requirements`] are validation errors.

use crate::binding::error::{BindError, BindErrorKind};
use crate::binding::metadata::{Requirements, ScalarType};
use crate::binding::request::RequestStructure;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;

/// Page size used when a `take` field has no explicit upper bound.
pub const DEFAULT_TAKE_MAX: i64 = 200;

/// Page size documented as the default for `take` parameters.
pub const DEFAULT_TAKE: i64 = 25;

/// Everything a parser may look at.
pub struct ParseInput<'a> {
    /// Field name.
    pub name: &'a str,
    /// Raw value, never `Null`.
    pub value: &'a Value,
    /// Dotted path of the value.
    pub location: &'a str,
    /// The target object bound so far in the current scope.
    pub model: &'a Map<String, Value>,
    /// The request being bound.
    pub request: &'a RequestStructure<'a>,
    /// Field requirements.
    pub requirements: &'a Requirements,
}

/// Why a parser rejected a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human readable message.
    pub message: String,
    /// Explicit error family; structure when unset.
    pub kind: Option<BindErrorKind>,
    /// Explicit error name; the family default when unset.
    pub name: Option<String>,
}

impl ParseError {
    /// A shape mismatch.
    pub fn structure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            name: None,
        }
    }

    /// A requirement violation.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: Some(BindErrorKind::Validation),
            name: None,
        }
    }

    /// Converts into a binding error at `location`.
    pub fn into_bind_error(self, location: &str) -> BindError {
        let err = BindError::new(
            self.kind.unwrap_or(BindErrorKind::Structure),
            self.message,
            location,
        );
        match self.name {
            Some(name) => err.with_name(name),
            None => err,
        }
    }
}

/// Result of one parser call.
pub type ParseOutput = Result<Value, ParseError>;

/// A parser.
pub type ParseFn = fn(&ParseInput<'_>) -> ParseOutput;

/// Error raised by a target constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructError {
    /// Original error name, reported as-is.
    pub name: String,
    /// Original message.
    pub message: String,
}

impl ConstructError {
    /// Creates a constructor error.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Converts a parsed value into its final representation.
pub type ConstructFn = fn(Value) -> Result<Value, ConstructError>;

/// Returns the built-in parser for `ty`.
pub fn parser_for(ty: ScalarType) -> ParseFn {
    match ty {
        ScalarType::String => parse_string,
        ScalarType::Number => parse_number,
        ScalarType::Integer => parse_integer,
        ScalarType::Boolean => parse_boolean,
        ScalarType::ObjectId => parse_object_id,
        ScalarType::Sort => parse_sort,
        ScalarType::Skip => parse_skip,
        ScalarType::Take => parse_take,
    }
}

/// Parses a string, checking length and membership requirements.
pub fn parse_string(input: &ParseInput<'_>) -> ParseOutput {
    let Value::String(s) = input.value else {
        return Err(ParseError::structure(format!(
            "`{}` must be a string",
            input.name
        )));
    };
    if let Some(max) = input.requirements.max_length {
        if s.chars().count() > max {
            return Err(ParseError::validation(format!(
                "`{}` must be at most {} characters long",
                input.name, max
            )));
        }
    }
    check_membership(input, input.value)?;
    Ok(input.value.clone())
}

/// Parses a number from a JSON number or a numeric string.
pub fn parse_number(input: &ParseInput<'_>) -> ParseOutput {
    let parsed = match input.value {
        Value::Number(n) => Some(Value::Number(n.clone())),
        Value::String(s) => number_from_str(s.trim()),
        _ => None,
    };
    let value = parsed.ok_or_else(|| {
        ParseError::structure(format!("`{}` must be a valid number", input.name))
    })?;
    let n = value.as_f64().unwrap_or_default();
    check_range(input, n)?;
    check_membership(input, &value)?;
    Ok(value)
}

/// Parses a whole number.
pub fn parse_integer(input: &ParseInput<'_>) -> ParseOutput {
    let n = as_integer(input.value).ok_or_else(|| {
        ParseError::structure(format!("`{}` must be a valid integer", input.name))
    })?;
    check_range(input, n as f64)?;
    let value = Value::from(n);
    check_membership(input, &value)?;
    Ok(value)
}

/// Parses `true` / `false`, including their string forms.
pub fn parse_boolean(input: &ParseInput<'_>) -> ParseOutput {
    match input.value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::String(s) if s == "true" => Ok(Value::Bool(true)),
        Value::String(s) if s == "false" => Ok(Value::Bool(false)),
        _ => Err(ParseError::structure(format!(
            "`{}` must be a boolean",
            input.name
        ))),
    }
}

/// Parses a 24 hex digit object id. The output is lower-cased.
pub fn parse_object_id(input: &ParseInput<'_>) -> ParseOutput {
    static OBJECT_ID_RE: OnceLock<Regex> = OnceLock::new();
    let re = OBJECT_ID_RE
        .get_or_init(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("Invalid regex constant"));

    match input.value {
        Value::String(s) if re.is_match(s) => {
            let value = Value::String(s.to_ascii_lowercase());
            check_membership(input, &value)?;
            Ok(value)
        }
        _ => Err(ParseError::structure(format!(
            "`{}` must be a valid ObjectId",
            input.name
        ))),
    }
}

/// Parses a sort specification into an ordered `{field: 1 | -1}` object.
///
/// Accepts `"-createdAt,name"` strings or an already structured object.
/// `valid_values` restricts the sortable field names.
pub fn parse_sort(input: &ParseInput<'_>) -> ParseOutput {
    static FIELD_RE: OnceLock<Regex> = OnceLock::new();
    let re = FIELD_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("Invalid regex constant"));

    let invalid = || ParseError::structure(format!("`{}` must be a valid sort", input.name));
    let mut out = Map::new();

    match input.value {
        Value::String(s) => {
            for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (field, direction) = match part.strip_prefix('-') {
                    Some(rest) => (rest, -1),
                    None => (part.strip_prefix('+').unwrap_or(part), 1),
                };
                if !re.is_match(field) {
                    return Err(invalid());
                }
                out.insert(field.to_string(), Value::from(direction));
            }
        }
        Value::Object(map) => {
            for (field, direction) in map {
                match direction.as_i64() {
                    Some(d @ (1 | -1)) if re.is_match(field) => {
                        out.insert(field.clone(), Value::from(d));
                    }
                    _ => return Err(invalid()),
                }
            }
        }
        _ => return Err(invalid()),
    }

    if out.is_empty() {
        return Err(invalid());
    }
    if let Some(valid) = &input.requirements.valid_values {
        if let Some(field) = out.keys().find(|f| !valid.contains(&Value::String((*f).clone()))) {
            return Err(ParseError::validation(format!(
                "`{}` cannot sort by `{}`",
                input.name, field
            )));
        }
    }
    Ok(Value::Object(out))
}

/// Parses a pagination offset.
pub fn parse_skip(input: &ParseInput<'_>) -> ParseOutput {
    let n = as_integer(input.value).ok_or_else(|| {
        ParseError::structure(format!("`{}` must be a valid integer", input.name))
    })?;
    if n < 0 {
        return Err(ParseError::validation(format!(
            "`{}` must be greater than or equal to 0",
            input.name
        )));
    }
    check_range(input, n as f64)?;
    Ok(Value::from(n))
}

/// Parses a pagination page size, bounded by `range` or `1..=DEFAULT_TAKE_MAX`.
pub fn parse_take(input: &ParseInput<'_>) -> ParseOutput {
    let n = as_integer(input.value).ok_or_else(|| {
        ParseError::structure(format!("`{}` must be a valid integer", input.name))
    })?;
    let (min, max) = take_bounds(input.requirements);
    if n < min || n > max {
        return Err(ParseError::validation(format!(
            "`{}` must be between {} and {}",
            input.name, min, max
        )));
    }
    Ok(Value::from(n))
}

/// Effective `take` bounds for the given requirements.
pub fn take_bounds(requirements: &Requirements) -> (i64, i64) {
    let range = requirements.range.unwrap_or_default();
    (
        range.min.map_or(1, |m| m as i64),
        range.max.map_or(DEFAULT_TAKE_MAX, |m| m as i64),
    )
}

fn number_from_str(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn check_range(input: &ParseInput<'_>, n: f64) -> Result<(), ParseError> {
    match input.requirements.range {
        Some(range) if !range.contains(n) => Err(ParseError::validation(format!(
            "`{}` must be between {} and {}",
            input.name,
            range.min.map_or("-inf".to_string(), |m| m.to_string()),
            range.max.map_or("inf".to_string(), |m| m.to_string()),
        ))),
        _ => Ok(()),
    }
}

fn check_membership(input: &ParseInput<'_>, value: &Value) -> Result<(), ParseError> {
    if let Some(valid) = &input.requirements.valid_values {
        if !valid.contains(value) {
            let allowed: Vec<String> = valid.iter().map(Value::to_string).collect();
            return Err(ParseError::validation(format!(
                "`{}` must be one of [{}]",
                input.name,
                allowed.join(", ")
            )));
        }
    }
    if let Some(invalid) = &input.requirements.invalid_values {
        if invalid.contains(value) {
            return Err(ParseError::validation(format!(
                "`{}` cannot be {}",
                input.name, value
            )));
        }
    }
    Ok(())
}
