//! Binding error types.
//!
//! Binding is fail-complete: every violation found while walking a model is
//! collected and returned together as [`BindErrors`].

use derive_more::Display;
use serde::Serialize;
use std::fmt;

/// Error family.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindErrorKind {
    /// Shape problem: wrong type, missing or unknown field, array bounds.
    #[display("structure")]
    Structure,
    /// Semantic rejection from a parser requirement or constructor.
    #[display("validation")]
    Validation,
}

impl BindErrorKind {
    /// Default error name reported for this kind.
    pub fn default_name(&self) -> &'static str {
        match self {
            BindErrorKind::Structure => "RequestStructureError",
            BindErrorKind::Validation => "RequestValidationError",
        }
    }
}

/// One binding violation.
#[derive(Debug, Display, Clone, PartialEq, Eq, Serialize)]
#[display("{name} at {location}: {message}")]
pub struct BindError {
    /// Error family.
    pub kind: BindErrorKind,
    /// Error name. Constructor failures keep their own name.
    pub name: String,
    /// Human readable message.
    pub message: String,
    /// Dotted path of the offending value, e.g. `body.records[0].name`.
    pub location: String,
}

impl BindError {
    /// Creates an error of `kind` with its default name.
    pub fn new(kind: BindErrorKind, message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            kind,
            name: kind.default_name().to_string(),
            message: message.into(),
            location: location.into(),
        }
    }

    /// A structure error.
    pub fn structure(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::new(BindErrorKind::Structure, message, location)
    }

    /// A validation error.
    pub fn validation(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::new(BindErrorKind::Validation, message, location)
    }

    /// Overrides the error name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// All violations found while binding one request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct BindErrors(Vec<BindError>);

impl BindErrors {
    /// Wraps a list of errors.
    pub fn new(errors: Vec<BindError>) -> Self {
        Self(errors)
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the errors in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, BindError> {
        self.0.iter()
    }

    /// Unwraps the list.
    pub fn into_inner(self) -> Vec<BindError> {
        self.0
    }
}

impl From<BindError> for BindErrors {
    fn from(err: BindError) -> Self {
        Self(vec![err])
    }
}

impl<'a> IntoIterator for &'a BindErrors {
    type Item = &'a BindError;
    type IntoIter = std::slice::Iter<'a, BindError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for BindErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BindErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let err = BindError::structure("missing", "body.name");
        assert_eq!(err.name, "RequestStructureError");
        let err = BindError::validation("too long", "body.name");
        assert_eq!(err.name, "RequestValidationError");
    }

    #[test]
    fn test_display_joins_errors() {
        let errors = BindErrors::new(vec![
            BindError::structure("a", "body.x"),
            BindError::validation("b", "query.y").with_name("RangeError"),
        ]);
        assert_eq!(
            errors.to_string(),
            "RequestStructureError at body.x: a; RangeError at query.y: b"
        );
    }

    #[test]
    fn test_serializes_as_list() {
        let errors = BindErrors::from(BindError::structure("a", "body.x"));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json[0]["kind"], "structure");
        assert_eq!(json[0]["location"], "body.x");
    }
}
