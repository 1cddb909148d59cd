#![deny(missing_docs)]

//! # Diff Calculation
//!
//! Compares a resource's on-disk state against its freshly merged state and
//! reports differences as JSON pointers. Object key order is not significant;
//! array order is.

use crate::oas::validation::escape_pointer_token;
use serde_json::Value;
use std::fmt::Display;

/// A single difference between the existing and the generated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diff {
    /// Present only in the generated document.
    Added {
        /// Location of the value.
        pointer: String,
    },
    /// Present only in the existing document.
    Removed {
        /// Location of the value.
        pointer: String,
    },
    /// Present in both with different scalar values or kinds.
    Changed {
        /// Location of the value.
        pointer: String,
    },
}

impl Diff {
    /// The JSON pointer of the difference. The root is `""`.
    pub fn pointer(&self) -> &str {
        match self {
            Diff::Added { pointer } | Diff::Removed { pointer } | Diff::Changed { pointer } => {
                pointer
            }
        }
    }
}

impl Display for Diff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diff::Added { pointer } => write!(f, "Added '{}'", pointer),
            Diff::Removed { pointer } => write!(f, "Removed '{}'", pointer),
            Diff::Changed { pointer } => write!(f, "Changed '{}'", pointer),
        }
    }
}

/// Lists every difference, existing keys first, then keys only generated.
pub fn calculate_diff(existing: &Value, generated: &Value) -> Vec<Diff> {
    let mut diffs = Vec::new();
    collect(existing, generated, String::new(), &mut diffs, false);
    diffs
}

/// The first difference, if any.
pub fn first_difference(existing: &Value, generated: &Value) -> Option<Diff> {
    let mut diffs = Vec::new();
    collect(existing, generated, String::new(), &mut diffs, true);
    diffs.into_iter().next()
}

fn collect(
    existing: &Value,
    generated: &Value,
    pointer: String,
    diffs: &mut Vec<Diff>,
    first_only: bool,
) {
    if first_only && !diffs.is_empty() {
        return;
    }
    match (existing, generated) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_value) in old {
                let child = format!("{pointer}/{}", escape_pointer_token(key));
                match new.get(key) {
                    Some(new_value) => collect(old_value, new_value, child, diffs, first_only),
                    None => diffs.push(Diff::Removed { pointer: child }),
                }
                if first_only && !diffs.is_empty() {
                    return;
                }
            }
            for key in new.keys().filter(|k| !old.contains_key(*k)) {
                diffs.push(Diff::Added {
                    pointer: format!("{pointer}/{}", escape_pointer_token(key)),
                });
                if first_only {
                    return;
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            for i in 0..old.len().max(new.len()) {
                let child = format!("{pointer}/{i}");
                match (old.get(i), new.get(i)) {
                    (Some(o), Some(n)) => collect(o, n, child, diffs, first_only),
                    (Some(_), None) => diffs.push(Diff::Removed { pointer: child }),
                    (None, Some(_)) => diffs.push(Diff::Added { pointer: child }),
                    (None, None) => {}
                }
                if first_only && !diffs.is_empty() {
                    return;
                }
            }
        }
        (old, new) if old != new => diffs.push(Diff::Changed { pointer }),
        _ => {}
    }
}
