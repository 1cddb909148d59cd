#![deny(missing_docs)]

//! # Field Lookup
//!
//! Naming-convention tolerant key resolution. A model declares `testProperty`
//! once; depending on its [`NamingMask`] a client may send `testProperty`,
//! `TestProperty` or `test_property`.

use heck::{ToSnakeCase, ToUpperCamelCase};
use serde_json::{Map, Value};

/// Selects which client key variants are accepted besides the exact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NamingMask {
    /// Accept `PascalCase` keys.
    pub pascal_case: bool,
    /// Accept `snake_case` keys.
    pub snake_case: bool,
}

impl NamingMask {
    /// Exact names only.
    pub const EXACT: NamingMask = NamingMask {
        pascal_case: false,
        snake_case: false,
    };

    /// Exact, PascalCase and snake_case.
    pub const ALL: NamingMask = NamingMask {
        pascal_case: true,
        snake_case: true,
    };

    /// Candidate keys for `field_name`, in resolution order, without repeats.
    pub fn candidates(&self, field_name: &str) -> Vec<String> {
        let mut keys = vec![field_name.to_string()];
        if self.pascal_case {
            push_unique(&mut keys, field_name.to_upper_camel_case());
        }
        if self.snake_case {
            push_unique(&mut keys, field_name.to_snake_case());
        }
        keys
    }
}

fn push_unique(keys: &mut Vec<String>, key: String) {
    if !keys.contains(&key) {
        keys.push(key);
    }
}

/// Returns the source key `field_name` resolves to, if any. First hit wins.
pub fn resolve_key<'a>(
    source: &'a Map<String, Value>,
    field_name: &str,
    mask: NamingMask,
) -> Option<&'a str> {
    mask.candidates(field_name)
        .into_iter()
        .find_map(|key| source.keys().find(|k| **k == key).map(String::as_str))
}

/// Looks up the value for `field_name` in `source`.
pub fn source_field_lookup<'a>(
    source: &'a Map<String, Value>,
    field_name: &str,
    mask: NamingMask,
) -> Option<&'a Value> {
    resolve_key(source, field_name, mask).and_then(|key| source.get(key))
}

/// Returns true if `source` holds a value for `field_name`.
pub fn contains_field(source: &Map<String, Value>, field_name: &str, mask: NamingMask) -> bool {
    resolve_key(source, field_name, mask).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_all_conventions_resolve() {
        for source in [
            json!({"test_property": "v"}),
            json!({"TestProperty": "v"}),
            json!({"testProperty": "v"}),
        ] {
            let source = obj(source);
            assert_eq!(
                source_field_lookup(&source, "testProperty", NamingMask::ALL),
                Some(&json!("v"))
            );
        }
    }

    #[test]
    fn test_exact_only() {
        let snake = obj(json!({"test_property": "v"}));
        let pascal = obj(json!({"TestProperty": "v"}));
        let camel = obj(json!({"testProperty": "v"}));
        assert!(source_field_lookup(&snake, "testProperty", NamingMask::EXACT).is_none());
        assert!(source_field_lookup(&pascal, "testProperty", NamingMask::EXACT).is_none());
        assert_eq!(
            source_field_lookup(&camel, "testProperty", NamingMask::EXACT),
            Some(&json!("v"))
        );
    }

    #[test]
    fn test_first_hit_wins() {
        let source = obj(json!({"test_property": 2, "testProperty": 1}));
        assert_eq!(
            resolve_key(&source, "testProperty", NamingMask::ALL),
            Some("testProperty")
        );
    }

    #[test]
    fn test_contains_field() {
        let source = obj(json!({"TestProperty": null}));
        assert!(contains_field(&source, "testProperty", NamingMask::ALL));
        assert!(!contains_field(&source, "testProperty", NamingMask::EXACT));
    }

    #[test]
    fn test_candidates_dedupe() {
        assert_eq!(NamingMask::ALL.candidates("id"), vec!["id", "Id"]);
    }
}
