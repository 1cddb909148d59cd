#![deny(missing_docs)]

//! # Document Validation
//!
//! Structural checks run on a composed Swagger 2.0 document before it is
//! written:
//! - `swagger`, when present, must be `"2.0"`.
//! - Local `$ref` pointers must resolve inside the document.
//! - `required` arrays must not be empty.
//! - Every operation must define at least one response.

use crate::error::{AppError, AppResult};
use serde_json::Value;

const OPERATION_VERBS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// Escapes one JSON pointer token.
pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Lists every structural problem of `document`, in document order.
pub fn document_problems(document: &Value) -> Vec<String> {
    let mut problems = Vec::new();
    if let Some(version) = document.get("swagger") {
        if version.as_str() != Some("2.0") {
            problems.push(format!("unsupported swagger version {version}"));
        }
    }
    walk(document, document, String::new(), &mut problems);
    check_operations(document, &mut problems);
    problems
}

/// Fails on the first structural problem of `document`.
pub fn validate_document(document: &Value) -> AppResult<()> {
    match document_problems(document).into_iter().next() {
        Some(problem) => Err(AppError::InvalidDocument(problem)),
        None => Ok(()),
    }
}

fn walk(root: &Value, node: &Value, pointer: String, problems: &mut Vec<String>) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                if let Some(local) = reference.strip_prefix('#') {
                    if root.pointer(local).is_none() {
                        problems.push(format!(
                            "unresolved reference '{reference}' at '{pointer}'"
                        ));
                    }
                }
            }
            if let Some(Value::Array(required)) = map.get("required") {
                if required.is_empty() {
                    problems.push(format!("empty required array at '{pointer}/required'"));
                }
            }
            for (key, child) in map {
                let next = format!("{pointer}/{}", escape_pointer_token(key));
                walk(root, child, next, problems);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(root, child, format!("{pointer}/{i}"), problems);
            }
        }
        _ => {}
    }
}

fn check_operations(document: &Value, problems: &mut Vec<String>) {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return;
    };
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (verb, operation) in item {
            if !OPERATION_VERBS.contains(&verb.as_str()) {
                continue;
            }
            let has_response = operation
                .get("responses")
                .and_then(Value::as_object)
                .is_some_and(|r| !r.is_empty());
            if !has_response {
                problems.push(format!("operation '{verb} {path}' defines no responses"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_document() {
        let doc = json!({
            "swagger": "2.0",
            "paths": {"/a": {"get": {
                "parameters": [{"$ref": "#/parameters/skip"}],
                "responses": {"200": {"description": "OK", "schema": {"$ref": "#/definitions/A"}}}
            }}},
            "parameters": {"skip": {"name": "skip", "in": "query", "type": "integer"}},
            "definitions": {"A": {"type": "object", "required": ["x"]}}
        });
        assert!(validate_document(&doc).is_ok());
    }

    #[test]
    fn test_unresolved_reference() {
        let doc = json!({"definitions": {"A": {"properties": {"b": {"$ref": "#/definitions/B"}}}}});
        let problems = document_problems(&doc);
        assert_eq!(
            problems,
            vec!["unresolved reference '#/definitions/B' at '/definitions/A/properties/b'"]
        );
        assert!(matches!(
            validate_document(&doc),
            Err(AppError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_empty_required_and_missing_responses() {
        let doc = json!({
            "paths": {"/a/{id}": {"post": {"parameters": []}, "parameters": []}},
            "definitions": {"A": {"type": "object", "required": []}}
        });
        let problems = document_problems(&doc);
        assert_eq!(problems.len(), 2);
        assert!(problems.contains(&"empty required array at '/definitions/A/required'".to_string()));
        assert!(problems.contains(&"operation 'post /a/{id}' defines no responses".to_string()));
    }

    #[test]
    fn test_pointer_escaping() {
        let doc = json!({
            "paths": {"/a/b": {"get": {"responses": {"200": {
                "description": "OK", "schema": {"$ref": "#/paths/~1a~1b/get"}
            }}}}}
        });
        assert!(document_problems(&doc).is_empty());
        assert_eq!(escape_pointer_token("/a~b"), "~1a~0b");
    }

    #[test]
    fn test_wrong_version() {
        let doc = json!({"swagger": "3.0"});
        assert_eq!(document_problems(&doc), vec!["unsupported swagger version \"3.0\""]);
    }
}
