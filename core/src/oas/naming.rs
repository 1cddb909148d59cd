#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Helper functions for deriving path keys, operation ids and definition name
//! fragments from route declarations.

use heck::ToUpperCamelCase;
use http::StatusCode;
use regex::Regex;
use std::sync::OnceLock;

fn express_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"))
}

fn path_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^}/]+)\}").expect("valid regex"))
}

/// Converts Express-style `:param` segments to Swagger `{param}` segments.
///
/// e.g. `/econ-models/:id` -> `/econ-models/{id}`
pub fn express_to_swagger_path(path: &str) -> String {
    express_param_regex().replace_all(path, "{$1}").into_owned()
}

/// Lists the `{var}` names of a Swagger path in order of appearance.
pub fn path_variables(path: &str) -> Vec<String> {
    path_var_regex()
        .captures_iter(path)
        .map(|c| c[1].to_string())
        .collect()
}

/// Operation id for a metadata-described route: `{verb}-{idPrefix}-{request}`.
///
/// The request name is lower-cased as a whole; an empty prefix is skipped.
pub fn operation_id(method: &str, id_prefix: &str, request_name: &str) -> String {
    let verb = method.to_lowercase();
    let request = request_name.to_lowercase();
    if id_prefix.is_empty() {
        format!("{verb}-{request}")
    } else {
        format!("{verb}-{id_prefix}-{request}")
    }
}

/// Derives a stable operation id from the HTTP method and normalized path.
///
/// e.g. `GET /econ-models/{id}` -> `get-econ-models-id`
pub fn derive_operation_id(method: &str, path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .map(|s| s.trim_start_matches(':').replace(['{', '}'], ""))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect();
    if segments.is_empty() {
        method.to_lowercase()
    } else {
        format!("{}-{}", method.to_lowercase(), segments.join("-"))
    }
}

/// PascalCase name of an HTTP status, used in response definition names.
///
/// `200` -> `Ok`, `207` -> `MultiStatus`. Codes without a canonical reason
/// fall back to `Status{code}`.
pub fn status_name(code: u16) -> String {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(|reason| reason.to_upper_camel_case())
        .unwrap_or_else(|| format!("Status{code}"))
}

/// Canonical reason phrase for a status code, used as response description.
pub fn status_description(code: u16) -> String {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Status {code}"))
}

/// Upper-cases the first character, leaving the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_express_path_conversion() {
        assert_eq!(
            express_to_swagger_path("/econ-models/:id"),
            "/econ-models/{id}"
        );
        assert_eq!(
            express_to_swagger_path("/projects/:projectId/wells/:wellId"),
            "/projects/{projectId}/wells/{wellId}"
        );
        assert_eq!(express_to_swagger_path("/static"), "/static");
    }

    #[test]
    fn test_path_variables() {
        assert_eq!(
            path_variables("/projects/{projectId}/wells/{wellId}"),
            vec!["projectId", "wellId"]
        );
        assert!(path_variables("/wells").is_empty());
    }

    #[test]
    fn test_operation_id() {
        assert_eq!(
            operation_id("GET", "wells", "ListWellsRequest"),
            "get-wells-listwellsrequest"
        );
        assert_eq!(operation_id("post", "", "Create"), "post-create");
    }

    #[test]
    fn test_derive_operation_id() {
        assert_eq!(
            derive_operation_id("GET", "/econ-models/{id}"),
            "get-econ-models-id"
        );
        assert_eq!(
            derive_operation_id("get", "/econ-models/:id"),
            "get-econ-models-id"
        );
        assert_eq!(derive_operation_id("GET", "/"), "get");
    }

    #[test]
    fn test_status_name() {
        assert_eq!(status_name(200), "Ok");
        assert_eq!(status_name(207), "MultiStatus");
        assert_eq!(status_name(404), "NotFound");
        assert_eq!(status_name(599), "Status599");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("results"), "Results");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("wellId"), "WellId");
    }
}
