//! # Target Transforms
//!
//! Document-wide rewrites applied when composing an audience's document.

use crate::oas::models::{definition_name, definition_ref};
use crate::spec::config::TargetConfig;
use indexmap::IndexMap;
use serde_json::{Map, Value};

const OPERATION_VERBS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// Applies every transform of `target`, in a fixed order.
pub fn apply(target: &TargetConfig, document: &mut Value) {
    exclude_flagged(document, &target.exclude_flagged);
    map_paths(document, &target.path_map);
    map_parameters(document, &target.parameter_map);
    map_definitions(document, &target.definition_map);
    map_extensions(document, &target.extension_map);
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

fn section_mut<'d>(document: &'d mut Value, key: &str) -> Option<&'d mut Map<String, Value>> {
    document.get_mut(key).and_then(Value::as_object_mut)
}

/// Removes operations carrying any truthy flag; drops emptied path items.
pub fn exclude_flagged(document: &mut Value, flags: &[String]) {
    if flags.is_empty() {
        return;
    }
    let Some(paths) = section_mut(document, "paths") else {
        return;
    };
    paths.retain(|path, item| {
        let Some(item) = item.as_object_mut() else {
            return true;
        };
        item.retain(|verb, operation| {
            let flagged = OPERATION_VERBS.contains(&verb.as_str())
                && flags
                    .iter()
                    .any(|flag| operation.get(flag).is_some_and(is_truthy));
            if flagged {
                tracing::debug!(%path, %verb, "excluded flagged operation");
            }
            !flagged
        });
        item.keys().any(|k| OPERATION_VERBS.contains(&k.as_str()))
    });
}

/// Renames or drops path keys.
pub fn map_paths(document: &mut Value, path_map: &IndexMap<String, Option<String>>) {
    if path_map.is_empty() {
        return;
    }
    let Some(paths) = section_mut(document, "paths") else {
        return;
    };
    *paths = std::mem::take(paths)
        .into_iter()
        .filter_map(|(path, item)| match path_map.get(&path) {
            Some(Some(renamed)) => Some((renamed.clone(), item)),
            Some(None) => None,
            None => Some((path, item)),
        })
        .collect();
}

/// Replaces or drops parameters by name in every parameter list under `paths`.
pub fn map_parameters(document: &mut Value, parameter_map: &IndexMap<String, Option<Value>>) {
    if parameter_map.is_empty() {
        return;
    }
    let Some(paths) = section_mut(document, "paths") else {
        return;
    };
    for item in paths.values_mut().filter_map(Value::as_object_mut) {
        let mut lists: Vec<&mut Value> = Vec::new();
        for (key, value) in item.iter_mut() {
            if key == "parameters" {
                lists.push(value);
            } else if let Some(params) = value.get_mut("parameters") {
                lists.push(params);
            }
        }
        for list in lists.into_iter().filter_map(Value::as_array_mut) {
            *list = std::mem::take(list)
                .into_iter()
                .filter_map(|param| {
                    let name = param.get("name").and_then(Value::as_str);
                    match name.and_then(|n| parameter_map.get(n)) {
                        Some(replacement) => replacement.clone(),
                        None => Some(param),
                    }
                })
                .collect();
        }
    }
}

/// Renames or drops definitions, rewriting every `$ref` to a renamed one.
pub fn map_definitions(document: &mut Value, definition_map: &IndexMap<String, Option<String>>) {
    if definition_map.is_empty() {
        return;
    }
    if let Some(definitions) = section_mut(document, "definitions") {
        *definitions = std::mem::take(definitions)
            .into_iter()
            .filter_map(|(name, schema)| match definition_map.get(&name) {
                Some(Some(renamed)) => Some((renamed.clone(), schema)),
                Some(None) => None,
                None => Some((name, schema)),
            })
            .collect();
    }
    for_each_object(document, &mut |map| {
        let renamed = map
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(definition_name)
            .and_then(|name| definition_map.get(name))
            .and_then(|target| target.as_deref().map(definition_ref));
        if let Some(reference) = renamed {
            map.insert("$ref".into(), Value::String(reference));
        }
    });
}

/// Renames or strips vendor extensions everywhere in the document.
pub fn map_extensions(document: &mut Value, extension_map: &IndexMap<String, Option<String>>) {
    if extension_map.is_empty() {
        return;
    }
    for_each_object(document, &mut |map| {
        if !map.keys().any(|k| extension_map.contains_key(k)) {
            return;
        }
        *map = std::mem::take(map)
            .into_iter()
            .filter_map(|(key, value)| match extension_map.get(&key) {
                Some(Some(renamed)) => Some((renamed.clone(), value)),
                Some(None) => None,
                None => Some((key, value)),
            })
            .collect();
    });
}

fn for_each_object(value: &mut Value, f: &mut dyn FnMut(&mut Map<String, Value>)) {
    match value {
        Value::Object(map) => {
            f(map);
            for child in map.values_mut() {
                for_each_object(child, f);
            }
        }
        Value::Array(items) => {
            for child in items {
                for_each_object(child, f);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "paths": {
                "/wells": {
                    "get": {"x-no-doc": true, "responses": {}},
                    "post": {"x-no-doc": false, "parameters": [{"name": "auth", "in": "header"}, {"name": "body", "in": "body", "schema": {"$ref": "#/definitions/WellInput"}}], "responses": {}}
                },
                "/internal": {"get": {"x-no-doc": "yes", "responses": {}}, "parameters": []}
            },
            "definitions": {
                "WellInput": {"type": "object", "x-google-management": {"a": 1}},
                "Hidden": {"type": "object"}
            },
            "x-google-quota": {}
        })
    }

    #[test]
    fn test_exclude_flagged() {
        let mut doc = document();
        exclude_flagged(&mut doc, &["x-no-doc".to_string()]);
        let paths = doc["paths"].as_object().unwrap();
        assert_eq!(paths.len(), 1);
        let verbs: Vec<_> = paths["/wells"].as_object().unwrap().keys().collect();
        assert_eq!(verbs, vec!["post"]);
    }

    #[test]
    fn test_map_paths() {
        let mut doc = document();
        let map = IndexMap::from([
            ("/wells".to_string(), Some("/v1/wells".to_string())),
            ("/internal".to_string(), None),
        ]);
        map_paths(&mut doc, &map);
        let keys: Vec<_> = doc["paths"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["/v1/wells"]);
    }

    #[test]
    fn test_map_parameters() {
        let mut doc = document();
        let map = IndexMap::from([("auth".to_string(), None)]);
        map_parameters(&mut doc, &map);
        let params = doc["paths"]["/wells"]["post"]["parameters"].as_array().unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0]["name"], json!("body"));

        let mut doc = document();
        let map = IndexMap::from([(
            "auth".to_string(),
            Some(json!({"$ref": "#/parameters/apiKey"})),
        )]);
        map_parameters(&mut doc, &map);
        assert_eq!(
            doc["paths"]["/wells"]["post"]["parameters"][0],
            json!({"$ref": "#/parameters/apiKey"})
        );
    }

    #[test]
    fn test_map_definitions_rewrites_refs() {
        let mut doc = document();
        let map = IndexMap::from([
            ("WellInput".to_string(), Some("WellPayload".to_string())),
            ("Hidden".to_string(), None),
        ]);
        map_definitions(&mut doc, &map);
        let names: Vec<_> = doc["definitions"].as_object().unwrap().keys().collect();
        assert_eq!(names, vec!["WellPayload"]);
        assert_eq!(
            doc["paths"]["/wells"]["post"]["parameters"][1]["schema"]["$ref"],
            json!("#/definitions/WellPayload")
        );
    }

    #[test]
    fn test_map_extensions() {
        let mut doc = document();
        let map = IndexMap::from([
            ("x-google-quota".to_string(), None),
            ("x-google-management".to_string(), Some("x-management".to_string())),
        ]);
        map_extensions(&mut doc, &map);
        assert!(doc.get("x-google-quota").is_none());
        assert_eq!(
            doc["definitions"]["WellInput"]["x-management"],
            json!({"a": 1})
        );
        assert!(doc["definitions"]["WellInput"].get("x-google-management").is_none());
    }
}
