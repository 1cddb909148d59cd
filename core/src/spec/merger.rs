#![deny(missing_docs)]

//! # Spec Merger
//!
//! Folds freshly generated resource content into the committed state.
//! Generated structure is authoritative; hand-curated fields named by the
//! [`MergeRules`] survive.

use crate::spec::config::MergeRules;
use crate::spec::generator::GeneratedResource;
use crate::spec::resource::LoadedResource;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Recursively merges `overlay` into `base`. Non-object values are replaced.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(b), Value::Object(o)) => {
            let mut out = b.clone();
            for (key, value) in o {
                let merged = match out.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        _ => overlay.clone(),
    }
}

/// Merges generated resources against committed ones.
#[derive(Debug, Clone, Copy)]
pub struct SpecMerger<'a> {
    rules: &'a MergeRules,
}

impl<'a> SpecMerger<'a> {
    /// Creates a merger applying `rules`.
    pub fn new(rules: &'a MergeRules) -> Self {
        Self { rules }
    }

    /// Produces the merged resource.
    ///
    /// Paths come from `generated` only. Definitions present only in
    /// `existing` are kept. A committed `example` replaces a synthesized one
    /// when `example` is a preserved schema field.
    pub fn merge(&self, existing: &LoadedResource, generated: GeneratedResource) -> LoadedResource {
        let GeneratedResource {
            paths: generated_paths,
            definitions: generated_definitions,
            synthesized_examples,
            ..
        } = generated;
        let keep_examples = self
            .rules
            .preserved_schema_fields
            .iter()
            .any(|f| f == "example");

        let mut paths = Map::new();
        for (path, item) in generated_paths {
            let merged = match (existing.paths.get(&path), item) {
                (Some(Value::Object(old)), Value::Object(new)) => {
                    Value::Object(self.merge_path_item(old, new))
                }
                (_, item) => item,
            };
            paths.insert(path, merged);
        }

        let mut definitions = Map::new();
        for (name, schema) in generated_definitions {
            let committed = existing.definitions.get(&name);
            let mut merged = self.merge_schema(committed, schema);
            if keep_examples && synthesized_examples.contains(&name) {
                if let (Some(example), Value::Object(target)) =
                    (committed.and_then(|c| c.get("example")), &mut merged)
                {
                    target.insert("example".into(), example.clone());
                }
            }
            definitions.insert(name, merged);
        }
        for (name, schema) in &existing.definitions {
            if !definitions.contains_key(name) {
                definitions.insert(name.clone(), schema.clone());
            }
        }

        LoadedResource {
            uri: existing.uri.clone(),
            dir: existing.dir.clone(),
            definitions,
            paths,
        }
    }

    fn merge_path_item(&self, old: &Map<String, Value>, new: Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (verb, operation) in new {
            let merged = match (old.get(&verb), operation) {
                (Some(Value::Object(existing)), Value::Object(generated)) => {
                    Value::Object(self.merge_operation(existing, generated))
                }
                (_, operation) => operation,
            };
            out.insert(verb, merged);
        }
        out
    }

    /// Shallow-merges an operation, existing first, keeping preserved fields.
    pub fn merge_operation(
        &self,
        existing: &Map<String, Value>,
        generated: Map<String, Value>,
    ) -> Map<String, Value> {
        let mut out = existing.clone();
        for (key, value) in generated {
            let merged = match (key.as_str(), existing.get(&key), value) {
                ("parameters", Some(Value::Array(old)), Value::Array(new)) => {
                    Value::Array(merge_parameters(old, new))
                }
                ("responses", Some(old), new) => deep_merge(old, &new),
                (_, _, value) => value,
            };
            out.insert(key, merged);
        }
        for field in &self.rules.preserved_operation_fields {
            if let Some(value) = existing.get(field) {
                out.insert(field.clone(), value.clone());
            }
        }
        out
    }

    /// Generated structure wins; preserved fields the generated schema lacks
    /// are copied from the existing one, through `properties` and `items`.
    pub fn merge_schema(&self, existing: Option<&Value>, generated: Value) -> Value {
        let (Some(Value::Object(old)), Value::Object(mut new)) = (existing, generated.clone())
        else {
            return generated;
        };
        for field in &self.rules.preserved_schema_fields {
            if !new.contains_key(field) {
                if let Some(value) = old.get(field) {
                    new.insert(field.clone(), value.clone());
                }
            }
        }
        if let (Some(Value::Object(old_props)), Some(Value::Object(new_props))) =
            (old.get("properties"), new.get_mut("properties"))
        {
            for (key, property) in new_props.iter_mut() {
                let merged = self.merge_schema(old_props.get(key), property.take());
                *property = merged;
            }
        }
        if let Some(items) = new.get_mut("items") {
            let merged = self.merge_schema(old.get("items"), items.take());
            *items = merged;
        }
        Value::Object(new)
    }
}

fn parameter_identity(parameter: &Value) -> String {
    parameter
        .get("name")
        .or_else(|| parameter.get("$ref"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| parameter.to_string())
}

/// Merges parameter lists by identity (`name`, else `$ref`).
///
/// Existing order is kept; the generated parameter replaces a shared one and
/// new parameters are appended.
pub fn merge_parameters(existing: &[Value], generated: Vec<Value>) -> Vec<Value> {
    let mut merged: IndexMap<String, Value> = existing
        .iter()
        .map(|p| (parameter_identity(p), p.clone()))
        .collect();
    for parameter in generated {
        merged.insert(parameter_identity(&parameter), parameter);
    }
    merged.into_values().collect()
}
