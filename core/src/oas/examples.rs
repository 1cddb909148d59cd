#![deny(missing_docs)]

//! # Example Synthesis
//!
//! Fills the `example` of every object definition by inlining the examples of
//! the definitions it references. Each definition is rendered once and reused.

use crate::oas::models::Schema;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

const OBJECT_ID_EXAMPLE: &str = "5e272d38b78910dd2a1bd691";

struct ExampleCache<'a> {
    definitions: &'a IndexMap<String, Schema>,
    memo: HashMap<String, Value>,
    in_progress: HashSet<String>,
}

impl<'a> ExampleCache<'a> {
    fn definition(&mut self, name: &str) -> Value {
        if let Some(example) = self.memo.get(name) {
            return example.clone();
        }
        // A self-referencing definition renders its inner occurrence as null.
        if !self.in_progress.insert(name.to_string()) {
            return Value::Null;
        }
        let example = match self.definitions.get(name) {
            Some(schema) => self.schema(schema),
            None => Value::Null,
        };
        self.in_progress.remove(name);
        self.memo.insert(name.to_string(), example.clone());
        example
    }

    fn schema(&mut self, schema: &Schema) -> Value {
        if let Some(example) = &schema.example {
            return example.clone();
        }
        if let Some(name) = schema.referenced_definition() {
            return self.definition(name);
        }
        match schema.schema_type.as_deref() {
            Some("object") => self.object(schema),
            Some("array") => match schema.items.as_deref() {
                Some(items) if items.reference.is_some() || items.is_object() => {
                    Value::Array(vec![self.schema(items)])
                }
                Some(items) => Value::Array(vec![scalar_example(items)]),
                None => Value::Array(Vec::new()),
            },
            None if !schema.properties.is_empty() => self.object(schema),
            _ => scalar_example(schema),
        }
    }

    fn object(&mut self, schema: &Schema) -> Value {
        let mut out = Map::new();
        for (key, property) in &schema.properties {
            out.insert(key.clone(), self.schema(property));
        }
        Value::Object(out)
    }
}

/// Placeholder value for a scalar schema.
pub fn scalar_example(schema: &Schema) -> Value {
    if let Some(value) = schema.example.as_ref().or(schema.default.as_ref()) {
        return value.clone();
    }
    if let Some(first) = schema.enum_values.as_ref().and_then(|v| v.first()) {
        return first.clone();
    }
    match schema.schema_type.as_deref() {
        Some("string") => {
            let text = match (schema.format.as_deref(), schema.pattern.as_deref()) {
                (Some("date-time"), _) => "2020-01-01T00:00:00Z",
                (Some("date"), _) => "2020-01-01",
                (Some("uuid"), _) => "00000000-0000-0000-0000-000000000000",
                (_, Some(_)) => OBJECT_ID_EXAMPLE,
                _ => "string",
            };
            Value::String(text.to_string())
        }
        Some("integer") | Some("number") => schema
            .minimum
            .clone()
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(0)),
        Some("boolean") => Value::Bool(true),
        _ => Value::Null,
    }
}

/// Sets `example` on every object definition that lacks one.
///
/// Returns the names of the definitions that received an example.
pub fn synthesize_examples(definitions: &mut IndexMap<String, Schema>) -> Vec<String> {
    let pending: Vec<String> = definitions
        .iter()
        .filter(|(_, schema)| schema.is_object() && schema.example.is_none())
        .map(|(name, _)| name.clone())
        .collect();
    let mut cache = ExampleCache {
        definitions: &*definitions,
        memo: HashMap::new(),
        in_progress: HashSet::new(),
    };
    let rendered: Vec<(String, Value)> = pending
        .into_iter()
        .map(|name| {
            let example = cache.definition(&name);
            (name, example)
        })
        .collect();
    let mut filled = Vec::with_capacity(rendered.len());
    for (name, example) in rendered {
        if let Some(schema) = definitions.get_mut(&name) {
            schema.example = Some(example);
            filled.push(name);
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(props: Vec<(&str, Schema)>) -> Schema {
        let mut schema = Schema::object();
        for (k, v) in props {
            schema.properties.insert(k.to_string(), v);
        }
        schema
    }

    #[test]
    fn test_inlines_references() {
        let mut defs = IndexMap::new();
        defs.insert(
            "Parent".to_string(),
            object(vec![
                ("child", Schema::reference_to("Child")),
                ("children", Schema::array_of(Schema::reference_to("Child"))),
                ("tags", Schema::array_of(Schema::typed("string"))),
            ]),
        );
        defs.insert(
            "Child".to_string(),
            object(vec![("n", Schema::typed("integer"))]),
        );
        synthesize_examples(&mut defs);
        assert_eq!(
            defs["Parent"].example,
            Some(json!({"child": {"n": 0}, "children": [{"n": 0}], "tags": ["string"]}))
        );
        assert_eq!(defs["Child"].example, Some(json!({"n": 0})));
    }

    #[test]
    fn test_existing_example_kept() {
        let mut defs = IndexMap::new();
        let mut child = object(vec![("n", Schema::typed("integer"))]);
        child.example = Some(json!({"n": 42}));
        defs.insert("Child".to_string(), child);
        defs.insert(
            "Parent".to_string(),
            object(vec![("child", Schema::reference_to("Child"))]),
        );
        let filled = synthesize_examples(&mut defs);
        assert_eq!(filled, vec!["Parent"]);
        assert_eq!(defs["Parent"].example, Some(json!({"child": {"n": 42}})));
    }

    #[test]
    fn test_cycle_terminates() {
        let mut defs = IndexMap::new();
        defs.insert(
            "Node".to_string(),
            object(vec![("next", Schema::reference_to("Node"))]),
        );
        synthesize_examples(&mut defs);
        assert_eq!(defs["Node"].example, Some(json!({"next": null})));
    }

    #[test]
    fn test_scalar_examples() {
        let mut id = Schema::typed("string");
        id.pattern = Some("^[0-9a-fA-F]{24}$".into());
        assert_eq!(scalar_example(&id), json!(OBJECT_ID_EXAMPLE));
        let mut when = Schema::typed("string");
        when.format = Some("date-time".into());
        assert_eq!(scalar_example(&when), json!("2020-01-01T00:00:00Z"));
        let mut choice = Schema::typed("string");
        choice.enum_values = Some(vec![json!("a"), json!("b")]);
        assert_eq!(scalar_example(&choice), json!("a"));
        assert_eq!(scalar_example(&Schema::typed("boolean")), json!(true));
    }
}
