#![deny(missing_docs)]

//! # Swagger 2.0 Models
//!
//! Typed document entities produced by the generators. Serialization skips
//! empty collections so that `required` arrays are never emitted empty, and
//! vendor extensions (`x-*`) are kept in a flattened map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Prefix of local definition references.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Builds a `#/definitions/{name}` pointer.
pub fn definition_ref(name: &str) -> String {
    format!("{DEFINITIONS_PREFIX}{name}")
}

/// Extracts the definition name from a `#/definitions/{name}` pointer.
pub fn definition_name(reference: &str) -> Option<&str> {
    reference.strip_prefix(DEFINITIONS_PREFIX)
}

/// Converts a bound into a JSON number, keeping whole numbers integral.
pub fn json_number(n: f64) -> Option<Number> {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Some(Number::from(n as i64))
    } else {
        Number::from_f64(n)
    }
}

/// A schema object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Reference to another definition.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Primitive type name.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Type format (`int64`, `date-time`, …).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Required property names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Object properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Array item schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Allowed values.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    /// Maximum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Minimum array length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    /// Maximum array length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Regular expression the value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Example value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Vendor extensions.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Schema {
    /// A schema of the given primitive type.
    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    /// A reference to a definition.
    pub fn reference_to(name: &str) -> Self {
        Self {
            reference: Some(definition_ref(name)),
            ..Self::default()
        }
    }

    /// An array of `items`.
    pub fn array_of(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// An empty object schema.
    pub fn object() -> Self {
        Self::typed("object")
    }

    /// Returns true for `type: object` schemas.
    pub fn is_object(&self) -> bool {
        self.schema_type.as_deref() == Some("object")
    }

    /// The referenced definition name, if this is a local reference.
    pub fn referenced_definition(&self) -> Option<&str> {
        self.reference.as_deref().and_then(definition_name)
    }
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Reference to a shared parameter.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Parameter name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// `path`, `query`, `body`, `header` or `formData`.
    #[serde(rename = "in", default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter must be sent.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Primitive type name (non-body parameters).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    /// Type format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Array item schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Array serialization (`multi` for repeated query keys).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<String>,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    /// Maximum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression the value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Body schema (body parameters only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Vendor extensions.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Parameter {
    /// A non-body parameter shaped like `schema`.
    pub fn from_schema(name: &str, location: &str, required: bool, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            location: location.to_string(),
            required,
            description: schema.description,
            param_type: schema.schema_type,
            format: schema.format,
            items: schema.items,
            default: schema.default,
            enum_values: schema.enum_values,
            minimum: schema.minimum,
            maximum: schema.maximum,
            max_length: schema.max_length,
            pattern: schema.pattern,
            ..Self::default()
        }
    }

    /// The `in: body` parameter carrying `schema`.
    pub fn body(required: bool, schema: Schema) -> Self {
        Self {
            name: "body".to_string(),
            location: "body".to_string(),
            required,
            schema: Some(schema),
            ..Self::default()
        }
    }
}

/// A response object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    /// Required description.
    pub description: String,
    /// Response body schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Vendor extensions.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// An operation object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Unique operation id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code.
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
    /// Vendor extensions.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Operations keyed by lower-case HTTP verb.
pub type PathItem = IndexMap<String, Operation>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_skips_empty_required() {
        let schema = Schema::object();
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value, json!({"type": "object"}));
    }

    #[test]
    fn test_schema_reference_round() {
        let schema = Schema::reference_to("Well");
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value, json!({"$ref": "#/definitions/Well"}));
        assert_eq!(schema.referenced_definition(), Some("Well"));
    }

    #[test]
    fn test_extensions_flattened() {
        let mut op = Operation::default();
        op.extensions.insert("x-google-quota".into(), json!({"metricCosts": {"read": 1}}));
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["x-google-quota"]["metricCosts"]["read"], json!(1));
    }

    #[test]
    fn test_parameter_from_schema() {
        let mut schema = Schema::typed("integer");
        schema.minimum = json_number(0.0);
        let param = Parameter::from_schema("skip", "query", false, schema);
        let value = serde_json::to_value(&param).unwrap();
        assert_eq!(
            value,
            json!({"name": "skip", "in": "query", "type": "integer", "minimum": 0})
        );
    }

    #[test]
    fn test_json_number() {
        assert_eq!(json_number(200.0), Some(Number::from(200)));
        assert!(json_number(0.5).unwrap().is_f64());
    }
}
