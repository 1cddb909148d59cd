#![deny(missing_docs)]

//! # Definitions Generator
//!
//! Derives the `definitions` section of a resource from its route registry.
//!
//! Two inputs feed it:
//! - the request model metadata, walked with an explicit worklist so deeply
//!   nested models never grow the stack,
//! - the runtime response samples, whose JSON value kinds are inferred into
//!   `{Request}{Status}Response` and `{Request}{Key}Output` definitions.
//!
//! A final pass attaches a synthesized `example` to every object definition.

use crate::binding::metadata::flatten_compositions;
use crate::binding::parsers::{take_bounds, DEFAULT_TAKE};
use crate::binding::{FieldKind, FieldMetadata, ModelRef, Requirements, ScalarType, Source};
use crate::oas::examples::synthesize_examples;
use crate::oas::models::{json_number, Schema};
use crate::oas::naming::{capitalize, status_name};
use crate::oas::registry::{RouteRegistry, RouteSpec};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};

/// Pattern advertised for object id strings.
pub const OBJECT_ID_PATTERN: &str = "^[0-9a-fA-F]{24}$";

/// Maps one scalar type and its requirements to a schema.
pub fn scalar_schema(ty: ScalarType, requirements: &Requirements) -> Schema {
    let mut schema = match ty {
        ScalarType::String => {
            let mut s = Schema::typed("string");
            s.max_length = requirements.max_length;
            s
        }
        ScalarType::Number => Schema::typed("number"),
        ScalarType::Integer => Schema::typed("integer"),
        ScalarType::Boolean => Schema::typed("boolean"),
        ScalarType::ObjectId => {
            let mut s = Schema::typed("string");
            s.pattern = Some(OBJECT_ID_PATTERN.to_string());
            s
        }
        ScalarType::Sort => {
            let mut s = Schema::typed("string");
            s.description =
                Some("Comma separated field names, prefix a name with `-` to sort descending".into());
            s
        }
        ScalarType::Skip => {
            let mut s = Schema::typed("integer");
            s.minimum = json_number(0.0);
            s.default = Some(Value::from(0));
            s
        }
        ScalarType::Take => {
            let (min, max) = take_bounds(requirements);
            let mut s = Schema::typed("integer");
            s.minimum = Some(min.into());
            s.maximum = Some(max.into());
            s.default = Some(Value::from(DEFAULT_TAKE.max(min).min(max)));
            s
        }
    };
    if matches!(ty, ScalarType::Number | ScalarType::Integer) {
        if let Some(range) = requirements.range {
            schema.minimum = range.min.and_then(json_number);
            schema.maximum = range.max.and_then(json_number);
        }
    }
    if ty != ScalarType::Sort {
        schema.enum_values = requirements.valid_values.clone();
    }
    schema
}

/// Maps a field kind to a schema. Nested models become references.
pub fn kind_schema(kind: &FieldKind, requirements: &Requirements) -> Schema {
    match kind {
        FieldKind::Scalar(ty) => scalar_schema(*ty, requirements),
        FieldKind::Object(model) | FieldKind::Composition(model) => {
            Schema::reference_to(model.name())
        }
        FieldKind::Array(inner) => {
            let item_requirements = Requirements {
                min_items: None,
                max_items: None,
                ..requirements.clone()
            };
            let mut schema = Schema::array_of(kind_schema(inner, &item_requirements));
            schema.min_items = requirements.min_items;
            schema.max_items = requirements.max_items;
            schema
        }
    }
}

/// Schema of one declared field, including its description.
pub fn field_schema(field: &FieldMetadata) -> Schema {
    let mut schema = kind_schema(&field.kind, &field.options.requirements);
    if let Some(description) = &field.options.description {
        schema.description = Some(description.clone());
    }
    schema
}

/// The model an object or array-of-object kind points into.
pub fn nested_model(kind: &FieldKind) -> Option<&ModelRef> {
    match kind {
        FieldKind::Object(model) => Some(model),
        FieldKind::Array(inner) => nested_model(inner),
        _ => None,
    }
}

/// Name of the definition holding a status' top-level response sample.
pub fn response_definition_name(request_name: &str, status: u16) -> String {
    format!("{request_name}{}Response", status_name(status))
}

/// Builds object definitions for the registry's routes.
#[derive(Debug)]
pub struct DefinitionsGenHandler<'a> {
    registry: &'a RouteRegistry,
}

struct PendingModel<'a> {
    name: &'a str,
    description: Option<&'a str>,
    fields: Vec<&'a FieldMetadata>,
}

impl<'a> DefinitionsGenHandler<'a> {
    /// Creates a generator over `registry`.
    pub fn new(registry: &'a RouteRegistry) -> Self {
        Self { registry }
    }

    /// Produces every definition, examples included.
    pub fn generate(&self) -> IndexMap<String, Schema> {
        self.generate_tracked().0
    }

    /// Like [`Self::generate`], also naming the definitions whose `example`
    /// was synthesized rather than declared.
    pub fn generate_tracked(&self) -> (IndexMap<String, Schema>, Vec<String>) {
        let mut definitions = IndexMap::new();
        for route in &self.registry.routes {
            model_definitions(route, &mut definitions);
            sample_definitions(route, &mut definitions);
        }
        let synthesized = synthesize_examples(&mut definitions);
        (definitions, synthesized)
    }
}

fn model_definitions(route: &RouteSpec, definitions: &mut IndexMap<String, Schema>) {
    let body = route.request.partition(Source::Body);
    let mut queue = VecDeque::new();

    if body.iter().any(|f| f.options.is_body) {
        // The body field's own model is the payload; the request type is not.
        queue.extend(
            body.iter()
                .filter_map(|f| nested_model(&f.kind))
                .map(pending),
        );
    } else if !body.is_empty() {
        queue.push_back(PendingModel {
            name: route.request.name(),
            description: route.request.model().description(),
            fields: flatten_compositions(body),
        });
    }

    let mut visited: HashSet<&str> = HashSet::new();
    while let Some(model) = queue.pop_front() {
        if !visited.insert(model.name) || definitions.contains_key(model.name) {
            continue;
        }
        for field in &model.fields {
            if let Some(nested) = nested_model(&field.kind) {
                queue.push_back(pending(nested));
            }
        }
        tracing::debug!(definition = model.name, "generated model definition");
        definitions.insert(model.name.to_string(), object_schema(&model));
    }
}

fn pending(model: &ModelRef) -> PendingModel<'_> {
    PendingModel {
        name: model.name(),
        description: model.description(),
        fields: flatten_compositions(model.fields()),
    }
}

fn object_schema(model: &PendingModel<'_>) -> Schema {
    let mut schema = Schema::object();
    schema.description = model.description.map(str::to_string);
    for field in &model.fields {
        schema
            .properties
            .insert(field.name.clone(), field_schema(field));
        if !field.options.is_optional {
            schema.required.push(field.name.clone());
        }
    }
    schema
}

fn sample_definitions(route: &RouteSpec, definitions: &mut IndexMap<String, Schema>) {
    let request_name = route.request.name();
    for response in &route.responses {
        if let Some(sample) = &response.sample {
            let name = response_definition_name(request_name, response.status);
            sample_schema(request_name, &name, sample, definitions);
        }
    }
}

/// Infers the schema of a sample value, registering object definitions.
///
/// Objects become the definition `definition_name`; their object-valued keys
/// become `{request_name}{Key}Output` definitions. Arrays are typed after
/// their first item.
pub fn sample_schema(
    request_name: &str,
    definition_name: &str,
    value: &Value,
    definitions: &mut IndexMap<String, Schema>,
) -> Schema {
    match value {
        Value::Object(map) => {
            if !definitions.contains_key(definition_name) {
                // Reserve the slot so the parent precedes its children.
                definitions.insert(definition_name.to_string(), Schema::object());
                let mut schema = Schema::object();
                for (key, item) in map {
                    let property = match item {
                        Value::Object(_) | Value::Array(_) => {
                            let nested = format!("{request_name}{}Output", capitalize(key));
                            sample_schema(request_name, &nested, item, definitions)
                        }
                        scalar => inferred_scalar(scalar),
                    };
                    schema.properties.insert(key.clone(), property);
                }
                definitions.insert(definition_name.to_string(), schema);
            }
            Schema::reference_to(definition_name)
        }
        Value::Array(items) => match items.first() {
            Some(first) => {
                Schema::array_of(sample_schema(request_name, definition_name, first, definitions))
            }
            None => Schema::array_of(Schema::default()),
        },
        scalar => inferred_scalar(scalar),
    }
}

fn inferred_scalar(value: &Value) -> Schema {
    let mut schema = match value {
        Value::Bool(_) => Schema::typed("boolean"),
        Value::Number(n) if n.is_i64() || n.is_u64() => Schema::typed("integer"),
        Value::Number(_) => Schema::typed("number"),
        Value::String(_) => Schema::typed("string"),
        _ => return Schema::default(),
    };
    schema.example = Some(value.clone());
    schema
}
