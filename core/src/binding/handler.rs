#![deny(missing_docs)]

//! # Bind Handler
//!
//! Turns a request plus a [`MetadataWrapper`] into a bound object and a
//! complete error report.
//!
//! Binding is fail-complete: every field in the model graph is visited and
//! every violation is recorded, so a client sees all of its mistakes in one
//! round trip.

use crate::binding::error::{BindError, BindErrors};
use crate::binding::lookup::source_field_lookup;
use crate::binding::metadata::{FieldKind, FieldMetadata, MetadataWrapper, Requirements, Source};
use crate::binding::parsers::{parser_for, ConstructFn, ParseFn, ParseInput};
use crate::binding::request::{RequestParts, RequestStructure, ResponseLocals};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Result of one binding pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BindOutcome {
    /// The bound object. Fields that failed or were absent are left unset.
    pub model: Map<String, Value>,
    /// Every violation found, in discovery order.
    pub errors: Vec<BindError>,
}

impl BindOutcome {
    /// Returns the model if no violation was recorded.
    pub fn into_result(self) -> Result<Map<String, Value>, BindErrors> {
        if self.errors.is_empty() {
            Ok(self.model)
        } else {
            Err(BindErrors::new(self.errors))
        }
    }
}

/// Single-use binder for one (model, request) pair.
pub struct BindHandler<'r> {
    metadata: &'r MetadataWrapper,
    request: RequestStructure<'r>,
    errors: Vec<BindError>,
}

impl<'r> BindHandler<'r> {
    /// Prepares a binder.
    pub fn new(
        metadata: &'r MetadataWrapper,
        request: &'r RequestParts,
        locals: &'r ResponseLocals,
    ) -> Self {
        Self {
            metadata,
            request: RequestStructure::new(request, locals),
            errors: Vec::new(),
        }
    }

    /// Binds every source partition and returns the outcome.
    pub fn bind(mut self) -> BindOutcome {
        let metadata = self.metadata;
        let mut target = Map::new();

        for source in Source::ALL {
            let fields = metadata.partition(source);
            let location = source.as_str();

            if fields.iter().any(|f| f.options.is_body) {
                self.inner_bind(source, location, &mut target, fields, None);
                continue;
            }

            match self.request.scope(source) {
                Ok(scope) => self.inner_bind(source, location, &mut target, fields, scope),
                Err(message) => self.errors.push(BindError::structure(message, location)),
            }
        }

        tracing::debug!(
            model = metadata.name(),
            errors = self.errors.len(),
            "bound request"
        );

        BindOutcome {
            model: target,
            errors: self.errors,
        }
    }

    fn inner_bind(
        &mut self,
        source: Source,
        location: &str,
        target: &mut Map<String, Value>,
        fields: &[FieldMetadata],
        scope: Option<&Map<String, Value>>,
    ) {
        if let Some(values) = scope {
            if source.rejects_unknown_keys() {
                self.request.report_unrecognized(
                    location,
                    values,
                    fields,
                    self.metadata.naming(),
                    &mut self.errors,
                );
            }
        }

        self.bind_fields(source, location, target, fields, scope);
    }

    /// Binds `fields` without checking `scope` for undeclared keys.
    fn bind_fields(
        &mut self,
        source: Source,
        location: &str,
        target: &mut Map<String, Value>,
        fields: &[FieldMetadata],
        scope: Option<&Map<String, Value>>,
    ) {
        for field in fields {
            self.bind_field(source, location, target, field, scope);
        }
    }

    fn bind_field(
        &mut self,
        source: Source,
        location: &str,
        target: &mut Map<String, Value>,
        field: &FieldMetadata,
        scope: Option<&Map<String, Value>>,
    ) {
        if let FieldKind::Composition(model) = &field.kind {
            let mut nested = match target.remove(&field.name) {
                Some(Value::Object(existing)) => existing,
                _ => Map::new(),
            };
            // The enclosing block already checked `scope` against the
            // flattened field set, composed fields included.
            self.bind_fields(source, location, &mut nested, model.fields(), scope);
            target.insert(field.name.clone(), Value::Object(nested));
            return;
        }

        let field_location = if field.options.is_body {
            location.to_string()
        } else {
            format!("{location}.{}", field.name)
        };

        let raw: Option<Cow<'_, Value>> = if field.options.is_body {
            match (&field.kind, self.request.body()) {
                (_, Value::Null) => None,
                (FieldKind::Array(_), body @ Value::Object(_)) => {
                    Some(Cow::Owned(Value::Array(vec![body.clone()])))
                }
                (_, body) => Some(Cow::Borrowed(body)),
            }
        } else {
            scope
                .and_then(|values| source_field_lookup(values, &field.name, self.metadata.naming()))
                .map(Cow::Borrowed)
        };

        let raw = match raw {
            Some(value) if !value.is_null() => value,
            _ => {
                if !field.options.is_optional {
                    self.errors.push(BindError::structure(
                        format!("`{}` is required", field.name),
                        field_location,
                    ));
                }
                return;
            }
        };

        let bound = match field.options.custom_parse {
            Some(parse) => self.run_parser(
                parse,
                &field.name,
                &field_location,
                &raw,
                &field.options.requirements,
                field.options.target_constructor,
                target,
            ),
            None => self.bind_value(
                source,
                &field_location,
                &field.name,
                &field.kind,
                &field.options.requirements,
                field.options.target_constructor,
                &raw,
                target,
            ),
        };

        if let Some(value) = bound {
            target.insert(field.name.clone(), value);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn bind_value(
        &mut self,
        source: Source,
        location: &str,
        name: &str,
        kind: &FieldKind,
        requirements: &Requirements,
        constructor: Option<ConstructFn>,
        raw: &Value,
        model: &Map<String, Value>,
    ) -> Option<Value> {
        match kind {
            FieldKind::Scalar(ty) => self.run_parser(
                parser_for(*ty),
                name,
                location,
                raw,
                requirements,
                constructor,
                model,
            ),
            FieldKind::Object(nested_model) | FieldKind::Composition(nested_model) => match raw {
                Value::Object(values) => {
                    let mut nested = Map::new();
                    self.inner_bind(source, location, &mut nested, nested_model.fields(), Some(values));
                    Some(Value::Object(nested))
                }
                _ => {
                    self.errors.push(BindError::structure(
                        format!("`{name}` must be an object"),
                        location,
                    ));
                    None
                }
            },
            FieldKind::Array(item_kind) => {
                let items: Vec<&Value> = match raw {
                    Value::Array(items) => items.iter().collect(),
                    scalar if source == Source::Query => vec![scalar],
                    _ => {
                        self.errors.push(BindError::structure(
                            format!("`{name}` must be an array"),
                            location,
                        ));
                        return None;
                    }
                };

                let mut valid = true;
                if let Some(min) = requirements.min_items {
                    if items.len() < min {
                        self.errors.push(BindError::structure(
                            format!("`{name}` must contain at least {min} items"),
                            location,
                        ));
                        valid = false;
                    }
                }
                if let Some(max) = requirements.max_items {
                    if items.len() > max {
                        self.errors.push(BindError::structure(
                            format!("`{name}` must contain at most {max} items"),
                            location,
                        ));
                        valid = false;
                    }
                }

                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    let item_location = format!("{location}[{i}]");
                    match self.bind_value(
                        source,
                        &item_location,
                        name,
                        item_kind,
                        requirements,
                        constructor,
                        item,
                        model,
                    ) {
                        Some(value) => out.push(value),
                        None => valid = false,
                    }
                }
                valid.then_some(Value::Array(out))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_parser(
        &mut self,
        parse: ParseFn,
        name: &str,
        location: &str,
        raw: &Value,
        requirements: &Requirements,
        constructor: Option<ConstructFn>,
        model: &Map<String, Value>,
    ) -> Option<Value> {
        let output = {
            let input = ParseInput {
                name,
                value: raw,
                location,
                model,
                request: &self.request,
                requirements,
            };
            parse(&input)
        };

        let parsed = match output {
            Ok(value) => value,
            Err(err) => {
                self.errors.push(err.into_bind_error(location));
                return None;
            }
        };

        match constructor {
            None => Some(parsed),
            Some(construct) => match construct(parsed) {
                Ok(value) => Some(value),
                Err(err) => {
                    self.errors
                        .push(BindError::validation(err.message, location).with_name(err.name));
                    None
                }
            },
        }
    }
}

/// Binds `request` against `metadata` and deserializes the result into `T`.
pub fn bind<T: DeserializeOwned>(
    metadata: &MetadataWrapper,
    request: &RequestParts,
    locals: &ResponseLocals,
) -> Result<T, BindErrors> {
    let model = BindHandler::new(metadata, request, locals)
        .bind()
        .into_result()?;
    serde_json::from_value(Value::Object(model))
        .map_err(|e| BindError::structure(e.to_string(), metadata.name()).into())
}

/// A type with a registered descriptor table.
///
/// Implementors usually keep the wrapper in a `static OnceLock`.
pub trait RequestModel: DeserializeOwned {
    /// The shared, immutable metadata of this model.
    fn metadata() -> &'static MetadataWrapper;

    /// Binds a request into a new instance.
    fn bind(request: &RequestParts, locals: &ResponseLocals) -> Result<Self, BindErrors> {
        bind(Self::metadata(), request, locals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::error::BindErrorKind;
    use crate::binding::lookup::NamingMask;
    use crate::binding::metadata::{ModelSchema, ScalarType};
    use crate::binding::parsers::{ConstructError, ParseError, ParseOutput};
    use serde_json::json;

    fn wrapper(model: crate::binding::metadata::ModelRef) -> MetadataWrapper {
        MetadataWrapper::new(model)
    }

    fn run(meta: &MetadataWrapper, req: RequestParts) -> BindOutcome {
        let locals = ResponseLocals::new();
        BindHandler::new(meta, &req, &locals).bind()
    }

    #[test]
    fn test_unknown_keys_reported_once_each() {
        let meta = wrapper(
            ModelSchema::builder("M")
                .field(FieldMetadata::scalar("a", Source::Body, ScalarType::String))
                .build(),
        );
        let out = run(
            &meta,
            RequestParts::new().with_body(json!({"a": "x", "b": 1, "c": 2})),
        );
        assert_eq!(out.errors.len(), 2);
        assert!(out.errors.iter().all(|e| e.kind == BindErrorKind::Structure));
        assert_eq!(out.model["a"], json!("x"));
    }

    #[test]
    fn test_unknown_query_keys_without_query_fields() {
        let meta = wrapper(ModelSchema::builder("M").build());
        let out = run(&meta, RequestParts::new().with_query("debug", "1"));
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].location, "query");
    }

    #[test]
    fn test_params_and_services_are_open() {
        let meta = wrapper(
            ModelSchema::builder("M")
                .field(FieldMetadata::scalar("id", Source::Params, ScalarType::String))
                .field(FieldMetadata::scalar("user", Source::Services, ScalarType::String))
                .build(),
        );
        let req = RequestParts::new()
            .with_param("id", "1")
            .with_param("other", "2");
        let locals = ResponseLocals::new().with("user", "u").with("logger", "l");
        let out = BindHandler::new(&meta, &req, &locals).bind();
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert_eq!(out.model["user"], json!("u"));
    }

    #[test]
    fn test_composed_body_fields_are_recognized() {
        let audit = ModelSchema::builder("Audit")
            .field(FieldMetadata::scalar("note", Source::Body, ScalarType::String).optional())
            .build();
        let meta = wrapper(
            ModelSchema::builder("M")
                .field(FieldMetadata::composition("audit", audit))
                .field(FieldMetadata::scalar("name", Source::Body, ScalarType::String))
                .build(),
        );
        let out = run(
            &meta,
            RequestParts::new().with_body(json!({"name": "n", "note": "x", "bogus": 1})),
        );
        let messages: Vec<_> = out.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["`bogus` is not a recognized field"]);
        assert_eq!(out.model["audit"], json!({"note": "x"}));
    }

    #[test]
    fn test_naming_mask_applies_to_binding() {
        let meta = wrapper(
            ModelSchema::builder("M")
                .naming(NamingMask::ALL)
                .field(FieldMetadata::scalar("wellName", Source::Body, ScalarType::String))
                .build(),
        );
        let out = run(&meta, RequestParts::new().with_body(json!({"well_name": "w"})));
        assert!(out.errors.is_empty());
        assert_eq!(out.model["wellName"], json!("w"));
    }

    #[test]
    fn test_nested_object_location() {
        let inner = ModelSchema::builder("Inner")
            .field(FieldMetadata::scalar("n", Source::Body, ScalarType::Number))
            .build();
        let meta = wrapper(
            ModelSchema::builder("M")
                .field(FieldMetadata::object("inner", Source::Body, inner))
                .build(),
        );
        let out = run(
            &meta,
            RequestParts::new().with_body(json!({"inner": {"n": "x", "z": 1}})),
        );
        let locations: Vec<_> = out.errors.iter().map(|e| e.location.as_str()).collect();
        assert_eq!(locations, vec!["body.inner", "body.inner.n"]);
    }

    #[test]
    fn test_array_items_locations() {
        let meta = wrapper(
            ModelSchema::builder("M")
                .field(
                    FieldMetadata::array("ids", Source::Body, FieldKind::Scalar(ScalarType::ObjectId))
                        .items(Some(1), Some(3)),
                )
                .build(),
        );
        let out = run(
            &meta,
            RequestParts::new().with_body(json!({"ids": ["5e272d38b78910dd2a1bd691", "bad"]})),
        );
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].location, "body.ids[1]");
        assert!(!out.model.contains_key("ids"));

        let out = run(&meta, RequestParts::new().with_body(json!({"ids": []})));
        assert_eq!(out.errors[0].message, "`ids` must contain at least 1 items");
    }

    #[test]
    fn test_query_scalar_coerced_body_scalar_rejected() {
        let query_meta = wrapper(
            ModelSchema::builder("Q")
                .field(FieldMetadata::array("tags", Source::Query, FieldKind::Scalar(ScalarType::String)))
                .build(),
        );
        let out = run(&query_meta, RequestParts::new().with_query("tags", "oil"));
        assert!(out.errors.is_empty());
        assert_eq!(out.model["tags"], json!(["oil"]));

        let body_meta = wrapper(
            ModelSchema::builder("B")
                .field(FieldMetadata::array("tags", Source::Body, FieldKind::Scalar(ScalarType::String)))
                .build(),
        );
        let out = run(&body_meta, RequestParts::new().with_body(json!({"tags": "oil"})));
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].kind, BindErrorKind::Structure);
        assert_eq!(out.errors[0].location, "body.tags");
    }

    fn even_only(input: &ParseInput<'_>) -> ParseOutput {
        match input.value.as_i64() {
            Some(n) if n % 2 == 0 => Ok(json!(n)),
            Some(_) => Err(ParseError::validation("must be even")),
            None => Err(ParseError::structure("must be a number")),
        }
    }

    #[test]
    fn test_custom_parse_error_kinds() {
        let meta = wrapper(
            ModelSchema::builder("M")
                .field(FieldMetadata::scalar("a", Source::Body, ScalarType::Number).custom_parse(even_only))
                .field(FieldMetadata::scalar("b", Source::Body, ScalarType::Number).custom_parse(even_only))
                .build(),
        );
        let out = run(&meta, RequestParts::new().with_body(json!({"a": 3, "b": "x"})));
        assert_eq!(out.errors[0].kind, BindErrorKind::Validation);
        assert_eq!(out.errors[1].kind, BindErrorKind::Structure);
    }

    fn to_date(value: Value) -> Result<Value, ConstructError> {
        match value.as_str() {
            Some(s) if s.len() == 10 => Ok(json!({ "date": s })),
            _ => Err(ConstructError::new("RangeError", "Invalid time value")),
        }
    }

    #[test]
    fn test_target_constructor() {
        let meta = wrapper(
            ModelSchema::builder("M")
                .field(FieldMetadata::scalar("d", Source::Body, ScalarType::String).construct_with(to_date))
                .build(),
        );
        let out = run(&meta, RequestParts::new().with_body(json!({"d": "2020-01-01"})));
        assert_eq!(out.model["d"], json!({"date": "2020-01-01"}));

        let out = run(&meta, RequestParts::new().with_body(json!({"d": "nope"})));
        assert_eq!(out.errors[0].kind, BindErrorKind::Validation);
        assert_eq!(out.errors[0].name, "RangeError");
        assert_eq!(out.errors[0].message, "Invalid time value");
    }

    #[test]
    fn test_custom_parser_sees_model_so_far() {
        fn after_start(input: &ParseInput<'_>) -> ParseOutput {
            let start = input.model.get("start").and_then(Value::as_i64).unwrap_or(0);
            match input.value.as_i64() {
                Some(end) if end >= start => Ok(json!(end)),
                _ => Err(ParseError::validation("end must not precede start")),
            }
        }
        let meta = wrapper(
            ModelSchema::builder("M")
                .field(FieldMetadata::scalar("start", Source::Body, ScalarType::Integer))
                .field(FieldMetadata::scalar("end", Source::Body, ScalarType::Integer).custom_parse(after_start))
                .build(),
        );
        let out = run(&meta, RequestParts::new().with_body(json!({"start": 5, "end": 3})));
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].location, "body.end");
    }

    #[test]
    fn test_non_object_body_reported() {
        let meta = wrapper(
            ModelSchema::builder("M")
                .field(FieldMetadata::scalar("a", Source::Body, ScalarType::String))
                .build(),
        );
        let out = run(&meta, RequestParts::new().with_body(json!([1, 2])));
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].location, "body");
    }
}
