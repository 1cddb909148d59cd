#![deny(missing_docs)]

//! # Paths Generator
//!
//! Derives the `paths` section of a resource from its route registry, walking
//! the same partitioned metadata as the binder so the contract and the runtime
//! validation never disagree.

use crate::binding::metadata::flatten_compositions;
use crate::binding::{FieldKind, FieldMetadata, ScalarType, Source};
use crate::oas::definitions::{field_schema, kind_schema, response_definition_name, sample_schema};
use crate::oas::models::{Operation, Parameter, PathItem, Response, Schema};
use crate::oas::naming::{express_to_swagger_path, operation_id, path_variables, status_description};
use crate::oas::registry::{RouteRegistry, RouteSpec};
use indexmap::IndexMap;
use serde_json::Value;

/// Extension marking offset-paginated list operations.
pub const PAGINATION_EXTENSION: &str = "x-pagination";

/// Builds path items for the registry's routes.
#[derive(Debug)]
pub struct PathsGenHandler<'a> {
    registry: &'a RouteRegistry,
}

impl<'a> PathsGenHandler<'a> {
    /// Creates a generator over `registry`.
    pub fn new(registry: &'a RouteRegistry) -> Self {
        Self { registry }
    }

    /// Produces every path item, keyed by Swagger-style path.
    pub fn generate(&self) -> IndexMap<String, PathItem> {
        let mut paths: IndexMap<String, PathItem> = IndexMap::new();
        for route in &self.registry.routes {
            let path = express_to_swagger_path(&route.path);
            let verb = route.method.as_str().to_lowercase();
            let operation = self.operation(route, &path);
            tracing::debug!(%path, %verb, "generated operation");
            paths.entry(path).or_default().insert(verb, operation);
        }
        paths
    }

    fn operation(&self, route: &RouteSpec, path: &str) -> Operation {
        let request = &route.request;
        let mut operation = Operation {
            operation_id: Some(operation_id(
                route.method.as_str(),
                &self.registry.id_prefix,
                request.name(),
            )),
            summary: route.summary.clone(),
            description: request.model().description().map(str::to_string),
            tags: route.tags.clone(),
            ..Operation::default()
        };

        let params = flatten_compositions(request.partition(Source::Params));
        for field in &params {
            operation.parameters.push(path_parameter(field));
        }
        for var in path_variables(path) {
            if !params.iter().any(|f| f.name == var) {
                operation.parameters.push(Parameter::from_schema(
                    &var,
                    "path",
                    true,
                    Schema::typed("string"),
                ));
            }
        }

        let query = flatten_compositions(request.partition(Source::Query));
        for field in &query {
            match query_parameter(field) {
                Some(parameter) => operation.parameters.push(parameter),
                None => tracing::warn!(
                    request = request.name(),
                    field = %field.name,
                    "object-typed query field has no Swagger 2.0 parameter form"
                ),
            }
        }
        if has_pagination(&query) {
            operation
                .extensions
                .insert(PAGINATION_EXTENSION.to_string(), Value::Bool(true));
        }

        let body = request.partition(Source::Body);
        if !body.is_empty() {
            operation.parameters.push(body_parameter(route));
        }

        operation.responses = responses(route);
        for (key, value) in &route.extensions {
            operation.extensions.insert(key.clone(), value.clone());
        }
        operation
    }
}

fn path_parameter(field: &FieldMetadata) -> Parameter {
    Parameter::from_schema(&field.name, "path", true, field_schema(field))
}

fn query_parameter(field: &FieldMetadata) -> Option<Parameter> {
    let required = !field.options.is_optional;
    match &field.kind {
        FieldKind::Scalar(_) => Some(Parameter::from_schema(
            &field.name,
            "query",
            required,
            field_schema(field),
        )),
        FieldKind::Array(inner) if matches!(**inner, FieldKind::Scalar(_)) => {
            let mut parameter =
                Parameter::from_schema(&field.name, "query", required, field_schema(field));
            parameter.collection_format = Some("multi".to_string());
            Some(parameter)
        }
        _ => None,
    }
}

fn has_pagination(query: &[&FieldMetadata]) -> bool {
    let has = |ty: ScalarType| {
        query
            .iter()
            .any(|f| matches!(f.kind, FieldKind::Scalar(t) if t == ty))
    };
    has(ScalarType::Skip) && has(ScalarType::Take)
}

fn body_parameter(route: &RouteSpec) -> Parameter {
    let body = route.request.partition(Source::Body);
    match body.iter().find(|f| f.options.is_body) {
        Some(field) => Parameter::body(
            !field.options.is_optional,
            kind_schema(&field.kind, &field.options.requirements),
        ),
        None => {
            let required = flatten_compositions(body)
                .iter()
                .any(|f| !f.options.is_optional);
            Parameter::body(required, Schema::reference_to(route.request.name()))
        }
    }
}

fn responses(route: &RouteSpec) -> IndexMap<String, Response> {
    let mut out = IndexMap::new();
    // Definitions are produced by the definitions generator; only the
    // references are needed here.
    let mut scratch = IndexMap::new();
    for sample in &route.responses {
        let schema = sample.sample.as_ref().map(|value| {
            let name = response_definition_name(route.request.name(), sample.status);
            sample_schema(route.request.name(), &name, value, &mut scratch)
        });
        out.insert(
            sample.status.to_string(),
            Response {
                description: sample
                    .description
                    .clone()
                    .unwrap_or_else(|| status_description(sample.status)),
                schema,
                extensions: IndexMap::new(),
            },
        );
    }
    if out.is_empty() {
        out.insert(
            "200".to_string(),
            Response {
                description: status_description(200),
                ..Response::default()
            },
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{ModelRef, ModelSchema};
    use http::Method;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pagination() -> ModelRef {
        ModelSchema::builder("Pagination")
            .field(FieldMetadata::scalar("skip", Source::Query, ScalarType::Skip).optional())
            .field(
                FieldMetadata::scalar("take", Source::Query, ScalarType::Take)
                    .range(None, Some(50.0))
                    .optional(),
            )
            .field(FieldMetadata::scalar("sort", Source::Query, ScalarType::Sort).optional())
            .build()
    }

    fn list_wells() -> ModelRef {
        ModelSchema::builder("ListWellsRequest")
            .field(FieldMetadata::composition("page", pagination()))
            .field(FieldMetadata::scalar("projectId", Source::Params, ScalarType::ObjectId))
            .field(FieldMetadata::array(
                "status",
                Source::Query,
                FieldKind::Scalar(ScalarType::String),
            ).optional())
            .field(FieldMetadata::scalar("userId", Source::Services, ScalarType::ObjectId))
            .build()
    }

    #[test]
    fn test_list_operation() {
        let registry = RouteRegistry::new("wells").route(
            RouteSpec::new(Method::GET, "/projects/:projectId/wells", list_wells())
                .respond(200, json!([{"id": "a"}])),
        );
        let paths = PathsGenHandler::new(&registry).generate();
        let op = &paths["/projects/{projectId}/wells"]["get"];

        assert_eq!(
            op.operation_id.as_deref(),
            Some("get-wells-listwellsrequest")
        );
        let value = serde_json::to_value(&op.parameters).unwrap();
        assert_eq!(
            value,
            json!([
                {"name": "projectId", "in": "path", "required": true, "type": "string",
                 "pattern": "^[0-9a-fA-F]{24}$"},
                {"name": "skip", "in": "query", "type": "integer", "default": 0, "minimum": 0},
                {"name": "take", "in": "query", "type": "integer", "default": 25,
                 "minimum": 1, "maximum": 50},
                {"name": "sort", "in": "query", "type": "string",
                 "description": "Comma separated field names, prefix a name with `-` to sort descending"},
                {"name": "status", "in": "query", "type": "array",
                 "items": {"type": "string"}, "collectionFormat": "multi"}
            ])
        );
        assert_eq!(op.extensions[PAGINATION_EXTENSION], json!(true));
        let ok = &op.responses["200"];
        assert_eq!(ok.description, "OK");
        assert_eq!(
            serde_json::to_value(ok.schema.as_ref().unwrap()).unwrap(),
            json!({"type": "array", "items": {"$ref": "#/definitions/ListWellsRequestOkResponse"}})
        );
    }

    #[test]
    fn test_body_parameter_and_default_response() {
        let model = ModelSchema::builder("CreateWell")
            .field(FieldMetadata::scalar("name", Source::Body, ScalarType::String))
            .build();
        let registry =
            RouteRegistry::new("wells").route(RouteSpec::new(Method::POST, "/wells", model));
        let paths = PathsGenHandler::new(&registry).generate();
        let op = &paths["/wells"]["post"];
        let body = &op.parameters[0];
        assert_eq!(body.location, "body");
        assert!(body.required);
        assert_eq!(
            body.schema.as_ref().unwrap().referenced_definition(),
            Some("CreateWell")
        );
        assert_eq!(op.responses["200"].description, "OK");
        assert!(!op.extensions.contains_key(PAGINATION_EXTENSION));
    }

    #[test]
    fn test_whole_body_array_parameter() {
        let row = ModelSchema::builder("Row")
            .field(FieldMetadata::scalar("a", Source::Body, ScalarType::Number))
            .build();
        let registry = RouteRegistry::new("rows").route(RouteSpec::new(
            Method::POST,
            "/rows",
            ModelSchema::multi_record("CreateRows", row),
        ));
        let paths = PathsGenHandler::new(&registry).generate();
        let schema = paths["/rows"]["post"].parameters[0].schema.clone().unwrap();
        assert_eq!(
            serde_json::to_value(schema).unwrap(),
            json!({"type": "array", "items": {"$ref": "#/definitions/Row"}})
        );
    }

    #[test]
    fn test_undeclared_path_variable_added() {
        let model = ModelSchema::builder("Ping").build();
        let registry =
            RouteRegistry::new("").route(RouteSpec::new(Method::GET, "/ping/:id", model));
        let paths = PathsGenHandler::new(&registry).generate();
        let op = &paths["/ping/{id}"]["get"];
        assert_eq!(op.operation_id.as_deref(), Some("get-ping"));
        assert_eq!(op.parameters[0].name, "id");
        assert!(op.parameters[0].required);
    }

    #[test]
    fn test_verbs_share_path_item() {
        let get = ModelSchema::builder("GetWell").build();
        let delete = ModelSchema::builder("DeleteWell").build();
        let registry = RouteRegistry::new("wells")
            .route(RouteSpec::new(Method::GET, "/wells/:id", get).respond_empty(404, "Missing"))
            .route(RouteSpec::new(Method::DELETE, "/wells/:id", delete));
        let paths = PathsGenHandler::new(&registry).generate();
        let item = &paths["/wells/{id}"];
        let verbs: Vec<_> = item.keys().map(String::as_str).collect();
        assert_eq!(verbs, vec!["get", "delete"]);
        assert_eq!(item["get"].responses["404"].description, "Missing");
        assert!(item["get"].responses["404"].schema.is_none());
    }
}
