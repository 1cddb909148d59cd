#![deny(missing_docs)]

//! # Resource Generators
//!
//! A [`ResourceGenerator`] produces the candidate `{paths, definitions}` of one
//! resource. Two strategies exist:
//! - [`MetadataGenerator`] walks a [`RouteRegistry`] of request models.
//! - [`SourceScanGenerator`] scans handler source against an explicit route
//!   table. It is the legacy path for controllers without request models.

use crate::error::{AppError, AppResult};
use crate::oas::models::{definition_name, Operation, Parameter, Response, Schema};
use crate::oas::naming::{derive_operation_id, express_to_swagger_path, path_variables};
use crate::oas::{DefinitionsGenHandler, PathsGenHandler, RouteRegistry};
use crate::parser::{extract_handler_signature, extract_struct, extract_struct_names, ParsedStruct};
use crate::spec::config::{ResourceConfig, RouteEntry};
use crate::spec::resource::LoadedResource;
use crate::type_mapping::{SwaggerTypeMapper, TypeMapper};
use http::Method;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fs;
use walkdir::WalkDir;

/// Freshly generated resource content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneratedResource {
    /// Generated `paths`.
    pub paths: Map<String, Value>,
    /// Generated `definitions`.
    pub definitions: Map<String, Value>,
    /// Whether any route accepts a write verb.
    pub has_write: bool,
    /// Definitions whose `example` was synthesized. A committed example
    /// takes precedence over these.
    pub synthesized_examples: Vec<String>,
}

/// Produces a resource's candidate content.
pub trait ResourceGenerator {
    /// Generates content, consulting the committed state where needed.
    fn generate(&self, existing: &LoadedResource) -> AppResult<GeneratedResource>;
}

/// Returns true for verbs that carry a request body.
pub fn is_write(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn to_map<T: serde::Serialize>(value: &T) -> AppResult<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::Generation("Expected a mapping".into())),
    }
}

/// Generates a resource from request model metadata.
#[derive(Debug, Clone)]
pub struct MetadataGenerator {
    registry: RouteRegistry,
}

impl MetadataGenerator {
    /// Wraps a registry.
    pub fn new(registry: RouteRegistry) -> Self {
        Self { registry }
    }
}

impl ResourceGenerator for MetadataGenerator {
    fn generate(&self, _existing: &LoadedResource) -> AppResult<GeneratedResource> {
        let (definitions, synthesized_examples) =
            DefinitionsGenHandler::new(&self.registry).generate_tracked();
        let paths = PathsGenHandler::new(&self.registry).generate();
        Ok(GeneratedResource {
            paths: to_map(&paths)?,
            definitions: to_map(&definitions)?,
            has_write: self.registry.routes.iter().any(|r| is_write(&r.method)),
            synthesized_examples,
        })
    }
}

/// Generates a resource by scanning handler source code.
#[derive(Debug, Clone)]
pub struct SourceScanGenerator<M: TypeMapper = SwaggerTypeMapper> {
    uri: String,
    resource_name: String,
    source: String,
    routes: Vec<RouteEntry>,
    tags: Vec<String>,
    mapper: M,
}

impl SourceScanGenerator {
    /// Builds a generator from a resource's configuration, reading its sources.
    ///
    /// A source directory contributes every `.rs` file below it, in path order.
    pub fn from_config(uri: &str, config: &ResourceConfig) -> AppResult<Self> {
        let path = config.source.as_ref().ok_or_else(|| {
            AppError::Config(format!("Resource '{}' has no source to scan", uri))
        })?;
        let mut source = String::new();
        if path.is_dir() {
            let mut files: Vec<_> = WalkDir::new(path)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
                .map(|e| e.into_path())
                .collect();
            files.sort();
            for file in files {
                source.push_str(&fs::read_to_string(&file)?);
                source.push('\n');
            }
        } else {
            source = fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("Cannot read source '{}': {}", path.display(), e))
            })?;
        }
        Ok(Self::new(uri, config.resource_name(uri), source, config.routes.clone())
            .with_tags(config.tags.clone()))
    }

    /// Builds a generator over in-memory source.
    pub fn new(
        uri: impl Into<String>,
        resource_name: impl Into<String>,
        source: impl Into<String>,
        routes: Vec<RouteEntry>,
    ) -> Self {
        Self {
            uri: uri.into(),
            resource_name: resource_name.into(),
            source: source.into(),
            routes,
            tags: Vec::new(),
            mapper: SwaggerTypeMapper,
        }
    }
}

impl<M: TypeMapper> SourceScanGenerator<M> {
    /// Sets tags attached to every operation.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Swaps the type mapper.
    pub fn with_mapper<N: TypeMapper>(self, mapper: N) -> SourceScanGenerator<N> {
        SourceScanGenerator {
            uri: self.uri,
            resource_name: self.resource_name,
            source: self.source,
            routes: self.routes,
            tags: self.tags,
            mapper,
        }
    }

    fn operation(
        &self,
        method: &Method,
        path: &str,
        entry: &RouteEntry,
        referenced: &mut Vec<String>,
    ) -> AppResult<Operation> {
        let mut operation = Operation {
            operation_id: Some(derive_operation_id(method.as_str(), path)),
            tags: self.tags.clone(),
            ..Operation::default()
        };
        for var in path_variables(path) {
            operation.parameters.push(Parameter::from_schema(
                &var,
                "path",
                true,
                Schema::typed("string"),
            ));
        }

        let Some(signature) = extract_handler_signature(&self.source, &entry.handler)? else {
            tracing::warn!(
                handler = %entry.handler,
                "handler signature not understood, emitting path parameters only"
            );
            operation.responses.insert("200".into(), ok_response(None));
            return Ok(operation);
        };

        if let Some(query) = &signature.query {
            let parsed = extract_struct(&self.source, query)?;
            for field in parsed.fields.iter().filter(|f| !f.is_skipped) {
                let mapped = self.mapper.map(&field.ty)?;
                if mapped.schema.reference.is_some() {
                    tracing::warn!(field = %field.name, "skipping object-typed query field");
                    continue;
                }
                let mut param = Parameter::from_schema(
                    field.json_name(),
                    "query",
                    !field.is_optional,
                    mapped.schema,
                );
                param.description = field.description.clone();
                if param.param_type.as_deref() == Some("array") {
                    param.collection_format = Some("multi".into());
                }
                operation.parameters.push(param);
            }
        }

        if let Some(body) = &signature.body {
            let schema = self.mapper.map(body)?.schema;
            collect_refs(&serde_json::to_value(&schema)?, referenced);
            operation.parameters.push(Parameter::body(true, schema));
        }

        let response_schema = match &signature.response {
            Some(ty) => {
                let schema = self.mapper.map(ty)?.schema;
                collect_refs(&serde_json::to_value(&schema)?, referenced);
                Some(schema)
            }
            None => None,
        };
        operation
            .responses
            .insert("200".into(), ok_response(response_schema));
        Ok(operation)
    }

    fn struct_definition(&self, parsed: &ParsedStruct) -> AppResult<Schema> {
        let mut schema = Schema::object();
        schema.description = parsed.description.clone();
        for field in parsed.fields.iter().filter(|f| !f.is_skipped) {
            let mut property = self.mapper.map(&field.ty)?.schema;
            if property.reference.is_none() {
                property.description = field.description.clone();
            }
            schema
                .properties
                .insert(field.json_name().to_string(), property);
            if !field.is_optional {
                schema.required.push(field.json_name().to_string());
            }
        }
        Ok(schema)
    }
}

fn ok_response(schema: Option<Schema>) -> Response {
    Response {
        description: "OK".into(),
        schema,
        extensions: IndexMap::new(),
    }
}

/// Collects the definition names of every local `$ref` below `value`.
fn collect_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(name) = map.get("$ref").and_then(Value::as_str).and_then(definition_name) {
                if !out.iter().any(|n| n == name) {
                    out.push(name.to_string());
                }
            }
            map.values().for_each(|v| collect_refs(v, out));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_refs(v, out)),
        _ => {}
    }
}

impl<M: TypeMapper> ResourceGenerator for SourceScanGenerator<M> {
    fn generate(&self, existing: &LoadedResource) -> AppResult<GeneratedResource> {
        let mut paths: IndexMap<String, IndexMap<String, Operation>> = IndexMap::new();
        let mut referenced = Vec::new();
        let mut has_write = false;

        for entry in &self.routes {
            let method = Method::from_bytes(entry.method.to_uppercase().as_bytes())
                .map_err(|_| {
                    AppError::Generation(format!("Invalid HTTP method '{}'", entry.method))
                })?;
            has_write |= is_write(&method);
            let path = express_to_swagger_path(&entry.path);
            let operation = self.operation(&method, &path, entry, &mut referenced)?;
            paths
                .entry(path)
                .or_default()
                .insert(method.as_str().to_lowercase(), operation);
        }

        // Definitions for every referenced type declared in the source.
        let declared = extract_struct_names(&self.source);
        let mut definitions: IndexMap<String, Schema> = IndexMap::new();
        let mut queue: VecDeque<String> = referenced.into_iter().collect();
        while let Some(name) = queue.pop_front() {
            if definitions.contains_key(&name) || !declared.contains(&name) {
                continue;
            }
            let schema = self.struct_definition(&extract_struct(&self.source, &name)?)?;
            let mut nested = Vec::new();
            collect_refs(&serde_json::to_value(&schema)?, &mut nested);
            queue.extend(nested);
            definitions.insert(name, schema);
        }

        if has_write {
            let input = format!("{}Input", self.resource_name);
            if !definitions.contains_key(&input) && !existing.definitions.contains_key(&input) {
                return Err(AppError::Generation(format!(
                    "Resource '{}' has write routes but no '{}' definition",
                    self.uri, input
                )));
            }
            let list = format!("{input}List");
            if !definitions.contains_key(&list) && !existing.definitions.contains_key(&list) {
                definitions.insert(list, Schema::array_of(Schema::reference_to(&input)));
            }
        }

        tracing::info!(
            uri = %self.uri,
            paths = paths.len(),
            definitions = definitions.len(),
            "scanned resource"
        );
        Ok(GeneratedResource {
            paths: to_map(&paths)?,
            definitions: to_map(&definitions)?,
            has_write,
            synthesized_examples: Vec::new(),
        })
    }
}
