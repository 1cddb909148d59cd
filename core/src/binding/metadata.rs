#![deny(missing_docs)]

//! # Metadata Registry
//!
//! Explicit, statically built field-descriptor tables for request models.
//!
//! A request type describes each bindable property once through a
//! [`ModelBuilder`]: where the value comes from ([`Source`]), what shape it has
//! ([`FieldKind`]) and how it is validated ([`Requirements`]). The resulting
//! [`ModelSchema`] is wrapped in a [`MetadataWrapper`], an immutable snapshot
//! partitioned by source that the binder and the spec generators both walk.

use crate::binding::lookup::NamingMask;
use crate::binding::parsers::{ConstructFn, ParseFn};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Where a field's raw value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Source {
    /// The JSON request body.
    #[default]
    Body,
    /// The decoded query string.
    Query,
    /// Route path parameters.
    Params,
    /// Values injected by earlier middleware into the response locals.
    Services,
}

impl Source {
    /// Every source, in binding order.
    pub const ALL: [Source; 4] = [Source::Body, Source::Query, Source::Params, Source::Services];

    /// The location prefix used in error reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Body => "body",
            Source::Query => "query",
            Source::Params => "params",
            Source::Services => "services",
        }
    }

    /// Whether keys not declared by the model are rejected for this source.
    ///
    /// Route params and service locals routinely carry values a given model
    /// does not consume, so only client-controlled payloads are closed.
    pub fn rejects_unknown_keys(&self) -> bool {
        matches!(self, Source::Body | Source::Query)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar value types understood by the parse function registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// UTF-8 string.
    String,
    /// Floating point number.
    Number,
    /// Whole number.
    Integer,
    /// `true` / `false`.
    Boolean,
    /// 24 hex digit document identifier.
    ObjectId,
    /// Sort specification such as `-createdAt,name`.
    Sort,
    /// Pagination offset.
    Skip,
    /// Pagination page size.
    Take,
}

/// Shared handle to a nested model schema.
pub type ModelRef = Arc<ModelSchema>;

/// The shape of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A leaf value parsed by a scalar parser.
    Scalar(ScalarType),
    /// A nested object bound into its own scope.
    Object(ModelRef),
    /// A list of items of the inner kind.
    Array(Box<FieldKind>),
    /// A model whose fields live directly in the parent's namespace.
    Composition(ModelRef),
}

impl FieldKind {
    /// Shorthand for an array of scalars.
    pub fn array_of(scalar: ScalarType) -> Self {
        FieldKind::Array(Box::new(FieldKind::Scalar(scalar)))
    }

    /// Shorthand for an array of nested objects.
    pub fn array_of_objects(model: ModelRef) -> Self {
        FieldKind::Array(Box::new(FieldKind::Object(model)))
    }

    /// Returns true for array kinds.
    pub fn is_array(&self) -> bool {
        matches!(self, FieldKind::Array(_))
    }

    /// The nested model for object and composition kinds.
    pub fn model(&self) -> Option<&ModelRef> {
        match self {
            FieldKind::Object(m) | FieldKind::Composition(m) => Some(m),
            _ => None,
        }
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Range {
    /// Lower bound.
    pub min: Option<f64>,
    /// Upper bound.
    pub max: Option<f64>,
}

impl Range {
    /// Returns true if `n` lies within the bounds.
    pub fn contains(&self, n: f64) -> bool {
        self.min.map_or(true, |min| n >= min) && self.max.map_or(true, |max| n <= max)
    }
}

/// Validation requirements attached to a field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Requirements {
    /// The value must be one of these.
    pub valid_values: Option<Vec<Value>>,
    /// The value must not be any of these.
    pub invalid_values: Option<Vec<Value>>,
    /// Numeric bounds.
    pub range: Option<Range>,
    /// Minimum array length.
    pub min_items: Option<usize>,
    /// Maximum array length.
    pub max_items: Option<usize>,
    /// Maximum string length in characters.
    pub max_length: Option<usize>,
}

/// Binding options for one field.
#[derive(Clone, Default)]
pub struct FieldOptions {
    /// Request location. Ignored for composition fields.
    pub from_where: Source,
    /// Absent values are accepted and left unset.
    pub is_optional: bool,
    /// The field receives the entire request body.
    pub is_body: bool,
    /// Validation requirements.
    pub requirements: Requirements,
    /// Replaces the built-in parser for this field.
    pub custom_parse: Option<ParseFn>,
    /// Converts the parsed value into its final representation.
    pub target_constructor: Option<ConstructFn>,
    /// Human readable description, surfaced in generated definitions.
    pub description: Option<String>,
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("from_where", &self.from_where)
            .field("is_optional", &self.is_optional)
            .field("is_body", &self.is_body)
            .field("requirements", &self.requirements)
            .field("custom_parse", &self.custom_parse.is_some())
            .field("target_constructor", &self.target_constructor.is_some())
            .field("description", &self.description)
            .finish()
    }
}

/// Describes one bindable property.
#[derive(Debug, Clone)]
pub struct FieldMetadata {
    /// Property name as declared by the model.
    pub name: String,
    /// Binding options.
    pub options: FieldOptions,
    /// Shape of the value.
    pub kind: FieldKind,
}

impl FieldMetadata {
    fn new(name: impl Into<String>, from_where: Source, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            options: FieldOptions {
                from_where,
                ..FieldOptions::default()
            },
            kind,
        }
    }

    /// A scalar field read from `from_where`.
    pub fn scalar(name: impl Into<String>, from_where: Source, ty: ScalarType) -> Self {
        Self::new(name, from_where, FieldKind::Scalar(ty))
    }

    /// A nested object field.
    pub fn object(name: impl Into<String>, from_where: Source, model: ModelRef) -> Self {
        Self::new(name, from_where, FieldKind::Object(model))
    }

    /// An array field with the given item kind.
    pub fn array(name: impl Into<String>, from_where: Source, items: FieldKind) -> Self {
        Self::new(name, from_where, FieldKind::Array(Box::new(items)))
    }

    /// A composition field. It owns no request location.
    pub fn composition(name: impl Into<String>, model: ModelRef) -> Self {
        Self::new(name, Source::default(), FieldKind::Composition(model))
    }

    /// Marks the field optional.
    pub fn optional(mut self) -> Self {
        self.options.is_optional = true;
        self
    }

    /// Binds the whole request body to this field.
    pub fn whole_body(mut self) -> Self {
        self.options.from_where = Source::Body;
        self.options.is_body = true;
        self
    }

    /// Replaces the requirements.
    pub fn requirements(mut self, requirements: Requirements) -> Self {
        self.options.requirements = requirements;
        self
    }

    /// Restricts the value to a fixed set.
    pub fn valid_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options.requirements.valid_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Rejects a fixed set of values.
    pub fn invalid_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options.requirements.invalid_values =
            Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets numeric bounds.
    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.options.requirements.range = Some(Range { min, max });
        self
    }

    /// Sets the maximum string length.
    pub fn max_length(mut self, max: usize) -> Self {
        self.options.requirements.max_length = Some(max);
        self
    }

    /// Sets array length bounds.
    pub fn items(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.options.requirements.min_items = min;
        self.options.requirements.max_items = max;
        self
    }

    /// Overrides the built-in parser.
    pub fn custom_parse(mut self, parse: ParseFn) -> Self {
        self.options.custom_parse = Some(parse);
        self
    }

    /// Pipes successfully parsed values through `construct`.
    pub fn construct_with(mut self, construct: ConstructFn) -> Self {
        self.options.target_constructor = Some(construct);
        self
    }

    /// Attaches a description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.options.description = Some(description.into());
        self
    }

    /// Returns true if this field is a composition.
    pub fn is_composition(&self) -> bool {
        matches!(self.kind, FieldKind::Composition(_))
    }
}

/// The descriptor table of one request model.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: String,
    description: Option<String>,
    naming: NamingMask,
    fields: Vec<FieldMetadata>,
}

impl ModelSchema {
    /// Starts a new model description.
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            schema: ModelSchema {
                name: name.into(),
                description: None,
                naming: NamingMask::EXACT,
                fields: Vec::new(),
            },
        }
    }

    /// A batch command whose body is a list of `item` records.
    ///
    /// A single object body is accepted as a one-element batch.
    pub fn multi_record(name: impl Into<String>, item: ModelRef) -> ModelRef {
        Self::builder(name)
            .field(
                FieldMetadata::array("records", Source::Body, FieldKind::Object(item))
                    .whole_body(),
            )
            .build()
    }

    /// Model name, used for definition names and operation ids.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Accepted client naming conventions.
    pub fn naming(&self) -> NamingMask {
        self.naming
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }
}

/// Builder for [`ModelSchema`].
#[derive(Debug)]
pub struct ModelBuilder {
    schema: ModelSchema,
}

impl ModelBuilder {
    /// Appends a field.
    pub fn field(mut self, field: FieldMetadata) -> Self {
        self.schema.fields.push(field);
        self
    }

    /// Sets the accepted client naming conventions.
    pub fn naming(mut self, mask: NamingMask) -> Self {
        self.schema.naming = mask;
        self
    }

    /// Sets the model description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.schema.description = Some(description.into());
        self
    }

    /// Freezes the schema.
    pub fn build(self) -> ModelRef {
        Arc::new(self.schema)
    }
}

/// Immutable snapshot of a model's field tree, partitioned by source.
///
/// Each partition keeps the declaration order. A composition appears in a
/// partition with only those of its fields that read from that source.
#[derive(Debug, Clone)]
pub struct MetadataWrapper {
    model: ModelRef,
    partitions: IndexMap<Source, Vec<FieldMetadata>>,
}

impl MetadataWrapper {
    /// Builds the snapshot for `model`.
    pub fn new(model: ModelRef) -> Self {
        let partitions = Source::ALL
            .iter()
            .map(|source| (*source, partition_fields(model.fields(), *source)))
            .collect();
        Self { model, partitions }
    }

    /// The wrapped model.
    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    /// The model name.
    pub fn name(&self) -> &str {
        self.model.name()
    }

    /// The model's naming mask.
    pub fn naming(&self) -> NamingMask {
        self.model.naming()
    }

    /// The full, unpartitioned field list.
    pub fn fields(&self) -> &[FieldMetadata] {
        self.model.fields()
    }

    /// Fields reading from `source`.
    pub fn partition(&self, source: Source) -> &[FieldMetadata] {
        self.partitions
            .get(&source)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn partition_fields(fields: &[FieldMetadata], source: Source) -> Vec<FieldMetadata> {
    let mut out = Vec::new();
    for field in fields {
        match &field.kind {
            FieldKind::Composition(model) => {
                let inner = partition_fields(model.fields(), source);
                if !inner.is_empty() {
                    let scoped = ModelSchema {
                        name: model.name.clone(),
                        description: model.description.clone(),
                        naming: model.naming,
                        fields: inner,
                    };
                    out.push(FieldMetadata {
                        name: field.name.clone(),
                        options: field.options.clone(),
                        kind: FieldKind::Composition(Arc::new(scoped)),
                    });
                }
            }
            _ if field.options.from_where == source => out.push(field.clone()),
            _ => {}
        }
    }
    out
}

/// Expands compositions, yielding the fields that live in one namespace.
pub fn flatten_compositions(fields: &[FieldMetadata]) -> Vec<&FieldMetadata> {
    let mut out = Vec::new();
    for field in fields {
        match &field.kind {
            FieldKind::Composition(model) => out.extend(flatten_compositions(model.fields())),
            _ => out.push(field),
        }
    }
    out
}
