#![deny(missing_docs)]

//! # Swagbind Core
//!
//! Declarative request binding for HTTP handlers, and a Swagger 2.0 pipeline
//! that derives API documentation from the same request metadata.

/// Shared error types.
pub mod error;

/// Metadata-driven request binding.
pub mod binding;

/// Swagger 2.0 generation from route metadata.
pub mod oas;

/// AST parsing of controller sources.
pub mod parser;

/// Type mapping logic (Rust -> Swagger schema).
pub mod type_mapping;

/// Structural diff of JSON documents.
pub mod diff;

/// Resource files, merging, drift checks and target composition.
pub mod spec;

pub use binding::{
    bind, BindError, BindErrorKind, BindErrors, BindHandler, BindOutcome, FieldKind,
    FieldMetadata, FieldOptions, MetadataWrapper, ModelBuilder, ModelRef, ModelSchema,
    NamingMask, Range, RequestModel, RequestParts, RequestStructure, Requirements,
    ResponseLocals, ScalarType, Source,
};
pub use diff::{calculate_diff, first_difference, Diff};
pub use error::{AppError, AppResult};
pub use oas::{
    DefinitionsGenHandler, Operation, Parameter, PathItem, PathsGenHandler, Response,
    ResponseSample, RouteRegistry, RouteSpec, Schema,
};
pub use parser::{extract_struct, extract_struct_names, ParsedField, ParsedStruct};
pub use spec::{
    GeneratedResource, LoadedResource, MergeRules, MetadataGenerator, ResourceConfig,
    ResourceGenerator, SourceScanGenerator, SpecBuilder, SpecConfig, SpecMerger, SpecUpdater,
    TargetConfig,
};
pub use type_mapping::{SwaggerTypeMapper, TypeMapper};
