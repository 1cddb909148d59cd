#![deny(missing_docs)]

//! # Request Binding
//!
//! - **metadata**: descriptor tables and the partitioned `MetadataWrapper`.
//! - **lookup**: naming-convention tolerant key resolution.
//! - **request**: the HTTP boundary and unknown-key reporting.
//! - **parsers**: per-scalar parse functions.
//! - **handler**: the fail-complete recursive binder.
//! - **error**: binding error types.

pub mod error;
pub mod handler;
pub mod lookup;
pub mod metadata;
pub mod parsers;
pub mod request;

pub use error::{BindError, BindErrorKind, BindErrors};
pub use handler::{bind, BindHandler, BindOutcome, RequestModel};
pub use lookup::{contains_field, source_field_lookup, NamingMask};
pub use metadata::{
    FieldKind, FieldMetadata, FieldOptions, MetadataWrapper, ModelBuilder, ModelRef, ModelSchema,
    Range, Requirements, ScalarType, Source,
};
pub use parsers::{ConstructError, ConstructFn, ParseError, ParseFn, ParseInput, ParseOutput};
pub use request::{RequestParts, RequestStructure, ResponseLocals};
