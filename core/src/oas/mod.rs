#![deny(missing_docs)]

//! # Swagger 2.0 Generation
//!
//! - **models**: Typed document entities.
//! - **naming**: Path, operation id and definition name helpers.
//! - **registry**: The explicit route table generators walk.
//! - **definitions**: Definitions from request metadata and response samples.
//! - **examples**: Example synthesis for object definitions.
//! - **paths**: Path items from request metadata.
//! - **validation**: Structural checks on composed documents.

pub mod definitions;
pub mod examples;
pub mod models;
pub mod naming;
pub mod paths;
pub mod registry;
pub mod validation;

pub use definitions::DefinitionsGenHandler;
pub use models::{Operation, Parameter, PathItem, Response, Schema};
pub use paths::PathsGenHandler;
pub use registry::{ResponseSample, RouteRegistry, RouteSpec};
pub use validation::{document_problems, validate_document};
