#![deny(missing_docs)]

//! # Spec Pipeline
//!
//! Keeps a Swagger 2.0 document split into per-resource files and assembles
//! audience-specific documents from them.
//!
//! - **config**: the `swagbind.yaml` layout (resources, targets, merge rules).
//! - **resource**: reading and writing `definitions.yaml` / `paths.yaml`.
//! - **generator**: producing fresh resource content.
//! - **merger**: folding generated content into the committed files.
//! - **updater**: the update and drift-check entry points.
//! - **transforms**: per-target document rewrites.
//! - **builder**: composing and validating a target document.

pub mod builder;
pub mod config;
pub mod generator;
pub mod merger;
pub mod resource;
pub mod transforms;
pub mod updater;

pub use builder::SpecBuilder;
pub use config::{MergeRules, ResourceConfig, RouteEntry, SpecConfig, TargetConfig};
pub use generator::{
    GeneratedResource, MetadataGenerator, ResourceGenerator, SourceScanGenerator,
};
pub use merger::{deep_merge, SpecMerger};
pub use resource::LoadedResource;
pub use updater::SpecUpdater;
