#![deny(missing_docs)]

//! # Spec Builder
//!
//! Composes the final document of one target:
//! 1. deep-merge the shared base fragments, then the target's own;
//! 2. fold in the definitions and paths of the selected resources;
//! 3. apply the target transforms;
//! 4. validate and serialize to YAML.

use crate::error::{AppError, AppResult};
use crate::oas::validation::validate_document;
use crate::spec::config::SpecConfig;
use crate::spec::merger::deep_merge;
use crate::spec::resource::{read_mapping, LoadedResource};
use crate::spec::transforms;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Builds target documents from a configuration.
#[derive(Debug, Clone, Copy)]
pub struct SpecBuilder<'a> {
    config: &'a SpecConfig,
}

impl<'a> SpecBuilder<'a> {
    /// Creates a builder over `config`.
    pub fn new(config: &'a SpecConfig) -> Self {
        Self { config }
    }

    /// Composes and validates the document of `target_name`.
    pub fn build(&self, target_name: &str) -> AppResult<Value> {
        let target = self.config.target(target_name)?;

        let mut document = Map::new();
        document.insert("swagger".into(), json!("2.0"));
        for fragment in self.config.base.iter().chain(&target.base) {
            if !fragment.exists() {
                return Err(AppError::Config(format!(
                    "Base fragment '{}' not found",
                    fragment.display()
                )));
            }
            merge_into(&mut document, read_mapping(fragment)?);
        }

        let uris: Vec<&str> = match &target.resources {
            Some(selected) => selected.iter().map(String::as_str).collect(),
            None => self.config.resources.keys().map(String::as_str).collect(),
        };
        for uri in uris {
            let resource = self.config.resource(uri)?;
            let loaded = LoadedResource::load(uri, &resource.dir)?;
            fold_resource(&mut document, loaded);
        }

        let mut document = Value::Object(document);
        transforms::apply(target, &mut document);
        validate_document(&document)?;
        tracing::info!(target = target_name, "built spec");
        Ok(document)
    }

    /// Composes the document of `target_name` as YAML.
    pub fn build_yaml(&self, target_name: &str) -> AppResult<String> {
        Ok(serde_yaml::to_string(&self.build(target_name)?)?)
    }

    /// Writes the document of `target_name` to `output`, or to the target's
    /// configured output. Returns the written path.
    pub fn write(&self, target_name: &str, output: Option<&Path>) -> AppResult<PathBuf> {
        let target = self.config.target(target_name)?;
        let path = output
            .map(Path::to_path_buf)
            .or_else(|| target.output.clone())
            .ok_or_else(|| {
                AppError::Config(format!("Target '{}' has no output path", target_name))
            })?;
        let yaml = self.build_yaml(target_name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, yaml)?;
        tracing::info!(target = target_name, path = %path.display(), "wrote spec");
        Ok(path)
    }
}

fn merge_into(root: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        let merged = match root.get(&key) {
            Some(existing) => deep_merge(existing, &value),
            None => value,
        };
        root.insert(key, merged);
    }
}

fn section<'d>(root: &'d mut Map<String, Value>, key: &str) -> Option<&'d mut Map<String, Value>> {
    if !root.get(key).is_some_and(Value::is_object) {
        root.insert(key.to_string(), Value::Object(Map::new()));
    }
    root.get_mut(key).and_then(Value::as_object_mut)
}

fn fold_resource(document: &mut Map<String, Value>, resource: LoadedResource) {
    if let Some(definitions) = section(document, "definitions") {
        for (name, schema) in resource.definitions {
            if definitions.insert(name.clone(), schema).is_some() {
                tracing::warn!(definition = %name, uri = %resource.uri, "definition redefined");
            }
        }
    }
    if let Some(paths) = section(document, "paths") {
        merge_into(paths, resource.paths);
    }
}
