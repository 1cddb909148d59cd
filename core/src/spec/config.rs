#![deny(missing_docs)]

//! # Spec Configuration
//!
//! The YAML file driving the offline pipeline: where each resource lives, how
//! it is generated, which fields survive a merge, and how each audience's
//! document is composed.
//!
//! Relative paths are resolved against the directory holding the file.

use crate::error::{AppError, AppResult};
use heck::ToUpperCamelCase;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "swagbind.yaml";

/// Fields a merge keeps from the committed spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeRules {
    /// Operation keys taken from the existing operation when present.
    pub preserved_operation_fields: Vec<String>,
    /// Schema keys kept from the existing schema when the generated one lacks them.
    pub preserved_schema_fields: Vec<String>,
}

impl Default for MergeRules {
    fn default() -> Self {
        Self {
            preserved_operation_fields: vec!["x-google-quota".into(), "operationId".into()],
            preserved_schema_fields: vec!["description".into(), "example".into()],
        }
    }
}

/// One row of an explicit route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// HTTP verb, any case.
    pub method: String,
    /// Express-style path.
    pub path: String,
    /// Handler function name in the resource's source.
    pub handler: String,
}

/// Where a resource is stored and how it is scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Directory holding `definitions.yaml` and `paths.yaml`.
    pub dir: PathBuf,
    /// Resource name used for `{Name}Input`; defaults to the URI in PascalCase.
    #[serde(default)]
    pub name: Option<String>,
    /// Handler source file or directory for the source-scan generator.
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Route table for the source-scan generator.
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    /// Tags attached to scanned operations.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ResourceConfig {
    /// The effective resource name for `uri`.
    pub fn resource_name(&self, uri: &str) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| uri.to_upper_camel_case())
    }
}

/// One audience-specific output document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Fragments merged after the shared base.
    pub base: Vec<PathBuf>,
    /// Resources included; all when absent.
    pub resources: Option<Vec<String>>,
    /// Operations carrying any of these truthy extensions are removed.
    pub exclude_flagged: Vec<String>,
    /// Path key renames; `null` drops the path.
    pub path_map: IndexMap<String, Option<String>>,
    /// Parameter replacements by name; `null` drops the parameter.
    pub parameter_map: IndexMap<String, Option<Value>>,
    /// Definition renames; `null` drops the definition.
    pub definition_map: IndexMap<String, Option<String>>,
    /// Vendor extension renames; `null` strips the extension.
    pub extension_map: IndexMap<String, Option<String>>,
    /// Output file.
    pub output: Option<PathBuf>,
}

/// The pipeline configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpecConfig {
    /// Ordered base fragments, deep-merged first to last.
    #[serde(default)]
    pub base: Vec<PathBuf>,
    /// Merge allow-lists.
    #[serde(default)]
    pub merge: MergeRules,
    /// Resources by URI.
    #[serde(default)]
    pub resources: IndexMap<String, ResourceConfig>,
    /// Targets by name.
    #[serde(default)]
    pub targets: IndexMap<String, TargetConfig>,
}

impl SpecConfig {
    /// Reads and resolves the configuration file at `path`.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_yaml(&content, root)?;
        tracing::debug!(
            path = %path.display(),
            resources = config.resources.len(),
            targets = config.targets.len(),
            "loaded spec config"
        );
        Ok(config)
    }

    /// Parses configuration text, resolving relative paths against `root`.
    pub fn from_yaml(content: &str, root: &Path) -> AppResult<Self> {
        let mut config: SpecConfig = serde_yaml::from_str(content)?;
        config.resolve_paths(root);
        Ok(config)
    }

    fn resolve_paths(&mut self, root: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };
        self.base.iter_mut().for_each(resolve);
        for resource in self.resources.values_mut() {
            resolve(&mut resource.dir);
            if let Some(source) = resource.source.as_mut() {
                resolve(source);
            }
        }
        for target in self.targets.values_mut() {
            target.base.iter_mut().for_each(resolve);
            if let Some(output) = target.output.as_mut() {
                resolve(output);
            }
        }
    }

    /// Looks up a resource by URI.
    pub fn resource(&self, uri: &str) -> AppResult<&ResourceConfig> {
        self.resources
            .get(uri)
            .ok_or_else(|| AppError::Config(format!("Unknown resource '{}'", uri)))
    }

    /// Looks up a target by name.
    pub fn target(&self, name: &str) -> AppResult<&TargetConfig> {
        self.targets
            .get(name)
            .ok_or_else(|| AppError::Config(format!("Unknown target '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
base: [spec/base.yaml]
resources:
  econ-models:
    dir: spec/resources/econ-models
    source: /abs/econ_models.rs
    routes:
      - { method: get, path: /econ-models/:id, handler: get_econ_model }
targets:
  public:
    base: [spec/overlays/public.yaml]
    exclude_flagged: [x-no-doc]
    extension_map: { x-google-quota: null, x-internal: x-private }
    output: dist/public.yaml
"#;

    #[test]
    fn test_defaults_and_resolution() {
        let config = SpecConfig::from_yaml(CONFIG, Path::new("/repo")).unwrap();
        assert_eq!(config.merge, MergeRules::default());
        assert_eq!(config.base, vec![PathBuf::from("/repo/spec/base.yaml")]);

        let resource = config.resource("econ-models").unwrap();
        assert_eq!(resource.dir, PathBuf::from("/repo/spec/resources/econ-models"));
        assert_eq!(resource.source, Some(PathBuf::from("/abs/econ_models.rs")));
        assert_eq!(resource.routes[0].handler, "get_econ_model");
        assert_eq!(resource.resource_name("econ-models"), "EconModels");

        let target = config.target("public").unwrap();
        assert_eq!(target.output, Some(PathBuf::from("/repo/dist/public.yaml")));
        assert_eq!(target.extension_map["x-google-quota"], None);
        assert_eq!(
            target.extension_map["x-internal"].as_deref(),
            Some("x-private")
        );
    }

    #[test]
    fn test_custom_merge_rules() {
        let config = SpecConfig::from_yaml(
            "merge:\n  preserved_schema_fields: [title]\n",
            Path::new("."),
        )
        .unwrap();
        assert_eq!(config.merge.preserved_schema_fields, vec!["title"]);
        assert_eq!(
            config.merge.preserved_operation_fields,
            MergeRules::default().preserved_operation_fields
        );
    }

    #[test]
    fn test_unknown_target() {
        let config = SpecConfig::default();
        assert!(matches!(config.target("x"), Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = SpecConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
