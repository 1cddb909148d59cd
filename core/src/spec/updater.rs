#![deny(missing_docs)]

//! # Spec Updater
//!
//! Runs generate → merge → dump for every registered resource, or compares
//! the merged result against disk without writing (the CI drift check).

use crate::diff::first_difference;
use crate::error::{AppError, AppResult};
use crate::spec::config::SpecConfig;
use crate::spec::generator::{ResourceGenerator, SourceScanGenerator};
use crate::spec::merger::SpecMerger;
use crate::spec::resource::LoadedResource;
use indexmap::IndexMap;

/// Keeps committed resource files in sync with their generators.
pub struct SpecUpdater<'a> {
    config: &'a SpecConfig,
    generators: IndexMap<String, Box<dyn ResourceGenerator + 'a>>,
}

impl std::fmt::Debug for SpecUpdater<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecUpdater")
            .field("resources", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a> SpecUpdater<'a> {
    /// An updater without generators.
    pub fn new(config: &'a SpecConfig) -> Self {
        Self {
            config,
            generators: IndexMap::new(),
        }
    }

    /// Registers a source-scan generator for every resource with a `source`.
    pub fn from_config(config: &'a SpecConfig) -> AppResult<Self> {
        let mut updater = Self::new(config);
        for (uri, resource) in &config.resources {
            if resource.source.is_some() {
                let generator = SourceScanGenerator::from_config(uri, resource)?;
                updater = updater.register(uri.clone(), generator);
            }
        }
        Ok(updater)
    }

    /// Registers (or replaces) the generator of resource `uri`.
    pub fn register(
        mut self,
        uri: impl Into<String>,
        generator: impl ResourceGenerator + 'a,
    ) -> Self {
        self.generators.insert(uri.into(), Box::new(generator));
        self
    }

    /// URIs with a registered generator, in registration order.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }

    fn plan(
        &self,
        uri: &str,
        generator: &dyn ResourceGenerator,
    ) -> AppResult<(LoadedResource, LoadedResource)> {
        let resource = self.config.resource(uri)?;
        let existing = LoadedResource::load(uri, &resource.dir)?;
        let generated = generator.generate(&existing)?;
        let merged = SpecMerger::new(&self.config.merge).merge(&existing, generated);
        Ok((existing, merged))
    }

    /// Regenerates and rewrites every registered resource.
    ///
    /// Returns the URIs whose files changed.
    pub fn update(&self) -> AppResult<Vec<String>> {
        let mut changed = Vec::new();
        for (uri, generator) in &self.generators {
            let (existing, merged) = self.plan(uri, generator.as_ref())?;
            let dirty = first_difference(&existing.to_value(), &merged.to_value()).is_some();
            merged.dump()?;
            if dirty {
                changed.push(uri.clone());
            }
            tracing::info!(uri = %uri, changed = dirty, "updated resource");
        }
        Ok(changed)
    }

    /// Fails on the first resource whose committed files are stale.
    pub fn check(&self) -> AppResult<()> {
        for (uri, generator) in &self.generators {
            let (existing, merged) = self.plan(uri, generator.as_ref())?;
            if let Some(diff) = first_difference(&existing.to_value(), &merged.to_value()) {
                tracing::error!(uri = %uri, %diff, "resource out of date");
                return Err(AppError::Drift {
                    uri: uri.clone(),
                    pointer: diff.pointer().to_string(),
                });
            }
            tracing::debug!(uri = %uri, "resource up to date");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::config::ResourceConfig;
    use crate::spec::generator::GeneratedResource;
    use serde_json::{json, Map, Value};
    use std::fs;
    use std::path::Path;

    struct Fixed(Value);

    impl ResourceGenerator for Fixed {
        fn generate(&self, _existing: &LoadedResource) -> AppResult<GeneratedResource> {
            let Value::Object(paths) = self.0.clone() else {
                unreachable!()
            };
            Ok(GeneratedResource {
                paths,
                definitions: Map::new(),
                has_write: false,
                synthesized_examples: Vec::new(),
            })
        }
    }

    fn config(dir: &Path) -> SpecConfig {
        let mut config = SpecConfig::default();
        config.resources.insert(
            "wells".into(),
            ResourceConfig {
                dir: dir.join("wells"),
                name: None,
                source: None,
                routes: Vec::new(),
                tags: Vec::new(),
            },
        );
        config
    }

    fn paths() -> Value {
        json!({"/wells": {"get": {"operationId": "get-wells", "responses": {"200": {"description": "OK"}}}}})
    }

    #[test]
    fn test_check_then_update_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let updater = SpecUpdater::new(&config).register("wells", Fixed(paths()));

        let err = updater.check().unwrap_err();
        match err {
            AppError::Drift { uri, pointer } => {
                assert_eq!(uri, "wells");
                assert_eq!(pointer, "/paths/~1wells");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(updater.update().unwrap(), vec!["wells"]);
        updater.check().unwrap();
        assert!(updater.update().unwrap().is_empty());
    }

    #[test]
    fn test_check_detects_hand_edit() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let updater = SpecUpdater::new(&config).register("wells", Fixed(paths()));
        updater.update().unwrap();

        let file = dir.path().join("wells").join("paths.yaml");
        let edited = fs::read_to_string(&file).unwrap().replace("OK", "Fine");
        fs::write(&file, edited).unwrap();

        let err = updater.check().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Spec drift in resource 'wells' at '/paths/~1wells/get/responses/200/description'"
        );
    }

    #[test]
    fn test_unknown_resource() {
        let config = SpecConfig::default();
        let updater = SpecUpdater::new(&config).register("ghost", Fixed(paths()));
        assert!(matches!(updater.update(), Err(AppError::Config(_))));
    }
}
