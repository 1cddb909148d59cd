#![deny(missing_docs)]

//! # Resource Files
//!
//! A resource is one directory holding `definitions.yaml` and `paths.yaml`.
//! Each file is loaded and dumped independently, and a missing file reads as
//! an empty mapping.

use crate::error::{AppError, AppResult};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// File holding a resource's definitions.
pub const DEFINITIONS_FILE: &str = "definitions.yaml";

/// File holding a resource's paths.
pub const PATHS_FILE: &str = "paths.yaml";

/// One resource's on-disk unit.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedResource {
    /// Resource URI as configured.
    pub uri: String,
    /// Resource directory.
    pub dir: PathBuf,
    /// `definitions` mapping.
    pub definitions: Map<String, Value>,
    /// `paths` mapping.
    pub paths: Map<String, Value>,
}

impl LoadedResource {
    /// An empty resource.
    pub fn empty(uri: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            uri: uri.into(),
            dir: dir.into(),
            definitions: Map::new(),
            paths: Map::new(),
        }
    }

    /// Reads the resource stored in `dir`.
    pub fn load(uri: impl Into<String>, dir: impl Into<PathBuf>) -> AppResult<Self> {
        let mut resource = Self::empty(uri, dir);
        resource.definitions = read_mapping(&resource.dir.join(DEFINITIONS_FILE))?;
        resource.paths = read_mapping(&resource.dir.join(PATHS_FILE))?;
        Ok(resource)
    }

    /// Writes both files, creating the directory when needed.
    pub fn dump(&self) -> AppResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(
            self.dir.join(DEFINITIONS_FILE),
            serde_yaml::to_string(&self.definitions)?,
        )?;
        fs::write(self.dir.join(PATHS_FILE), serde_yaml::to_string(&self.paths)?)?;
        tracing::debug!(uri = %self.uri, dir = %self.dir.display(), "dumped resource");
        Ok(())
    }

    /// Both mappings as one `{definitions, paths}` value, for comparison.
    pub fn to_value(&self) -> Value {
        json!({
            "definitions": self.definitions,
            "paths": self.paths,
        })
    }
}

/// Reads a YAML mapping; a missing or empty file is an empty mapping.
pub fn read_mapping(path: &Path) -> AppResult<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_yaml::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(AppError::Config(format!(
            "'{}' must contain a mapping",
            path.display()
        ))),
    }
}
