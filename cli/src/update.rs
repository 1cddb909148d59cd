#![deny(missing_docs)]

//! # Spec Update Commands
//!
//! `spec-update` rewrites resource files from their controllers;
//! `spec-update-check` fails when committed files are stale.

use crate::error::CliResult;
use swagbind_core::{SpecConfig, SpecUpdater};

/// Regenerates every resource with a configured `source`.
pub fn execute(config: &SpecConfig) -> CliResult<()> {
    let updater = SpecUpdater::from_config(config)?;
    let changed = updater.update()?;
    if changed.is_empty() {
        println!("All resources up to date.");
    } else {
        for uri in &changed {
            println!("Updated {}", uri);
        }
    }
    Ok(())
}

/// Compares generated resources with disk without writing.
pub fn check(config: &SpecConfig) -> CliResult<()> {
    SpecUpdater::from_config(config)?.check()?;
    println!("Spec is up to date.");
    Ok(())
}
