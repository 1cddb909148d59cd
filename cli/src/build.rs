#![deny(missing_docs)]

//! # Spec Build Command
//!
//! Composes one target document and writes it as YAML.

use crate::error::CliResult;
use std::path::PathBuf;
use swagbind_core::{SpecBuilder, SpecConfig};

/// Arguments for the spec-build command.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Name of the target under `targets:` in the config file.
    #[clap(long)]
    pub target: String,

    /// Output file. Defaults to the target's configured `output`.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

/// Builds the target and writes it to disk.
pub fn execute(args: &BuildArgs, config: &SpecConfig) -> CliResult<()> {
    let path = SpecBuilder::new(config).write(&args.target, args.output.as_deref())?;
    println!("Wrote {} to {}", args.target, path.display());
    Ok(())
}
