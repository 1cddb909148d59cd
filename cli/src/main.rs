#![deny(missing_docs)]

//! # Swagbind CLI
//!
//! Command Line Interface for the offline spec pipeline.
//!
//! Supported Commands:
//! - `spec-build`: Composes a target document from the resource files.
//! - `spec-update`: Regenerates resource files from controller sources.
//! - `spec-update-check`: Fails when resource files are out of date.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use swagbind_core::spec::config::DEFAULT_CONFIG_FILE;
use swagbind_core::SpecConfig;
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};

mod build;
mod error;
mod update;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Swagger 2.0 spec toolchain")]
struct Cli {
    /// Path to the pipeline configuration.
    #[clap(long, global = true, env = "SWAGBIND_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose and write the document of one target.
    SpecBuild(build::BuildArgs),
    /// Regenerate resource files from controller sources.
    SpecUpdate,
    /// Exit non-zero when resource files differ from what would be generated.
    SpecUpdateCheck,
}

fn init_logging(verbose: bool) -> CliResult<()> {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}

fn run(cli: &Cli) -> CliResult<()> {
    let config = SpecConfig::load(&cli.config)?;
    match &cli.command {
        Commands::SpecBuild(args) => build::execute(args, &config),
        Commands::SpecUpdate => update::execute(&config),
        Commands::SpecUpdateCheck => update::check(&config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_with_global_config() {
        let cli = Cli::parse_from([
            "swagbind",
            "spec-build",
            "--target",
            "public",
            "--config",
            "api/swagbind.yaml",
        ]);
        assert_eq!(cli.config, PathBuf::from("api/swagbind.yaml"));
        match cli.command {
            Commands::SpecBuild(args) => {
                assert_eq!(args.target, "public");
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_config_is_error() {
        let cli = Cli::parse_from(["swagbind", "--config", "/nope/swagbind.yaml", "spec-update"]);
        assert!(run(&cli).is_err());
    }
}
