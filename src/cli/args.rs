//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Asset pipeline for static sites
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: sitepipe.toml, optional)
    #[arg(short = 'C', long, global = true, default_value = "sitepipe.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Pipeline to run (defaults to `dev`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available pipelines
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Build, then serve the output with live reload and watch sources
    #[command(visible_alias = "d")]
    Dev,

    /// Production build with image optimization
    #[command(visible_alias = "b")]
    Build,
}

impl Cli {
    /// The selected pipeline, falling back to `dev` when none is given.
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        <Cli as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_default_pipeline_is_dev() {
        let cli = Cli::parse_from(["sitepipe"]);
        assert_eq!(cli.command(), Commands::Dev);
        assert_ne!(cli.command(), Commands::Build);
    }

    #[test]
    fn test_build_subcommand() {
        let cli = Cli::parse_from(["sitepipe", "build"]);
        assert_eq!(cli.command(), Commands::Build);

        let cli = Cli::parse_from(["sitepipe", "b"]);
        assert_eq!(cli.command(), Commands::Build);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["sitepipe", "build", "-C", "site.toml", "--verbose"]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_short_verbose_and_version_coexist() {
        let cli = Cli::parse_from(["sitepipe", "-v", "dev"]);
        assert!(cli.verbose);
        assert_eq!(cli.command(), Commands::Dev);

        let err = Cli::try_parse_from(["sitepipe", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
