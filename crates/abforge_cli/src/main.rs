//! abforge CLI: incremental asset bundle builds from the command line.
//!
//! Provides `abforge build` to build the bundles of a project, `abforge graph`
//! to inspect how assets are classified, and `abforge deps` to dump a binary
//! dependency table.

#![warn(missing_docs)]

mod build;
mod compiler;
mod deps;
mod graph;
mod pipeline;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Dependency-aware incremental asset bundle builder.
#[derive(Parser, Debug)]
#[command(name = "abforge", version, about = "Incremental asset bundle builder")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `abforge.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the bundles of the current project.
    Build(BuildArgs),
    /// Print how every asset would be bundled, without building.
    Graph(GraphArgs),
    /// Print the contents of a binary dependency table.
    Deps(DepsArgs),
}

/// Arguments for the `abforge build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Platform name to select from `abforge.toml`.
    #[arg(short, long)]
    pub platform: Option<String>,

    /// Rebuild every bundle, ignoring recorded fingerprints.
    #[arg(long)]
    pub force: bool,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `abforge graph` subcommand.
#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Only print assets exported as bundles.
    #[arg(long)]
    pub bundles_only: bool,
}

/// Arguments for the `abforge deps` subcommand.
#[derive(Parser, Debug)]
pub struct DepsArgs {
    /// Dependency table file to read.
    pub file: PathBuf,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        EnvFilter::new("abforge=error")
    } else if cli.verbose {
        EnvFilter::new("abforge=debug")
    } else {
        EnvFilter::new("abforge=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var("TERM").is_ok() && std::env::var("NO_COLOR").is_err(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Graph(ref args) => graph::run(args, &global),
        Command::Deps(ref args) => deps::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
