// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::{EngineKind, LaunchMode};

/// Command-line arguments for `dwgbatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dwgbatch",
    version,
    about = "Run prepared scripts against drawing files through a CAD engine, in parallel.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the batch file (TOML).
    ///
    /// Default: `Dwgbatch.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Dwgbatch.toml")]
    pub config: String,

    /// Prepared script to run against every INPUT given on the command line.
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Drawing files to process with `--script`, in addition to the
    /// `[[job]]` entries of the batch file.
    #[arg(value_name = "INPUT", requires = "script")]
    pub inputs: Vec<PathBuf>,

    /// Maximum number of engine processes running at once (1-12).
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// How engine processes are attached: `captured` or `console`
    /// (overrides `[scheduler].mode`).
    #[arg(long, value_name = "MODE", conflicts_with = "console")]
    pub mode: Option<LaunchMode>,

    /// Shorthand for `--mode console`.
    #[arg(long)]
    pub console: bool,

    /// Engine flavour: `core-console` (alias `accore`) or `desktop`
    /// (overrides `[engine].kind`).
    #[arg(long, value_name = "KIND")]
    pub engine_kind: Option<EngineKind>,

    /// Don't relay engine output or write per-job log files.
    #[arg(long)]
    pub no_logs: bool,

    /// Directory for per-job log files (overrides `[output].log_dir`).
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DWGBATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print jobs and command lines, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
