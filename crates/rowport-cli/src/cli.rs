//! CLI argument definitions for rowport.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use rowport_cli::pipeline::DEFAULT_STORE_DIR;
use rowport_core::Decision;

#[derive(Parser)]
#[command(
    name = "rowport",
    version,
    about = "Map CSV rows onto records through column rules",
    long_about = "Map CSV rows onto records through column rules.\n\n\
                  Re-running an import of the same source asks for a decision:\n\
                  cancel, force (replace the previous records) or continue (keep them)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include cell values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Directory holding records, sessions and decision flags.
    #[arg(
        long = "store-dir",
        value_name = "DIR",
        default_value = DEFAULT_STORE_DIR,
        global = true
    )]
    pub store_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Preview or persist an import described by a profile.
    Import(ImportArgs),

    /// Inspect or decide import sessions.
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Parser)]
pub struct ImportArgs {
    /// Import profile (JSON).
    #[arg(value_name = "PROFILE")]
    pub profile: PathBuf,

    /// Source CSV file (overrides the profile's source).
    #[arg(long = "source", value_name = "CSV")]
    pub source: Option<PathBuf>,

    /// Write records instead of previewing them.
    #[arg(long = "persist")]
    pub persist: bool,

    /// Decision for a source that was imported before.
    #[arg(long = "decision", value_name = "DECISION")]
    pub decision: Option<Decision>,

    /// Report format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: ReportFormatArg,

    /// Cell delimiter (overrides the profile).
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// First 1-based row to import (overrides the profile).
    #[arg(long = "start-row", value_name = "N")]
    pub start_row: Option<usize>,

    /// Trim whitespace around cell values.
    #[arg(long = "trim")]
    pub trim: bool,

    /// Keep empty cells in place inside multi-column values.
    #[arg(long = "keep-positions")]
    pub keep_positions: bool,

    /// Register an additional record kind before writing.
    #[arg(long = "register-kind", value_name = "KIND")]
    pub register_kinds: Vec<String>,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Show the session state of a source.
    Status(SourceArgs),

    /// Record a decision for a source.
    Decide(DecideArgs),

    /// List every recorded session.
    List,
}

#[derive(Parser)]
pub struct SourceArgs {
    /// Source CSV file.
    #[arg(value_name = "CSV")]
    pub source: PathBuf,
}

#[derive(Parser)]
pub struct DecideArgs {
    /// Source CSV file.
    #[arg(value_name = "CSV")]
    pub source: PathBuf,

    /// cancel, force or continue.
    #[arg(value_name = "DECISION")]
    pub decision: Decision,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
