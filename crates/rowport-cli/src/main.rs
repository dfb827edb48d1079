//! rowport CLI.

use clap::{ColorChoice, Parser};
use rowport_cli::logging::{LogConfig, LogFormat, init_logging};
use rowport_cli::pipeline::StoreLayout;
use rowport_core::{Decision, ImportError};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg, ReportFormatArg, SessionCommand};
use crate::commands::{run_decide, run_import_command, run_list, run_status};
use crate::summary::{print_report, print_report_json, print_sessions, print_status};

/// Exit code when a previous run needs a decision first.
const EXIT_PENDING_DECISION: i32 = 2;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let store = StoreLayout::new(&cli.store_dir);
    let exit_code = match &cli.command {
        Command::Import(args) => match run_import_command(args, &store) {
            Ok(outcome) => match args.format {
                ReportFormatArg::Table => {
                    print_report(&outcome);
                    0
                }
                ReportFormatArg::Json => match print_report_json(&outcome) {
                    Ok(()) => 0,
                    Err(error) => report_error(&error),
                },
            },
            Err(error) => report_error(&error),
        },
        Command::Session(SessionCommand::Status(args)) => match run_status(args, &store) {
            Ok(status) => {
                print_status(&status);
                0
            }
            Err(error) => report_error(&error),
        },
        Command::Session(SessionCommand::Decide(args)) => match run_decide(args, &store) {
            Ok(status) => {
                print_status(&status);
                0
            }
            Err(error) => report_error(&error),
        },
        Command::Session(SessionCommand::List) => match run_list(&store) {
            Ok(sessions) => {
                print_sessions(&sessions);
                0
            }
            Err(error) => report_error(&error),
        },
    };
    std::process::exit(exit_code);
}

/// Print an error and pick the exit code.
fn report_error(error: &anyhow::Error) -> i32 {
    let Some(import_error) = error.downcast_ref::<ImportError>() else {
        eprintln!("error: {error:#}");
        return 1;
    };
    eprintln!("error: {}", import_error.user_message());
    if let Some(suggestion) = import_error.suggestion() {
        eprintln!("hint: {suggestion}");
    }
    if matches!(import_error, ImportError::PendingDecisionRequired { .. }) {
        eprintln!("choices: {}", Decision::ALL.map(Decision::as_str).join(", "));
        EXIT_PENDING_DECISION
    } else {
        1
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
