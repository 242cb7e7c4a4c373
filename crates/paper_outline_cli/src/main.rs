//! `paper-outline` command-line entry point.

mod args;
mod commands;
mod error;
mod render;

use args::Cli;
use clap::Parser;
use error::CliError;
use paper_outline_core::{default_log_level, init_logging, SessionError};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match commands::execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &CliError) {
    match err {
        CliError::Session(SessionError::ValidationFailed(report)) => {
            eprintln!("error: outline is invalid");
            for issue in &report.errors {
                eprintln!("  - {issue}");
            }
        }
        other => {
            log::error!("event=cli_command module=cli status=error error={other}");
            eprintln!("error: {other}");
        }
    }
}
