// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Flag combinations that clap cannot express with the exact wording we want
//! (`--parallel` together with `--sequential`, a mode flag without names) are
//! checked in [`RunArgs::mode`] and reported as usage errors.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::errors::{MultirunError, Result};
use crate::types::RunMode;

/// Command-line arguments for `multirun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "multirun",
    version,
    about = "Run package.json scripts and shell commands in parallel or in sequence with prefixed output.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MULTIRUN_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run one or more scripts, globs or raw shell commands.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Run all scripts concurrently.
    #[arg(long)]
    pub parallel: bool,

    /// Run scripts one after another, in the given order.
    #[arg(long)]
    pub sequential: bool,

    /// Keep running the remaining scripts when one fails.
    #[arg(long)]
    pub no_exit_on_error: bool,

    /// Run in workspace packages matching this name or path pattern.
    #[arg(long, value_name = "PATTERN")]
    pub filter: Vec<String>,

    /// Run in every workspace package (the root package is excluded).
    #[arg(long)]
    pub workspaces: bool,

    /// With `--workspaces`, skip packages that lack the script instead of failing.
    #[arg(long)]
    pub if_present: bool,

    /// Directory to resolve `package.json` from (default: current directory).
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Extra environment variable for every script (`KEY=VALUE`).
    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Script names, glob patterns (`build:*`), file paths or raw commands.
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,
}

impl RunArgs {
    /// Validate the mode flags against the given names.
    ///
    /// Returns `None` when neither mode flag was given.
    pub fn mode(&self) -> Result<Option<RunMode>> {
        if self.parallel && self.sequential {
            return Err(MultirunError::usage(
                "--parallel and --sequential cannot be used together",
            ));
        }

        let mode = if self.parallel {
            Some(RunMode::Parallel)
        } else if self.sequential {
            Some(RunMode::Sequential)
        } else {
            None
        };

        if mode.is_some() && self.names.is_empty() {
            return Err(MultirunError::usage(
                "--parallel/--sequential requires at least one script name",
            ));
        }

        Ok(mode)
    }

    pub fn exit_on_error(&self) -> bool {
        !self.no_exit_on_error
    }
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

fn parse_env_pair(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got \"{s}\"")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
