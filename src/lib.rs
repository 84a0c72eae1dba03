// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod output;
pub mod resolve;
pub mod types;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command, RunArgs};
use crate::config::find_manifest;
use crate::engine::{Orchestrator, OrchestratorOptions};
use crate::errors::{MultirunError, Result};
use crate::exec::RealShellExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::output::{detect_color, OutputSink};
use crate::resolve::{build_groups, RunRequest};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - flag validation
/// - manifest / workspace resolution into Groups
/// - the orchestrator with the real shell executor
/// - Ctrl-C handling
///
/// Returns the process exit code of the run.
pub async fn run(args: CliArgs) -> Result<i32> {
    match args.command {
        Command::Run(run_args) => run_scripts(run_args).await,
    }
}

async fn run_scripts(args: RunArgs) -> Result<i32> {
    let mode = args.mode()?;
    let cwd = resolve_cwd(args.cwd.as_deref())?;
    let fs = RealFileSystem;

    if mode.is_none() && args.names.is_empty() {
        list_scripts(&fs, &cwd)?;
        return Ok(0);
    }

    let request = RunRequest::from_args(&args, cwd);
    let groups = build_groups(&request, &fs)?;

    let options = OrchestratorOptions {
        mode: mode.unwrap_or_default(),
        exit_on_error: args.exit_on_error(),
        colored: detect_color(),
        ..OrchestratorOptions::default()
    };

    let orchestrator = Orchestrator::new(
        groups,
        options,
        Arc::new(RealShellExecutor::new()),
        OutputSink::stdio(),
    );

    // Ctrl-C -> terminate everything, exit 130.
    let interrupt = orchestrator.interrupt_handle();
    let ctrl_c = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received; stopping run");
                interrupt.interrupt();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    let report = orchestrator.run().await;
    ctrl_c.abort();

    debug!(exit_code = report.exit_code, "run complete");
    Ok(report.exit_code)
}

fn resolve_cwd(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir().map_err(|source| MultirunError::Io {
        path: PathBuf::from("."),
        source,
    })?;

    Ok(match cwd {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => current.join(dir),
        None => current,
    })
}

/// `run` without names: print the nearest manifest's scripts.
fn list_scripts(fs: &dyn FileSystem, cwd: &Path) -> Result<()> {
    let Some(loaded) = find_manifest(fs, cwd)? else {
        return Err(MultirunError::usage(format!(
            "No package.json found in {} or any parent directory",
            cwd.display()
        )));
    };

    let mut out = std::io::stdout().lock();
    let io_err = |source| MultirunError::Io {
        path: PathBuf::from("<stdout>"),
        source,
    };

    if loaded.manifest.scripts.is_empty() {
        writeln!(out, "No scripts found").map_err(io_err)?;
        return Ok(());
    }

    for (name, command) in &loaded.manifest.scripts {
        writeln!(out, "{name}: {command}").map_err(io_err)?;
    }
    Ok(())
}
