// tests/cli_args.rs

use clap::Parser;
use multirun::cli::{CliArgs, Command, RunArgs};
use multirun::errors::{MultirunError, USAGE_EXIT_CODE};
use multirun::types::RunMode;

fn run_args(args: &[&str]) -> RunArgs {
    let argv = std::iter::once("multirun").chain(std::iter::once("run")).chain(args.iter().copied());
    match CliArgs::try_parse_from(argv).unwrap().command {
        Command::Run(run) => run,
    }
}

#[test]
fn mode_defaults_to_none_and_exit_on_error() {
    let args = run_args(&["build", "test"]);
    assert_eq!(args.mode().unwrap(), None);
    assert!(args.exit_on_error());
    assert_eq!(args.names, vec!["build", "test"]);
}

#[test]
fn explicit_modes() {
    assert_eq!(run_args(&["--parallel", "a"]).mode().unwrap(), Some(RunMode::Parallel));
    assert_eq!(run_args(&["--sequential", "a"]).mode().unwrap(), Some(RunMode::Sequential));
    assert!(!run_args(&["--no-exit-on-error", "a"]).exit_on_error());
}

#[test]
fn conflicting_or_empty_modes_are_usage_errors() {
    let both = run_args(&["--parallel", "--sequential", "a"]).mode().unwrap_err();
    assert!(matches!(both, MultirunError::Usage(_)));
    assert_eq!(both.to_string(), "--parallel and --sequential cannot be used together");
    assert_eq!(both.exit_code(), USAGE_EXIT_CODE);

    let empty = run_args(&["--sequential"]).mode().unwrap_err();
    assert_eq!(
        empty.to_string(),
        "--parallel/--sequential requires at least one script name"
    );
}

#[test]
fn repeatable_filters_and_env_pairs() {
    let args = run_args(&[
        "--filter", "web", "--filter", "!api", "-e", "A=1", "--env", "B=x=y", "dev",
    ]);
    assert_eq!(args.filter, vec!["web", "!api"]);
    assert_eq!(
        args.env,
        vec![
            ("A".to_string(), "1".to_string()),
            ("B".to_string(), "x=y".to_string())
        ]
    );
}

#[test]
fn malformed_env_pair_is_rejected_by_clap() {
    let argv = ["multirun", "run", "-e", "NOEQUALS", "x"];
    assert!(CliArgs::try_parse_from(argv).is_err());
}
