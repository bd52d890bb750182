//! Main CLI application

use crate::config::TaskFileWalker;
use crate::error::{ConfigError, ConfigResult, ExecutionError};
use crate::name::{Pattern, DEFAULT_PATTERN};
use crate::runner::{find_tasks, run_tasks, Context, Verbosity};
use anyhow::Context as _;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter that overrides verbosity
pub const LOG_ENV: &str = "ARBOR_LOG";

/// Build the clap command
pub fn build_command() -> Command {
    let pattern = || {
        Arg::new("pattern")
            .value_name("PATTERN")
            .help("Dotted task pattern; * matches one segment, ** any number")
            .default_value(DEFAULT_PATTERN)
    };

    Command::new("arbor")
        .version(crate::VERSION)
        .about("Run tasks declared in .arbor files across a directory tree")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("dir")
                .short('C')
                .long("dir")
                .value_name("DIR")
                .help("Directory to search for task files (default: current directory)")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .value_name("GLOB")
                .help("Skip directories whose path relative to DIR matches GLOB")
                .action(ArgAction::Append)
                .global(true),
        )
        .arg(
            Arg::new("env-file")
                .long("env-file")
                .value_name("FILE")
                .help("Load environment variables from a dotenv file first")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("find")
                .visible_alias("f")
                .about("List tasks matching a pattern")
                .arg(pattern()),
        )
        .subcommand(
            Command::new("run")
                .visible_alias("r")
                .about("Run tasks matching a pattern")
                .arg(pattern()),
        )
        .subcommand(
            Command::new("completions")
                .about("Print a shell completion script")
                .arg(
                    Arg::new("shell")
                        .value_name("SHELL")
                        .required(true)
                        .value_parser(value_parser!(Shell)),
                ),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Install the `tracing` subscriber. `ARBOR_LOG` wins over verbosity flags.
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));

    // A subscriber may already be installed when embedded, e.g. in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}

/// Load a dotenv file into the process environment without overriding
fn load_env_file(path: &Path) -> ConfigResult<()> {
    dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::debug!("Loaded environment from {}", path.display());
    Ok(())
}

/// Resolve the walk root to an absolute, canonical directory
fn resolve_root(dir: Option<&PathBuf>) -> anyhow::Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let root = fs::canonicalize(&dir).map_err(|_| ConfigError::RootNotFound(dir))?;
    Ok(root)
}

fn build_walker(matches: &ArgMatches, root: PathBuf) -> ConfigResult<TaskFileWalker> {
    let excludes = matches
        .get_many::<String>("exclude")
        .into_iter()
        .flatten();
    TaskFileWalker::new(root)?.with_excludes(excludes)
}

fn pattern_arg(matches: &ArgMatches) -> Pattern {
    let pattern = matches
        .get_one::<String>("pattern")
        .map(String::as_str)
        .unwrap_or(DEFAULT_PATTERN);
    Pattern::parse(pattern)
}

/// Run the CLI application with the process arguments
pub fn run() -> anyhow::Result<()> {
    run_from(env::args_os())
}

/// Run the CLI application with explicit arguments
pub fn run_from<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let mut command = build_command();
    let matches = command.clone().get_matches_from(args);

    let (name, sub_matches) = match matches.subcommand() {
        Some(subcommand) => subcommand,
        None => {
            command.print_help()?;
            println!();
            return Ok(());
        }
    };

    // Global flags are visible on the subcommand wherever they were given
    let verbosity = get_verbosity(sub_matches);
    init_logging(verbosity);

    if name == "completions" {
        if let Some(shell) = sub_matches.get_one::<Shell>("shell") {
            clap_complete::generate(*shell, &mut command, "arbor", &mut io::stdout());
        }
        return Ok(());
    }

    if let Some(path) = sub_matches.get_one::<PathBuf>("env-file") {
        load_env_file(path)?;
    }

    let root = resolve_root(sub_matches.get_one::<PathBuf>("dir"))?;
    let walker = build_walker(sub_matches, root.clone())?;
    let ctx = Context::new()
        .with_root(root)
        .with_pattern(pattern_arg(sub_matches))
        .with_verbosity(verbosity);

    tracing::debug!("Searching {} for '{}'", ctx.root.display(), ctx.pattern);

    match name {
        "find" => {
            for (task_name, file) in find_tasks(&ctx, &walker)? {
                ctx.print_match(&task_name, &file);
            }
        }
        "run" => {
            let summary = run_tasks(&ctx, &walker)?;
            if !summary.is_success() {
                return Err(ExecutionError::TasksFailed(summary.failed_files).into());
            }
        }
        other => unreachable!("unknown subcommand {other}"),
    }

    Ok(())
}
