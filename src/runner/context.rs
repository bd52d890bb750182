//! Run context
//!
//! The context carries the settings of one invocation and owns the
//! user-facing output.

use crate::name::{Pattern, TaskName};
use colored::Colorize;
use std::env;
use std::path::{Path, PathBuf};

/// Settings for one `find` or `run` invocation
pub struct Context {
    /// Directory the walk starts from
    pub root: PathBuf,

    /// Tasks must match this pattern to be listed or run
    pub pattern: Pattern,

    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Verbosity {
    /// Default `tracing` filter directive for this level
    pub fn log_directive(&self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "debug",
        }
    }
}

impl Context {
    /// Create a context rooted at the current directory, matching every task
    pub fn new() -> Self {
        Context {
            root: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            pattern: Pattern::default(),
            verbosity: Verbosity::Normal,
        }
    }

    /// Set the walk root
    pub fn with_root(mut self, root: PathBuf) -> Self {
        self.root = root;
        self
    }

    /// Set the task pattern
    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Print a task found by `find`
    pub fn print_match(&self, name: &TaskName, file: &Path) {
        println!("{} in {}", name.to_string().bold(), file.display());
    }

    /// Print task start banner
    pub fn print_task_start(&self, name: &TaskName) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{}", format!("-------- {} --------", name).cyan().bold());
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}", "[ERROR]".red().bold(), message);
        }
    }

    /// Print note that the rest of a file is skipped
    pub fn print_file_aborted(&self, file: &Path, skipped: usize) {
        if skipped > 0 && self.verbosity >= Verbosity::Normal {
            eprintln!(
                "{} skipping {} remaining task(s) in {}",
                "[WARN]".yellow().bold(),
                skipped,
                file.display()
            );
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
