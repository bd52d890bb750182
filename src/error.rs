//! Error types for Arbor

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for Arbor operations
pub type Result<T> = std::result::Result<T, ArborError>;

/// Main error type for Arbor
#[derive(Error, Debug)]
pub enum ArborError {
    /// Task file discovery and parsing errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Template and variable resolution errors
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Task file discovery, parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read task file '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse task file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid task file '{}': {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("Root directory '{}' does not exist or is not a directory", .0.display())]
    RootNotFound(PathBuf),

    #[error("Invalid exclude pattern: {0}")]
    Exclude(#[from] globset::Error),

    #[error("Failed to load environment file '{}': {message}", .path.display())]
    EnvFile { path: PathBuf, message: String },
}

/// Template and variable resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("variable \"{name}\" was not found{}", origin_suffix(.origin.as_deref()))]
    NotFound {
        name: String,
        origin: Option<PathBuf>,
    },

    #[error("cyclic variable reference: {chain}")]
    Cyclic { chain: String },

    #[error("malformed template \"{text}\" at offset {position}: {message}")]
    Syntax {
        text: String,
        position: usize,
        message: String,
    },

    #[error("could not resolve variable \"{name}\": \"{value}\" in {}: {source}", .origin.display())]
    Variable {
        name: String,
        value: String,
        origin: PathBuf,
        source: Box<ResolveError>,
    },

    #[error("{}", join_lines(.0))]
    Unresolved(Vec<ResolveError>),
}

impl ResolveError {
    /// True for a malformed template, which callers may fall back from
    pub fn is_syntax(&self) -> bool {
        matches!(self, ResolveError::Syntax { .. })
    }
}

fn origin_suffix(origin: Option<&Path>) -> String {
    match origin {
        Some(path) => format!(" (looked up from {})", path.display()),
        None => String::new(),
    }
}

fn join_lines(errors: &[ResolveError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Could not resolve {field} of task '{task}': {source}")]
    Field {
        task: String,
        field: String,
        source: ResolveError,
    },

    #[error("Task '{0}' has no command")]
    EmptyCommand(String),

    #[error("Failed to start '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    #[error("Task '{task}' failed with exit code {code:?}")]
    CommandFailed { task: String, code: Option<i32> },

    #[error("{0} task file(s) aborted after a failing task")]
    TasksFailed(usize),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for resolution operations
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
