//! Arbor - a directory-tree task runner
//!
//! Arbor finds `.arbor` task files throughout a project, nests their
//! variables by directory, resolves `{{ ... }}` expressions in task fields
//! and runs the tasks whose dotted names match a pattern.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod name;
pub mod resolve;
pub mod runner;

// Re-export commonly used types
pub use error::{ArborError, Result};
pub use name::{matches, Pattern, TaskName};

/// Current version of Arbor
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
