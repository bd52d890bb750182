//! Task execution engine
//!
//! This module resolves tasks against the scope chain and runs them as
//! subprocesses, one task file at a time.

pub mod command;
pub mod context;
pub mod orchestrator;
pub mod task;

// Re-export main types
pub use command::*;
pub use context::*;
pub use orchestrator::*;
pub use task::*;
