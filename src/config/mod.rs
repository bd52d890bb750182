//! Task file discovery, parsing and validation
//!
//! This module handles finding `.arbor` files in a directory tree, parsing
//! them and checking their structure.

pub mod parse;
pub mod schema;
pub mod types;
pub mod walk;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
pub use walk::*;
