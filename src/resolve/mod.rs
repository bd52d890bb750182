//! Variable scopes and template resolution
//!
//! Task files declare variables that nest by directory. This module keeps
//! those declarations in a [`ScopeChain`] and evaluates `{{ ... }}`
//! expressions against it.

pub mod scope;
pub mod template;

// Re-export main types
pub use scope::*;
pub use template::*;
