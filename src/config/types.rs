//! Core task file types
//!
//! This module defines the data structures that represent a `.arbor` task file.

use crate::name::TaskName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// A parsed task file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskFile {
    /// Where the file came from. Set by the parser, not read from YAML.
    #[serde(skip)]
    pub path: PathBuf,

    /// Top level variables, inherited by tasks here and in subdirectories
    #[serde(rename = "Variables", default, skip_serializing_if = "HashMap::is_empty")]
    pub variables: HashMap<String, String>,

    /// Tasks in declaration order
    #[serde(rename = "Tasks", default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
}

impl TaskFile {
    /// Directory relative paths in this file resolve against
    pub fn anchor_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// A task definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Task {
    /// Dotted name, e.g. `app.test.unit`
    #[serde(rename = "Name")]
    pub name: TaskName,

    /// Executable followed by its arguments
    #[serde(rename = "Command", default)]
    pub command: Vec<String>,

    /// Working directory, defaults to the task file's directory
    #[serde(rename = "CWD", default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    /// Environment variables set for the command
    #[serde(
        rename = "Environment",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub environment: BTreeMap<String, String>,
}
