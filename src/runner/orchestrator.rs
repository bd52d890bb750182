//! Task resolution
//!
//! Ties a task file to its place in the scope chain and turns its tasks
//! into concrete, runnable form.

use crate::config::{Task, TaskFile};
use crate::error::{ExecutionError, ExecutionResult};
use crate::name::{Pattern, TaskName};
use crate::resolve::{resolve_string, ScopeChain, ScopeId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A task with every template expression evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTask {
    pub name: TaskName,
    pub program: String,
    pub args: Vec<String>,
    /// Always absolute when the anchor directory is
    pub cwd: PathBuf,
    pub environment: BTreeMap<String, String>,
}

/// Builds the scope chain as task files arrive and resolves their tasks
#[derive(Debug, Default)]
pub struct Orchestrator {
    chain: ScopeChain,
    pattern: Pattern,
}

impl Orchestrator {
    pub fn new(pattern: Pattern) -> Self {
        Orchestrator {
            chain: ScopeChain::new(),
            pattern,
        }
    }

    pub fn chain(&self) -> &ScopeChain {
        &self.chain
    }

    /// Give `file` a scope, chained onto the nearest enclosing directory that
    /// already has one, and register it for the file's own directory.
    ///
    /// Files must arrive in walk order: a directory before its descendants.
    pub fn load(&mut self, file: &TaskFile) -> ScopeId {
        let parent = self.chain.nearest_ancestor(&file.path);
        let id = self
            .chain
            .build_scope(file.variables.clone(), parent, file.path.clone());
        self.chain.register(file.anchor_dir(), id);

        tracing::debug!(
            "Loaded {} ({} variable(s), parent scope: {})",
            file.path.display(),
            file.variables.len(),
            parent.is_some()
        );
        id
    }

    /// Tasks of `file` matching the run's pattern, in declaration order
    pub fn matching<'f>(&'f self, file: &'f TaskFile) -> impl Iterator<Item = &'f Task> + 'f {
        file.tasks
            .iter()
            .filter(move |task| task.name.matches_pattern(&self.pattern))
    }

    /// Resolve a task of a file previously passed to [`Orchestrator::load`]
    pub fn resolve(&self, task: &Task, scope: ScopeId, anchor_dir: &Path) -> ExecutionResult<ResolvedTask> {
        resolve_task_fields(task, &self.chain, scope, anchor_dir)
    }
}

/// Evaluate every templated field of `task`.
///
/// Environment entries resolve first, then the executable, then the remaining
/// arguments, then the working directory. The first field that fails aborts
/// the task.
pub fn resolve_task_fields(
    task: &Task,
    chain: &ScopeChain,
    scope: ScopeId,
    anchor_dir: &Path,
) -> ExecutionResult<ResolvedTask> {
    let resolve = |field: &str, raw: &str| resolve_field(task, field, raw, chain, scope, anchor_dir);

    let mut environment = BTreeMap::new();
    for (key, value) in &task.environment {
        environment.insert(key.clone(), resolve(&format!("Environment[{}]", key), value)?);
    }

    let (executable, rest) = task
        .command
        .split_first()
        .ok_or_else(|| ExecutionError::EmptyCommand(task.name.to_string()))?;
    let program = resolve("Command[0]", executable)?;

    let args = rest
        .iter()
        .enumerate()
        .map(|(i, arg)| resolve(&format!("Command[{}]", i + 1), arg))
        .collect::<ExecutionResult<Vec<_>>>()?;

    let cwd = match &task.cwd {
        Some(raw) => resolve("CWD", raw)?,
        None => String::new(),
    };
    let cwd = if cwd.is_empty() {
        anchor_dir.to_path_buf()
    } else {
        anchor_dir.join(cwd)
    };

    Ok(ResolvedTask {
        name: task.name.clone(),
        program,
        args,
        cwd,
        environment,
    })
}

/// Resolve one field. A malformed template falls back to the raw text.
fn resolve_field(
    task: &Task,
    field: &str,
    raw: &str,
    chain: &ScopeChain,
    scope: ScopeId,
    anchor_dir: &Path,
) -> ExecutionResult<String> {
    match resolve_string(raw, chain, scope, anchor_dir) {
        Ok(value) => Ok(value),
        Err(e) if e.is_syntax() => {
            tracing::warn!("{} of task '{}' used unresolved: {}", field, task.name, e);
            Ok(raw.to_string())
        }
        Err(source) => Err(ExecutionError::Field {
            task: task.name.to_string(),
            field: field.to_string(),
            source,
        }),
    }
}
