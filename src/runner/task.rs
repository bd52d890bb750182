//! Task file execution
//!
//! Files are processed in walk order. Within a file the matching tasks run
//! one after another; the first task that fails to resolve or to run aborts
//! the rest of that file, and the next file starts fresh.

use crate::config::{TaskFile, TaskFileWalker};
use crate::error::Result;
use crate::name::TaskName;
use crate::runner::{execute_task, Context, Orchestrator};
use std::path::PathBuf;

/// Totals for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Task files visited
    pub files: usize,
    /// Tasks that ran and succeeded
    pub succeeded: usize,
    /// Files cut short by a failing task
    pub failed_files: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed_files == 0
    }
}

/// Runs the matching tasks of each task file it is given
pub struct Runner<'c> {
    ctx: &'c Context,
    orchestrator: Orchestrator,
    summary: RunSummary,
}

impl<'c> Runner<'c> {
    pub fn new(ctx: &'c Context) -> Self {
        Runner {
            ctx,
            orchestrator: Orchestrator::new(ctx.pattern.clone()),
            summary: RunSummary::default(),
        }
    }

    /// Load `file` into the scope chain and run its matching tasks
    pub fn run_file(&mut self, file: &TaskFile) {
        self.summary.files += 1;
        let scope = self.orchestrator.load(file);
        let tasks: Vec<_> = self.orchestrator.matching(file).collect();

        for (i, task) in tasks.iter().enumerate() {
            self.ctx.print_task_start(&task.name);

            let outcome = self
                .orchestrator
                .resolve(task, scope, file.anchor_dir())
                .and_then(|resolved| execute_task(&resolved));

            if let Err(e) = outcome {
                self.ctx.print_error(&e.to_string());
                self.ctx.print_file_aborted(&file.path, tasks.len() - i - 1);
                self.summary.failed_files += 1;
                return;
            }
            self.summary.succeeded += 1;
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}

/// Walk the tree and run every matching task
pub fn run_tasks(ctx: &Context, walker: &TaskFileWalker) -> Result<RunSummary> {
    let mut runner = Runner::new(ctx);
    walker.walk(|file| {
        runner.run_file(&file);
        Ok(())
    })?;
    Ok(runner.into_summary())
}

/// Walk the tree and collect every matching task with the file declaring it
pub fn find_tasks(ctx: &Context, walker: &TaskFileWalker) -> Result<Vec<(TaskName, PathBuf)>> {
    let mut found = Vec::new();
    walker.walk(|file| {
        found.extend(
            file.tasks
                .iter()
                .filter(|task| task.name.matches_pattern(&ctx.pattern))
                .map(|task| (task.name.clone(), file.path.clone())),
        );
        Ok(())
    })?;
    Ok(found)
}
