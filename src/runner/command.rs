//! Command execution
//!
//! This module launches the process for a resolved task.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::ResolvedTask;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

/// Build the process for a resolved task without starting it.
///
/// The child inherits the parent's environment, with the task's environment
/// entries added on top. On Windows, batch files run through `cmd /c`.
pub fn build_command(task: &ResolvedTask) -> StdCommand {
    let mut command = if is_batch_file(&task.program) {
        let mut command = StdCommand::new("cmd");
        command.arg("/c").arg(&task.program);
        command
    } else {
        StdCommand::new(&task.program)
    };

    command.args(&task.args);
    command.current_dir(&task.cwd);
    command.envs(&task.environment);

    // Set up stdio
    command.stdin(Stdio::inherit());
    command.stdout(Stdio::inherit());
    command.stderr(Stdio::inherit());

    command
}

/// Run a resolved task to completion
pub fn execute_task(task: &ResolvedTask) -> ExecutionResult<()> {
    tracing::debug!(
        "Running {} {:?} in {}",
        task.program,
        task.args,
        task.cwd.display()
    );

    let status = build_command(task)
        .status()
        .map_err(|source| ExecutionError::Spawn {
            program: task.program.clone(),
            source,
        })?;

    if !status.success() {
        return Err(ExecutionError::CommandFailed {
            task: task.name.to_string(),
            code: status.code(),
        });
    }

    Ok(())
}

fn is_batch_file(program: &str) -> bool {
    cfg!(windows)
        && Path::new(program)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("bat"))
}
