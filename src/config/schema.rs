//! Task file validation

use crate::config::types::{Task, TaskFile};
use crate::error::{ConfigError, ConfigResult};

/// Validate a parsed task file
pub fn validate_task_file(file: &TaskFile) -> ConfigResult<()> {
    for task in &file.tasks {
        validate_task(task).map_err(|message| ConfigError::Invalid {
            path: file.path.clone(),
            message,
        })?;
    }
    Ok(())
}

/// Validate a single task, describing the first problem found
fn validate_task(task: &Task) -> Result<(), String> {
    if task.name.segments().iter().any(String::is_empty) {
        return Err(format!("task name '{}' has an empty segment", task.name));
    }

    match task.command.first() {
        None => Err(format!("task '{}' has no Command", task.name)),
        Some(executable) if executable.trim().is_empty() => {
            Err(format!("task '{}' has an empty executable", task.name))
        }
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_task_file_str;
    use std::path::Path;

    fn parse(yaml: &str) -> ConfigResult<TaskFile> {
        parse_task_file_str(yaml, Path::new("/proj/t.arbor"))
    }

    #[test]
    fn test_valid_file() {
        let yaml = r#"
Tasks:
  - Name: a.b
    Command: [make, all]
  - Name: a.c
    Command: ['{{ var "tool" }}']
"#;
        assert!(parse(yaml).is_ok());
    }

    #[test]
    fn test_missing_command() {
        let err = parse("Tasks:\n  - Name: a\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref message, .. } if message.contains("no Command")));
    }

    #[test]
    fn test_empty_executable() {
        let err = parse("Tasks:\n  - Name: a\n    Command: ['', x]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_empty_name_segment() {
        assert!(parse("Tasks:\n  - Name: a..b\n    Command: [x]\n").is_err());
        assert!(parse("Tasks:\n  - Name: ''\n    Command: [x]\n").is_err());
    }
}
