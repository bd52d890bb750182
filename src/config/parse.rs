//! Task file parsing

use crate::config::schema::validate_task_file;
use crate::config::types::TaskFile;
use crate::error::{ConfigError, ConfigResult};
use std::fs;
use std::path::Path;

/// Extension that marks a file as a task file
pub const TASK_FILE_EXTENSION: &str = "arbor";

/// Whether `path` names a task file
pub fn is_task_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == TASK_FILE_EXTENSION)
}

/// Read, parse and validate a task file
pub fn parse_task_file(path: &Path) -> ConfigResult<TaskFile> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_task_file_str(&contents, path)
}

/// Parse and validate task file contents that came from `path`
pub fn parse_task_file_str(yaml: &str, path: &Path) -> ConfigResult<TaskFile> {
    // An empty document declares nothing
    let mut file: TaskFile = if yaml.trim().is_empty() {
        TaskFile::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };

    file.path = path.to_path_buf();
    validate_task_file(&file)?;

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_simple_file() {
        let yaml = r#"
Tasks:
  - Name: hello
    Command: [echo, hello]
"#;
        let file = parse_task_file_str(yaml, Path::new("/proj/a.arbor")).unwrap();
        assert_eq!(file.tasks.len(), 1);
        assert_eq!(file.path, Path::new("/proj/a.arbor"));
    }

    #[test]
    fn test_parse_empty_file() {
        let file = parse_task_file_str("\n", Path::new("/proj/a.arbor")).unwrap();
        assert!(file.tasks.is_empty());
        assert!(file.variables.is_empty());
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = parse_task_file_str("Tasks: [", Path::new("/proj/bad.arbor")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("/proj/bad.arbor"));
    }

    #[test]
    fn test_parse_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("build.arbor");
        fs::write(
            &path,
            "Variables:\n  a: '1'\nTasks:\n  - Name: x\n    Command: ['true']\n",
        )
        .unwrap();

        let file = parse_task_file(&path).unwrap();
        assert_eq!(file.variables.get("a").unwrap(), "1");
        assert_eq!(file.anchor_dir(), temp_dir.path());
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = parse_task_file(&temp_dir.path().join("nope.arbor")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_is_task_file() {
        assert!(is_task_file(Path::new("/proj/build.arbor")));
        assert!(!is_task_file(Path::new("/proj/build.yml")));
        assert!(!is_task_file(Path::new("/proj/arbor")));
    }
}
