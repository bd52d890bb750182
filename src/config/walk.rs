//! Task file discovery
//!
//! The walk is depth-first. Inside each directory the task files are visited
//! first, sorted by name, then the subdirectories, also sorted. A directory's
//! own task files are therefore always seen before anything beneath it.

use crate::config::parse::{is_task_file, parse_task_file};
use crate::config::types::TaskFile;
use crate::error::{ArborError, ConfigError, ConfigResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walks a directory tree and yields parsed task files
#[derive(Debug)]
pub struct TaskFileWalker {
    root: PathBuf,
    exclude: GlobSet,
}

impl TaskFileWalker {
    /// Create a walker rooted at `root`, which must be a directory
    pub fn new(root: impl Into<PathBuf>) -> ConfigResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ConfigError::RootNotFound(root));
        }
        Ok(TaskFileWalker {
            root,
            exclude: GlobSet::empty(),
        })
    }

    /// Skip directories whose root-relative path matches any of `patterns`
    pub fn with_excludes<I, S>(mut self, patterns: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        self.exclude = builder.build()?;
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Visit every task file in walk order.
    ///
    /// Files that fail to read, parse or validate are logged and skipped. An
    /// error returned by `visit` stops the walk.
    pub fn walk<F>(&self, mut visit: F) -> Result<(), ArborError>
    where
        F: FnMut(TaskFile) -> Result<(), ArborError>,
    {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by(|a, b| {
                let a_dir = a.file_type().is_dir();
                let b_dir = b.file_type().is_dir();
                a_dir
                    .cmp(&b_dir)
                    .then_with(|| a.file_name().cmp(b.file_name()))
            })
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !e.file_type().is_dir() || !self.is_excluded(e.path())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error walking {}: {}", self.root.display(), e);
                    continue;
                }
            };

            // Symlinks report their own type and are never task files
            if !entry.file_type().is_file() || !is_task_file(entry.path()) {
                continue;
            }

            match parse_task_file(entry.path()) {
                Ok(file) => visit(file)?,
                Err(e) => tracing::warn!("Skipping task file: {}", e),
            }
        }

        Ok(())
    }

    fn is_excluded(&self, dir: &Path) -> bool {
        let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
        let excluded = self.exclude.is_match(relative);
        if excluded {
            tracing::debug!("Excluded directory {}", dir.display());
        }
        excluded
    }
}
