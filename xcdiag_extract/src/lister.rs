//! DerivedData enumeration.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use glob::Pattern;
use tracing::{debug, info, warn};
use xcdiag_core::{Error, ProjectRecord, Result};

pub const DEFAULT_LOG_EXTENSION: &str = "xcactivitylog";

/// The newest build log of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLog {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

/// `<project>/Logs/Build`
#[must_use]
pub fn build_log_dir(project_dir: &Path) -> PathBuf {
    project_dir.join("Logs").join("Build")
}

/// File-name pattern for build logs with the given extension.
///
/// # Errors
/// Returns [`Error::InvalidConfig`] for an empty extension.
pub fn log_pattern(log_extension: &str) -> Result<Pattern> {
    let extension = log_extension.trim_start_matches('.');
    if extension.is_empty() {
        return Err(Error::InvalidConfig("log extension is empty".to_string()));
    }
    Pattern::new(&format!("*.{}", Pattern::escape(extension)))
        .map_err(|e| Error::InvalidConfig(format!("log extension {log_extension:?}: {e}")))
}

/// Find the most recently modified build log of a project.
///
/// Ties on modification time are broken by file name so the choice is stable.
/// Returns `Ok(None)` when the project has no `Logs/Build` directory or no
/// matching file in it.
///
/// # Errors
/// Returns [`Error::Io`] if the log directory exists but cannot be listed.
pub fn latest_build_log(project_dir: &Path, pattern: &Pattern) -> Result<Option<BuildLog>> {
    let dir = build_log_dir(project_dir);
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut newest: Option<BuildLog> = None;
    for entry in std::fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().to_string();
        if !pattern.matches(&name) {
            continue;
        }
        let Some(modified) = modified_time(&entry.path()) else {
            continue;
        };
        if !entry.path().is_file() {
            continue;
        }

        let candidate = BuildLog {
            path: entry.path(),
            modified,
        };
        let replace = newest.as_ref().is_none_or(|current| {
            (candidate.modified, &candidate.path) > (current.modified, &current.path)
        });
        if replace {
            newest = Some(candidate);
        }
    }
    Ok(newest)
}

fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(time) => Some(to_utc(time)),
        Err(e) => {
            warn!("Cannot read modification time of {}: {e}", path.display());
            None
        }
    }
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Lists project directories below a DerivedData root.
#[derive(Debug, Clone)]
pub struct ProjectLister {
    root: PathBuf,
    pattern: Pattern,
}

impl ProjectLister {
    /// # Errors
    /// Returns [`Error::InvalidConfig`] if `log_extension` is unusable.
    pub fn new(root: impl Into<PathBuf>, log_extension: &str) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            pattern: log_pattern(log_extension)?,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// One record per project directory, most recently built first.
    ///
    /// A missing root yields an empty list. Hidden directories and Xcode's
    /// shared `*.noindex` caches are skipped.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the root exists but cannot be listed.
    pub fn list(&self) -> Result<Vec<ProjectRecord>> {
        if !self.root.is_dir() {
            info!(
                "DerivedData root {} does not exist, no projects",
                self.root.display()
            );
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(|e| Error::io(&self.root, e))? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {e}", self.root.display());
                    continue;
                }
            };
            let directory_name = entry.file_name().to_string_lossy().to_string();
            if directory_name.starts_with('.') || directory_name.ends_with(".noindex") {
                continue;
            }
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(record) = self.describe(&path, directory_name) {
                projects.push(record);
            }
        }

        projects.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| a.directory_name.cmp(&b.directory_name))
        });
        debug!("Found {} projects in {}", projects.len(), self.root.display());
        Ok(projects)
    }

    fn describe(&self, path: &Path, directory_name: String) -> Option<ProjectRecord> {
        let latest = latest_build_log(path, &self.pattern).unwrap_or_else(|e| {
            warn!("Cannot list build logs of {directory_name}: {e}");
            None
        });
        let last_modified = match &latest {
            Some(log) => log.modified,
            None => modified_time(path)?,
        };

        Some(ProjectRecord {
            name: ProjectRecord::name_from_directory(&directory_name),
            directory_name,
            directory_path: path.display().to_string(),
            has_build_logs: latest.is_some(),
            latest_log: latest.map(|log| log.path.display().to_string()),
            last_modified,
        })
    }
}
