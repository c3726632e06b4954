//! `get_project_diagnostics`: newest log of one project to a report.

use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use tracing::{debug, info, warn};
use xcdiag_core::{DiagnosticEntry, DiagnosticsReport, Error, Result};

use crate::dedup::dedup;
use crate::engine::{ExtractionConfig, ExtractionEngine};
use crate::lister::{BuildLog, ProjectLister, latest_build_log, log_pattern};
use crate::reader::read_log;

/// Extracts diagnostics from the build logs below one DerivedData root.
#[derive(Debug, Clone)]
pub struct DiagnosticExtractor {
    root: PathBuf,
    log_extension: String,
    pattern: Pattern,
    engine: ExtractionEngine,
    config: ExtractionConfig,
}

impl DiagnosticExtractor {
    /// # Errors
    /// Returns an error if an extra rule fails to compile or the log
    /// extension is unusable.
    pub fn new(
        root: impl Into<PathBuf>,
        log_extension: &str,
        config: ExtractionConfig,
    ) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            log_extension: log_extension.to_string(),
            pattern: log_pattern(log_extension)?,
            engine: ExtractionEngine::new(&config)?,
            config,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn engine(&self) -> &ExtractionEngine {
        &self.engine
    }

    #[must_use]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// A lister over the same root and log extension.
    ///
    /// # Errors
    /// Propagates [`ProjectLister::new`] errors.
    pub fn lister(&self) -> Result<ProjectLister> {
        ProjectLister::new(&self.root, &self.log_extension)
    }

    /// Extract diagnostics from the newest build log of `project_dir_name`.
    ///
    /// # Errors
    /// - [`Error::InvalidProject`] if the name is not a single path component
    /// - [`Error::ProjectNotFound`] / [`Error::NoBuildLogs`] if there is
    ///   nothing to read
    /// - [`Error::Io`] / [`Error::Decompress`] if the log cannot be decoded
    pub fn extract(
        &self,
        project_dir_name: &str,
        include_warnings: bool,
    ) -> Result<DiagnosticsReport> {
        validate_project_name(project_dir_name)?;

        let project_dir = self.root.join(project_dir_name);
        if !project_dir.is_dir() {
            return Err(Error::ProjectNotFound(project_dir_name.to_string()));
        }
        let BuildLog { path, modified } = latest_build_log(&project_dir, &self.pattern)?
            .ok_or_else(|| Error::NoBuildLogs(project_dir_name.to_string()))?;

        info!(
            "Extracting diagnostics for {project_dir_name} from {}",
            path.display()
        );
        let log = read_log(&path)?;
        if let Some(dump) = &self.config.raw_dump {
            match std::fs::write(dump, log.text()) {
                Ok(()) => debug!("Wrote decoded log to {}", dump.display()),
                Err(e) => warn!("Failed to write raw dump {}: {e}", dump.display()),
            }
        }

        let mut outcome = self.engine.scan(&log.lines);
        let (entries, collapsed) = dedup(std::mem::take(&mut outcome.entries));
        let (mut errors, mut warnings): (Vec<DiagnosticEntry>, Vec<DiagnosticEntry>) =
            entries.into_iter().partition(DiagnosticEntry::is_error);
        if !include_warnings {
            warnings.clear();
        }

        let error_count = errors.len();
        let warning_count = warnings.len();
        let errors_cut = cap(&mut errors, self.config.max_entries);
        let warnings_cut = cap(&mut warnings, self.config.max_entries);
        let truncated = errors_cut || warnings_cut;
        if truncated {
            warn!(
                "Diagnostics for {project_dir_name} truncated to {} per bucket ({error_count} errors, {warning_count} warnings)",
                self.config.max_entries
            );
        }

        info!(
            "{project_dir_name}: {error_count} errors, {warning_count} warnings, {collapsed} duplicates collapsed"
        );

        let debug_info = self.config.debug_info.then(|| {
            let mut debug = outcome.debug;
            debug.compressed = log.compressed;
            debug.duplicates_collapsed = collapsed;
            debug
        });

        Ok(DiagnosticsReport {
            success: true,
            project: project_dir_name.to_string(),
            log_file: path.display().to_string(),
            log_modified: modified,
            errors,
            warnings,
            error_count,
            warning_count,
            truncated,
            debug_info,
        })
    }
}

/// Truncate `bucket` to `max`; true when something was cut.
fn cap(bucket: &mut Vec<DiagnosticEntry>, max: usize) -> bool {
    if bucket.len() > max {
        bucket.truncate(max);
        true
    } else {
        false
    }
}

/// A project name must be exactly one normal path component.
fn validate_project_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(Error::InvalidProject(name.to_string())),
    }
}
