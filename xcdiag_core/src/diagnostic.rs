//! Diagnostic records produced by a single extraction pass.
//!
//! Entries are created by the pattern engine, deduplicated by fingerprint and
//! handed to the caller. Nothing here is persisted.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity bucket of a diagnostic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Error,
    Warning,
}

impl DiagnosticKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagnosticKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            _ => Err("unknown diagnostic kind"),
        }
    }
}

/// A `note:` line or fix-it suggestion attached to its parent diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DiagnosticNote {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    /// Caret/range marker printed under the source line (`^~~~`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caret: Option<String>,
    /// Replacement text the compiler offers as a fix-it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

/// A single error or warning recognised in a build log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub kind: DiagnosticKind,

    /// Category of the rule that classified this entry (e.g. `compiler`).
    pub category: String,

    /// Name of the rule that fired.
    pub rule: String,

    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,

    /// First source line printed under the diagnostic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub caret: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<DiagnosticNote>,

    /// The grouped block (headline plus context lines) as it appeared in the log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_context: Option<String>,

    /// SHA-256 of `(kind, file, line, message)`; the deduplication key.
    pub fingerprint: String,
}

impl DiagnosticEntry {
    #[must_use]
    pub fn new(
        kind: DiagnosticKind,
        category: impl Into<String>,
        rule: impl Into<String>,
        file: Option<String>,
        line: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let fingerprint = crate::fingerprint(kind.as_str(), file.as_deref(), line, &message);
        Self {
            kind,
            category: category.into(),
            rule: rule.into(),
            file,
            line,
            column: None,
            message,
            code: None,
            caret: None,
            notes: Vec::new(),
            raw_context: None,
            fingerprint,
        }
    }

    #[must_use]
    pub const fn with_column(mut self, column: Option<u32>) -> Self {
        self.column = column;
        self
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Error)
    }
}

/// Observability data about one extraction pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DebugInfo {
    pub compressed: bool,
    pub lines_scanned: usize,
    /// Hit count per rule name, sorted by name.
    pub rule_hits: BTreeMap<String, usize>,
    pub duplicates_collapsed: usize,
    pub orphan_notes: usize,
    pub concurrency_terms_found: Vec<String>,
    pub concurrency_context: Vec<String>,
}

/// Result of `get_project_diagnostics`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticsReport {
    pub success: bool,
    pub project: String,
    pub log_file: String,
    pub log_modified: DateTime<Utc>,
    pub errors: Vec<DiagnosticEntry>,
    pub warnings: Vec<DiagnosticEntry>,
    pub error_count: usize,
    pub warning_count: usize,
    /// Set when either bucket was cut at the configured maximum.
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}
