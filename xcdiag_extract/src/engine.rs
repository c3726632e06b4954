//! Pattern engine: turns decoded log lines into diagnostic entries.
//!
//! Each line is classified by the ordered [`RuleSet`]. A matching line opens a
//! block, and the lines that follow it (notes, the quoted source line, caret
//! markers, fix-it text) are folded into the same entry until something that
//! does not belong appears. Grouping is heuristic: Xcode does not document the
//! layout, so a block can occasionally swallow an unrelated indented line or
//! stop early.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xcdiag_core::{DebugInfo, DiagnosticEntry, DiagnosticNote, Result};

use crate::rules::{RuleDef, RuleMatch, RuleSet, clean_file};

/// Phrases that point at Swift concurrency problems, reported in debug info.
/// Matched case-insensitively.
pub const CONCURRENCY_TERMS: &[&str] = &[
    "concurrency-safe",
    "nonisolated global",
    "global shared",
    "Swift 6 language mode",
    "actor isolation",
    "thread safety",
    "Sendable",
];

static LOCATED_NOTE: OnceLock<Regex> = OnceLock::new();
static BARE_NOTE: OnceLock<Regex> = OnceLock::new();
static CARET: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn located_note() -> &'static Regex {
    LOCATED_NOTE.get_or_init(|| {
        Regex::new(r"(?P<file>[^:\n]+):(?P<line>\d+)(?::(?P<col>\d+))?: note: (?P<msg>.+)$")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn bare_note() -> &'static Regex {
    BARE_NOTE.get_or_init(|| {
        Regex::new(r"^\s*note: (?P<msg>.+)$")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Caret and range markers: `^`, `~~~~ ^~~~`.
#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn caret() -> &'static Regex {
    CARET.get_or_init(|| {
        Regex::new(r"^\s*[\^~][\^~\s]*$")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Configuration for the extraction engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Maximum entries returned per bucket (errors, warnings).
    #[serde(default = "ExtractionConfig::default_max_entries")]
    pub max_entries: usize,

    /// Maximum lines folded into one diagnostic block after its headline.
    #[serde(default = "ExtractionConfig::default_max_context_lines")]
    pub max_context_lines: usize,

    /// Attach [`DebugInfo`] to reports.
    #[serde(default = "ExtractionConfig::default_debug_info")]
    pub debug_info: bool,

    /// Maximum lines of surrounding log kept for concurrency terms.
    #[serde(default = "ExtractionConfig::default_concurrency_context_lines")]
    pub concurrency_context_lines: usize,

    /// Rules tried before the built-in set.
    #[serde(default)]
    pub extra_rules: Vec<RuleDef>,

    /// Write the decoded log text here on every extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_dump: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_entries: Self::default_max_entries(),
            max_context_lines: Self::default_max_context_lines(),
            debug_info: Self::default_debug_info(),
            concurrency_context_lines: Self::default_concurrency_context_lines(),
            extra_rules: Vec::new(),
            raw_dump: None,
        }
    }
}

impl ExtractionConfig {
    const fn default_max_entries() -> usize {
        500
    }

    const fn default_max_context_lines() -> usize {
        12
    }

    const fn default_debug_info() -> bool {
        true
    }

    const fn default_concurrency_context_lines() -> usize {
        20
    }
}

/// Entries in log order plus scan statistics.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub entries: Vec<DiagnosticEntry>,
    pub debug: DebugInfo,
}

/// Where a caret or fix-it line should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Entry,
    Note(usize),
}

/// Extraction engine for classifying build-log lines.
#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    rules: RuleSet,
    max_context_lines: usize,
    concurrency_context_lines: usize,
}

impl ExtractionEngine {
    /// Create an engine from configuration.
    ///
    /// # Errors
    /// Returns an error if a configured extra rule fails to compile.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let rules = if config.extra_rules.is_empty() {
            RuleSet::defaults().clone()
        } else {
            RuleSet::with_extra(&config.extra_rules)?
        };
        Ok(Self {
            rules,
            max_context_lines: config.max_context_lines,
            concurrency_context_lines: config.concurrency_context_lines,
        })
    }

    /// Create an engine with the built-in rules and default limits.
    #[must_use]
    pub fn with_defaults() -> Self {
        let config = ExtractionConfig::default();
        Self {
            rules: RuleSet::defaults().clone(),
            max_context_lines: config.max_context_lines,
            concurrency_context_lines: config.concurrency_context_lines,
        }
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Scan lines top to bottom.
    #[must_use]
    pub fn scan<S: AsRef<str>>(&self, lines: &[S]) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        outcome.debug.lines_scanned = lines.len();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i].as_ref();
            if let Some(hit) = self.rules.classify(line) {
                *outcome
                    .debug
                    .rule_hits
                    .entry(hit.rule.name.clone())
                    .or_default() += 1;
                debug!("Rule '{}' matched: {line}", hit.rule.name);

                let mut entry = Self::entry_from(&hit);
                i = self.consume_block(lines, i + 1, line, &mut entry);
                outcome.entries.push(entry);
            } else {
                if let Some(note) = parse_note(line) {
                    Self::attach_stray_note(note, &mut outcome);
                }
                i += 1;
            }
        }

        let (terms, context) = self.concurrency_context(lines);
        outcome.debug.concurrency_terms_found = terms;
        outcome.debug.concurrency_context = context;
        outcome
    }

    fn entry_from(hit: &RuleMatch<'_>) -> DiagnosticEntry {
        DiagnosticEntry::new(
            hit.rule.kind,
            hit.rule.category.clone(),
            hit.rule.name.clone(),
            hit.file.clone(),
            hit.line,
            hit.message.clone(),
        )
        .with_column(hit.column)
    }

    /// Fold the lines following a headline into `entry`; returns the index of
    /// the first line that does not belong to the block.
    fn consume_block<S: AsRef<str>>(
        &self,
        lines: &[S],
        start: usize,
        headline: &str,
        entry: &mut DiagnosticEntry,
    ) -> usize {
        let limit = lines.len().min(start + self.max_context_lines);
        let mut context = vec![headline.to_string()];
        let mut target = Target::Entry;
        let mut j = start;

        while j < limit {
            let line = lines[j].as_ref();
            if line.trim().is_empty() {
                break;
            }

            if let Some(note) = parse_note(line) {
                entry.notes.push(note);
                target = Target::Note(entry.notes.len() - 1);
            } else if self.rules.matches_any(line) {
                break;
            } else if is_caret(line) {
                let caret = line.trim_end().to_string();
                context.push(caret.clone());

                let fix = lines
                    .get(j + 1)
                    .map(AsRef::as_ref)
                    .filter(|next| j + 1 < limit && is_fixit(next, &self.rules))
                    .map(|next| next.trim().to_string());

                match target {
                    Target::Note(idx) => {
                        let note = &mut entry.notes[idx];
                        note.caret.get_or_insert(caret);
                        if let Some(fix) = fix.clone() {
                            note.suggested_fix = Some(fix);
                        }
                    }
                    Target::Entry => {
                        if let Some(fix) = fix.clone() {
                            entry.notes.push(DiagnosticNote {
                                message: "fix-it suggestion".to_string(),
                                file: entry.file.clone(),
                                line: entry.line,
                                column: entry.column,
                                caret: Some(caret.clone()),
                                suggested_fix: Some(fix),
                            });
                        }
                        entry.caret.get_or_insert(caret);
                    }
                }

                if fix.is_some() {
                    j += 1;
                    context.push(lines[j].as_ref().trim_end().to_string());
                }
                j += 1;
                continue;
            } else if is_indented(line) {
                if target == Target::Entry && entry.code.is_none() {
                    entry.code = Some(line.trim_end().to_string());
                }
            } else {
                break;
            }

            context.push(line.trim_end().to_string());
            j += 1;
        }

        if context.len() > 1 {
            entry.raw_context = Some(context.join("\n"));
        }
        j
    }

    /// A note outside any block attaches to the latest entry for its file.
    fn attach_stray_note(note: DiagnosticNote, outcome: &mut ScanOutcome) {
        let parent = note.file.as_ref().and_then(|file| {
            outcome
                .entries
                .iter_mut()
                .rev()
                .find(|e| e.file.as_ref() == Some(file))
        });
        if let Some(parent) = parent {
            parent.notes.push(note);
        } else {
            debug!("Dropping orphan note: {}", note.message);
            outcome.debug.orphan_notes += 1;
        }
    }

    fn concurrency_context<S: AsRef<str>>(&self, lines: &[S]) -> (Vec<String>, Vec<String>) {
        let mut found = BTreeSet::new();
        let mut indices = BTreeSet::new();

        for (idx, line) in lines.iter().enumerate() {
            let lowered = line.as_ref().to_lowercase();
            let mut hit = false;
            for term in CONCURRENCY_TERMS {
                if lowered.contains(&term.to_lowercase()) {
                    found.insert(*term);
                    hit = true;
                }
            }
            if hit {
                let from = idx.saturating_sub(2);
                let to = (idx + 2).min(lines.len() - 1);
                indices.extend(from..=to);
            }
        }

        // Keep the declaration order of the terms, not alphabetical.
        let terms = CONCURRENCY_TERMS
            .iter()
            .filter(|t| found.contains(*t))
            .map(|t| (*t).to_string())
            .collect();
        let context = indices
            .into_iter()
            .take(self.concurrency_context_lines)
            .map(|idx| lines[idx].as_ref().to_string())
            .collect();
        (terms, context)
    }
}

/// Parse a `file:line[:col]: note:` or bare `note:` line.
fn parse_note(line: &str) -> Option<DiagnosticNote> {
    if let Some(caps) = located_note().captures(line) {
        return Some(DiagnosticNote {
            message: caps.name("msg")?.as_str().trim().to_string(),
            file: caps.name("file").and_then(|m| clean_file(m.as_str())),
            line: caps.name("line").and_then(|m| m.as_str().parse().ok()),
            column: caps.name("col").and_then(|m| m.as_str().parse().ok()),
            ..DiagnosticNote::default()
        });
    }
    let caps = bare_note().captures(line)?;
    Some(DiagnosticNote {
        message: caps.name("msg")?.as_str().trim().to_string(),
        ..DiagnosticNote::default()
    })
}

fn is_caret(line: &str) -> bool {
    caret().is_match(line)
}

fn is_indented(line: &str) -> bool {
    line.starts_with([' ', '\t']) && !line.trim().is_empty()
}

/// Indented text right after a caret line is a fix-it replacement.
fn is_fixit(line: &str, rules: &RuleSet) -> bool {
    is_indented(line) && !is_caret(line) && parse_note(line).is_none() && !rules.matches_any(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcdiag_core::DiagnosticKind;

    const SAMPLE: &str = r#"
SwiftCompile normal arm64 /Users/developer/MyProject/Sources/App/AppDelegate.swift
    cd /Users/developer/MyProject

/Users/developer/MyProject/Sources/App/AppDelegate.swift:25:18: error: use of unresolved identifier 'AppConfiguration'
        let config = AppConfiguration()
                     ^~~~~~~~~~~~~~~~
/Users/developer/MyProject/Sources/App/AppDelegate.swift:25:18: note: did you mean 'URLSessionConfiguration'?
        let config = AppConfiguration()
                     ^~~~~~~~~~~~~~~~
                     URLSessionConfiguration
/Users/developer/MyProject/Sources/App/ViewController.swift:42:10: warning: result of call to 'loadView()' is unused
        self.loadView()
        ^~~~~~~~~~~~
/Users/developer/MyProject/Sources/App/ViewController.swift:53:14: error: value of type 'UIView' has no member 'setText'
        myView.setText("Hello World")
        ~~~~~~ ^~~~~~~
/Users/developer/MyProject/Sources/Services/NetworkManager.swift:112:40: warning: initialization of immutable value 'response' was never used
        let data = responseData, let response = httpResponse {
                                       ^~~~~~~~
"#;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn scans_errors_and_warnings_with_context() {
        let outcome = ExtractionEngine::with_defaults().scan(&lines(SAMPLE));
        let errors: Vec<_> = outcome.entries.iter().filter(|e| e.is_error()).collect();
        let warnings: Vec<_> = outcome.entries.iter().filter(|e| !e.is_error()).collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(warnings.len(), 2);

        let first = errors[0];
        assert_eq!(first.line, Some(25));
        assert_eq!(first.column, Some(18));
        assert_eq!(first.code.as_deref(), Some("        let config = AppConfiguration()"));
        assert_eq!(first.caret.as_deref(), Some("                     ^~~~~~~~~~~~~~~~"));
        assert_eq!(first.notes.len(), 1);
        assert_eq!(
            first.notes[0].suggested_fix.as_deref(),
            Some("URLSessionConfiguration")
        );
        assert!(
            first
                .raw_context
                .as_deref()
                .is_some_and(|c| c.contains("did you mean"))
        );
    }

    #[test]
    fn rule_hits_are_counted() {
        let outcome = ExtractionEngine::with_defaults().scan(&lines(SAMPLE));
        assert_eq!(outcome.debug.rule_hits.get("located_error"), Some(&2));
        assert_eq!(outcome.debug.rule_hits.get("located_warning"), Some(&2));
        assert_eq!(outcome.debug.lines_scanned, lines(SAMPLE).len());
    }

    #[test]
    fn block_stops_at_unindented_text() {
        let text = "/a/A.swift:1:1: error: first\n    code\nCompileSwift normal\n    unrelated";
        let outcome = ExtractionEngine::with_defaults().scan(&lines(text));
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(
            outcome.entries[0].raw_context.as_deref(),
            Some("/a/A.swift:1:1: error: first\n    code")
        );
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn block_is_capped() {
        let mut text = String::from("/a/A.swift:1:1: error: first\n");
        for _ in 0..50 {
            text.push_str("    filler\n");
        }
        text.push_str("/a/A.swift:9:1: error: second\n");
        let config = ExtractionConfig {
            max_context_lines: 3,
            ..ExtractionConfig::default()
        };
        let engine = ExtractionEngine::new(&config).expect("default rules compile");
        let outcome = engine.scan(&lines(&text));
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(
            outcome.entries[0].raw_context.as_deref().map(|c| c.lines().count()),
            Some(4)
        );
    }

    #[test]
    fn stray_note_attaches_to_same_file_or_is_orphaned() {
        let text = "/a/A.swift:1:1: error: first\n\n/a/A.swift:5:1: note: declared here\n/b/B.swift:2:2: note: nobody owns me";
        let outcome = ExtractionEngine::with_defaults().scan(&lines(text));
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].notes.len(), 1);
        assert_eq!(outcome.entries[0].notes[0].line, Some(5));
        assert_eq!(outcome.debug.orphan_notes, 1);
    }

    #[test]
    fn concurrency_context_is_collected() {
        let text = "noise\n/s/S.swift:3:12: warning: var 'x' is not concurrency-safe because it is nonisolated global shared mutable state\nmore";
        let outcome = ExtractionEngine::with_defaults().scan(&lines(text));
        assert_eq!(outcome.entries[0].kind, DiagnosticKind::Warning);
        assert_eq!(outcome.entries[0].category, "concurrency-isolation");
        assert_eq!(
            outcome.debug.concurrency_terms_found,
            vec!["concurrency-safe", "nonisolated global", "global shared"]
        );
        assert_eq!(outcome.debug.concurrency_context.len(), 3);
    }

    #[test]
    fn concurrency_terms_ignore_case() {
        let text = "/s/S.swift:9:4: warning: capture of 'model' with non-sendable type in a @Sendable closure\nswift 6 LANGUAGE MODE";
        let outcome = ExtractionEngine::with_defaults().scan(&lines(text));
        assert_eq!(
            outcome.debug.concurrency_terms_found,
            vec!["Swift 6 language mode", "Sendable"]
        );
        assert_eq!(outcome.debug.concurrency_context.len(), 2);
    }

    #[test]
    fn duplicates_are_kept_by_the_scanner() {
        let text = "/a/A.swift:1:1: warning: same\n/a/A.swift:1:1: warning: same";
        let outcome = ExtractionEngine::with_defaults().scan(&lines(text));
        assert_eq!(outcome.entries.len(), 2);
    }
}
