//! Ordered pattern rules for classifying build-log lines.
//!
//! Rules are evaluated top to bottom and the first match wins, so specific
//! shapes (a named concurrency warning) must come before the generic
//! `file:line:col: warning:` fallback. Extra rules can be supplied through
//! configuration and are tried before the defaults.
//!
//! Every rule regex must define a `msg` group. `file`, `line` and `col` are
//! optional named groups.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::error;
use xcdiag_core::{DiagnosticKind, Error, Result};

/// Location prefix with a column: `/path/File.swift:12:5:`.
const LOC_COL: &str = r"(?P<file>[^:\n]+):(?P<line>\d+):(?P<col>\d+):";

/// Location prefix without a column: `/path/File.m:12:`.
const LOC_LINE: &str = r"(?P<file>[^:\n]+):(?P<line>\d+):";

/// Optional location, with or without a column, ahead of `warning:`.
const WARNING_LEAD: &str =
    r"(?:(?P<file>[^:\n]+):(?P<line>\d+):(?:(?P<col>\d+):)? |^\s*)warning: ";

/// Serializable definition of a pattern rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleDef {
    /// Unique identifier, reported in `rule_hits`.
    pub name: String,

    /// Regex with a `msg` group and optional `file`/`line`/`col` groups.
    pub pattern: String,

    /// `error` or `warning`.
    pub kind: String,

    pub category: String,
}

impl RuleDef {
    fn new(name: &str, pattern: String, kind: DiagnosticKind, category: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern,
            kind: kind.as_str().to_string(),
            category: category.to_string(),
        }
    }

    /// Compile into a [`PatternRule`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidRule`] if the regex does not compile, lacks a
    /// `msg` group, or the kind is neither `error` nor `warning`.
    pub fn build(&self) -> Result<PatternRule> {
        let invalid = |reason: String| Error::InvalidRule {
            name: self.name.clone(),
            reason,
        };

        let regex = Regex::new(&self.pattern).map_err(|e| invalid(e.to_string()))?;
        if !regex.capture_names().flatten().any(|n| n == "msg") {
            return Err(invalid("pattern has no 'msg' capture group".to_string()));
        }
        let kind = self
            .kind
            .parse::<DiagnosticKind>()
            .map_err(|e| invalid(format!("{e}: {}", self.kind)))?;

        Ok(PatternRule {
            name: self.name.clone(),
            regex,
            kind,
            category: self.category.clone(),
        })
    }
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: String,
    pub regex: Regex,
    pub kind: DiagnosticKind,
    pub category: String,
}

/// Fields captured from a matching line.
#[derive(Debug, Clone)]
pub struct RuleMatch<'r> {
    pub rule: &'r PatternRule,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
}

impl PatternRule {
    /// Match `line` against this rule.
    #[must_use]
    pub fn apply<'r>(&'r self, line: &str) -> Option<RuleMatch<'r>> {
        let caps = self.regex.captures(line)?;
        let message = caps.name("msg")?.as_str().trim();
        if message.is_empty() {
            return None;
        }
        Some(RuleMatch {
            rule: self,
            file: caps.name("file").and_then(|m| clean_file(m.as_str())),
            line: parse_number(&caps, "line"),
            column: parse_number(&caps, "col"),
            message: message.to_string(),
        })
    }
}

fn parse_number(caps: &Captures<'_>, group: &str) -> Option<u32> {
    caps.name(group).and_then(|m| m.as_str().parse().ok())
}

/// Trim a captured path and drop an SLF string-length prefix (`123"`).
#[must_use]
pub fn clean_file(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let cleaned = trimmed
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .strip_prefix('"')
        .unwrap_or(trimmed)
        .trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// An ordered list of compiled rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<PatternRule>,
}

impl RuleSet {
    /// Compile rule definitions, preserving their order.
    ///
    /// # Errors
    /// Returns the first [`Error::InvalidRule`] encountered.
    pub fn from_defs(defs: &[RuleDef]) -> Result<Self> {
        let rules = defs.iter().map(RuleDef::build).collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// The process-wide default rule set.
    #[must_use]
    pub fn defaults() -> &'static Self {
        &DEFAULT_RULES
    }

    /// Custom rules first, then the defaults.
    ///
    /// # Errors
    /// Returns an error if any custom rule fails to compile.
    pub fn with_extra(extra: &[RuleDef]) -> Result<Self> {
        let mut set = Self::from_defs(extra)?;
        set.rules.extend(DEFAULT_RULES.rules.iter().cloned());
        Ok(set)
    }

    /// First matching rule for `line`.
    #[must_use]
    pub fn classify<'r>(&'r self, line: &str) -> Option<RuleMatch<'r>> {
        self.rules.iter().find_map(|rule| rule.apply(line))
    }

    #[must_use]
    pub fn matches_any(&self, line: &str) -> bool {
        self.rules.iter().any(|rule| rule.regex.is_match(line))
    }

    #[must_use]
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

static DEFAULT_RULES: Lazy<RuleSet> = Lazy::new(|| {
    let rules = default_rule_defs()
        .iter()
        .filter_map(|def| {
            def.build()
                .map_err(|e| error!("Dropping built-in rule: {e}"))
                .ok()
        })
        .collect();
    RuleSet { rules }
});

/// Built-in rules, most specific first.
#[must_use]
pub fn default_rule_defs() -> Vec<RuleDef> {
    vec![
        RuleDef::new(
            "duplicate_getter",
            r"(?P<file>[^:\n]+\.swift):(?P<line>\d+):(?P<col>\d+): error: (?P<msg>variable already has a getter.*)$".to_string(),
            DiagnosticKind::Error,
            "duplicate-accessor",
        ),
        RuleDef::new(
            "concurrency_isolation",
            format!(r"{WARNING_LEAD}(?P<msg>.*(?:concurrency-safe|global shared|Swift 6|nonisolated).*)$"),
            DiagnosticKind::Warning,
            "concurrency-isolation",
        ),
        RuleDef::new(
            "concurrency",
            format!(r"{WARNING_LEAD}(?P<msg>.*(?i:concurrency|thread safety|isolat|\bactor\b|mainactor|sendable).*)$"),
            DiagnosticKind::Warning,
            "concurrency",
        ),
        RuleDef::new(
            "located_error",
            format!(r"{LOC_COL} (?:fatal )?error: (?P<msg>.+)$"),
            DiagnosticKind::Error,
            "compiler",
        ),
        RuleDef::new(
            "located_warning",
            format!(r"{LOC_COL} warning: (?P<msg>.+)$"),
            DiagnosticKind::Warning,
            "compiler",
        ),
        RuleDef::new(
            "line_error",
            format!(r"{LOC_LINE} (?:fatal )?error: (?P<msg>.+)$"),
            DiagnosticKind::Error,
            "compiler",
        ),
        RuleDef::new(
            "line_warning",
            format!(r"{LOC_LINE} warning: (?P<msg>.+)$"),
            DiagnosticKind::Warning,
            "compiler",
        ),
        RuleDef::new(
            "build_error",
            r"^\s*error: (?P<msg>.+)$".to_string(),
            DiagnosticKind::Error,
            "build-system",
        ),
        RuleDef::new(
            "build_warning",
            r"^\s*warning: (?P<msg>.+)$".to_string(),
            DiagnosticKind::Warning,
            "build-system",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_default_rules_compile() {
        assert_eq!(RuleSet::defaults().len(), default_rule_defs().len());
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn located_error_captures_location() {
        let hit = RuleSet::defaults()
            .classify("/Users/dev/App/Bar.swift:42:17: error: cannot find type 'Foo' in scope")
            .expect("line should match");
        assert_eq!(hit.rule.name, "located_error");
        assert_eq!(hit.rule.kind, DiagnosticKind::Error);
        assert_eq!(hit.file.as_deref(), Some("/Users/dev/App/Bar.swift"));
        assert_eq!(hit.line, Some(42));
        assert_eq!(hit.column, Some(17));
        assert_eq!(hit.message, "cannot find type 'Foo' in scope");
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn specific_concurrency_rule_wins_over_fallback() {
        let hit = RuleSet::defaults()
            .classify("/src/State.swift:3:12: warning: var 'counter' is not concurrency-safe because it is nonisolated global shared mutable state")
            .expect("line should match");
        assert_eq!(hit.rule.name, "concurrency_isolation");
        assert_eq!(hit.rule.category, "concurrency-isolation");
        assert_eq!(hit.rule.kind, DiagnosticKind::Warning);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn concurrency_isolation_matches_every_warning_form() {
        let message = "var 'counter' is not concurrency-safe because it is nonisolated global shared mutable state";
        let cases = [
            (format!("/src/State.swift:3:12: warning: {message}"), Some(3), Some(12)),
            (format!("/src/State.swift:3: warning: {message}"), Some(3), None),
            (format!("warning: {message}"), None, None),
        ];
        for (line, expected_line, expected_col) in cases {
            let hit = RuleSet::defaults().classify(&line).expect("line should match");
            assert_eq!(hit.rule.name, "concurrency_isolation", "{line}");
            assert_eq!(hit.rule.category, "concurrency-isolation");
            assert_eq!(hit.line, expected_line);
            assert_eq!(hit.column, expected_col);
            assert_eq!(hit.message, message);
        }
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn concurrency_rule_matches_line_only_and_bare_warnings() {
        for line in [
            "/src/Model.m:8: warning: capture of 'self' with non-sendable type",
            "warning: main actor-isolated property cannot be referenced",
        ] {
            let hit = RuleSet::defaults().classify(line).expect("line should match");
            assert_eq!(hit.rule.name, "concurrency", "{line}");
            assert_eq!(hit.rule.kind, DiagnosticKind::Warning);
        }
        let plain = RuleSet::defaults()
            .classify("warning: unused variable 'x'")
            .expect("line should match");
        assert_eq!(plain.rule.name, "build_warning");
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn generic_concurrency_rule() {
        let hit = RuleSet::defaults()
            .classify("/src/Model.swift:8:5: warning: capture of 'self' with non-sendable type 'Model' in a `@Sendable` closure")
            .expect("line should match");
        assert_eq!(hit.rule.name, "concurrency");
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn plain_warning_is_not_concurrency() {
        let hit = RuleSet::defaults()
            .classify("/src/View.swift:42:10: warning: result of call to 'loadView()' is unused")
            .expect("line should match");
        assert_eq!(hit.rule.name, "located_warning");
        assert_eq!(hit.rule.category, "compiler");
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn line_only_and_bare_forms() {
        let set = RuleSet::defaults();
        let hit = set
            .classify("/src/legacy.m:10: error: expected ';' after expression")
            .expect("line should match");
        assert_eq!(hit.rule.name, "line_error");
        assert_eq!(hit.column, None);

        let hit = set
            .classify("error: Multiple commands produce '/build/App.app/Info.plist'")
            .expect("line should match");
        assert_eq!(hit.rule.name, "build_error");
        assert_eq!(hit.file, None);
        assert_eq!(hit.line, None);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn slf_prefix_is_stripped() {
        let hit = RuleSet::defaults()
            .classify("187\"/Users/dev/App/A.swift:1:2: error: boom")
            .expect("line should match");
        assert_eq!(hit.file.as_deref(), Some("/Users/dev/App/A.swift"));
    }

    #[test]
    fn noise_is_unmatched() {
        let set = RuleSet::defaults();
        assert!(set.classify("SwiftCompile normal arm64 /Users/dev/App/A.swift").is_none());
        assert!(set.classify("    let config = AppConfiguration()").is_none());
        assert!(!set.matches_any("Build succeeded"));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn extra_rules_take_priority() {
        let extra = [RuleDef {
            name: "linker".to_string(),
            pattern: r"^ld: (?P<msg>.+)$".to_string(),
            kind: "error".to_string(),
            category: "linker".to_string(),
        }];
        let set = RuleSet::with_extra(&extra).expect("extra rules should compile");
        assert_eq!(set.len(), default_rule_defs().len() + 1);
        let hit = set
            .classify("ld: library not found for -lPods")
            .expect("line should match");
        assert_eq!(hit.rule.name, "linker");
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let no_msg = RuleDef {
            name: "bad".to_string(),
            pattern: r"^oops$".to_string(),
            kind: "error".to_string(),
            category: "x".to_string(),
        };
        assert!(matches!(no_msg.build(), Err(Error::InvalidRule { .. })));

        let bad_kind = RuleDef {
            kind: "note".to_string(),
            pattern: r"(?P<msg>.+)".to_string(),
            ..no_msg.clone()
        };
        assert!(bad_kind.build().is_err());

        let bad_regex = RuleDef {
            pattern: r"(?P<msg>[".to_string(),
            ..no_msg
        };
        assert!(bad_regex.build().is_err());
    }
}
