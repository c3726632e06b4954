#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

pub mod dedup;
pub mod engine;
pub mod extractor;
pub mod lister;
pub mod reader;
pub mod rules;

pub use dedup::dedup;
pub use engine::{CONCURRENCY_TERMS, ExtractionConfig, ExtractionEngine, ScanOutcome};
pub use extractor::DiagnosticExtractor;
pub use lister::{BuildLog, DEFAULT_LOG_EXTENSION, ProjectLister, latest_build_log};
pub use reader::{LogText, read_log};
pub use rules::{PatternRule, RuleDef, RuleMatch, RuleSet, default_rule_defs};
