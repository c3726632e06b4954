#![deny(
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
    clippy::missing_errors_doc
)]

pub mod diagnostic;
pub mod error;
pub mod project;
pub mod util;

pub use diagnostic::{
    DebugInfo, DiagnosticEntry, DiagnosticKind, DiagnosticNote, DiagnosticsReport,
};
pub use error::{Error, Result};
pub use project::ProjectRecord;
pub use util::fingerprint;
