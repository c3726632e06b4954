//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use std::path::PathBuf;
use std::sync::Arc;

use xcdiag_config::Config;
use xcdiag_extract::DiagnosticExtractor;
use xcdiag_tools::ToolRegistry;

mod diagnostics;
mod info;
mod init;
mod projects;
mod serve;
mod version;

pub use diagnostics::{DiagnosticsInput, DiagnosticsStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use projects::{ProjectsInput, ProjectsStrategy};
pub use serve::ServeStrategy;
pub use version::VersionStrategy;

/// Loaded configuration plus the resolved DerivedData root.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    /// Where `config` was read from, or would have been.
    pub config_file: PathBuf,
    pub root: PathBuf,
}

impl AppContext {
    pub fn extractor(&self) -> anyhow::Result<DiagnosticExtractor> {
        Ok(DiagnosticExtractor::new(
            &self.root,
            &self.config.derived_data.log_extension,
            self.config.extraction.clone(),
        )?)
    }

    pub fn registry(&self) -> anyhow::Result<ToolRegistry> {
        Ok(ToolRegistry::with_default_tools(Arc::new(self.extractor()?)))
    }
}

/// Core trait defining the contract for all command strategies.
///
/// # Example
/// ```rust,ignore
/// struct MyStrategy;
///
/// impl CommandStrategy for MyStrategy {
///     type Input = MyInput;
///
///     async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
///         // Command logic here
///         Ok(())
///     }
/// }
/// ```
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
