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

mod command;
mod logging;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use xcdiag_config::Config;

use command::{
    AppContext, CommandStrategy, DiagnosticsInput, DiagnosticsStrategy, InfoStrategy,
    InitStrategy, ProjectsInput, ProjectsStrategy, ServeStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "xcdiag")]
#[command(about = "Xcode build-log diagnostics", long_about = None)]
struct Cli {
    /// DerivedData root to scan instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    derived_data: Option<PathBuf>,

    /// Config file to load instead of ~/xcdiag/config.json
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects with build logs, most recent first
    Projects {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Extract errors and warnings from a project's latest build log
    Diagnostics {
        /// Directory name in DerivedData, e.g. MyApp-bqzxkmfhhgnwdkdjcyodbkuwzjxm
        project_dir_name: String,

        /// Only report errors
        #[arg(long)]
        no_warnings: bool,

        /// Print the JSON report
        #[arg(long)]
        json: bool,
    },
    /// Run the MCP server on stdio
    Serve,
    /// Initialize configuration
    Init,
    /// Show effective configuration
    Info,
    /// Show version
    Version,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<(Config, PathBuf)> {
    match path {
        Some(path) => Ok((Config::load_from(path)?, path.to_path_buf())),
        None => Ok((Config::load()?, Config::config_path()?)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => return InitStrategy.execute(()).await,
        Commands::Version => return VersionStrategy.execute(()).await,
        _ => {}
    }

    let (config, config_file) = load_config(cli.config.as_deref())?;
    logging::init(&config.logging)?;

    let root = match cli.derived_data {
        Some(root) => root,
        None => config.derived_data.root()?,
    };
    info!("Using DerivedData root {}", root.display());
    let context = AppContext {
        config,
        config_file,
        root,
    };

    match cli.command {
        Commands::Projects { json } => {
            ProjectsStrategy
                .execute(ProjectsInput { context, json })
                .await
        }
        Commands::Diagnostics {
            project_dir_name,
            no_warnings,
            json,
        } => {
            DiagnosticsStrategy
                .execute(DiagnosticsInput {
                    context,
                    project_dir_name,
                    include_warnings: !no_warnings,
                    json,
                })
                .await
        }
        Commands::Serve => ServeStrategy.execute(context).await,
        Commands::Info => InfoStrategy.execute(context).await,
        Commands::Init | Commands::Version => Ok(()),
    }
}
