use serde_json::json;
use tracing::info;

use super::AppContext;

/// Input parameters for the Projects command strategy.
#[derive(Debug, Clone)]
pub struct ProjectsInput {
    pub context: AppContext,
    pub json: bool,
}

/// Strategy for listing DerivedData projects.
#[derive(Debug, Clone, Copy)]
pub struct ProjectsStrategy;

impl super::CommandStrategy for ProjectsStrategy {
    type Input = ProjectsInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let projects = input.context.extractor()?.lister()?.list()?;
        info!("Listed {} projects", projects.len());

        if input.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "projects": projects }))?
            );
            return Ok(());
        }

        if projects.is_empty() {
            println!("No projects found in {}", input.context.root.display());
            return Ok(());
        }

        for project in &projects {
            let logs = if project.has_build_logs { "logs" } else { "no logs" };
            println!(
                "{}  {:<24}  {:<8}  {}",
                project.last_modified.format("%Y-%m-%d %H:%M:%S"),
                project.name,
                logs,
                project.directory_name
            );
        }
        Ok(())
    }
}
