use serde_json::json;
use xcdiag_core::DiagnosticEntry;

use super::AppContext;

/// Input parameters for the Diagnostics command strategy.
#[derive(Debug, Clone)]
pub struct DiagnosticsInput {
    pub context: AppContext,
    pub project_dir_name: String,
    pub include_warnings: bool,
    /// Print the same JSON the `get_project_diagnostics` tool returns.
    pub json: bool,
}

/// Strategy for extracting diagnostics from one project.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsStrategy;

impl super::CommandStrategy for DiagnosticsStrategy {
    type Input = DiagnosticsInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        if input.json {
            let registry = input.context.registry()?;
            let result = registry
                .execute(
                    "get_project_diagnostics",
                    json!({
                        "project_dir_name": input.project_dir_name,
                        "include_warnings": input.include_warnings,
                    }),
                )
                .await;
            let value: serde_json::Value = serde_json::from_str(&result.content)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            if result.is_error {
                anyhow::bail!(
                    "Extraction failed ({})",
                    result.error_type.as_deref().unwrap_or("tool_error")
                );
            }
            return Ok(());
        }

        let report = input
            .context
            .extractor()?
            .extract(&input.project_dir_name, input.include_warnings)?;

        println!("Log: {}", report.log_file);
        for entry in report.errors.iter().chain(&report.warnings) {
            print_entry(entry);
        }
        println!(
            "{} errors, {} warnings{}",
            report.error_count,
            report.warning_count,
            if report.truncated { " (truncated)" } else { "" }
        );
        Ok(())
    }
}

fn print_entry(entry: &DiagnosticEntry) {
    let location = match (&entry.file, entry.line, entry.column) {
        (Some(file), Some(line), Some(column)) => format!("{file}:{line}:{column}: "),
        (Some(file), Some(line), None) => format!("{file}:{line}: "),
        (Some(file), None, _) => format!("{file}: "),
        (None, ..) => String::new(),
    };
    println!("{location}{}: {}", entry.kind, entry.message);
    if let Some(code) = &entry.code {
        println!("{code}");
    }
    if let Some(caret) = &entry.caret {
        println!("{caret}");
    }
    for note in &entry.notes {
        println!("    note: {}", note.message);
        if let Some(fix) = &note.suggested_fix {
            println!("    fix-it: {fix}");
        }
    }
}
