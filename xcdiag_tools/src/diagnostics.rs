use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use xcdiag_extract::DiagnosticExtractor;

use crate::{Tool, ToolDefinition, ToolResult, run_blocking, schema_object};

/// `get_project_diagnostics`: errors and warnings from a project's newest build log.
pub struct GetProjectDiagnosticsTool {
    extractor: Arc<DiagnosticExtractor>,
}

impl GetProjectDiagnosticsTool {
    #[must_use]
    pub const fn new(extractor: Arc<DiagnosticExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Tool for GetProjectDiagnosticsTool {
    fn name(&self) -> &'static str {
        "get_project_diagnostics"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_project_diagnostics".into(),
            description: "Gets diagnostic information (errors and warnings) from the latest build log of a specific project.".into(),
            input_schema: schema_object(
                json!({
                    "project_dir_name": {
                        "type": "string",
                        "description": "Directory name of the project in DerivedData (e.g. 'ProjectName-hash')"
                    },
                    "include_warnings": {
                        "type": "boolean",
                        "description": "Whether to include warnings in addition to errors",
                        "default": true
                    }
                }),
                &["project_dir_name"],
            ),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let Some(project) = input.get("project_dir_name").and_then(|v| v.as_str()) else {
            return ToolResult::failure("invalid_params", "Missing 'project_dir_name' parameter");
        };
        let include_warnings = match input.get("include_warnings") {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(other) => {
                return ToolResult::failure(
                    "invalid_params",
                    &format!("'include_warnings' must be a boolean, got {other}"),
                );
            }
        };

        info!("Diagnostics: {project} (include_warnings={include_warnings})");

        let extractor = Arc::clone(&self.extractor);
        let project = project.to_string();
        match run_blocking(move || extractor.extract(&project, include_warnings)).await {
            Ok(report) => ToolResult::json(&report),
            Err(failure) => failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    const PROJECT: &str = "Demo-bqzxkmfhhgnwdkdjcyodbkuwzjxm";

    fn setup_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("xcdiag_diag_tool_{}", uuid::Uuid::now_v7()));
        let logs = dir.join(PROJECT).join("Logs").join("Build");
        std::fs::create_dir_all(&logs).unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(
                b"/src/Bar.swift:42:9: error: cannot find type 'Foo' in scope\n\
                  /src/Baz.swift:7:3: warning: variable 'x' was never used\n",
            )
            .unwrap();
        std::fs::write(logs.join("a.xcactivitylog"), encoder.finish().unwrap()).unwrap();
        dir
    }

    fn tool(root: &Path) -> GetProjectDiagnosticsTool {
        let extractor = DiagnosticExtractor::new(
            root,
            xcdiag_extract::DEFAULT_LOG_EXTENSION,
            xcdiag_extract::ExtractionConfig::default(),
        )
        .unwrap();
        GetProjectDiagnosticsTool::new(Arc::new(extractor))
    }

    fn payload(result: &ToolResult) -> serde_json::Value {
        serde_json::from_str(&result.content).unwrap()
    }

    #[tokio::test]
    async fn test_extracts_errors_and_warnings() {
        let root = setup_root();
        let result = tool(&root)
            .execute(json!({"project_dir_name": PROJECT}))
            .await;
        assert!(!result.is_error);

        let report = payload(&result);
        assert_eq!(report["success"], true);
        assert_eq!(report["errors"][0]["line"], 42);
        assert_eq!(report["errors"][0]["kind"], "error");
        assert_eq!(report["warnings"].as_array().unwrap().len(), 1);
        assert!(report["debug_info"].is_object());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_warnings_can_be_excluded() {
        let root = setup_root();
        let result = tool(&root)
            .execute(json!({"project_dir_name": PROJECT, "include_warnings": false}))
            .await;
        let report = payload(&result);
        assert_eq!(report["errors"].as_array().unwrap().len(), 1);
        assert_eq!(report["warnings"], json!([]));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_unknown_project_is_structured_error() {
        let root = setup_root();
        let result = tool(&root)
            .execute(json!({"project_dir_name": "Nope-abc"}))
            .await;
        assert!(result.is_error);
        assert_eq!(result.error_type.as_deref(), Some("not_found"));

        let report = payload(&result);
        assert_eq!(report["success"], false);
        assert_eq!(report["error"]["kind"], "not_found");
        assert_eq!(report["errors"], json!([]));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let root = setup_root();
        let result = tool(&root)
            .execute(json!({"project_dir_name": "../etc"}))
            .await;
        assert!(result.is_error);
        assert_eq!(payload(&result)["error"]["kind"], "invalid_project");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_missing_parameter() {
        let root = setup_root();
        let result = tool(&root).execute(json!({})).await;
        assert!(result.is_error);
        assert_eq!(result.error_type.as_deref(), Some("invalid_params"));

        let result = tool(&root)
            .execute(json!({"project_dir_name": PROJECT, "include_warnings": "yes"}))
            .await;
        assert_eq!(result.error_type.as_deref(), Some("invalid_params"));
        let _ = std::fs::remove_dir_all(&root);
    }
}
