pub mod diagnostics;
pub mod projects;

// Re-export tool types for convenience
pub use diagnostics::GetProjectDiagnosticsTool;
pub use projects::GetXcodeProjectsTool;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use xcdiag_extract::DiagnosticExtractor;

/// Tool definition advertised to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Result of tool execution
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// JSON text returned to the caller, for failures as well.
    pub content: String,
    pub is_error: bool,
    pub bytes: usize,
    pub duration_ms: Option<u128>,
    pub error_type: Option<String>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        let content = content.into();
        let bytes = content.len();
        Self {
            content,
            is_error: false,
            bytes,
            duration_ms: None,
            error_type: None,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        let content = content.into();
        let bytes = content.len();
        Self {
            content,
            is_error: true,
            bytes,
            duration_ms: None,
            error_type: Some("tool_error".to_string()),
        }
    }

    /// Serialize `value` as the successful payload.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(content) => Self::success(content),
            Err(e) => Self::failure("internal", &format!("Failed to serialize result: {e}")),
        }
    }

    /// Structured failure: `{success: false, error: {kind, message}, errors: [], warnings: []}`.
    #[must_use]
    pub fn failure(kind: &str, message: &str) -> Self {
        let payload = json!({
            "success": false,
            "error": {
                "kind": kind,
                "message": message,
            },
            "errors": [],
            "warnings": [],
        });
        Self::error(payload.to_string()).with_error_type(kind)
    }

    #[must_use]
    pub fn from_core_error(err: &xcdiag_core::Error) -> Self {
        Self::failure(err.kind(), &err.to_string())
    }

    #[must_use]
    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }
}

/// Tool trait
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn definition(&self) -> ToolDefinition;
    async fn execute(&self, input: serde_json::Value) -> ToolResult;
}

/// Tool registry
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with `get_xcode_projects` and `get_project_diagnostics`.
    #[must_use]
    pub fn with_default_tools(extractor: Arc<DiagnosticExtractor>) -> Self {
        let mut registry = Self::new();
        registry.add_tool(Box::new(GetXcodeProjectsTool::new(Arc::clone(&extractor))));
        registry.add_tool(Box::new(GetProjectDiagnosticsTool::new(extractor)));
        registry
    }

    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    pub async fn execute(&self, name: &str, input: serde_json::Value) -> ToolResult {
        for tool in &self.tools {
            if tool.name() == name {
                let started = Instant::now();
                let mut result = tool.execute(input).await;
                result.duration_ms = Some(started.elapsed().as_millis());
                result.bytes = result.content.len();
                return result;
            }
        }
        ToolResult::failure("unknown_tool", &format!("Unknown tool: {name}"))
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run blocking extraction work off the async runtime.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ToolResult>
where
    T: Send + 'static,
    F: FnOnce() -> xcdiag_core::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ToolResult::from_core_error(&e)),
        Err(e) => Err(ToolResult::failure(
            "internal",
            &format!("Extraction task failed: {e}"),
        )),
    }
}

/// Helper to build JSON schema
#[must_use]
#[allow(clippy::needless_pass_by_value)]
pub fn schema_object(properties: serde_json::Value, required: &[&str]) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ToolRegistry {
        let extractor = DiagnosticExtractor::new(
            "/nonexistent/xcdiag/DerivedData",
            xcdiag_extract::DEFAULT_LOG_EXTENSION,
            xcdiag_extract::ExtractionConfig::default(),
        )
        .unwrap();
        ToolRegistry::with_default_tools(Arc::new(extractor))
    }

    #[test]
    fn test_tool_result_failure_payload() {
        let r = ToolResult::failure("not_found", "No build logs found for project X");
        assert!(r.is_error);
        assert_eq!(r.error_type.as_deref(), Some("not_found"));
        let payload: serde_json::Value = serde_json::from_str(&r.content).unwrap();
        assert_eq!(payload["success"], false);
        assert_eq!(payload["error"]["kind"], "not_found");
        assert_eq!(payload["errors"], json!([]));
        assert_eq!(payload["warnings"], json!([]));
    }

    #[test]
    fn test_schema_object() {
        let schema = schema_object(
            json!({
                "project_dir_name": {"type": "string"}
            }),
            &["project_dir_name"],
        );
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["project_dir_name"]));
    }

    #[test]
    fn test_default_tools_registered() {
        let registry = registry();
        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["get_xcode_projects", "get_project_diagnostics"]);
        assert!(registry.contains("get_project_diagnostics"));
        assert!(!registry.contains("bash"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = registry().execute("bash", json!({})).await;
        assert!(result.is_error);
        assert_eq!(result.error_type.as_deref(), Some("unknown_tool"));
        assert!(result.duration_ms.is_none());
    }

    #[tokio::test]
    async fn test_execute_records_timing_and_size() {
        let result = registry().execute("get_xcode_projects", json!({})).await;
        assert!(!result.is_error);
        assert!(result.error_type.is_none());
        assert!(result.duration_ms.is_some());
        assert_eq!(result.bytes, result.content.len());
    }
}
