use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use xcdiag_extract::DiagnosticExtractor;

use crate::{Tool, ToolDefinition, ToolResult, run_blocking, schema_object};

/// `get_xcode_projects`: every project under the DerivedData root.
pub struct GetXcodeProjectsTool {
    extractor: Arc<DiagnosticExtractor>,
}

impl GetXcodeProjectsTool {
    #[must_use]
    pub const fn new(extractor: Arc<DiagnosticExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Tool for GetXcodeProjectsTool {
    fn name(&self) -> &'static str {
        "get_xcode_projects"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_xcode_projects".into(),
            description: "Lists all Xcode projects that have build logs in the DerivedData directory, most recently built first.".into(),
            input_schema: schema_object(json!({}), &[]),
        }
    }

    async fn execute(&self, _input: serde_json::Value) -> ToolResult {
        let extractor = Arc::clone(&self.extractor);
        info!("Listing projects in {}", extractor.root().display());

        match run_blocking(move || extractor.lister()?.list()).await {
            Ok(projects) => ToolResult::json(&json!({ "projects": projects })),
            Err(failure) => failure,
        }
    }
}
