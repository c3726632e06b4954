//! MCP request routing.

use serde_json::{Value, json};
use tracing::{debug, info, warn};
use xcdiag_tools::ToolRegistry;

use crate::protocol::{
    CallToolResult, McpRequest, McpResponse, PROTOCOL_VERSION, ServerCapabilities, ServerInfo,
    ToolInfo, error_codes,
};

/// Handler for MCP requests
pub struct McpHandler {
    registry: ToolRegistry,
    server_info: ServerInfo,
    capabilities: ServerCapabilities,
}

impl McpHandler {
    #[must_use]
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            server_info: ServerInfo::default(),
            capabilities: ServerCapabilities::default(),
        }
    }

    /// Handle one raw input line.
    ///
    /// Returns the serialized response, or `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(line) {
            Err(e) => {
                warn!("Invalid JSON from client: {e}");
                Some(McpResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    "Parse error: invalid JSON",
                ))
            }
            Ok(value) => self.handle_value(value).await,
        }?;

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to serialize response: {e}");
                None
            }
        }
    }

    async fn handle_value(&self, value: Value) -> Option<McpResponse> {
        let id = value.get("id").cloned();
        if value.get("method").and_then(Value::as_str).is_none() {
            return Some(McpResponse::error(
                id,
                error_codes::INVALID_REQUEST,
                "Invalid Request: missing method",
            ));
        }
        match serde_json::from_value::<McpRequest>(value) {
            Ok(request) => self.handle(&request).await,
            Err(e) => Some(McpResponse::error(
                id,
                error_codes::INVALID_REQUEST,
                format!("Invalid Request: {e}"),
            )),
        }
    }

    /// Handle an MCP request. Notifications get no response.
    pub async fn handle(&self, request: &McpRequest) -> Option<McpResponse> {
        debug!("Request: {}", request.method);
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "shutdown" => {
                info!("Client requested shutdown");
                McpResponse::success(request.id.clone(), json!({}))
            }
            "tools/list" | "mcp.list_tools" => self.handle_tools_list(request),
            "tools/call" | "mcp.call_tool" => self.handle_tools_call(request).await,
            "prompts/list" => McpResponse::success(request.id.clone(), json!({ "prompts": [] })),
            "notifications/initialized" => return None,
            _ => McpResponse::error(
                request.id.clone(),
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
            ),
        };

        if request.is_notification() {
            None
        } else {
            Some(response)
        }
    }

    fn handle_initialize(&self, request: &McpRequest) -> McpResponse {
        info!("Initializing MCP session");
        McpResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": self.server_info,
                "capabilities": self.capabilities
            }),
        )
    }

    fn handle_tools_list(&self, request: &McpRequest) -> McpResponse {
        let tools: Vec<ToolInfo> = self
            .registry
            .definitions()
            .into_iter()
            .map(|t| ToolInfo {
                name: t.name,
                description: t.description,
                input_schema: t.input_schema,
            })
            .collect();

        McpResponse::success(request.id.clone(), json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, request: &McpRequest) -> McpResponse {
        let Some(params) = &request.params else {
            return McpResponse::error(
                request.id.clone(),
                error_codes::INVALID_PARAMS,
                "Missing params",
            );
        };

        let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
            return McpResponse::error(
                request.id.clone(),
                error_codes::INVALID_PARAMS,
                "Missing tool name",
            );
        };

        if !self.registry.contains(tool_name) {
            return McpResponse::error(
                request.id.clone(),
                error_codes::METHOD_NOT_FOUND,
                format!("Tool '{tool_name}' not found"),
            );
        }

        let arguments = tool_arguments(params);
        let result = self.registry.execute(tool_name, arguments).await;
        info!(
            "Tool {tool_name} finished: error={} bytes={} duration_ms={:?}",
            result.is_error, result.bytes, result.duration_ms
        );

        match serde_json::to_value(CallToolResult::text(result.content, result.is_error)) {
            Ok(value) => McpResponse::success(request.id.clone(), value),
            Err(e) => McpResponse::error(
                request.id.clone(),
                error_codes::INTERNAL_ERROR,
                format!("Failed to encode tool result: {e}"),
            ),
        }
    }
}

/// `arguments`, or the older `parameters` key when it carries values.
fn tool_arguments(params: &Value) -> Value {
    let non_empty = |key: &str| {
        params
            .get(key)
            .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
            .cloned()
    };
    non_empty("parameters")
        .or_else(|| non_empty("arguments"))
        .unwrap_or_else(|| json!({}))
}
