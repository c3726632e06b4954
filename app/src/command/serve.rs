use xcdiag_mcp::McpServer;

use super::AppContext;

/// Strategy for running the stdio MCP server.
#[derive(Debug, Clone, Copy)]
pub struct ServeStrategy;

impl super::CommandStrategy for ServeStrategy {
    type Input = AppContext;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        McpServer::new(input.registry()?).run().await
    }
}
