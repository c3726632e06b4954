//! MCP server over stdio.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use xcdiag_tools::ToolRegistry;

use crate::handler::McpHandler;

pub struct McpServer {
    handler: McpHandler,
}

impl McpServer {
    #[must_use]
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            handler: McpHandler::new(registry),
        }
    }

    /// Serve requests on stdin/stdout until stdin closes.
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("Starting Xcode diagnostics MCP server on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await?;
        info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Newline-delimited JSON-RPC loop over arbitrary streams.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            debug!("<- {line}");

            if let Some(response) = self.handler.handle_line(line).await {
                debug!("-> {response}");
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn handler(&self) -> &McpHandler {
        &self.handler
    }
}
