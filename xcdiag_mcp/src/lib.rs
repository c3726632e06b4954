//! Model Context Protocol front end for the Xcode diagnostics tools.
//!
//! One JSON-RPC message per line on stdin, one response per line on stdout.
//! Logging must never write to stdout while the server runs.

pub mod handler;
pub mod protocol;
pub mod server;

pub use handler::McpHandler;
pub use protocol::{McpRequest, McpResponse, PROTOCOL_VERSION, SERVER_NAME};
pub use server::McpServer;
