//! Tool-Calling Server: JSON-RPC 2.0 over stdio (spec §4.5).

pub mod protocol;
pub mod schema;
pub mod server;
pub mod tools;

pub use server::McpServer;
