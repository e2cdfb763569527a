//! Tool-Calling Server: async stdio JSON-RPC loop and dispatch
//! (spec §4.5).
//!
//! The read-loop structure (`read line -> parse -> handle_message`),
//! notification-vs-request branching on `id.is_none()`, and the
//! `Result<Value, (i32, String)>` dispatch-then-map-to-response pattern
//! are adapted from the teacher's `mcp::server::McpReviewServer::run_sync`
//! / `handle_message`, swapped from synchronous `std::io::stdin().lock()`
//! to `tokio::io::AsyncBufReadExt::lines()` since this server must run
//! concurrently with the Dashboard Bridge in embedded configurations.

use super::protocol::{
    error_codes, InitializeResult, JsonRpcRequest, JsonRpcResponse, ServerCapabilities,
    ServerInfo, Tool, ToolCallParams, ToolCallResult, ToolsCapability, ToolsListResult,
};
use super::schema::first_missing_required;
use super::tools;
use crate::config::EnabledTools;
use crate::errors::ToolError;
use crate::session_store::SessionStore;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const SERVER_NAME: &str = "ccw-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpServer {
    store: SessionStore,
    project_root: PathBuf,
    tool_timeout: Duration,
    enabled_tools: EnabledTools,
}

impl McpServer {
    pub fn new(
        store: SessionStore,
        project_root: PathBuf,
        tool_timeout: Duration,
        enabled_tools: EnabledTools,
    ) -> Self {
        Self {
            store,
            project_root,
            tool_timeout,
            enabled_tools,
        }
    }

    /// The tool catalog narrowed to what `CCW_ENABLED_TOOLS` allows
    /// (spec §6: "`tools/list` returns only tools whose names are in
    /// `CCW_ENABLED_TOOLS` (or all if `all`)").
    fn enabled_catalog(&self) -> Vec<Tool> {
        tools::catalog()
            .into_iter()
            .filter(|tool| self.enabled_tools.is_enabled(&tool.name))
            .collect()
    }

    /// Runs the server over the given async stdin/stdout, one JSON object
    /// per line in each direction. Malformed input never kills the loop.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: tokio::io::AsyncRead + Unpin,
        W: AsyncWriteExt + Unpin,
    {
        let mut lines = BufReader::new(input).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_message(&line).await {
                let frame = serde_json::to_string(&response)?;
                output.write_all(frame.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
        }
        Ok(())
    }

    async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Failed to parse request: {e}"),
                ));
            }
        };

        if request.id.is_none() {
            return None;
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tool_call(request.params).await,
            other => Err((
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err((code, message)) => JsonRpcResponse::error(request.id, code, message),
        })
    }

    fn handle_initialize(&self) -> Result<Value, (i32, String)> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };
        serde_json::to_value(result)
            .map_err(|e| (error_codes::INTERNAL_ERROR, format!("Serialization error: {e}")))
    }

    fn handle_tools_list(&self) -> Result<Value, (i32, String)> {
        let result = ToolsListResult {
            tools: self.enabled_catalog(),
        };
        serde_json::to_value(result)
            .map_err(|e| (error_codes::INTERNAL_ERROR, format!("Serialization error: {e}")))
    }

    async fn handle_tool_call(&self, params: Option<Value>) -> Result<Value, (i32, String)> {
        let call_params: ToolCallParams = params
            .ok_or((error_codes::INVALID_PARAMS, "Missing params".to_string()))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| (error_codes::INVALID_PARAMS, format!("Invalid tool call params: {e}")))
            })?;

        let outcome = tokio::time::timeout(
            self.tool_timeout,
            self.invoke_tool(&call_params.name, &call_params.arguments),
        )
        .await;

        let tool_result = match outcome {
            Ok(result) => result,
            Err(_) => ToolCallResult::error("timeout".to_string()),
        };

        serde_json::to_value(tool_result)
            .map_err(|e| (error_codes::INTERNAL_ERROR, format!("Serialization error: {e}")))
    }

    async fn invoke_tool(&self, name: &str, arguments: &Value) -> ToolCallResult {
        let catalog = self.enabled_catalog();
        let Some(tool) = catalog.iter().find(|t| t.name == name) else {
            return ToolCallResult::error("tool not found or not enabled".to_string());
        };

        if let Some(missing) = first_missing_required(&tool.input_schema, arguments) {
            return ToolCallResult::error(format!("Parameter {missing} is required"));
        }

        let project_root: &Path = &self.project_root;
        let outcome: Result<String, ToolError> = match name {
            "session_manager" => tools::session_manager::call(&self.store, arguments),
            "write_file" => tools::write_file::call(project_root, self.store.event_bus(), arguments),
            "edit_file" => tools::edit_file::call(project_root, arguments),
            "smart_search" => tools::smart_search::call(project_root, arguments),
            "outline" => tools::outline::call(project_root, arguments),
            _ => Err(ToolError::NotFound),
        };

        match outcome {
            Ok(text) => ToolCallResult::text(text),
            Err(err) => ToolCallResult::error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;
    use tempfile::tempdir;

    fn new_server(project_root: PathBuf) -> McpServer {
        new_server_with_tools(project_root, EnabledTools::All)
    }

    fn new_server_with_tools(project_root: PathBuf, enabled_tools: EnabledTools) -> McpServer {
        let store = SessionStore::new(project_root.clone(), EventBus::new(16));
        McpServer::new(store, project_root, Duration::from_secs(5), enabled_tools)
    }

    async fn run_single(server: &McpServer, request: &str) -> Value {
        let input = tokio::io::BufReader::new(request.as_bytes());
        let mut output = Vec::new();
        server.run(input, &mut output).await.unwrap();
        let line = String::from_utf8(output).unwrap();
        serde_json::from_str(line.trim()).unwrap()
    }

    #[tokio::test]
    async fn malformed_json_returns_parse_error() {
        let dir = tempdir().unwrap();
        let server = new_server(dir.path().to_path_buf());
        let response = run_single(&server, "not json\n").await;
        assert_eq!(response["error"]["code"], error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found() {
        let dir = tempdir().unwrap();
        let server = new_server(dir.path().to_path_buf());
        let response = run_single(&server, "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"nope\"}\n").await;
        assert_eq!(response["error"]["code"], error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn notification_without_id_produces_no_response() {
        let dir = tempdir().unwrap();
        let server = new_server(dir.path().to_path_buf());
        let input = tokio::io::BufReader::new(
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n".as_bytes(),
        );
        let mut output = Vec::new();
        server.run(input, &mut output).await.unwrap();
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn tools_list_returns_five_tools() {
        let dir = tempdir().unwrap();
        let server = new_server(dir.path().to_path_buf());
        let response = run_single(&server, "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n").await;
        assert_eq!(response["result"]["tools"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn tool_call_with_unknown_tool_name_is_error_envelope_not_protocol_error() {
        let dir = tempdir().unwrap();
        let server = new_server(dir.path().to_path_buf());
        let request = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"ghost\",\"arguments\":{}}}\n";
        let response = run_single(&server, request).await;
        assert_eq!(response["result"]["isError"], true);
    }

    #[tokio::test]
    async fn tool_call_missing_required_parameter_is_error_envelope() {
        let dir = tempdir().unwrap();
        let server = new_server(dir.path().to_path_buf());
        let request = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"write_file\",\"arguments\":{}}}\n";
        let response = run_single(&server, request).await;
        assert_eq!(response["result"]["isError"], true);
        assert!(response["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("required"));
    }

    #[tokio::test]
    async fn enabled_tools_restricts_tools_list_and_tool_calls() {
        let dir = tempdir().unwrap();
        let mut only_write_file = std::collections::HashSet::new();
        only_write_file.insert("write_file".to_string());
        let server =
            new_server_with_tools(dir.path().to_path_buf(), EnabledTools::Named(only_write_file));

        let list_response =
            run_single(&server, "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n").await;
        let names: Vec<&str> = list_response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["write_file"]);

        let call_request = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"outline\",\"arguments\":{\"path\":\"x\"}}}\n";
        let call_response = run_single(&server, call_request).await;
        assert_eq!(call_response["result"]["isError"], true);
    }

    #[tokio::test]
    async fn duplicate_request_ids_each_get_their_own_response() {
        let dir = tempdir().unwrap();
        let server = new_server(dir.path().to_path_buf());
        let request = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n";
        let input = tokio::io::BufReader::new(request.as_bytes());
        let mut output = Vec::new();
        server.run(input, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
