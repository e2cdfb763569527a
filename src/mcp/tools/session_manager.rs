//! `session_manager` tool: a thin JSON-RPC wrapper over the Session Store
//! (spec §4.2, §4.5).

use crate::errors::ToolError;
use crate::mcp::protocol::Tool;
use crate::mcp::schema::object_schema;
use crate::session_store::types::{ContentType, ListLocation, SessionType, StoreResult};
use crate::session_store::SessionStore;
use serde_json::{json, Value};
use std::collections::HashMap;

pub fn tool_definition() -> Tool {
    Tool {
        name: "session_manager".to_string(),
        description:
            "Create, read, write, update, archive, or list workflow sessions and their content."
                .to_string(),
        input_schema: object_schema(
            json!({
                "operation": {"type": "string", "enum": ["init", "read", "write", "update", "archive", "list"]},
                "sessionId": {"type": "string"},
                "contentType": {"type": "string"},
                "pathParams": {"type": "object"},
                "content": {},
                "location": {"type": "string"},
                "metadata": {"type": "object"},
                "updateStatus": {"type": "boolean"},
            }),
            &["operation"],
        ),
    }
}

fn require_str(arguments: &Value, name: &str) -> Result<String, ToolError> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::MissingParameter {
            name: name.to_string(),
        })
}

fn content_type_from(arguments: &Value) -> Result<ContentType, ToolError> {
    let content_type = require_str(arguments, "contentType")?;
    let path_params = arguments.get("pathParams").cloned().unwrap_or(json!({}));

    let param = |key: &str| -> Result<String, ToolError> {
        path_params
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ToolError::MissingParameter {
                name: format!("pathParams.{key}"),
            })
    };

    match content_type.as_str() {
        "session" => Ok(ContentType::Session),
        "task" => Ok(ContentType::Task {
            task_id: param("taskId")?,
        }),
        "summary" => Ok(ContentType::Summary { name: param("name")? }),
        "context" => Ok(ContentType::Context),
        "review" => Ok(ContentType::Review {
            dimension: param("dimension")?,
        }),
        "plan" => Ok(ContentType::Plan),
        other => Err(ToolError::ParameterError {
            message: format!("unknown contentType: {other}"),
        }),
    }
}

fn list_location_from(arguments: &Value) -> Result<ListLocation, ToolError> {
    match arguments.get("location").and_then(Value::as_str) {
        Some("active") | None => Ok(ListLocation::Active),
        Some("archived") => Ok(ListLocation::Archived),
        Some("lite-plan") => Ok(ListLocation::LitePlan),
        Some("lite-fix") => Ok(ListLocation::LiteFix),
        Some("all") => Ok(ListLocation::All),
        Some(other) => Err(ToolError::ParameterError {
            message: format!("unknown location: {other}"),
        }),
    }
}

fn session_type_from(arguments: &Value) -> Result<SessionType, ToolError> {
    let raw = arguments
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("workflow");
    serde_json::from_value(Value::String(raw.to_string())).map_err(|_| ToolError::ParameterError {
        message: format!("unknown session type: {raw}"),
    })
}

/// Dispatches on `arguments.operation` and returns the §4.2 `StoreResult`
/// envelope, JSON-stringified (per the tool catalog's "Notes" column).
pub fn call(store: &SessionStore, arguments: &Value) -> Result<String, ToolError> {
    let operation = require_str(arguments, "operation")?;

    let result = match operation.as_str() {
        "init" => {
            let session_id = require_str(arguments, "sessionId")?;
            let session_type = session_type_from(arguments)?;
            let metadata: HashMap<String, Value> = arguments
                .get("metadata")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            store.init(&session_id, session_type, metadata)
        }
        "read" => {
            let session_id = require_str(arguments, "sessionId")?;
            let content_type = content_type_from(arguments)?;
            store.read(&session_id, &content_type)
        }
        "write" => {
            let session_id = require_str(arguments, "sessionId")?;
            let content_type = content_type_from(arguments)?;
            let content = arguments.get("content").cloned().unwrap_or(Value::Null);
            store.write(&session_id, &content_type, &content)
        }
        "update" => {
            let session_id = require_str(arguments, "sessionId")?;
            let content_type = content_type_from(arguments)?;
            let content = arguments.get("content").cloned().unwrap_or(Value::Null);
            store.update(&session_id, &content_type, &content)
        }
        "archive" => {
            let session_id = require_str(arguments, "sessionId")?;
            let update_status = arguments
                .get("updateStatus")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            store.archive(&session_id, update_status)
        }
        "list" => {
            let location = list_location_from(arguments)?;
            let include_metadata = arguments
                .get("includeMetadata")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            store.list(location, include_metadata)
        }
        other => {
            return Err(ToolError::ParameterError {
                message: format!("unknown operation: {other}"),
            })
        }
    };

    let envelope = match result {
        Ok(value) => StoreResult::ok(value),
        Err(err) => StoreResult::err(err.kind()),
    };

    serde_json::to_string(&envelope).map_err(|e| ToolError::ParameterError {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;
    use tempfile::tempdir;

    fn new_store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().to_path_buf(), EventBus::new(16));
        (dir, store)
    }

    #[test]
    fn init_then_write_then_read_round_trips_through_json_string() {
        let (_dir, store) = new_store();
        call(&store, &json!({"operation": "init", "sessionId": "WFS-A", "type": "workflow"})).unwrap();

        call(
            &store,
            &json!({
                "operation": "write",
                "sessionId": "WFS-A",
                "contentType": "task",
                "pathParams": {"taskId": "IMPL-001"},
                "content": {"status": "pending"},
            }),
        )
        .unwrap();

        let response = call(
            &store,
            &json!({
                "operation": "read",
                "sessionId": "WFS-A",
                "contentType": "task",
                "pathParams": {"taskId": "IMPL-001"},
            }),
        )
        .unwrap();

        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["result"]["status"], "pending");
    }

    #[test]
    fn missing_operation_reports_missing_parameter() {
        let (_dir, store) = new_store();
        let err = call(&store, &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter { .. }));
    }

    #[test]
    fn store_error_is_reported_as_envelope_not_rust_error() {
        let (_dir, store) = new_store();
        let response = call(
            &store,
            &json!({"operation": "read", "sessionId": "WFS-GHOST", "contentType": "session"}),
        )
        .unwrap();
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["error"], "NotFound");
    }
}
