//! `write_file` tool: atomic create-or-replace of a file inside the
//! project root (spec §4.5).

use crate::errors::ToolError;
use crate::event_bus::EventBus;
use crate::mcp::protocol::Tool;
use crate::mcp::schema::object_schema;
use crate::session_store::types::{Event, EventType};
use crate::session_store::{assert_within_project, atomic_write_text};
use chrono::Utc;
use serde_json::{json, Value};
use std::path::Path;

pub fn tool_definition() -> Tool {
    Tool {
        name: "write_file".to_string(),
        description: "Atomically create or replace a file at a project-relative path.".to_string(),
        input_schema: object_schema(
            json!({
                "path": {"type": "string"},
                "content": {"type": "string"},
            }),
            &["path", "content"],
        ),
    }
}

pub fn call(project_root: &Path, events: &EventBus, arguments: &Value) -> Result<String, ToolError> {
    let path = arguments
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::MissingParameter {
            name: "path".to_string(),
        })?;
    let content = arguments
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::MissingParameter {
            name: "content".to_string(),
        })?;

    let target = assert_within_project(project_root, Path::new(path))?;
    atomic_write_text(&target, content)?;

    events.publish(Event {
        event_type: EventType::FileWritten,
        session_id: String::new(),
        entity_id: Some(path.to_string()),
        payload: json!({ "path": target, "bytes": content.len() }),
        timestamp: Utc::now(),
    });

    Ok(format!("wrote {} bytes to {}", content.len(), target.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_file_inside_project_root() {
        let dir = tempdir().unwrap();
        let events = EventBus::new(16);
        let response = call(
            dir.path(),
            &events,
            &json!({"path": "src/lib.rs", "content": "fn main() {}"}),
        )
        .unwrap();
        assert!(response.contains("wrote"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/lib.rs")).unwrap(),
            "fn main() {}"
        );
    }

    #[test]
    fn rejects_path_escaping_project_root() {
        let dir = tempdir().unwrap();
        let events = EventBus::new(16);
        let err = call(
            dir.path(),
            &events,
            &json!({"path": "../../etc/passwd", "content": "x"}),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Store(_)));
    }

    #[test]
    fn successful_write_emits_file_written_event() {
        let dir = tempdir().unwrap();
        let events = EventBus::new(16);
        let mut sub = events.subscribe();

        call(
            dir.path(),
            &events,
            &json!({"path": "notes.txt", "content": "hi"}),
        )
        .unwrap();

        let event = sub.receiver.try_recv().unwrap();
        assert_eq!(event.event_type, EventType::FileWritten);
        assert_eq!(event.entity_id.as_deref(), Some("notes.txt"));
    }
}
