//! `edit_file` tool: read-modify-write a single exact-match text
//! replacement, insertion, or deletion (spec §4.5).

use crate::errors::ToolError;
use crate::mcp::protocol::Tool;
use crate::mcp::schema::object_schema;
use crate::session_store::{assert_within_project, atomic_write_text};
use serde_json::{json, Value};
use std::path::Path;

pub fn tool_definition() -> Tool {
    Tool {
        name: "edit_file".to_string(),
        description:
            "Replace, insert after, or delete an exact text match inside an existing file."
                .to_string(),
        input_schema: object_schema(
            json!({
                "path": {"type": "string"},
                "oldText": {"type": "string"},
                "newText": {"type": "string"},
                "mode": {"type": "string", "enum": ["update", "insert", "delete"]},
            }),
            &["path", "oldText", "newText", "mode"],
        ),
    }
}

fn require_str<'a>(arguments: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::MissingParameter {
            name: name.to_string(),
        })
}

pub fn call(project_root: &Path, arguments: &Value) -> Result<String, ToolError> {
    let path = require_str(arguments, "path")?;
    let old_text = require_str(arguments, "oldText")?;
    let new_text = require_str(arguments, "newText")?;
    let mode = require_str(arguments, "mode")?;

    let target = assert_within_project(project_root, Path::new(path))?;
    let original = std::fs::read_to_string(&target).map_err(|e| {
        ToolError::ParameterError {
            message: format!("could not read {}: {e}", target.display()),
        }
    })?;

    let occurrences = original.matches(old_text).count();
    if mode == "update" {
        if occurrences == 0 {
            return Err(ToolError::ParameterError {
                message: "oldText not found".to_string(),
            });
        }
        if occurrences > 1 {
            return Err(ToolError::ParameterError {
                message: format!("oldText matches {occurrences} times; expected exactly one"),
            });
        }
    }

    let updated = match mode {
        "update" => original.replacen(old_text, new_text, 1),
        "insert" => {
            if occurrences == 0 {
                return Err(ToolError::ParameterError {
                    message: "oldText not found".to_string(),
                });
            }
            original.replacen(old_text, &format!("{old_text}{new_text}"), 1)
        }
        "delete" => {
            if occurrences == 0 {
                return Err(ToolError::ParameterError {
                    message: "oldText not found".to_string(),
                });
            }
            original.replacen(old_text, "", 1)
        }
        other => {
            return Err(ToolError::ParameterError {
                message: format!("unknown mode: {other}"),
            })
        }
    };

    atomic_write_text(&target, &updated)?;
    Ok(format!("edited {}", target.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn update_replaces_single_occurrence() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", "hello world");

        call(
            dir.path(),
            &json!({"path": "a.txt", "oldText": "world", "newText": "rust", "mode": "update"}),
        )
        .unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "hello rust");
    }

    #[test]
    fn update_fails_on_zero_matches() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", "hello world");

        let err = call(
            dir.path(),
            &json!({"path": "a.txt", "oldText": "nope", "newText": "x", "mode": "update"}),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::ParameterError { .. }));
    }

    #[test]
    fn update_fails_on_multiple_matches() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", "aa aa aa");

        let err = call(
            dir.path(),
            &json!({"path": "a.txt", "oldText": "aa", "newText": "b", "mode": "update"}),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::ParameterError { .. }));
    }

    #[test]
    fn insert_appends_after_match() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", "line1\n");

        call(
            dir.path(),
            &json!({"path": "a.txt", "oldText": "line1\n", "newText": "line2\n", "mode": "insert"}),
        )
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "line1\nline2\n"
        );
    }

    #[test]
    fn delete_removes_match() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", "keep TODO remove");

        call(
            dir.path(),
            &json!({"path": "a.txt", "oldText": " TODO", "newText": "", "mode": "delete"}),
        )
        .unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "keep remove");
    }
}
