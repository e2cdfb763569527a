//! `smart_search` tool: metadata and file-name search over the project
//! (spec §4.5).

use crate::errors::ToolError;
use crate::mcp::protocol::Tool;
use crate::mcp::schema::object_schema;
use crate::session_store::assert_within_project;
use serde_json::{json, Value};
use std::path::Path;

pub fn tool_definition() -> Tool {
    Tool {
        name: "smart_search".to_string(),
        description: "Search project metadata or file names: status, search, find_files, or init."
            .to_string(),
        input_schema: object_schema(
            json!({
                "action": {"type": "string", "enum": ["status", "search", "find_files", "init"]},
                "query": {"type": "string"},
                "pattern": {"type": "string"},
                "path": {"type": "string"},
                "limit": {"type": "number"},
                "offset": {"type": "number"},
                "caseSensitive": {"type": "boolean"},
            }),
            &["action"],
        ),
    }
}

pub fn call(project_root: &Path, arguments: &Value) -> Result<String, ToolError> {
    let action = arguments
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::MissingParameter {
            name: "action".to_string(),
        })?;

    match action {
        "status" => status(project_root),
        "search" => search(project_root, arguments),
        "find_files" => find_files(project_root, arguments),
        "init" => Ok(json!({"initialized": true}).to_string()),
        other => Err(ToolError::ParameterError {
            message: format!("unknown action: {other}"),
        }),
    }
}

fn status(project_root: &Path) -> Result<String, ToolError> {
    let exists = project_root.is_dir();
    Ok(json!({ "projectRoot": project_root, "exists": exists }).to_string())
}

fn search(project_root: &Path, arguments: &Value) -> Result<String, ToolError> {
    let query = arguments
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::MissingParameter {
            name: "query".to_string(),
        })?;
    let case_sensitive = arguments
        .get("caseSensitive")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let limit = arguments
        .get("limit")
        .and_then(Value::as_u64)
        .unwrap_or(50) as usize;

    let root = match arguments.get("path").and_then(Value::as_str) {
        Some(relative) => assert_within_project(project_root, Path::new(relative))?,
        None => project_root.to_path_buf(),
    };

    let needle = if case_sensitive {
        query.to_string()
    } else {
        query.to_lowercase()
    };

    let mut matches = Vec::new();
    for entry in walk(&root) {
        if matches.len() >= limit {
            break;
        }
        let Ok(content) = std::fs::read_to_string(&entry) else {
            continue;
        };
        let haystack = if case_sensitive {
            content.clone()
        } else {
            content.to_lowercase()
        };
        if haystack.contains(&needle) {
            matches.push(entry.display().to_string());
        }
    }

    Ok(json!({ "matches": matches }).to_string())
}

fn find_files(project_root: &Path, arguments: &Value) -> Result<String, ToolError> {
    let pattern = arguments
        .get("pattern")
        .and_then(Value::as_str)
        .unwrap_or("");
    let limit = arguments
        .get("limit")
        .and_then(Value::as_u64)
        .unwrap_or(100) as usize;

    let root = match arguments.get("path").and_then(Value::as_str) {
        Some(relative) => assert_within_project(project_root, Path::new(relative))?,
        None => project_root.to_path_buf(),
    };

    let mut found = Vec::new();
    for entry in walk(&root) {
        if found.len() >= limit {
            break;
        }
        let name = entry.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if pattern.is_empty() || name.contains(pattern) {
            found.push(entry.display().to_string());
        }
    }

    Ok(json!({ "files": found }).to_string())
}

/// Recursive file walk, skipping hidden directories (`.git`, `.workflow`'s
/// own dotfiles would otherwise pollute a project-wide text search).
fn walk(root: &Path) -> Vec<std::path::PathBuf> {
    let mut results = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            if path.is_dir() {
                stack.push(path);
            } else {
                results.push(path);
            }
        }
    }
    results
}
