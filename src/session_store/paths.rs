//! SessionId/taskId charset validation and contentType->path derivation,
//! including the path-traversal containment check (spec §4.2).

use super::types::{ContentType, ListLocation};
use crate::errors::StoreError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap())
}

/// Validates a sessionId/taskId/other user-supplied path fragment against
/// the spec's charset rule: `[A-Za-z0-9._-]`, non-empty, no `.`/`..` segment.
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() || !id_pattern().is_match(id) {
        return Err(StoreError::InvalidId { id: id.to_string() });
    }
    if id == "." || id == ".." {
        return Err(StoreError::InvalidId { id: id.to_string() });
    }
    // `[A-Za-z0-9._-]` already excludes `/` and `\`, so no separate check is
    // needed for path separators; guard against a dotted-suffix id that is
    // entirely dots (`...`) which the regex alone would accept.
    if id.chars().all(|c| c == '.') {
        return Err(StoreError::InvalidId { id: id.to_string() });
    }
    Ok(())
}

/// Root-relative directory for a location within a project's state root.
pub fn location_dir(state_root: &Path, location: ListLocation) -> PathBuf {
    match location {
        ListLocation::Active => state_root.join(".workflow").join("active"),
        ListLocation::Archived => state_root.join(".workflow").join("archives"),
        ListLocation::LitePlan => state_root.join(".workflow").join(".lite-plan"),
        ListLocation::LiteFix => state_root.join(".workflow").join(".lite-fix"),
        ListLocation::All => state_root.join(".workflow"),
    }
}

/// Directory for a single session within a location.
pub fn session_dir(state_root: &Path, location: ListLocation, session_id: &str) -> PathBuf {
    location_dir(state_root, location).join(session_id)
}

/// Resolves `(contentType, pathParams-implied-by-ContentType)` to a concrete
/// file path inside `session_dir`, per spec §4.2's path-derivation table.
///
/// Containment is checked *before* the charset check: a `taskId` like
/// `"../../../etc/passwd"` must surface as `InvalidPath` (spec §8 scenario
/// 2), not `InvalidId` — the id is well-formed as a path, it just escapes
/// the session directory once resolved. Non-traversing but otherwise
/// illegal ids (stray spaces, unsupported punctuation) still fall through
/// to `validate_id` and come back as `InvalidId`.
pub fn content_path(session_dir: &Path, content_type: &ContentType) -> Result<PathBuf, StoreError> {
    let path = match content_type {
        ContentType::Session => session_dir.join("workflow-session.json"),
        ContentType::Task { task_id } => session_dir.join(".task").join(format!("{task_id}.json")),
        ContentType::Summary { name } => session_dir.join(".summaries").join(format!("{name}.md")),
        ContentType::Context => session_dir.join("context-package.json"),
        ContentType::Review { dimension } => {
            session_dir.join(".review").join(format!("{dimension}.json"))
        }
        ContentType::Plan => session_dir.join("plan.json"),
    };

    let contained = contain(session_dir, &path)?;

    match content_type {
        ContentType::Task { task_id } => validate_id(task_id)?,
        ContentType::Summary { name } => validate_id(name)?,
        ContentType::Review { dimension } => validate_id(dimension)?,
        _ => {}
    }

    Ok(contained)
}

/// Validates that `candidate`, once resolved, still lives inside `root`.
/// This is the path-traversal defense (spec §4.2): every derived path must
/// be validated to start with the session's directory after resolution.
pub fn contain(root: &Path, candidate: &Path) -> Result<PathBuf, StoreError> {
    let normalized = lexically_normalize(candidate);
    let normalized_root = lexically_normalize(root);
    if normalized.starts_with(&normalized_root) {
        Ok(normalized)
    } else {
        Err(StoreError::InvalidPath {
            attempted: candidate.to_path_buf(),
        })
    }
}

/// Normalizes `.`/`..` components lexically without touching the filesystem
/// (the target file may not exist yet, so `fs::canonicalize` isn't usable).
pub fn lexically_normalize(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/paths_tests.rs"]
mod tests;
