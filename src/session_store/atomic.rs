//! Atomic write + read-merge-write helpers.
//!
//! The temp-file-then-rename protocol is lifted directly from the teacher's
//! `session_store::save_snapshot` / `event_store::file_store::save_snapshot`.
//! `update_json`'s read-merge-write sequence holds no lock across the read
//! and the write: per spec §4.2/§5, concurrent updates to the same file are
//! last-write-wins by design, and a held lock across the sequence would
//! turn that into a serialized-but-still-overwriting queue while giving a
//! false impression of safety. The teacher's `FileEventStore::commit` does
//! hold `file.lock_exclusive()` across its own read-merge-write, but that
//! guards a shared append-only log with a different consistency contract;
//! it is not carried forward here (see DESIGN.md).

use crate::errors::StoreError;
use serde_json::Value;
use std::fs;
use std::path::Path;

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::IoError {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `content` to `path` atomically: write to a sibling `.tmp` file,
/// flush, then rename over the target. Creates parent directories first.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });
    fs::write(&tmp_path, content).map_err(|e| io_err(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

pub fn write_json_atomic(path: &Path, value: &Value) -> Result<(), StoreError> {
    let content =
        serde_json::to_vec_pretty(value).map_err(|e| StoreError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    write_atomic(path, &content)
}

pub fn read_json(path: &Path) -> Result<Value, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound {
                what: path.display().to_string(),
            }
        } else {
            io_err(path, e)
        }
    })?;
    serde_json::from_str(&content).map_err(|e| StoreError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Reads the JSON at `path`, shallow-merges `patch`'s top-level keys over
/// it, and writes the result back atomically. No lock is held across the
/// read and the write: two concurrent callers on the same path each read,
/// merge, and write independently, and the later `rename` wins — last-write-
/// wins with no torn writes, per the spec's explicit concurrency contract.
pub fn update_json(path: &Path, patch: &Value) -> Result<Value, StoreError> {
    let existing = read_json(path)?;
    let merged = shallow_merge(existing, patch.clone());
    write_json_atomic(path, &merged)?;
    Ok(merged)
}

/// Shallow top-level merge: keys in `patch` replace keys in `base`; keys
/// only present in `base` are preserved. Arrays and nested objects in
/// `patch` replace the corresponding value wholesale (spec §4.2).
pub fn shallow_merge(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base_map), Value::Object(patch_map)) => {
            for (k, v) in patch_map {
                base_map.insert(k, v);
            }
            Value::Object(base_map)
        }
        (_, patch) => patch,
    }
}
