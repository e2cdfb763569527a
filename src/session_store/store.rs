//! Session Store: the single entry point over session/task/summary/context/
//! review/plan entities (spec §4.2).

use super::atomic::{read_json, update_json, write_json_atomic};
use super::paths::{contain, content_path, location_dir, session_dir, validate_id};
use super::types::{
    ContentType, Event, EventType, ListLocation, SessionHeader, SessionLocation, SessionStatus,
};
use crate::errors::StoreError;
use crate::event_bus::EventBus;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Ties together path derivation, atomic I/O, and event emission for one
/// project's state root.
pub struct SessionStore {
    state_root: PathBuf,
    events: EventBus,
}

fn location_of(list_location: ListLocation) -> Result<SessionLocation, StoreError> {
    match list_location {
        ListLocation::Active => Ok(SessionLocation::Active),
        ListLocation::Archived => Ok(SessionLocation::Archived),
        ListLocation::LitePlan => Ok(SessionLocation::LitePlanRoot),
        ListLocation::LiteFix => Ok(SessionLocation::LiteFixRoot),
        ListLocation::All => Err(StoreError::InvalidId {
            id: "all".to_string(),
        }),
    }
}

impl SessionStore {
    pub fn new(state_root: PathBuf, events: EventBus) -> Self {
        Self { state_root, events }
    }

    /// Exposes the store's Event Bus so tool handlers outside the content-type
    /// addressing scheme (e.g. `write_file`) can publish their own events.
    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    fn publish(&self, event_type: EventType, session_id: &str, entity_id: Option<String>, payload: Value) {
        self.events.publish(Event {
            event_type,
            session_id: session_id.to_string(),
            entity_id,
            payload,
            timestamp: Utc::now(),
        });
    }

    /// Finds which location currently holds `session_id`, searching active,
    /// lite-plan, and lite-fix roots (archived sessions are not addressable
    /// by plain operations other than `list`).
    fn locate_session(&self, session_id: &str) -> Result<(ListLocation, PathBuf), StoreError> {
        validate_id(session_id)?;
        for candidate in [ListLocation::Active, ListLocation::LitePlan, ListLocation::LiteFix] {
            let dir = session_dir(&self.state_root, candidate, session_id);
            if dir.is_dir() {
                return Ok((candidate, dir));
            }
        }
        Err(StoreError::NotFound {
            what: session_id.to_string(),
        })
    }

    /// Creates a new session directory under the location implied by
    /// `session_type`, writes its header, and creates the empty subdirs.
    pub fn init(
        &self,
        session_id: &str,
        session_type: super::types::SessionType,
        metadata: HashMap<String, Value>,
    ) -> Result<Value, StoreError> {
        validate_id(session_id)?;

        let list_location = match session_type {
            super::types::SessionType::LitePlan => ListLocation::LitePlan,
            super::types::SessionType::LiteFix => ListLocation::LiteFix,
            _ => ListLocation::Active,
        };
        let dir = session_dir(&self.state_root, list_location, session_id);
        if dir.is_dir() {
            return Err(StoreError::AlreadyExists {
                what: session_id.to_string(),
            });
        }

        let header = SessionHeader {
            session_id: session_id.to_string(),
            session_type,
            status: SessionStatus::Initialized,
            location: location_of(list_location)?,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            archived_at: None,
            metadata,
        };

        std::fs::create_dir_all(dir.join(".task")).map_err(|e| StoreError::IoError {
            path: dir.clone(),
            source: e,
        })?;
        std::fs::create_dir_all(dir.join(".summaries")).map_err(|e| StoreError::IoError {
            path: dir.clone(),
            source: e,
        })?;
        std::fs::create_dir_all(dir.join(".process")).map_err(|e| StoreError::IoError {
            path: dir.clone(),
            source: e,
        })?;

        let header_value = serde_json::to_value(&header).map_err(|e| StoreError::ParseError {
            path: dir.join("workflow-session.json"),
            message: e.to_string(),
        })?;
        let header_path = content_path(&dir, &ContentType::Session)?;
        write_json_atomic(&header_path, &header_value)?;

        self.publish(EventType::SessionCreated, session_id, None, header_value.clone());
        Ok(header_value)
    }

    /// Returns parsed JSON for the file addressed by `content_type`.
    pub fn read(&self, session_id: &str, content_type: &ContentType) -> Result<Value, StoreError> {
        let (_, dir) = self.locate_session(session_id)?;
        let path = content_path(&dir, content_type)?;
        read_json(&path)
    }

    /// Create-or-replace the file addressed by `content_type`.
    pub fn write(
        &self,
        session_id: &str,
        content_type: &ContentType,
        content: &Value,
    ) -> Result<Value, StoreError> {
        let (_, dir) = self.locate_session(session_id)?;
        let path = content_path(&dir, content_type)?;
        let existed_before = path.is_file();
        write_json_atomic(&path, content)?;

        let entity_id = entity_id_for(content_type);
        let event_type = event_type_for_write(content_type, existed_before);
        self.publish(event_type, session_id, entity_id, content.clone());
        Ok(content.clone())
    }

    /// Shallow-merges `patch` over the existing file addressed by
    /// `content_type`; fails if the target does not already exist.
    pub fn update(
        &self,
        session_id: &str,
        content_type: &ContentType,
        patch: &Value,
    ) -> Result<Value, StoreError> {
        let (_, dir) = self.locate_session(session_id)?;
        let path = content_path(&dir, content_type)?;
        let merged = update_json(&path, patch)?;

        let entity_id = entity_id_for(content_type);
        let event_type = event_type_for_update(content_type);
        self.publish(event_type, session_id, entity_id, merged.clone());
        Ok(merged)
    }

    /// Moves a session's directory to the archived root, optionally
    /// stamping `status=completed, archivedAt=now` on its header first.
    pub fn archive(&self, session_id: &str, update_status: bool) -> Result<Value, StoreError> {
        let (current_location, dir) = self.locate_session(session_id)?;
        if current_location == ListLocation::Archived {
            return Err(StoreError::AlreadyExists {
                what: session_id.to_string(),
            });
        }

        if update_status {
            let header_path = content_path(&dir, &ContentType::Session)?;
            let mut header: SessionHeader = serde_json::from_value(read_json(&header_path)?)
                .map_err(|e| StoreError::ParseError {
                    path: header_path.clone(),
                    message: e.to_string(),
                })?;
            header.status = SessionStatus::Completed;
            header.archived_at = Some(Utc::now());
            header.updated_at = Utc::now();
            let value = serde_json::to_value(&header).map_err(|e| StoreError::ParseError {
                path: header_path.clone(),
                message: e.to_string(),
            })?;
            write_json_atomic(&header_path, &value)?;
        }

        let destination = session_dir(&self.state_root, ListLocation::Archived, session_id);
        if destination.is_dir() {
            return Err(StoreError::AlreadyExists {
                what: session_id.to_string(),
            });
        }
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::rename(&dir, &destination).map_err(|e| StoreError::IoError {
            path: destination.clone(),
            source: e,
        })?;

        let payload = json!({ "sessionId": session_id, "archivedTo": destination });
        self.publish(EventType::SessionArchived, session_id, None, payload.clone());
        Ok(payload)
    }

    /// Scans `location` for session directories, optionally reading each
    /// header for its metadata. Missing directories yield an empty list.
    pub fn list(&self, location: ListLocation, include_metadata: bool) -> Result<Value, StoreError> {
        let dir = location_dir(&self.state_root, location);
        if !dir.is_dir() {
            return Ok(json!([]));
        }

        let mut sessions = Vec::new();
        let entries = std::fs::read_dir(&dir).map_err(|e| StoreError::IoError {
            path: dir.clone(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::IoError {
                path: dir.clone(),
                source: e,
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            let session_id = entry.file_name().to_string_lossy().to_string();

            if include_metadata {
                let header_path = content_path(&entry.path(), &ContentType::Session)?;
                match read_json(&header_path) {
                    Ok(header) => sessions.push(header),
                    Err(_) => sessions.push(json!({ "sessionId": session_id })),
                }
            } else {
                sessions.push(json!({ "sessionId": session_id }));
            }
        }
        Ok(Value::Array(sessions))
    }
}

fn entity_id_for(content_type: &ContentType) -> Option<String> {
    match content_type {
        ContentType::Task { task_id } => Some(task_id.clone()),
        ContentType::Summary { name } => Some(name.clone()),
        ContentType::Review { dimension } => Some(dimension.clone()),
        _ => None,
    }
}

/// Picks the event type a `write` emits, content-type-appropriate per
/// SPEC_FULL.md §9: a session header mutation is `SESSION_UPDATED`; a task
/// file that did not previously exist is `TASK_CREATED` rather than
/// `TASK_UPDATED`; every other content type (context, summary, review,
/// plan) uses `TASK_UPDATED` as the closest generic "entity mutated within
/// a session" event, since the wire format names no dedicated type for them.
fn event_type_for_write(content_type: &ContentType, existed_before: bool) -> EventType {
    match content_type {
        ContentType::Session => EventType::SessionUpdated,
        ContentType::Task { .. } if !existed_before => EventType::TaskCreated,
        _ => EventType::TaskUpdated,
    }
}

/// Picks the event type an `update` emits. `update` always targets an
/// existing file (it fails with `NotFound` otherwise), so a task mutation
/// here is always `TASK_UPDATED`, never `TASK_CREATED`.
fn event_type_for_update(content_type: &ContentType) -> EventType {
    match content_type {
        ContentType::Session => EventType::SessionUpdated,
        _ => EventType::TaskUpdated,
    }
}

/// Guards a filesystem `path` against escaping `project_root`, used by the
/// tool handlers that accept a raw path parameter (spec §4.5).
pub fn assert_within_project(project_root: &Path, path: &Path) -> Result<PathBuf, StoreError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    };
    contain(project_root, &absolute)
}

/// Atomic create-or-replace of a plain-text file, used by the `write_file`
/// tool (spec §4.5) which operates outside the Session Store's content-type
/// addressing.
pub fn atomic_write_text(path: &Path, content: &str) -> Result<(), StoreError> {
    super::atomic::write_atomic(path, content.as_bytes())
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
