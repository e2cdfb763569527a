//! Typed headers for sessions, tasks, and the events the store emits.
//!
//! Per the spec's design note on "dynamic-typed anything-goes JSON": headers
//! are plain typed structs (teacher's `domain::types.rs` newtype/enum idiom);
//! free-form bodies stay as `serde_json::Value` and round-trip untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    Workflow,
    LitePlan,
    LiteFix,
    Review,
    ReviewCycle,
    TestFix,
    Fix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initialized,
    Active,
    Completed,
    Archived,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionLocation {
    Active,
    Archived,
    LitePlanRoot,
    LiteFixRoot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixResult {
    Fixed,
    Failed,
    Pending,
}

/// Header fields of `workflow-session.json`. `metadata` stays free-form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHeader {
    pub session_id: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub status: SessionStatus,
    pub location: SessionLocation,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// A single finding inside a `ReviewFindings` document for one dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewFinding {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "fixStatus")]
    pub fix_status: Option<FixResult>,
}

/// Event type enum (spec §3). `TASK_CREATED`/`FILE_WRITTEN` are reserved in
/// the source but reachable here (see SPEC_FULL.md §9 decision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "SESSION_CREATED")]
    SessionCreated,
    #[serde(rename = "SESSION_UPDATED")]
    SessionUpdated,
    #[serde(rename = "SESSION_ARCHIVED")]
    SessionArchived,
    #[serde(rename = "TASK_CREATED")]
    TaskCreated,
    #[serde(rename = "TASK_UPDATED")]
    TaskUpdated,
    #[serde(rename = "FILE_WRITTEN")]
    FileWritten,
}

/// Emitted by the Session Store on every successful mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

/// The content type addressed by a Session Store operation, paired with
/// whatever path parameters it needs to resolve to a concrete file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    Session,
    Task { task_id: String },
    Summary { name: String },
    Context,
    Review { dimension: String },
    Plan,
}

/// Where a `list` operation should scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLocation {
    Active,
    Archived,
    LitePlan,
    LiteFix,
    All,
}

/// Uniform result envelope returned by every Session Store operation
/// (spec §4.2: "each returns `{success, result}` or `{success:false, error}`").
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StoreResult {
    Ok { success: bool, result: Value },
    Err { success: bool, error: String },
}

impl StoreResult {
    pub fn ok(result: Value) -> Self {
        Self::Ok {
            success: true,
            result,
        }
    }

    pub fn err(kind: &str) -> Self {
        Self::Err {
            success: false,
            error: kind.to_string(),
        }
    }
}
