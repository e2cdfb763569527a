//! HTTP/WebSocket surface for the Dashboard Bridge (spec §4.4, §6).
//!
//! Grounded in `other_examples`' MrScripty-Eidetic manifest (axum `ws`
//! feature, tower, tower-http `cors`) since the teacher itself has no
//! HTTP/WebSocket framework anywhere in its dependency tree — its own
//! networking is raw TCP/Unix-socket newline-JSON in `host/server.rs` and
//! `session_daemon/server.rs`. The per-connection writer task here plays
//! the same role as that module's `run_unix_server` read/write loop,
//! adapted to an axum `WebSocket` split sink/stream.

use super::state::AppState;
use crate::session_store::types::{ContentType, Event, EventType, ListLocation};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tower_http::cors::{Any, CorsLayer};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/hook", post(hook_handler))
        .route("/api/status/all", get(status_all_handler))
        .route("/api/session-detail", get(session_detail_handler))
        .layer(cors)
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drains an Event Bus subscription onto the socket; unsubscribes cleanly
/// on read error, write error, or peer close (spec §4.4, §5 cancellation).
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut subscription = state.events.subscribe();

    loop {
        tokio::select! {
            event = subscription.receiver.recv() => {
                let Some(event) = event else { break };
                let frame = match serde_json::to_string(&event) {
                    Ok(frame) => frame,
                    Err(_) => continue,
                };
                if sink.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(_)) => continue,
                    _ => break,
                }
            }
        }
    }

    subscription.cancel();
}

#[derive(Debug, Deserialize)]
struct HookBody {
    #[serde(rename = "type")]
    event_type: EventType,
    #[serde(default, rename = "sessionId")]
    session_id: Option<String>,
    #[serde(default, rename = "entityId")]
    entity_id: Option<String>,
    #[serde(default)]
    payload: Value,
}

/// Fire-and-forget hook ingress. Must return within the <100ms p99 budget
/// regardless of subscriber count or health — `EventBus::publish` is a
/// non-blocking `try_send` fan-out, so this handler never awaits delivery.
async fn hook_handler(State(state): State<AppState>, Json(body): Json<HookBody>) -> impl IntoResponse {
    let event = Event {
        event_type: body.event_type,
        session_id: body.session_id.unwrap_or_default(),
        entity_id: body.entity_id,
        payload: body.payload,
        timestamp: Utc::now(),
    };
    state.events.publish(event);
    StatusCode::OK.into_response()
}

async fn status_all_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut snapshot = HashMap::new();
    for (key, location) in [
        ("active", ListLocation::Active),
        ("archived", ListLocation::Archived),
        ("lite-plan", ListLocation::LitePlan),
        ("lite-fix", ListLocation::LiteFix),
    ] {
        match state.store.list(location, true) {
            Ok(sessions) => {
                snapshot.insert(key, sessions);
            }
            Err(err) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": err.kind() })),
                )
                    .into_response();
            }
        }
    }
    Json(snapshot).into_response()
}

#[derive(Debug, Deserialize)]
struct SessionDetailQuery {
    path: String,
    #[serde(rename = "type")]
    facet: String,
}

/// Lazily loads one facet of a session for dashboard hydration
/// (`?path=<sessionId>&type=tasks|context|summary|impl-plan|review`).
async fn session_detail_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionDetailQuery>,
) -> impl IntoResponse {
    let content_type = match query.facet.as_str() {
        "context" => ContentType::Context,
        "impl-plan" => ContentType::Plan,
        "tasks" => ContentType::Task {
            task_id: query.path.clone(),
        },
        "summary" => ContentType::Summary {
            name: query.path.clone(),
        },
        "review" => ContentType::Review {
            dimension: query.path.clone(),
        },
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    match state.store.read(&query.path, &content_type) {
        Ok(value) => Json(value).into_response(),
        Err(err) if err.kind() == "NotFound" => StatusCode::NOT_FOUND.into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.kind() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;
    use crate::session_store::SessionStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn test_state() -> (tempfile::TempDir, AppState) {
        let dir = tempdir().unwrap();
        let bus = EventBus::new(16);
        let store = Arc::new(SessionStore::new(dir.path().to_path_buf(), bus.clone()));
        (dir, AppState::new(store, bus))
    }

    #[tokio::test]
    async fn hook_with_valid_body_returns_200() {
        let (_dir, state) = test_state();
        let app = router(state);

        let body = json!({"type": "SESSION_UPDATED", "sessionId": "WFS-A"}).to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/hook")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn hook_with_malformed_body_returns_400() {
        let (_dir, state) = test_state();
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/hook")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unmatched_path_returns_404() {
        let (_dir, state) = test_state();
        let app = router(state);

        let response = app
            .oneshot(Request::builder().uri("/not-a-route").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_all_returns_empty_lists_for_fresh_project() {
        let (_dir, state) = test_state();
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/status/all")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
