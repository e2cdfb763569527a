//! Shared axum application state (spec §4.4).
//!
//! Modeled on `other_examples`' MrScripty-Eidetic `AppState`, which wraps a
//! broadcast sender as `Clone`-able `State` for its handlers; here the
//! Event Bus (§4.3) plays that role instead of a bare `broadcast::Sender`,
//! since subscriber lifecycle (bounded buffer, slow-consumer-drop) is
//! already owned by that type.

use crate::event_bus::EventBus;
use crate::session_store::SessionStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub events: EventBus,
}

impl AppState {
    pub fn new(store: Arc<SessionStore>, events: EventBus) -> Self {
        Self { store, events }
    }
}
