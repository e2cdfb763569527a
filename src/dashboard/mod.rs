//! Dashboard Bridge: WebSocket fan-out plus hook ingress (spec §4.4).

pub mod server;
pub mod state;

pub use server::router;
pub use state::AppState;
