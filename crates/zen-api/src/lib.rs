//! Zen API crate - axum HTTP server, route handlers, frame streaming.
//!
//! Serves the streaming chat endpoint plus diagnostics and health checks.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
