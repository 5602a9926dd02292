//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use zen_chat::ChatWorkflow;
use zen_core::config::ZenConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Nothing
/// here is mutated per request.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<ZenConfig>,
    /// Reply pipeline (engine, encoder, optional upstream model).
    pub workflow: Arc<ChatWorkflow>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Build state with a workflow derived from `config`.
    pub fn new(config: ZenConfig) -> Self {
        let workflow = ChatWorkflow::from_config(&config);
        Self::with_workflow(config, workflow)
    }

    /// Build state around an already-configured workflow.
    pub fn with_workflow(config: ZenConfig, workflow: ChatWorkflow) -> Self {
        Self {
            config: Arc::new(config),
            workflow: Arc::new(workflow),
            start_time: Instant::now(),
        }
    }
}
