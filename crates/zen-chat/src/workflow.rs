//! Chat workflow: central coordinator wiring the engine, encoder, and the
//! optional upstream model.
//!
//! Every request produces some streamed reply. A configured model is tried
//! first; any failure before output begins falls back to the template path.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future;
use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;

use zen_core::config::{EngineConfig, StreamConfig, ZenConfig};

use crate::clock::{Clock, SystemClock};
use crate::corpus::SYSTEM_PROMPT;
use crate::engine::ResponseEngine;
use crate::error::ChatError;
use crate::stream::{FrameEncoder, FrameStream};
use crate::types::{last_content, ChatTurn, ValidatedReply};
use crate::upstream::{self, DeltaStream, OpenAiModel, Prompt, ReplyModel};

/// Token limit for the non-streaming diagnostics call.
pub const DIAGNOSTIC_MAX_TOKENS: u32 = 50;

/// Request-independent pipeline shared by all handlers.
pub struct ChatWorkflow {
    engine: ResponseEngine,
    encoder: FrameEncoder,
    model: Option<Arc<dyn ReplyModel>>,
    clock: Arc<dyn Clock>,
    thinking_delay: Duration,
    rng: Mutex<StdRng>,
}

impl ChatWorkflow {
    /// Template-only workflow on the system clock with an OS-seeded rng.
    pub fn new(engine: &EngineConfig, stream: &StreamConfig) -> Self {
        Self {
            engine: ResponseEngine::new(engine),
            encoder: FrameEncoder::new(Duration::from_millis(stream.char_delay_ms)),
            model: None,
            clock: Arc::new(SystemClock),
            thinking_delay: Duration::from_millis(stream.thinking_delay_ms),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Build from full configuration, attaching the OpenAI model unless mock
    /// mode applies.
    pub fn from_config(config: &ZenConfig) -> Self {
        let workflow = Self::new(&config.engine, &config.stream);
        if config.upstream.use_mock() {
            tracing::info!("Using mock mode");
            workflow
        } else {
            workflow.with_model(Arc::new(OpenAiModel::new(&config.upstream)))
        }
    }

    pub fn with_model(mut self, model: Arc<dyn ReplyModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Make template selection reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// True when no upstream model is attached.
    pub fn is_mock(&self) -> bool {
        self.model.is_none()
    }

    /// Produce the frame stream for a conversation.
    ///
    /// Never fails: upstream errors are logged and answered from templates.
    /// The upstream path is only taken once it has produced some text.
    pub async fn respond(&self, turns: &[ChatTurn]) -> FrameStream {
        if let Some(model) = &self.model {
            let prompt = Prompt::new(turns).with_system(SYSTEM_PROMPT);
            let opened = match model.open(prompt).await {
                Ok(mut deltas) => first_delta(&mut deltas)
                    .await
                    .map(|first| stream::once(future::ready(Ok(first))).chain(deltas).boxed()),
                Err(e) => Err(e),
            };
            match opened {
                Ok(deltas) => return self.encoder.relay(deltas),
                Err(e) => {
                    tracing::error!(model = model.name(), error = %e, "Upstream model failed");
                    tracing::info!("Falling back to mock mode due to error");
                }
            }
        }
        self.mock_response(turns).await
    }

    /// Template path: thinking delay, generate and validate, then pace.
    pub async fn mock_response(&self, turns: &[ChatTurn]) -> FrameStream {
        if !self.thinking_delay.is_zero() {
            tokio::time::sleep(self.thinking_delay).await;
        }
        let outcome = self.compose(last_content(turns));
        self.encoder.encode(&outcome.reply)
    }

    /// Generate a validated reply for one utterance at the clock's time.
    pub fn compose(&self, utterance: &str) -> ValidatedReply {
        let now = self.clock.now();
        let outcome = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            self.engine.generate_validated(utterance, &now, &mut *rng)
        };

        tracing::info!(
            intent = %outcome.intent,
            time_context = %ResponseEngine::time_context(&now),
            season = %ResponseEngine::season(&now),
            attempts = outcome.attempts,
            valid = outcome.valid,
            reply = %outcome.reply,
            "Generated zen response"
        );
        outcome
    }

    /// Non-streaming upstream call, used by the diagnostics endpoint.
    ///
    /// Sends the bare conversation with a small token limit and no system
    /// instruction.
    pub async fn complete(&self, turns: &[ChatTurn]) -> Result<String, ChatError> {
        let model = self.model.as_ref().ok_or(ChatError::MissingCredential)?;
        let prompt = Prompt::new(turns).with_max_tokens(DIAGNOSTIC_MAX_TOKENS);
        upstream::complete(model.as_ref(), prompt).await
    }
}

/// Wait for the first non-empty delta. An error or an exhausted stream
/// before any text counts as an upstream failure.
async fn first_delta(deltas: &mut DeltaStream) -> Result<String, ChatError> {
    while let Some(item) = deltas.next().await {
        let delta = item?;
        if !delta.is_empty() {
            return Ok(delta);
        }
    }
    Err(ChatError::UpstreamStream("stream ended before any text".to_string()))
}

// =============================================================================
// Tests
// =============================================================================
