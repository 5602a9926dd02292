//! External text-generation boundary.
//!
//! [`ReplyModel`] is the seam the workflow calls before falling back to the
//! local template path. [`OpenAiModel`] talks to any OpenAI-compatible
//! chat-completions endpoint with SSE streaming.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};

use zen_core::config::UpstreamConfig;

use crate::error::ChatError;
use crate::types::ChatTurn;

/// Incremental text deltas from an upstream model.
pub type DeltaStream = BoxStream<'static, Result<String, ChatError>>;

/// One request to an upstream model.
#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
    /// Leading system instruction, if any.
    pub system: Option<&'a str>,
    pub turns: &'a [ChatTurn],
    /// Overrides the model's configured token limit.
    pub max_tokens: Option<u32>,
}

impl<'a> Prompt<'a> {
    pub fn new(turns: &'a [ChatTurn]) -> Self {
        Self {
            system: None,
            turns,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: &'a str) -> Self {
        self.system = Some(system);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A text-generation service that can answer a conversation.
#[async_trait]
pub trait ReplyModel: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Start generating a reply.
    ///
    /// Errors returned here happen before the request produced anything;
    /// errors inside the stream may come before or after the first delta.
    async fn open(&self, prompt: Prompt<'_>) -> Result<DeltaStream, ChatError>;
}

/// Drain a model's stream into one string.
pub async fn complete(model: &dyn ReplyModel, prompt: Prompt<'_>) -> Result<String, ChatError> {
    let mut deltas = model.open(prompt).await?;
    let mut text = String::new();
    while let Some(delta) = deltas.next().await {
        text.push_str(&delta?);
    }
    Ok(text)
}

// =============================================================================
// OpenAiModel
// =============================================================================

/// OpenAI-compatible chat-completions client.
pub struct OpenAiModel {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiModel {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(config.timeout_secs.max(1)))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &Prompt<'_>) -> Value {
        let mut messages = Vec::with_capacity(prompt.turns.len() + 1);
        if let Some(system) = prompt.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.extend(
            prompt
                .turns
                .iter()
                .map(|t| json!({"role": t.role.as_str(), "content": t.content})),
        );

        json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": prompt.max_tokens.unwrap_or(self.max_tokens),
            "temperature": self.temperature,
            "stream": true,
        })
    }
}

#[async_trait]
impl ReplyModel for OpenAiModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn open(&self, prompt: Prompt<'_>) -> Result<DeltaStream, ChatError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ChatError::MissingCredential)?;

        let url = self.endpoint();
        tracing::info!(url = %url, model = %self.model, turns = prompt.turns.len(), "Calling upstream model");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.request_body(&prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::UpstreamStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        tracing::info!("Upstream model response received");
        Ok(sse_deltas(response.bytes_stream()))
    }
}

// =============================================================================
// SSE decoding
// =============================================================================

/// Meaning of one server-sent-event line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    Delta(String),
    /// Provider error reported inside a successful response.
    Error(String),
    Done,
    Skip,
}

/// Interpret one line of an OpenAI-style SSE body.
pub fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return SseLine::Done;
    }

    let Ok(value) = serde_json::from_str::<Value>(data) else {
        return SseLine::Skip;
    };
    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let message = error["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return SseLine::Error(message);
    }
    match value["choices"][0]["delta"]["content"].as_str() {
        Some(text) if !text.is_empty() => SseLine::Delta(text.to_string()),
        _ => SseLine::Skip,
    }
}

struct SseState<B, E> {
    bytes: BoxStream<'static, Result<B, E>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String, ChatError>>,
    finished: bool,
}

impl<B, E> SseState<B, E> {
    /// Split complete lines out of the buffer. Lines are decoded only once
    /// whole, so multi-byte characters split across chunks survive.
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.accept(&line) {
                return;
            }
        }
    }

    fn flush(&mut self) {
        let rest = std::mem::take(&mut self.buffer);
        if !rest.is_empty() {
            self.accept(&rest);
        }
    }

    /// Returns true once the stream is over: `[DONE]` or a provider error.
    fn accept(&mut self, line: &[u8]) -> bool {
        match parse_sse_line(&String::from_utf8_lossy(line)) {
            SseLine::Delta(delta) => {
                self.pending.push_back(Ok(delta));
                false
            }
            SseLine::Error(message) => {
                self.pending.push_back(Err(ChatError::UpstreamStream(message)));
                self.finished = true;
                self.buffer.clear();
                true
            }
            SseLine::Done => {
                self.finished = true;
                self.buffer.clear();
                true
            }
            SseLine::Skip => false,
        }
    }
}

/// Turn a raw SSE byte stream into text deltas.
pub fn sse_deltas<S, B, E>(bytes: S) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = SseState {
        bytes: bytes.boxed(),
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    st.buffer.extend_from_slice(chunk.as_ref());
                    st.drain_lines();
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(ChatError::UpstreamStream(e.to_string())), st));
                }
                None => {
                    st.finished = true;
                    st.flush();
                }
            }
        }
    })
    .boxed()
}

// =============================================================================
// Tests
// =============================================================================
