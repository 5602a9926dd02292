//! Error types for the chat workflow.

/// Errors from the upstream model path.
///
/// None of these reach a chat client: the workflow logs them and falls back
/// to the local template path.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("upstream API key is not configured")]
    MissingCredential,
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("upstream stream error: {0}")]
    UpstreamStream(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Upstream(err.to_string())
    }
}
