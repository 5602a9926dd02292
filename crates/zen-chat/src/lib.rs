//! Zen conversational responder.
//!
//! Classifies a short utterance into an intent, picks a templated reply
//! that varies with time of day and season, validates it, and streams it
//! to the client one character per frame.

pub mod clock;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod stream;
pub mod types;
pub mod upstream;
pub mod workflow;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{Draw, ResponseEngine};
pub use error::ChatError;
pub use stream::{forward, ForwardOutcome, Frame, FrameEncoder, FrameStream};
pub use types::{ChatRequest, ChatTurn, Intent, Role, Season, TimeContext, ValidatedReply};
pub use upstream::{OpenAiModel, Prompt, ReplyModel};
pub use workflow::ChatWorkflow;
