//! Line-oriented text streaming protocol.
//!
//! Each frame is `0:<json string>\n`. A stream opens with the empty
//! preamble `0:""\n` and then carries one frame per character (mock path)
//! or per upstream text delta. There is no terminator frame: the end of
//! the message is the end of the stream.

use std::fmt;
use std::time::Duration;

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;

use crate::upstream::DeltaStream;

/// Channel tag for text payloads.
pub const TEXT_CHANNEL: u8 = 0;

/// A one-shot, paced sequence of frames.
pub type FrameStream = BoxStream<'static, Frame>;

// =============================================================================
// Frame
// =============================================================================

/// One complete wire line, including the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(String);

impl Frame {
    /// The empty-payload frame that opens every stream.
    pub fn preamble() -> Self {
        Self::text("")
    }

    /// A text frame with a JSON-escaped payload.
    pub fn text(payload: &str) -> Self {
        Frame(format!(
            "{}:{}\n",
            TEXT_CHANNEL,
            serde_json::Value::from(payload)
        ))
    }

    pub fn from_char(c: char) -> Self {
        let mut buf = [0u8; 4];
        Self::text(c.encode_utf8(&mut buf))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unpaced frame sequence for `reply`: the preamble, then one frame per
/// character in order, whitespace and newlines included.
pub fn frames(reply: &str) -> impl Iterator<Item = Frame> + '_ {
    std::iter::once(Frame::preamble()).chain(reply.chars().map(Frame::from_char))
}

// =============================================================================
// FrameEncoder
// =============================================================================

/// Turns finished replies and upstream deltas into frame streams.
#[derive(Debug, Clone, Copy)]
pub struct FrameEncoder {
    char_delay: Duration,
}

impl FrameEncoder {
    pub fn new(char_delay: Duration) -> Self {
        Self { char_delay }
    }

    /// Typewriter stream for a finished reply.
    ///
    /// The preamble is yielded immediately; every character frame waits
    /// `char_delay` first. The stream ends right after the last character.
    /// Delays only run while the stream is polled, so dropping it stops
    /// emission at the next suspension point.
    pub fn encode(&self, reply: &str) -> FrameStream {
        let delay = self.char_delay;
        let chars: Vec<char> = reply.chars().collect();

        let body = stream::iter(chars).then(move |c| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Frame::from_char(c)
        });

        stream::once(future::ready(Frame::preamble()))
            .chain(body)
            .boxed()
    }

    /// Wrap upstream text deltas in the same wire format, unpaced.
    ///
    /// An upstream error after the stream has started is logged and ends
    /// the stream; empty deltas are skipped.
    pub fn relay(&self, deltas: DeltaStream) -> FrameStream {
        let body = deltas
            .take_while(|item| {
                if let Err(e) = item {
                    tracing::warn!(error = %e, "Upstream stream ended with an error");
                }
                future::ready(item.is_ok())
            })
            .filter_map(|item| {
                future::ready(
                    item.ok()
                        .filter(|delta| !delta.is_empty())
                        .map(|delta| Frame::text(&delta)),
                )
            });

        stream::once(future::ready(Frame::preamble()))
            .chain(body)
            .boxed()
    }
}

// =============================================================================
// Transport pump
// =============================================================================

/// Summary of one [`forward`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOutcome {
    /// Frames accepted by the transport.
    pub frames_sent: usize,
    /// False when the receiver went away before the stream ended.
    pub completed: bool,
}

/// Pump frames into a transport channel until the stream ends or the
/// receiving side is closed. Each frame is sent whole; a closed receiver
/// is not an error.
pub async fn forward(mut frames: FrameStream, tx: mpsc::Sender<Frame>) -> ForwardOutcome {
    let mut frames_sent = 0;

    loop {
        let frame = tokio::select! {
            biased;
            _ = tx.closed() => break,
            next = frames.next() => match next {
                Some(frame) => frame,
                None => {
                    return ForwardOutcome {
                        frames_sent,
                        completed: true,
                    }
                }
            },
        };

        if tx.send(frame).await.is_err() {
            break;
        }
        frames_sent += 1;
    }

    tracing::debug!(frames_sent, "Client closed the stream; emission stopped");
    ForwardOutcome {
        frames_sent,
        completed: false,
    }
}

// =============================================================================
// Tests
// =============================================================================
