//! Media pipeline abstraction
//!
//! The engine drives an external media pipeline through [`Pipeline`] and
//! receives its asynchronous messages over a [`PipelineBus`]. Messages are
//! produced on whatever thread the pipeline runs on and consumed by a
//! single engine task, which keeps handling serialized.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// Pipeline state ladder (lowest to highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Null,
    Ready,
    Paused,
    Playing,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Null => "NULL",
            PipelineState::Ready => "READY",
            PipelineState::Paused => "PAUSED",
            PipelineState::Playing => "PLAYING",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of a state change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeReturn {
    Success,
    /// Change will complete later (AsyncDone follows)
    Async,
    /// Live source: the pipeline cannot preroll
    NoPreroll,
    Failure,
}

/// Message posted by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineMessage {
    EndOfStream,
    Error { message: String, debug: Option<String> },
    ClockLost,
    /// Buffer fill level, 0..=100
    Buffering { percent: u8 },
    AsyncDone,
}

/// Media pipeline driven by the engine
///
/// Implementations must be callable from any task; every method is
/// synchronous and expected to return promptly.
pub trait Pipeline: Send + Sync {
    fn set_state(&self, state: PipelineState) -> StateChangeReturn;

    fn current_state(&self) -> PipelineState;

    /// Point the source at a new stream
    fn set_uri(&self, uri: &str);

    /// Flushing seek; returns false if the pipeline rejected it
    fn seek(&self, position_ms: u64) -> bool;

    fn query_position(&self) -> Option<u64>;

    fn query_duration(&self) -> Option<u64>;

    fn set_volume(&self, volume: f64);
}

/// Sending half used by pipeline implementations to post messages
#[derive(Debug, Clone)]
pub struct PipelineBus {
    tx: mpsc::UnboundedSender<PipelineMessage>,
}

impl PipelineBus {
    /// Create a bus and the receiver the engine consumes
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PipelineMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Post a message; silently dropped once the engine has shut down
    pub fn post(&self, message: PipelineMessage) {
        if self.tx.send(message).is_err() {
            debug!("Pipeline message dropped: engine gone");
        }
    }
}
