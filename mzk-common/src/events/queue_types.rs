//! Queue type definitions
//!
//! Supporting types for queue configuration and change notifications.

use serde::{Deserialize, Serialize};

/// Repeat mode of the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop after the last track
    #[default]
    None,
    /// Replay the current track on end-of-stream
    One,
    /// Wrap around to the first track after the last one
    All,
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepeatMode::None => write!(f, "none"),
            RepeatMode::One => write!(f, "one"),
            RepeatMode::All => write!(f, "all"),
        }
    }
}

/// Why the queue changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum QueueChangeTrigger {
    /// Tracks appended or inserted
    UserEnqueue,
    /// Tracks removed or queue cleared
    UserDequeue,
    /// Queue replaced with a new play session
    Replaced,
    /// Cursor moved (next, previous, position change)
    Navigation,
    /// Shuffle or repeat toggled
    ModeChange,
    /// Restored from a persisted snapshot
    Restore,
}

impl std::fmt::Display for QueueChangeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueChangeTrigger::UserEnqueue => write!(f, "UserEnqueue"),
            QueueChangeTrigger::UserDequeue => write!(f, "UserDequeue"),
            QueueChangeTrigger::Replaced => write!(f, "Replaced"),
            QueueChangeTrigger::Navigation => write!(f, "Navigation"),
            QueueChangeTrigger::ModeChange => write!(f, "ModeChange"),
            QueueChangeTrigger::Restore => write!(f, "Restore"),
        }
    }
}
