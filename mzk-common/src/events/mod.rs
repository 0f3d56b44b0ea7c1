//! Event types for the Muzika event system
//!
//! Provides the typed player event enum and the EventBus used by the
//! queue and playback engine to notify observers.

mod queue_types;

pub use queue_types::{QueueChangeTrigger, RepeatMode};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Player event types
///
/// Every observable property of the engine has a dedicated variant. Property
/// events are only emitted when the value actually changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// The engine's intent to play changed
    PlayingChanged {
        playing: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Pipeline started or finished buffering
    BufferingChanged {
        buffering: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current stream was detected as live (or a new track reset the flag)
    IsLiveChanged {
        is_live: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback position moved
    PositionChanged {
        position_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Duration of the current stream became known
    DurationChanged {
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new track metadata snapshot was published (or cleared)
    ///
    /// Observers fetch the snapshot itself from the player; `generation`
    /// identifies the track change that produced it.
    CurrentChanged {
        /// Track identifier of the new snapshot, None when playback stopped
        video_id: Option<String>,
        /// Track change generation that produced this snapshot
        generation: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A seek completed
    ///
    /// Emitted after every applied seek, including deferred ones, so that
    /// scrubbers can resynchronise.
    Seeked {
        position_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue contents, cursor or modes changed
    QueueChanged {
        /// Number of entries in the (possibly shuffled) current order
        length: usize,
        /// Cursor into the current order
        position: Option<usize>,
        /// Entry under the cursor
        current_entry: Option<Uuid>,
        shuffle: bool,
        repeat: RepeatMode,
        can_play_previous: bool,
        can_play_next: bool,
        /// Why the queue changed
        trigger: QueueChangeTrigger,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback of the current track failed
    ///
    /// Covers resolution errors (catalog fetch, no playable format) and
    /// runtime errors reported by the pipeline.
    PlaybackError {
        video_id: Option<String>,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Event type name (matches the serde tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::PlayingChanged { .. } => "PlayingChanged",
            PlayerEvent::BufferingChanged { .. } => "BufferingChanged",
            PlayerEvent::IsLiveChanged { .. } => "IsLiveChanged",
            PlayerEvent::PositionChanged { .. } => "PositionChanged",
            PlayerEvent::DurationChanged { .. } => "DurationChanged",
            PlayerEvent::CurrentChanged { .. } => "CurrentChanged",
            PlayerEvent::Seeked { .. } => "Seeked",
            PlayerEvent::QueueChanged { .. } => "QueueChanged",
            PlayerEvent::PlaybackError { .. } => "PlaybackError",
        }
    }
}

/// Per-engine event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use mzk_common::events::{EventBus, PlayerEvent};
///
/// let event_bus = EventBus::new(64);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(PlayerEvent::Seeked {
///     position_ms: 42_000,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(PlayerEvent::Seeked { position_ms: 42_000, .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
