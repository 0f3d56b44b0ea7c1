//! Observable engine state
//!
//! Holds the flags and counters the presentation layer observes (playing,
//! buffering, is_live, position, duration, volume) together with the two
//! pending seek slots. Every setter emits the matching [`PlayerEvent`] only
//! when the value actually changes.

use crate::catalog::{QueueSettings, Song};
use crate::playback::negotiate::NegotiatedFormat;
use crate::playback::queue::QueueEntry;
use mzk_common::events::{EventBus, PlayerEvent};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Immutable description of the track being played
///
/// Replaced wholesale on every track change, never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub song: Arc<Song>,
    pub format: NegotiatedFormat,
    pub entry: QueueEntry,
    pub settings: QueueSettings,
}

impl TrackMetadata {
    pub fn video_id(&self) -> &str {
        &self.song.video_id
    }
}

/// Point-in-time copy of the observable flags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub playing: bool,
    pub buffering: bool,
    pub is_live: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    /// 0.0..=1.0
    pub volume: f64,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            playing: false,
            buffering: false,
            is_live: false,
            position_ms: 0,
            duration_ms: 0,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Default)]
struct StateInner {
    status: PlayerStatus,
    /// Seek requested while buffering; runs once buffering finishes
    deferred_seek: Option<u64>,
    /// Position restored from a saved session, applied to the next track
    seek_to: Option<u64>,
}

/// Engine state shared between the transport API and the event handlers
pub struct EngineState {
    inner: RwLock<StateInner>,
    events: EventBus,
}

impl EngineState {
    pub fn new(events: EventBus) -> Self {
        Self {
            inner: RwLock::new(StateInner::default()),
            events,
        }
    }

    pub async fn status(&self) -> PlayerStatus {
        self.inner.read().await.status.clone()
    }

    pub async fn playing(&self) -> bool {
        self.inner.read().await.status.playing
    }

    pub async fn buffering(&self) -> bool {
        self.inner.read().await.status.buffering
    }

    pub async fn is_live(&self) -> bool {
        self.inner.read().await.status.is_live
    }

    pub async fn position_ms(&self) -> u64 {
        self.inner.read().await.status.position_ms
    }

    pub async fn set_playing(&self, playing: bool) {
        let mut inner = self.inner.write().await;
        if inner.status.playing != playing {
            inner.status.playing = playing;
            self.events.emit_lossy(PlayerEvent::PlayingChanged {
                playing,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Update the buffering flag
    ///
    /// On a true → false transition the pending deferred seek (if any) is
    /// taken and returned for the caller to execute.
    pub async fn set_buffering(&self, buffering: bool) -> Option<u64> {
        let mut inner = self.inner.write().await;
        if inner.status.buffering == buffering {
            return None;
        }
        inner.status.buffering = buffering;
        self.events.emit_lossy(PlayerEvent::BufferingChanged {
            buffering,
            timestamp: chrono::Utc::now(),
        });

        if buffering {
            None
        } else {
            inner.deferred_seek.take()
        }
    }

    pub async fn set_is_live(&self, is_live: bool) {
        let mut inner = self.inner.write().await;
        if inner.status.is_live != is_live {
            inner.status.is_live = is_live;
            self.events.emit_lossy(PlayerEvent::IsLiveChanged {
                is_live,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    pub async fn set_position(&self, position_ms: u64) {
        let mut inner = self.inner.write().await;
        if inner.status.position_ms != position_ms {
            inner.status.position_ms = position_ms;
            self.events.emit_lossy(PlayerEvent::PositionChanged {
                position_ms,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    pub async fn set_duration(&self, duration_ms: u64) {
        let mut inner = self.inner.write().await;
        if inner.status.duration_ms != duration_ms {
            inner.status.duration_ms = duration_ms;
            self.events.emit_lossy(PlayerEvent::DurationChanged {
                duration_ms,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Store a clamped volume; returns the value actually stored
    pub async fn set_volume(&self, volume: f64) -> f64 {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.inner.write().await.status.volume = volume;
        volume
    }

    /// Register a seek to run when buffering finishes, replacing any pending one
    pub async fn defer_seek(&self, position_ms: u64) -> Option<u64> {
        self.inner.write().await.deferred_seek.replace(position_ms)
    }

    pub async fn deferred_seek(&self) -> Option<u64> {
        self.inner.read().await.deferred_seek
    }

    pub async fn set_seek_to(&self, position_ms: Option<u64>) {
        self.inner.write().await.seek_to = position_ms;
    }

    pub async fn seek_to(&self) -> Option<u64> {
        self.inner.read().await.seek_to
    }

    /// Consume the restored-session seek target
    ///
    /// While buffering it is armed as the deferred seek, unless the user has
    /// requested one since the track change started. Otherwise the target
    /// is returned for the caller to seek to right away.
    pub async fn take_restored_seek(&self) -> Option<u64> {
        let mut inner = self.inner.write().await;
        let target = inner.seek_to.take()?;
        if !inner.status.buffering {
            return Some(target);
        }
        if inner.deferred_seek.is_none() {
            inner.deferred_seek = Some(target);
        }
        None
    }

    /// Reset per-track state at the start of a track change
    ///
    /// Buffering goes up, liveness and any pending user seek are dropped,
    /// position and duration return to zero.
    pub async fn reset_for_track_change(&self) {
        {
            let mut inner = self.inner.write().await;
            inner.deferred_seek = None;
        }
        self.set_buffering(true).await;
        self.set_is_live(false).await;
        self.set_position(0).await;
        self.set_duration(0).await;
    }
}
