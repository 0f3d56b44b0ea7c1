//! Transport control: play, pause, seek and queue navigation

use super::core::Player;
use crate::error::{Error, Result};
use crate::playback::pipeline::{PipelineState, StateChangeReturn};
use mzk_common::events::PlayerEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// User intent routed through [`Player::dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "position_ms", rename_all = "snake_case")]
pub enum PlayerAction {
    Play,
    Pause,
    PlayPause,
    Previous,
    Next,
    Seek(u64),
}

/// Which transport actions are currently enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionState {
    pub play: bool,
    pub pause: bool,
    pub previous: bool,
    pub next: bool,
}

impl Player {
    /// Start playback
    ///
    /// No-op if the pipeline is already playing. While a track change is
    /// still resolving only the `playing` flag is set; the track starts as
    /// soon as it is published. If the pipeline refuses to start, the player
    /// falls back to paused and the failure is returned.
    pub async fn play(&self) -> Result<()> {
        if self.pipeline.current_state() == PipelineState::Playing {
            return Ok(());
        }

        let ready = {
            let current = self.current.read().await;
            !current.pending && current.meta.is_some()
        };

        info!("Play");
        self.state.set_playing(true).await;
        if !ready {
            debug!("No track ready yet, playback starts once one is published");
            return Ok(());
        }
        self.start_pipeline().await
    }

    /// Request PLAYING from the pipeline, assuming a source is set
    pub(super) async fn start_pipeline(&self) -> Result<()> {
        self.state.set_playing(true).await;
        match self.pipeline.set_state(PipelineState::Playing) {
            StateChangeReturn::Failure => {
                error!("Pipeline refused to enter PLAYING");
                self.pause().await;
                Err(Error::PlaybackFailed(
                    "pipeline could not transition to PLAYING".to_string(),
                ))
            }
            StateChangeReturn::NoPreroll => {
                debug!("No preroll: live source");
                self.state.set_is_live(true).await;
                Ok(())
            }
            StateChangeReturn::Success | StateChangeReturn::Async => Ok(()),
        }
    }

    /// Pause playback; idempotent
    pub async fn pause(&self) {
        self.state.set_playing(false).await;
        if self.pipeline.current_state() == PipelineState::Playing {
            info!("Pause");
            if self.pipeline.set_state(PipelineState::Paused) == StateChangeReturn::Failure {
                warn!("Pipeline refused to enter PAUSED");
            }
        }
    }

    /// Toggle on the pipeline's actual state rather than the `playing` flag
    pub async fn play_pause(&self) -> Result<()> {
        if self.pipeline.current_state() == PipelineState::Playing {
            self.pause().await;
            Ok(())
        } else {
            self.play().await
        }
    }

    /// Stop playback; the queue position is kept
    pub async fn stop(&self) {
        info!("Stop");
        self.state.set_playing(false).await;
        self.pipeline.set_state(PipelineState::Null);
    }

    /// Seek within the current track
    ///
    /// While buffering the seek is deferred until buffering finishes; a
    /// newer request replaces a pending one. Seeking a live stream is
    /// ignored.
    pub async fn seek(&self, position_ms: u64) {
        if self.state.is_live().await {
            warn!("Ignoring seek to {}ms on a live stream", position_ms);
            return;
        }

        if self.state.buffering().await {
            match self.state.defer_seek(position_ms).await {
                Some(previous) => debug!(
                    "Deferred seek to {}ms replaces pending {}ms",
                    position_ms, previous
                ),
                None => debug!("Buffering, seek to {}ms deferred", position_ms),
            }
            return;
        }

        self.seek_now(position_ms).await;
    }

    pub(super) async fn seek_now(&self, position_ms: u64) {
        if !self.pipeline.seek(position_ms) {
            warn!("Pipeline rejected seek to {}ms", position_ms);
            return;
        }

        let position_ms = self.pipeline.query_position().unwrap_or(position_ms);
        debug!("Seeked to {}ms", position_ms);
        self.state.set_position(position_ms).await;
        self.events.emit_lossy(PlayerEvent::Seeked {
            position_ms,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Skip forward; the switch itself happens on the resulting track change
    pub async fn next(&self) {
        self.state.set_playing(true).await;
        self.queue.next().await;
    }

    /// Skip back; no-op at the start of the queue
    pub async fn previous(&self) {
        self.state.set_playing(true).await;
        self.queue.previous().await;
    }

    /// End-of-track advance honouring repeat one
    pub async fn repeat_or_next(&self) {
        self.queue.repeat_or_next().await;
    }

    /// Run a transport action
    pub async fn dispatch(&self, action: PlayerAction) -> Result<()> {
        debug!("Dispatching {:?}", action);
        match action {
            PlayerAction::Play => self.play().await?,
            PlayerAction::Pause => self.pause().await,
            PlayerAction::PlayPause => self.play_pause().await?,
            PlayerAction::Previous => self.previous().await,
            PlayerAction::Next => self.next().await,
            PlayerAction::Seek(position_ms) => self.seek(position_ms).await,
        }
        Ok(())
    }

    /// Enabled state of each transport control
    pub async fn action_state(&self) -> ActionState {
        let playing = self.state.playing().await;
        let queue = self.queue.snapshot().await;
        ActionState {
            play: !playing,
            pause: playing,
            previous: queue.can_play_previous(),
            next: queue.can_play_next(),
        }
    }
}
