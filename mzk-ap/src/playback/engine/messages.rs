//! Pipeline message handling
//!
//! Messages arrive from the pipeline's own threads through the pipeline bus
//! and are handled one at a time on the player's message task, so all state
//! they touch is mutated from a single writer.

use super::core::Player;
use crate::playback::pipeline::{PipelineMessage, PipelineState};
use mzk_common::events::PlayerEvent;
use tracing::{debug, error, info};

impl Player {
    pub(super) async fn handle_pipeline_message(&self, message: PipelineMessage) {
        if let Some(position_ms) = self.pipeline.query_position() {
            self.state.set_position(position_ms).await;
        }

        match message {
            PipelineMessage::EndOfStream => {
                info!("End of stream");
                self.repeat_or_next().await;
            }
            PipelineMessage::Error { message, debug: details } => {
                error!(
                    "Pipeline error: {} ({})",
                    message,
                    details.as_deref().unwrap_or("no debug info")
                );
                self.stop().await;
                let video_id = self
                    .current_meta()
                    .await
                    .map(|meta| meta.video_id().to_string());
                self.events.emit_lossy(PlayerEvent::PlaybackError {
                    video_id,
                    message,
                    timestamp: chrono::Utc::now(),
                });
            }
            PipelineMessage::ClockLost => {
                if self.track_change_pending().await {
                    debug!("Clock lost while a track change resolves, ignored");
                    return;
                }
                debug!("Clock lost, re-selecting");
                self.pipeline.set_state(PipelineState::Paused);
                self.pipeline.set_state(PipelineState::Playing);
            }
            PipelineMessage::Buffering { percent } if percent < 100 => {
                self.buffering_started(percent).await;
            }
            PipelineMessage::Buffering { .. } => {
                self.buffering_finished().await;
            }
            PipelineMessage::AsyncDone => {
                if let Some(duration_ms) = self.pipeline.query_duration() {
                    self.state.set_duration(duration_ms).await;
                }
            }
        }
    }

    async fn buffering_started(&self, percent: u8) {
        // Live sources report buffering differently and must keep running
        if self.state.is_live().await {
            debug!("Buffering {}% on live source, ignored", percent);
            return;
        }

        let was_buffering = self.state.buffering().await;
        if !was_buffering && self.state.playing().await {
            debug!("Buffering {}%, pausing until filled", percent);
            self.pipeline.set_state(PipelineState::Paused);
        }
        self.state.set_buffering(true).await;
    }

    async fn buffering_finished(&self) {
        if let Some(target) = self.state.set_buffering(false).await {
            debug!("Buffering finished, running deferred seek to {}ms", target);
            self.seek_now(target).await;
        }

        // The pipeline still holds the previous source until the new track is
        // published, and publishing starts it
        if self.state.playing().await && !self.track_change_pending().await {
            self.pipeline.set_state(PipelineState::Playing);
        }
    }

    async fn track_change_pending(&self) -> bool {
        self.current.read().await.pending
    }
}
