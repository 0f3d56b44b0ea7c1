//! Track change handling
//!
//! A track change runs in two halves. `begin_track_change` executes inline on
//! the queue-signal task, so requests are numbered in cursor-mutation order:
//! it bumps the generation and hard-resets the pipeline. `finish_track_change`
//! resolves song and settings concurrently off that task and publishes the
//! result only if no newer request arrived meanwhile (last request wins).

use super::core::Player;
use crate::error::{Error, Result};
use crate::playback::negotiate::select_best_format;
use crate::playback::pipeline::PipelineState;
use crate::playback::queue::{QueueEntry, QueueSignal};
use crate::playback::state::TrackMetadata;
use mzk_common::events::PlayerEvent;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl Player {
    pub(super) async fn handle_queue_signal(self: &Arc<Self>, signal: QueueSignal) {
        match signal {
            QueueSignal::CurrentChanged(entry) => {
                let generation = self.begin_track_change(entry.as_ref()).await;
                if let Some(entry) = entry {
                    let player = Arc::clone(self);
                    tokio::spawn(async move {
                        player.finish_track_change(generation, entry).await;
                    });
                }
            }
            QueueSignal::WantsToPlay => {
                debug!("Queue wants playback");
                self.state.set_playing(true).await;
            }
        }
    }

    /// Resolve and publish `entry` as the current track, awaiting completion
    ///
    /// `None` stops playback and clears the published metadata.
    pub async fn change_current_track(self: &Arc<Self>, entry: Option<QueueEntry>) {
        let generation = self.begin_track_change(entry.as_ref()).await;
        if let Some(entry) = entry {
            self.finish_track_change(generation, entry).await;
        }
    }

    /// Number the request and reset the pipeline; returns the new generation
    pub(super) async fn begin_track_change(&self, entry: Option<&QueueEntry>) -> u64 {
        let generation = {
            let mut current = self.current.write().await;
            current.generation += 1;
            current.pending = entry.is_some();
            if entry.is_none() {
                current.meta = None;
            }
            current.generation
        };

        self.pipeline.set_state(PipelineState::Null);

        match entry {
            Some(entry) => {
                info!(
                    "Track change #{} -> {} ({})",
                    generation,
                    entry.video_id(),
                    entry.track.title
                );
                self.state.reset_for_track_change().await;
            }
            None => {
                info!("Track change #{} -> none, stopping", generation);
                self.state.set_playing(false).await;
                self.state.set_buffering(false).await;
                self.state.set_position(0).await;
                self.state.set_duration(0).await;
                self.events.emit_lossy(PlayerEvent::CurrentChanged {
                    video_id: None,
                    generation,
                    timestamp: chrono::Utc::now(),
                });
            }
        }

        generation
    }

    pub(super) async fn finish_track_change(&self, generation: u64, entry: QueueEntry) {
        match self.resolve(&entry).await {
            Ok(meta) => self.publish(generation, Arc::new(meta)).await,
            Err(e) => self.fail_track_change(generation, &entry, e).await,
        }
    }

    /// Fetch song and per-track settings concurrently, then pick a format
    async fn resolve(&self, entry: &QueueEntry) -> Result<TrackMetadata> {
        let video_id = entry.video_id();
        let lookups = async {
            tokio::try_join!(
                async { self.songs.get(video_id).await.map_err(Error::from) },
                self.queue.get_track_settings(video_id),
            )
        };

        let (song, settings) = tokio::time::timeout(self.fetch_timeout, lookups)
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "resolving {} took longer than {:?}",
                    video_id, self.fetch_timeout
                ))
            })??;

        let format = select_best_format(&song, &self.prefs)?;
        debug!(
            "Negotiated {} / {} (adaptive={}) for {}",
            format.format.audio_quality, format.format.audio_codec, format.adaptive, video_id
        );

        Ok(TrackMetadata {
            song,
            format,
            entry: entry.clone(),
            settings,
        })
    }

    /// Swap in the new snapshot and point the pipeline at it
    ///
    /// The current-track lock is held throughout so that a newer track
    /// change cannot interleave with the pipeline reconfiguration.
    async fn publish(&self, generation: u64, meta: Arc<TrackMetadata>) {
        let mut current = self.current.write().await;
        if current.generation != generation {
            debug!(
                "Discarding stale resolution #{} for {} (current #{})",
                generation,
                meta.video_id(),
                current.generation
            );
            return;
        }

        current.meta = Some(Arc::clone(&meta));
        current.pending = false;

        self.pipeline.set_state(PipelineState::Null);
        self.pipeline.set_uri(meta.format.url());

        if let Some(duration_ms) = meta.song.duration_ms {
            self.state.set_duration(duration_ms).await;
        }
        let restored_seek = self.state.take_restored_seek().await;

        if self.state.playing().await {
            if let Err(e) = self.start_pipeline().await {
                warn!("Could not start {}: {}", meta.video_id(), e);
            }
        }

        // Buffering already finished during resolution, so no deferred seek
        // would ever fire
        if let Some(target) = restored_seek {
            debug!("Restoring position {}ms", target);
            self.seek(target).await;
        }

        info!("Now current: {} (#{})", meta.video_id(), generation);
        self.events.emit_lossy(PlayerEvent::CurrentChanged {
            video_id: Some(meta.video_id().to_string()),
            generation,
            timestamp: chrono::Utc::now(),
        });
    }

    async fn fail_track_change(&self, generation: u64, entry: &QueueEntry, error: Error) {
        {
            let mut current = self.current.write().await;
            if current.generation != generation {
                debug!(
                    "Ignoring failure of stale resolution #{} for {}: {}",
                    generation,
                    entry.video_id(),
                    error
                );
                return;
            }
            current.meta = None;
            current.pending = false;
        }

        warn!("Could not resolve {}: {}", entry.video_id(), error);
        self.state.set_playing(false).await;
        self.state.set_buffering(false).await;
        self.events.emit_lossy(PlayerEvent::PlaybackError {
            video_id: Some(entry.video_id().to_string()),
            message: error.to_string(),
            timestamp: chrono::Utc::now(),
        });
    }
}
