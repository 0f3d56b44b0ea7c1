//! Started player wired to fakes

use super::{FakeCatalog, FakePipeline};
use mzk_ap::catalog::{QueueTrack, TrackRef};
use mzk_ap::db::{BlobStore, MemoryStore};
use mzk_ap::playback::{EngineContext, PipelineBus, PipelineMessage};
use mzk_ap::{Player, PlayerConfig};
use mzk_common::events::PlayerEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn ids(video_ids: &[&str]) -> Vec<String> {
    video_ids.iter().map(|s| s.to_string()).collect()
}

pub struct TestPlayer {
    pub player: Arc<Player>,
    pub catalog: Arc<FakeCatalog>,
    pub pipeline: Arc<FakePipeline>,
    pub bus: PipelineBus,
    pub volume: watch::Sender<f64>,
    pub events: broadcast::Receiver<PlayerEvent>,
}

impl TestPlayer {
    /// Player with an empty store
    pub async fn start(catalog: Arc<FakeCatalog>) -> Self {
        Self::start_with_store(catalog, Arc::new(MemoryStore::new())).await
    }

    pub async fn start_with_store(catalog: Arc<FakeCatalog>, store: Arc<dyn BlobStore>) -> Self {
        Self::start_with(catalog, store, Arc::new(FakePipeline::default())).await
    }

    pub async fn start_with(
        catalog: Arc<FakeCatalog>,
        store: Arc<dyn BlobStore>,
        pipeline: Arc<FakePipeline>,
    ) -> Self {
        Self::start_with_config(catalog, store, pipeline, test_config()).await
    }

    pub async fn start_with_config(
        catalog: Arc<FakeCatalog>,
        store: Arc<dyn BlobStore>,
        pipeline: Arc<FakePipeline>,
        config: PlayerConfig,
    ) -> Self {
        let (bus, pipeline_messages) = PipelineBus::channel();
        let (volume, volume_rx) = watch::channel(1.0);
        let ctx = EngineContext::new(
            &config,
            catalog.clone(),
            pipeline.clone(),
            pipeline_messages,
            store,
            volume_rx,
        );
        let rx = ctx.events.subscribe();

        let player = Player::start(&config, ctx).await;

        Self {
            player,
            catalog,
            pipeline,
            bus,
            volume,
            events: rx,
        }
    }

    /// Queue tracks for the given ids and start playing the one at `start`
    pub async fn play(&self, video_ids: &[&str], start: usize) {
        let tracks = video_ids.iter().map(|id| queue_track(id)).collect();
        self.player.queue().play_tracks(tracks, None, start).await;
    }

    pub fn post(&self, message: PipelineMessage) {
        self.bus.post(message);
    }

    /// Next event matching `pred`, skipping others; panics after a timeout
    pub async fn wait_for<F>(&mut self, mut pred: F) -> PlayerEvent
    where
        F: FnMut(&PlayerEvent) -> bool,
    {
        let result = tokio::time::timeout(EVENT_TIMEOUT, async {
            loop {
                match self.events.recv().await {
                    Ok(event) if pred(&event) => return event,
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        panic!("test event receiver lagged by {}", n)
                    }
                    Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
                }
            }
        })
        .await;
        result.expect("timed out waiting for event")
    }

    /// Wait until the published current track is `video_id` (None: stopped)
    pub async fn wait_current(&mut self, video_id: Option<&str>) -> u64 {
        let expected = video_id.map(str::to_string);
        match self
            .wait_for(|e| matches!(e, PlayerEvent::CurrentChanged { video_id, .. } if *video_id == expected))
            .await
        {
            PlayerEvent::CurrentChanged { generation, .. } => generation,
            _ => unreachable!(),
        }
    }

    /// Post a duration marker and wait for it, proving every earlier
    /// pipeline message has been handled
    pub async fn flush_messages(&mut self, marker_ms: u64) {
        self.pipeline.set_duration(Some(marker_ms));
        self.post(PipelineMessage::AsyncDone);
        self.wait_for(|e| matches!(e, PlayerEvent::DurationChanged { duration_ms, .. } if *duration_ms == marker_ms))
            .await;
    }

    /// Poll `cond` until it holds; panics after a timeout
    pub async fn eventually<F>(&self, mut cond: F)
    where
        F: FnMut() -> bool,
    {
        let result = tokio::time::timeout(EVENT_TIMEOUT, async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        result.expect("condition never became true");
    }
}

/// Engine configuration used by [`TestPlayer::start`]
pub fn test_config() -> PlayerConfig {
    PlayerConfig {
        fetch_timeout_ms: 2_000,
        event_capacity: 1024,
        ..PlayerConfig::default()
    }
}

pub fn queue_track(video_id: &str) -> QueueTrack {
    QueueTrack {
        track: TrackRef::new(video_id),
        title: format!("Song {}", video_id),
        artists: vec!["Test Artist".to_string()],
        duration_ms: Some(180_000),
    }
}
