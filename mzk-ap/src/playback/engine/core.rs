//! Core player engine - construction, background tasks and accessors
//!
//! **Responsibilities:**
//! - Player struct definition and startup
//! - Marshaling queue signals and pipeline messages onto one handler task each
//! - Applying the volume setting to the pipeline
//! - Read-only accessors for observers

use crate::catalog::Catalog;
use crate::config::PlayerConfig;
use crate::db::BlobStore;
use crate::playback::negotiate::FormatPreferences;
use crate::playback::pipeline::{Pipeline, PipelineMessage};
use crate::playback::queue::{Queue, QueueSignal};
use crate::playback::song_cache::SongCache;
use crate::playback::state::{EngineState, PlayerStatus, TrackMetadata};
use mzk_common::events::{EventBus, PlayerEvent};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Everything the player needs from its surroundings
pub struct EngineContext {
    pub catalog: Arc<dyn Catalog>,
    pub pipeline: Arc<dyn Pipeline>,
    /// Receiving end of the pipeline's message bus
    pub pipeline_messages: mpsc::UnboundedReceiver<PipelineMessage>,
    pub store: Arc<dyn BlobStore>,
    /// Volume setting (0.0..=1.0)
    pub volume: watch::Receiver<f64>,
    pub events: EventBus,
}

impl EngineContext {
    /// Wire the player's surroundings, sizing the event bus from `config`
    pub fn new(
        config: &PlayerConfig,
        catalog: Arc<dyn Catalog>,
        pipeline: Arc<dyn Pipeline>,
        pipeline_messages: mpsc::UnboundedReceiver<PipelineMessage>,
        store: Arc<dyn BlobStore>,
        volume: watch::Receiver<f64>,
    ) -> Self {
        Self {
            catalog,
            pipeline,
            pipeline_messages,
            store,
            volume,
            events: EventBus::new(config.event_capacity),
        }
    }
}

/// Current-track slot guarded as one unit
///
/// `generation` increments on every track-change request; a resolution may
/// only publish if the generation it captured is still current.
#[derive(Debug, Default)]
pub(super) struct CurrentTrack {
    pub(super) generation: u64,
    /// A track change is resolving; the pipeline has no usable source yet
    pub(super) pending: bool,
    pub(super) meta: Option<Arc<TrackMetadata>>,
}

/// Playback engine - owns the pipeline handle and reacts to the queue
pub struct Player {
    pub(crate) queue: Arc<Queue>,
    pub(crate) pipeline: Arc<dyn Pipeline>,
    pub(super) songs: SongCache,
    pub(crate) store: Arc<dyn BlobStore>,
    pub(crate) state: EngineState,
    pub(super) current: RwLock<CurrentTrack>,
    pub(super) events: EventBus,
    pub(super) prefs: FormatPreferences,
    pub(super) fetch_timeout: Duration,
    tasks: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Player {
    /// Create the player, start its handler tasks and restore the saved session
    ///
    /// Restore failures are logged and leave an empty queue.
    pub async fn start(config: &PlayerConfig, ctx: EngineContext) -> Arc<Self> {
        let EngineContext {
            catalog,
            pipeline,
            pipeline_messages,
            store,
            volume,
            events,
        } = ctx;

        let (queue, queue_signals) = Queue::new(Arc::clone(&catalog), events.clone());

        let player = Arc::new(Self {
            queue: Arc::new(queue),
            pipeline,
            songs: SongCache::new(catalog),
            store,
            state: EngineState::new(events.clone()),
            current: RwLock::new(CurrentTrack::default()),
            events,
            prefs: FormatPreferences {
                quality: config.preferred_quality,
                codec: config.preferred_codec.clone(),
            },
            fetch_timeout: config.fetch_timeout(),
            tasks: std::sync::Mutex::new(Vec::new()),
        });

        let handles = vec![
            tokio::spawn(run_queue_signals(Arc::downgrade(&player), queue_signals)),
            tokio::spawn(run_pipeline_messages(Arc::downgrade(&player), pipeline_messages)),
            tokio::spawn(run_volume(Arc::downgrade(&player), volume)),
        ];
        player.lock_tasks().extend(handles);

        info!(
            "Player started (quality={}, codec={}, fetch timeout={:?})",
            player.prefs.quality, player.prefs.codec, player.fetch_timeout
        );

        player.load_state().await;
        player
    }

    /// Abort the background handler tasks
    pub fn shutdown(&self) {
        for handle in self.lock_tasks().drain(..) {
            handle.abort();
        }
        debug!("Player handler tasks stopped");
    }

    pub fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the observable flags
    pub async fn status(&self) -> PlayerStatus {
        self.state.status().await
    }

    pub async fn playing(&self) -> bool {
        self.state.playing().await
    }

    pub async fn buffering(&self) -> bool {
        self.state.buffering().await
    }

    pub async fn is_live(&self) -> bool {
        self.state.is_live().await
    }

    /// Published metadata of the current track, if any
    pub async fn current_meta(&self) -> Option<Arc<TrackMetadata>> {
        self.current.read().await.meta.clone()
    }

    /// Generation of the latest track-change request
    pub async fn generation(&self) -> u64 {
        self.current.read().await.generation
    }

    /// Live position straight from the pipeline
    pub fn query_position(&self) -> Option<u64> {
        self.pipeline.query_position()
    }

    /// Live duration straight from the pipeline
    pub fn query_duration(&self) -> Option<u64> {
        self.pipeline.query_duration()
    }

    pub(super) async fn apply_volume(&self, volume: f64) {
        let volume = self.state.set_volume(volume).await;
        debug!("Volume set to {:.2}", volume);
        self.pipeline.set_volume(volume);
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

async fn run_queue_signals(player: Weak<Player>, mut rx: mpsc::UnboundedReceiver<QueueSignal>) {
    while let Some(signal) = rx.recv().await {
        let Some(player) = player.upgrade() else {
            break;
        };
        player.handle_queue_signal(signal).await;
    }
    debug!("Queue signal handler exiting");
}

async fn run_pipeline_messages(
    player: Weak<Player>,
    mut rx: mpsc::UnboundedReceiver<PipelineMessage>,
) {
    while let Some(message) = rx.recv().await {
        let Some(player) = player.upgrade() else {
            break;
        };
        player.handle_pipeline_message(message).await;
    }
    debug!("Pipeline message handler exiting");
}

async fn run_volume(player: Weak<Player>, mut volume: watch::Receiver<f64>) {
    loop {
        let value = *volume.borrow_and_update();
        match player.upgrade() {
            Some(player) => player.apply_volume(value).await,
            None => break,
        }
        if volume.changed().await.is_err() {
            break;
        }
    }
    debug!("Volume watcher exiting");
}
