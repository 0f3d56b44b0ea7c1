//! Player state persistence
//!
//! The session (queue orders, cursor, modes, seek offset, queue settings) is
//! stored as one JSON blob under [`PLAYER_STATE_KEY`] in the blob store.

use crate::catalog::QueueSettings;
use crate::db::BlobStore;
use crate::error::{Error, Result};
use crate::playback::engine::Player;
use mzk_common::events::RepeatMode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fixed blob-store key of the saved session
pub const PLAYER_STATE_KEY: &str = "player-state";

/// Serialized player session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStateSnapshot {
    pub shuffle: bool,
    pub repeat: RepeatMode,
    /// Cursor into `tracks`
    pub position: Option<usize>,
    /// Track ids in current (possibly shuffled) order
    pub tracks: Vec<String>,
    /// Track ids in insertion order
    pub original: Vec<String>,
    /// Playback offset within the current track
    pub seek_ms: u64,
    #[serde(default)]
    pub settings: Option<QueueSettings>,
}

impl PlayerStateSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read the saved session, if any
    pub async fn read(store: &dyn BlobStore) -> Result<Option<Self>> {
        match store.get(PLAYER_STATE_KEY).await? {
            Some(bytes) => Ok(Some(Self::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl Player {
    /// Build a snapshot of the current session
    pub async fn snapshot_state(&self) -> PlayerStateSnapshot {
        let queue = self.queue.snapshot().await;
        let seek_ms = self
            .query_position()
            .unwrap_or(self.state.position_ms().await);

        PlayerStateSnapshot {
            shuffle: queue.shuffle(),
            repeat: queue.repeat(),
            position: queue.position(),
            tracks: queue.entries().iter().map(|e| e.video_id().to_string()).collect(),
            original: queue.original().iter().map(|e| e.video_id().to_string()).collect(),
            seek_ms,
            settings: queue.settings().cloned(),
        }
    }

    /// Write the current session to the blob store
    pub async fn save_state(&self) -> Result<()> {
        let snapshot = self.snapshot_state().await;
        let bytes = snapshot.to_bytes()?;
        self.store.set(PLAYER_STATE_KEY, &bytes).await?;
        info!(
            "Saved player state: {} tracks, position {:?}, seek {}ms",
            snapshot.tracks.len(),
            snapshot.position,
            snapshot.seek_ms
        );
        Ok(())
    }

    /// Restore the saved session; failures leave an empty queue
    pub async fn load_state(&self) {
        if let Err(e) = self.try_load_state().await {
            warn!("Could not restore player state: {}", e);
            self.state.set_seek_to(None).await;
            self.queue.clear().await;
        }
    }

    async fn try_load_state(&self) -> Result<()> {
        let Some(snapshot) = PlayerStateSnapshot::read(self.store.as_ref()).await? else {
            debug!("No saved player state");
            return Ok(());
        };
        if snapshot.tracks.is_empty() {
            debug!("Saved player state has no tracks, nothing to restore");
            return Ok(());
        }

        if snapshot.settings.is_some() {
            self.queue.set_settings(snapshot.settings.clone()).await;
        }
        self.state.set_seek_to(Some(snapshot.seek_ms)).await;

        let (tracks, original) = tokio::join!(
            self.queue.get_tracklist(&snapshot.tracks),
            self.queue.get_tracklist(&snapshot.original),
        );
        if tracks.is_empty() {
            return Err(Error::Queue(format!(
                "none of the {} saved tracks could be resolved",
                snapshot.tracks.len()
            )));
        }
        if tracks.len() < snapshot.tracks.len() {
            warn!(
                "Dropped {} unresolvable tracks from saved state",
                snapshot.tracks.len() - tracks.len()
            );
        }

        let len = tracks.len();
        self.queue
            .restore(tracks, original, snapshot.shuffle, snapshot.repeat)
            .await;

        if let Some(position) = snapshot.position {
            self.queue.change_position(position.min(len - 1)).await?;
        }

        info!(
            "Restored player state: {} tracks, position {:?}, shuffle {}, repeat {}",
            len, snapshot.position, snapshot.shuffle, snapshot.repeat
        );
        Ok(())
    }
}
