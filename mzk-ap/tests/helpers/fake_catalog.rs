//! Scripted catalog

use async_trait::async_trait;
use mzk_ap::catalog::{
    AudioQuality, Catalog, CatalogError, QueueSettings, QueueTrack, Song, StreamFormat, TrackRef,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn stream_url(video_id: &str) -> String {
    format!("https://stream.test/{}/opus", video_id)
}

/// Song with one low-quality static format and one preferred adaptive format
pub fn playable_song(video_id: &str) -> Song {
    Song {
        video_id: video_id.to_string(),
        title: format!("Song {}", video_id),
        artists: vec!["Test Artist".to_string()],
        duration_ms: Some(180_000),
        formats: vec![StreamFormat {
            audio_quality: AudioQuality::Low,
            audio_codec: "mp4a.40.2".to_string(),
            has_audio: true,
            url: format!("https://stream.test/{}/aac", video_id),
            bitrate: Some(48_000),
        }],
        adaptive_formats: vec![StreamFormat {
            audio_quality: AudioQuality::Medium,
            audio_codec: "opus".to_string(),
            has_audio: true,
            url: stream_url(video_id),
            bitrate: Some(128_000),
        }],
    }
}

#[derive(Default)]
struct CatalogScript {
    songs: HashMap<String, Song>,
    failing: HashSet<String>,
    gates: HashMap<String, Arc<Notify>>,
    song_fetches: HashMap<String, usize>,
    tracklist_calls: usize,
}

/// In-memory catalog whose behaviour each test scripts
#[derive(Default)]
pub struct FakeCatalog {
    script: Mutex<CatalogScript>,
}

impl FakeCatalog {
    /// Catalog knowing a playable song for each id
    pub fn with_songs(video_ids: &[&str]) -> Arc<Self> {
        let catalog = Self::default();
        for id in video_ids {
            catalog.add_song(playable_song(id));
        }
        Arc::new(catalog)
    }

    pub fn add_song(&self, song: Song) {
        self.lock().songs.insert(song.video_id.clone(), song);
    }

    /// Song lookups for this id fail with a network error
    pub fn fail(&self, video_id: &str) {
        self.lock().failing.insert(video_id.to_string());
    }

    /// Hold song lookups for this id until [`FakeCatalog::release`]
    pub fn gate(&self, video_id: &str) {
        self.lock()
            .gates
            .insert(video_id.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, video_id: &str) {
        if let Some(gate) = self.lock().gates.get(video_id) {
            gate.notify_one();
        }
    }

    pub fn song_fetches(&self, video_id: &str) -> usize {
        self.lock().song_fetches.get(video_id).copied().unwrap_or(0)
    }

    pub fn tracklist_calls(&self) -> usize {
        self.lock().tracklist_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CatalogScript> {
        self.script.lock().unwrap()
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn fetch_song(&self, video_id: &str) -> Result<Song, CatalogError> {
        let gate = {
            let mut script = self.lock();
            *script.song_fetches.entry(video_id.to_string()).or_insert(0) += 1;
            script.gates.get(video_id).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let script = self.lock();
        if script.failing.contains(video_id) {
            return Err(CatalogError::Network(format!("{} unavailable", video_id)));
        }
        script
            .songs
            .get(video_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(video_id.to_string()))
    }

    async fn fetch_track_settings(&self, _video_id: &str) -> Result<QueueSettings, CatalogError> {
        Ok(QueueSettings::default())
    }

    async fn fetch_tracklist(&self, video_ids: &[String]) -> Result<Vec<QueueTrack>, CatalogError> {
        let mut script = self.lock();
        script.tracklist_calls += 1;
        Ok(video_ids
            .iter()
            .filter_map(|id| script.songs.get(id))
            .map(|song| QueueTrack {
                track: TrackRef::new(song.video_id.clone()),
                title: song.title.clone(),
                artists: song.artists.clone(),
                duration_ms: song.duration_ms,
            })
            .collect())
    }
}
