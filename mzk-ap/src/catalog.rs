//! Catalog contract and track data model
//!
//! The remote catalog supplies song metadata, per-track queue settings and
//! tracklists. The engine only sees it through the [`Catalog`] trait; the
//! transport behind it (HTTP client, caching proxy, test double) is not
//! this crate's concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog lookup failure
///
/// Cloneable so that one in-flight fetch can hand its result to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Identifier unknown to the catalog
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),
}

/// Reference to a track: identifier plus optional owning playlist
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackRef {
    pub video_id: String,
    pub playlist_id: Option<String>,
}

impl TrackRef {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            playlist_id: None,
        }
    }

    pub fn with_playlist(mut self, playlist_id: impl Into<String>) -> Self {
        self.playlist_id = Some(playlist_id.into());
        self
    }
}

/// Audio quality tier, ordered tiny < low < medium < high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    Tiny,
    Low,
    Medium,
    High,
}

impl AudioQuality {
    /// Base negotiation score of the tier
    pub fn base_score(self) -> u32 {
        match self {
            AudioQuality::Tiny => 1,
            AudioQuality::Low => 2,
            AudioQuality::Medium => 3,
            AudioQuality::High => 4,
        }
    }
}

impl std::fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioQuality::Tiny => write!(f, "tiny"),
            AudioQuality::Low => write!(f, "low"),
            AudioQuality::Medium => write!(f, "medium"),
            AudioQuality::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for AudioQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tiny" => Ok(AudioQuality::Tiny),
            "low" => Ok(AudioQuality::Low),
            "medium" => Ok(AudioQuality::Medium),
            "high" => Ok(AudioQuality::High),
            other => Err(format!("unknown audio quality '{}'", other)),
        }
    }
}

/// One candidate audio stream of a song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFormat {
    pub audio_quality: AudioQuality,
    /// Codec name as reported by the catalog (e.g. "opus", "mp4a")
    pub audio_codec: String,
    pub has_audio: bool,
    /// Playable URL (a manifest for adaptive formats)
    pub url: String,
    pub bitrate: Option<u32>,
}

/// Fetched metadata of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub video_id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub duration_ms: Option<u64>,
    /// Static-URL streams
    pub formats: Vec<StreamFormat>,
    /// Manifest-delivered streams
    pub adaptive_formats: Vec<StreamFormat>,
}

/// How a queue session is resolved: an explicit tracklist or a radio
/// continuation seeded from a track/playlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Explicit,
    Radio,
}

/// Queue session settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    #[serde(default)]
    pub mode: SessionMode,
    /// Playlist the session was started from
    #[serde(default)]
    pub playlist_id: Option<String>,
    /// Opaque continuation parameters handed back to the catalog
    #[serde(default)]
    pub params: Option<String>,
}

/// Track as it appears in a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTrack {
    pub track: TrackRef,
    pub title: String,
    pub artists: Vec<String>,
    pub duration_ms: Option<u64>,
}

impl QueueTrack {
    pub fn video_id(&self) -> &str {
        &self.track.video_id
    }
}

/// Remote catalog lookups
///
/// Implementations decide their own retry and caching policy; the engine
/// memoizes songs per process on top of this.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Song metadata and stream formats for a track
    async fn fetch_song(&self, video_id: &str) -> Result<Song, CatalogError>;

    /// Queue settings applying to a track
    async fn fetch_track_settings(&self, video_id: &str) -> Result<QueueSettings, CatalogError>;

    /// Queue tracks for a batch of identifiers
    ///
    /// Unresolvable identifiers are omitted from the result rather than
    /// failing the batch.
    async fn fetch_tracklist(&self, video_ids: &[String]) -> Result<Vec<QueueTrack>, CatalogError>;
}
