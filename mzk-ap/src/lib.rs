//! # Muzika Audio Player Library (mzk-ap)
//!
//! Playback engine for a streaming music client.
//!
//! **Purpose:** Keep the play queue, negotiate the best audio stream for each
//! track, drive a media pipeline through its buffering/playing/paused
//! lifecycle, and persist the session across restarts.
//!
//! **Architecture:** Queue → Player → observers, as a one-directional flow.
//! The queue signals cursor changes over an ordered channel; the player
//! resolves metadata asynchronously (generation-checked, last request wins)
//! and reports every observable change on a typed event bus.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod playback;

pub use catalog::{Catalog, CatalogError};
pub use config::PlayerConfig;
pub use error::{Error, Result};
pub use playback::{EngineContext, Player, PlayerAction};
