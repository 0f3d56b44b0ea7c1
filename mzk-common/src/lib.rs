//! # Muzika Common Library
//!
//! Shared code for the Muzika playback crates:
//! - Event types (PlayerEvent enum) and the EventBus
//! - Queue/playback enums carried by events
//! - Configuration file and data folder resolution
//! - Common error type

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{EventBus, PlayerEvent, QueueChangeTrigger, RepeatMode};
