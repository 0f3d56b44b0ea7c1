//! Playback engine, queue and their supporting pieces

pub mod engine;
pub mod negotiate;
pub mod persistence;
pub mod pipeline;
pub mod queue;
pub mod song_cache;
pub mod state;

pub use engine::{ActionState, EngineContext, Player, PlayerAction};
pub use negotiate::{select_best_format, FormatPreferences, NegotiatedFormat};
pub use persistence::{PlayerStateSnapshot, PLAYER_STATE_KEY};
pub use pipeline::{Pipeline, PipelineBus, PipelineMessage, PipelineState, StateChangeReturn};
pub use queue::{Queue, QueueEntry, QueueSignal, QueueState};
pub use song_cache::SongCache;
pub use state::{PlayerStatus, TrackMetadata};
