//! Player engine
//!
//! **Module Structure:**
//! - `core.rs`: Player struct, startup, background handler tasks, accessors
//! - `transport.rs`: play/pause/seek/navigation and action dispatch
//! - `track_change.rs`: generation-checked resolution and publishing of the current track
//! - `messages.rs`: pipeline message handling (buffering, EOS, errors, clock)
//!
//! Persistence (`save_state`/`load_state`) lives in `playback::persistence`.

mod core;
mod messages;
mod track_change;
mod transport;

pub use self::core::{EngineContext, Player};
pub use self::transport::{ActionState, PlayerAction};
