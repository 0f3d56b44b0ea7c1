//! Database access layer
//!
//! SQLite connection setup and the blob store the player state is persisted in.

pub mod init;
pub mod store;

pub use init::init_database;
pub use store::{BlobStore, MemoryStore, SqliteStore};
