//! Test helper modules for mzk-ap integration tests
//!
//! - FakeCatalog: scripted catalog with per-track gates, fetch counters and failures
//! - FakePipeline: pipeline double recording every state change, URI and seek
//! - TestPlayer: a started Player wired to both fakes plus event helpers

#![allow(dead_code)]

pub mod fake_catalog;
pub mod fake_pipeline;
pub mod test_player;

pub use fake_catalog::{playable_song, stream_url, FakeCatalog};
pub use fake_pipeline::FakePipeline;
pub use test_player::{ids, test_config, TestPlayer};
