//! Recording pipeline double

use mzk_ap::playback::{Pipeline, PipelineState, StateChangeReturn};
use std::sync::Mutex;

struct Recorded {
    state: PipelineState,
    states: Vec<PipelineState>,
    uris: Vec<String>,
    seeks: Vec<u64>,
    volume: Option<f64>,
    position: Option<u64>,
    duration: Option<u64>,
    play_result: StateChangeReturn,
}

pub struct FakePipeline {
    recorded: Mutex<Recorded>,
}

impl Default for FakePipeline {
    fn default() -> Self {
        Self {
            recorded: Mutex::new(Recorded {
                state: PipelineState::Null,
                states: Vec::new(),
                uris: Vec::new(),
                seeks: Vec::new(),
                volume: None,
                position: None,
                duration: None,
                play_result: StateChangeReturn::Success,
            }),
        }
    }
}

impl FakePipeline {
    /// What a request for PLAYING returns from now on
    pub fn set_play_result(&self, result: StateChangeReturn) {
        self.lock().play_result = result;
    }

    pub fn set_position(&self, position_ms: Option<u64>) {
        self.lock().position = position_ms;
    }

    pub fn set_duration(&self, duration_ms: Option<u64>) {
        self.lock().duration = duration_ms;
    }

    /// Every state requested so far, in order
    pub fn states(&self) -> Vec<PipelineState> {
        self.lock().states.clone()
    }

    pub fn count_state(&self, state: PipelineState) -> usize {
        self.lock().states.iter().filter(|s| **s == state).count()
    }

    pub fn uris(&self) -> Vec<String> {
        self.lock().uris.clone()
    }

    pub fn seeks(&self) -> Vec<u64> {
        self.lock().seeks.clone()
    }

    pub fn volume(&self) -> Option<f64> {
        self.lock().volume
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }
}

impl Pipeline for FakePipeline {
    fn set_state(&self, state: PipelineState) -> StateChangeReturn {
        let mut recorded = self.lock();
        recorded.states.push(state);

        let result = if state == PipelineState::Playing {
            recorded.play_result
        } else {
            StateChangeReturn::Success
        };
        if result != StateChangeReturn::Failure {
            recorded.state = state;
        }
        if state == PipelineState::Null {
            recorded.position = None;
        }
        result
    }

    fn current_state(&self) -> PipelineState {
        self.lock().state
    }

    fn set_uri(&self, uri: &str) {
        self.lock().uris.push(uri.to_string());
    }

    fn seek(&self, position_ms: u64) -> bool {
        let mut recorded = self.lock();
        recorded.seeks.push(position_ms);
        recorded.position = Some(position_ms);
        true
    }

    fn query_position(&self) -> Option<u64> {
        self.lock().position
    }

    fn query_duration(&self) -> Option<u64> {
        self.lock().duration
    }

    fn set_volume(&self, volume: f64) {
        self.lock().volume = Some(volume);
    }
}
