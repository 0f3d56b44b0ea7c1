//! Play queue
//!
//! Owns the ordered tracks of the current session: the "current" order
//! (possibly shuffled), the "original" insertion order, the cursor, and the
//! shuffle/repeat modes.
//!
//! **Invariants:**
//! - `list` and `original` hold the same entries (by entry id), only the
//!   order may differ; shuffling permutes `list` only.
//! - The cursor is either None or a valid index into `list`.
//!
//! Every cursor movement is signalled to the player over an ordered
//! channel ([`QueueSignal`]); observers get [`PlayerEvent::QueueChanged`]
//! on the event bus.

use crate::catalog::{Catalog, QueueSettings, QueueTrack};
use crate::error::{Error, Result};
use mzk_common::events::{EventBus, PlayerEvent, QueueChangeTrigger, RepeatMode};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One queued track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Identity of this queue slot (the same track may be queued twice)
    pub entry_id: Uuid,
    pub track: QueueTrack,
    /// Session settings the entry was added with
    pub settings: Option<QueueSettings>,
}

impl QueueEntry {
    pub fn new(track: QueueTrack, settings: Option<QueueSettings>) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            track,
            settings,
        }
    }

    pub fn video_id(&self) -> &str {
        self.track.video_id()
    }
}

/// Queue → player notifications, delivered in mutation order
#[derive(Debug, Clone)]
pub enum QueueSignal {
    /// Entry under the cursor changed (or must be replayed); None stops playback
    CurrentChanged(Option<QueueEntry>),
    /// A user-level action asked for playback to start
    WantsToPlay,
}

/// Queue contents and cursor, without any I/O
#[derive(Debug, Clone, Default)]
pub struct QueueState {
    list: Vec<QueueEntry>,
    original: Vec<QueueEntry>,
    position: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    settings: Option<QueueSettings>,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current (possibly shuffled) order
    pub fn entries(&self) -> &[QueueEntry] {
        &self.list
    }

    /// Insertion order
    pub fn original(&self) -> &[QueueEntry] {
        &self.original
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn settings(&self) -> Option<&QueueSettings> {
        self.settings.as_ref()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.position.and_then(|p| self.list.get(p))
    }

    fn current_id(&self) -> Option<Uuid> {
        self.current().map(|e| e.entry_id)
    }

    /// False only at the first entry with repeat off (or on an empty queue)
    pub fn can_play_previous(&self) -> bool {
        if self.list.is_empty() {
            return false;
        }
        self.repeat != RepeatMode::None || self.position.is_some_and(|p| p > 0)
    }

    /// False only at the last entry with repeat off (or on an empty queue)
    pub fn can_play_next(&self) -> bool {
        if self.list.is_empty() {
            return false;
        }
        self.repeat != RepeatMode::None || self.position.map_or(true, |p| p + 1 < self.list.len())
    }

    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.repeat = repeat;
    }

    pub fn set_settings(&mut self, settings: Option<QueueSettings>) {
        self.settings = settings;
    }

    /// Append entries at the end of both orders
    pub fn append(&mut self, entries: Vec<QueueEntry>) {
        self.original.extend(entries.iter().cloned());
        self.list.extend(entries);
    }

    /// Insert entries into the current order at `index` (clamped to the end)
    ///
    /// Unshuffled, the original order mirrors the insertion point; shuffled,
    /// the entries join the end of the original order.
    pub fn insert(&mut self, index: usize, entries: Vec<QueueEntry>) {
        let index = index.min(self.list.len());
        let count = entries.len();

        if self.shuffle {
            self.original.extend(entries.iter().cloned());
        } else {
            let original_index = index.min(self.original.len());
            self.original
                .splice(original_index..original_index, entries.iter().cloned());
        }
        self.list.splice(index..index, entries);

        if let Some(p) = self.position {
            if index <= p {
                self.position = Some(p + count);
            }
        }
    }

    /// Remove entries by id from both orders
    ///
    /// Returns true when the entry under the cursor was among them; the
    /// cursor then lands on the entry that slid into its place (the new last
    /// entry if it was at the end, None if the queue emptied).
    pub fn remove(&mut self, entry_ids: &[Uuid]) -> bool {
        let ids: HashSet<Uuid> = entry_ids.iter().copied().collect();
        let current_id = self.current_id();
        let removed_current = current_id.is_some_and(|id| ids.contains(&id));

        let removed_before = match self.position {
            Some(p) => self.list[..p].iter().filter(|e| ids.contains(&e.entry_id)).count(),
            None => 0,
        };

        self.list.retain(|e| !ids.contains(&e.entry_id));
        self.original.retain(|e| !ids.contains(&e.entry_id));

        self.position = match self.position {
            _ if self.list.is_empty() => None,
            Some(p) if removed_current => Some((p - removed_before).min(self.list.len() - 1)),
            Some(p) => Some(p - removed_before),
            None => None,
        };

        removed_current
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.list.clear();
        self.original.clear();
        self.position = None;
    }

    /// Advance the cursor by one
    ///
    /// Past the end the cursor wraps with repeat all and becomes None
    /// otherwise. From None it starts at the first entry.
    pub fn next(&mut self) {
        let len = self.list.len();
        self.position = match self.position {
            _ if len == 0 => None,
            None => Some(0),
            Some(p) if p + 1 < len => Some(p + 1),
            Some(_) if self.repeat == RepeatMode::All => Some(0),
            Some(_) => None,
        };
    }

    /// Step the cursor back by one; no-op at the start. Returns whether it moved.
    pub fn previous(&mut self) -> bool {
        match self.position {
            Some(p) if p > 0 => {
                self.position = Some(p - 1);
                true
            }
            _ => false,
        }
    }

    /// Move the cursor to `index`; returns whether the current entry changed
    pub fn change_position(&mut self, index: usize) -> Result<bool> {
        if index >= self.list.len() {
            return Err(Error::Queue(format!(
                "position {} out of range for queue of {}",
                index,
                self.list.len()
            )));
        }

        let before = self.current_id();
        self.position = Some(index);
        Ok(before != self.current_id())
    }

    /// Toggle shuffle, keeping the same entry current
    ///
    /// Enabling permutes the current order only; disabling restores the
    /// original order.
    pub fn set_shuffle<R: Rng + ?Sized>(&mut self, shuffle: bool, rng: &mut R) {
        if self.shuffle == shuffle {
            return;
        }

        let current_id = self.current_id();
        if shuffle {
            self.list.shuffle(rng);
        } else {
            self.list = self.original.clone();
        }
        self.shuffle = shuffle;

        self.position = current_id.and_then(|id| self.list.iter().position(|e| e.entry_id == id));
    }

    /// Replace the whole queue with a new session
    ///
    /// The entry at `start` becomes current. With shuffle on, the current
    /// order is permuted right away.
    pub fn replace<R: Rng + ?Sized>(&mut self, entries: Vec<QueueEntry>, start: usize, rng: &mut R) {
        let start_id = entries.get(start.min(entries.len().saturating_sub(1))).map(|e| e.entry_id);

        self.original = entries.clone();
        self.list = entries;
        if self.shuffle {
            self.list.shuffle(rng);
        }
        self.position = start_id.and_then(|id| self.list.iter().position(|e| e.entry_id == id));
    }

    /// Rebuild the queue from a persisted session
    ///
    /// `tracks` is the persisted current order, `original` the persisted
    /// insertion order. Original entries are matched to current entries by
    /// track id so both orders share entry ids; ids missing from the
    /// current order are dropped and unmatched current entries are appended
    /// to the original order. Shuffle and repeat are set directly: the
    /// persisted current order already reflects any shuffle. The cursor is
    /// left at None.
    pub fn restore(
        &mut self,
        tracks: Vec<QueueTrack>,
        original: Vec<QueueTrack>,
        shuffle: bool,
        repeat: RepeatMode,
    ) {
        let settings = self.settings.clone();
        self.list = tracks
            .into_iter()
            .map(|t| QueueEntry::new(t, settings.clone()))
            .collect();

        let mut unmatched: Vec<Option<&QueueEntry>> = self.list.iter().map(Some).collect();
        let mut rebuilt = Vec::with_capacity(self.list.len());
        for track in &original {
            let slot = unmatched
                .iter_mut()
                .find(|slot| slot.is_some_and(|e| e.video_id() == track.video_id()));
            if let Some(slot) = slot {
                if let Some(entry) = slot.take() {
                    rebuilt.push(entry.clone());
                }
            }
        }
        rebuilt.extend(unmatched.into_iter().flatten().cloned());

        self.original = rebuilt;
        self.shuffle = shuffle;
        self.repeat = repeat;
        self.position = None;
    }
}

/// Shared queue with change notifications
pub struct Queue {
    catalog: Arc<dyn Catalog>,
    state: RwLock<QueueState>,
    signals: mpsc::UnboundedSender<QueueSignal>,
    event_bus: EventBus,
}

impl Queue {
    /// Create an empty queue and the receiving end of its signal channel
    pub fn new(
        catalog: Arc<dyn Catalog>,
        event_bus: EventBus,
    ) -> (Self, mpsc::UnboundedReceiver<QueueSignal>) {
        let (signals, rx) = mpsc::unbounded_channel();
        let queue = Self {
            catalog,
            state: RwLock::new(QueueState::new()),
            signals,
            event_bus,
        };
        (queue, rx)
    }

    /// Copy of the full queue state
    pub async fn snapshot(&self) -> QueueState {
        self.state.read().await.clone()
    }

    pub async fn current(&self) -> Option<QueueEntry> {
        self.state.read().await.current().cloned()
    }

    pub async fn position(&self) -> Option<usize> {
        self.state.read().await.position()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.is_empty()
    }

    pub async fn shuffle(&self) -> bool {
        self.state.read().await.shuffle()
    }

    pub async fn repeat(&self) -> RepeatMode {
        self.state.read().await.repeat()
    }

    pub async fn settings(&self) -> Option<QueueSettings> {
        self.state.read().await.settings().cloned()
    }

    pub async fn can_play_previous(&self) -> bool {
        self.state.read().await.can_play_previous()
    }

    pub async fn can_play_next(&self) -> bool {
        self.state.read().await.can_play_next()
    }

    /// Append tracks to the end of the queue
    pub async fn append(&self, tracks: Vec<QueueTrack>, settings: Option<QueueSettings>) -> Vec<Uuid> {
        let entries: Vec<QueueEntry> = tracks
            .into_iter()
            .map(|t| QueueEntry::new(t, settings.clone()))
            .collect();
        let ids = entries.iter().map(|e| e.entry_id).collect();

        let mut state = self.state.write().await;
        debug!("Appending {} tracks to queue of {}", entries.len(), state.len());
        state.append(entries);
        self.emit_queue_changed(&state, QueueChangeTrigger::UserEnqueue);
        ids
    }

    /// Insert tracks before `index` of the current order
    pub async fn insert(
        &self,
        index: usize,
        tracks: Vec<QueueTrack>,
        settings: Option<QueueSettings>,
    ) -> Vec<Uuid> {
        let entries: Vec<QueueEntry> = tracks
            .into_iter()
            .map(|t| QueueEntry::new(t, settings.clone()))
            .collect();
        let ids = entries.iter().map(|e| e.entry_id).collect();

        let mut state = self.state.write().await;
        debug!("Inserting {} tracks at {}", entries.len(), index);
        state.insert(index, entries);
        self.emit_queue_changed(&state, QueueChangeTrigger::UserEnqueue);
        ids
    }

    /// Remove entries; re-signals the current entry if it was removed
    pub async fn remove(&self, entry_ids: &[Uuid]) {
        let mut state = self.state.write().await;
        let removed_current = state.remove(entry_ids);
        if removed_current {
            info!("Current entry removed, new position {:?}", state.position());
            self.signal(QueueSignal::CurrentChanged(state.current().cloned()));
        }
        self.emit_queue_changed(&state, QueueChangeTrigger::UserDequeue);
    }

    /// Empty the queue and stop playback
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        let had_current = state.current().is_some();
        state.clear();
        if had_current {
            self.signal(QueueSignal::CurrentChanged(None));
        }
        self.emit_queue_changed(&state, QueueChangeTrigger::UserDequeue);
    }

    /// Start a new session with `tracks`, playing the one at `start`
    pub async fn play_tracks(
        &self,
        tracks: Vec<QueueTrack>,
        settings: Option<QueueSettings>,
        start: usize,
    ) {
        let entries: Vec<QueueEntry> = tracks
            .into_iter()
            .map(|t| QueueEntry::new(t, settings.clone()))
            .collect();

        let mut state = self.state.write().await;
        info!("Starting session of {} tracks at {}", entries.len(), start);
        state.set_settings(settings);
        state.replace(entries, start, &mut rand::thread_rng());
        self.signal(QueueSignal::WantsToPlay);
        self.signal(QueueSignal::CurrentChanged(state.current().cloned()));
        self.emit_queue_changed(&state, QueueChangeTrigger::Replaced);
    }

    /// Advance the cursor; always signals the (possibly absent) new current entry
    pub async fn next(&self) {
        let mut state = self.state.write().await;
        state.next();
        debug!("Queue next -> {:?}", state.position());
        self.signal(QueueSignal::CurrentChanged(state.current().cloned()));
        self.emit_queue_changed(&state, QueueChangeTrigger::Navigation);
    }

    /// Step back; no-op at the start of the queue
    pub async fn previous(&self) {
        let mut state = self.state.write().await;
        if state.previous() {
            debug!("Queue previous -> {:?}", state.position());
            self.signal(QueueSignal::CurrentChanged(state.current().cloned()));
            self.emit_queue_changed(&state, QueueChangeTrigger::Navigation);
        }
    }

    /// End-of-stream advance: replays the current entry with repeat one
    pub async fn repeat_or_next(&self) {
        let mut state = self.state.write().await;
        if state.repeat() == RepeatMode::One {
            if let Some(current) = state.current() {
                debug!("Repeating {}", current.video_id());
                self.signal(QueueSignal::CurrentChanged(Some(current.clone())));
                return;
            }
        }
        state.next();
        debug!("Queue advance -> {:?}", state.position());
        self.signal(QueueSignal::CurrentChanged(state.current().cloned()));
        self.emit_queue_changed(&state, QueueChangeTrigger::Navigation);
    }

    /// Move the cursor directly; signals only if the current entry changed
    pub async fn change_position(&self, index: usize) -> Result<()> {
        let mut state = self.state.write().await;
        if state.change_position(index)? {
            self.signal(QueueSignal::CurrentChanged(state.current().cloned()));
        }
        self.emit_queue_changed(&state, QueueChangeTrigger::Navigation);
        Ok(())
    }

    pub async fn set_shuffle(&self, shuffle: bool) {
        let mut state = self.state.write().await;
        if state.shuffle() == shuffle {
            return;
        }
        state.set_shuffle(shuffle, &mut rand::thread_rng());
        info!("Shuffle {}", if shuffle { "enabled" } else { "disabled" });
        self.emit_queue_changed(&state, QueueChangeTrigger::ModeChange);
    }

    pub async fn set_repeat(&self, repeat: RepeatMode) {
        let mut state = self.state.write().await;
        if state.repeat() == repeat {
            return;
        }
        state.set_repeat(repeat);
        info!("Repeat mode {}", repeat);
        self.emit_queue_changed(&state, QueueChangeTrigger::ModeChange);
    }

    pub async fn set_settings(&self, settings: Option<QueueSettings>) {
        self.state.write().await.set_settings(settings);
    }

    /// Rebuild from a persisted session (see [`QueueState::restore`])
    pub async fn restore(
        &self,
        tracks: Vec<QueueTrack>,
        original: Vec<QueueTrack>,
        shuffle: bool,
        repeat: RepeatMode,
    ) {
        let mut state = self.state.write().await;
        state.restore(tracks, original, shuffle, repeat);
        self.emit_queue_changed(&state, QueueChangeTrigger::Restore);
    }

    /// Queue settings applying to one track
    pub async fn get_track_settings(&self, video_id: &str) -> Result<QueueSettings> {
        Ok(self.catalog.fetch_track_settings(video_id).await?)
    }

    /// Resolve identifiers to queue tracks, dropping the ones that fail
    ///
    /// If the batch lookup itself fails, each identifier is retried on its
    /// own so that one bad track does not sink the batch.
    pub async fn get_tracklist(&self, video_ids: &[String]) -> Vec<QueueTrack> {
        if video_ids.is_empty() {
            return Vec::new();
        }

        match self.catalog.fetch_tracklist(video_ids).await {
            Ok(tracks) => {
                if tracks.len() < video_ids.len() {
                    debug!(
                        "Tracklist resolved {} of {} tracks",
                        tracks.len(),
                        video_ids.len()
                    );
                }
                tracks
            }
            Err(e) => {
                warn!("Tracklist batch lookup failed ({}), resolving one by one", e);
                let mut tracks = Vec::with_capacity(video_ids.len());
                for id in video_ids {
                    match self.catalog.fetch_tracklist(std::slice::from_ref(id)).await {
                        Ok(found) => tracks.extend(found),
                        Err(e) => warn!("Dropping track {}: {}", id, e),
                    }
                }
                tracks
            }
        }
    }

    /// Resolve identifiers and append them; returns how many were added
    pub async fn add_songs(&self, video_ids: &[String]) -> usize {
        let tracks = self.get_tracklist(video_ids).await;
        let added = tracks.len();
        let settings = self.settings().await;
        self.append(tracks, settings).await;
        added
    }

    fn signal(&self, signal: QueueSignal) {
        if self.signals.send(signal).is_err() {
            debug!("Queue signal dropped: no player listening");
        }
    }

    fn emit_queue_changed(&self, state: &QueueState, trigger: QueueChangeTrigger) {
        self.event_bus.emit_lossy(PlayerEvent::QueueChanged {
            length: state.len(),
            position: state.position(),
            current_entry: state.current_id(),
            shuffle: state.shuffle(),
            repeat: state.repeat(),
            can_play_previous: state.can_play_previous(),
            can_play_next: state.can_play_next(),
            trigger,
            timestamp: chrono::Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogError, Song, TrackRef};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn track(id: &str) -> QueueTrack {
        QueueTrack {
            track: TrackRef::new(id),
            title: format!("Track {}", id),
            artists: vec![],
            duration_ms: None,
        }
    }

    fn entries(ids: &[&str]) -> Vec<QueueEntry> {
        ids.iter().map(|id| QueueEntry::new(track(id), None)).collect()
    }

    fn state_with(ids: &[&str], position: Option<usize>) -> QueueState {
        let mut state = QueueState::new();
        state.append(entries(ids));
        state.position = position;
        state
    }

    fn video_ids(list: &[QueueEntry]) -> Vec<String> {
        list.iter().map(|e| e.video_id().to_string()).collect()
    }

    fn assert_same_entries(state: &QueueState) {
        let mut a: Vec<Uuid> = state.entries().iter().map(|e| e.entry_id).collect();
        let mut b: Vec<Uuid> = state.original().iter().map(|e| e.entry_id).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b, "current and original orders must hold the same entries");
    }

    #[test]
    fn test_next_wraps_with_repeat_all() {
        let mut state = state_with(&["a", "b", "c"], Some(2));
        state.set_repeat(RepeatMode::All);
        state.next();
        assert_eq!(state.position(), Some(0));
    }

    #[test]
    fn test_next_past_end_stops_without_repeat() {
        let mut state = state_with(&["a", "b", "c"], Some(2));
        state.next();
        assert_eq!(state.position(), None);
        assert!(state.current().is_none());

        // Repeat one does not wrap on explicit next
        let mut state = state_with(&["a", "b"], Some(1));
        state.set_repeat(RepeatMode::One);
        state.next();
        assert_eq!(state.position(), None);
    }

    #[test]
    fn test_next_from_none_starts_at_first() {
        let mut state = state_with(&["a", "b"], None);
        state.next();
        assert_eq!(state.position(), Some(0));

        let mut empty = QueueState::new();
        empty.next();
        assert_eq!(empty.position(), None);
    }

    #[test]
    fn test_previous_at_start_is_noop_for_every_repeat_mode() {
        for repeat in [RepeatMode::None, RepeatMode::One, RepeatMode::All] {
            let mut state = state_with(&["a", "b", "c"], Some(0));
            state.set_repeat(repeat);
            assert!(!state.previous());
            assert_eq!(state.position(), Some(0));
        }

        let mut state = state_with(&["a", "b", "c"], Some(2));
        assert!(state.previous());
        assert_eq!(state.position(), Some(1));
    }

    #[test]
    fn test_can_play_flags_at_boundaries() {
        let mut state = state_with(&["a", "b", "c"], Some(0));
        assert!(!state.can_play_previous());
        assert!(state.can_play_next());

        state.position = Some(2);
        assert!(state.can_play_previous());
        assert!(!state.can_play_next());

        state.set_repeat(RepeatMode::All);
        assert!(state.can_play_next());
        state.position = Some(0);
        assert!(state.can_play_previous());

        let empty = QueueState::new();
        assert!(!empty.can_play_previous());
        assert!(!empty.can_play_next());
    }

    #[test]
    fn test_shuffle_round_trip_restores_original_and_keeps_current() {
        let ids = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let mut state = state_with(&ids, Some(3));
        let current = state.current().unwrap().entry_id;
        let original_order = video_ids(state.original());
        let mut rng = StdRng::seed_from_u64(7);

        state.set_shuffle(true, &mut rng);
        assert!(state.shuffle());
        assert_eq!(state.current().unwrap().entry_id, current);
        assert_eq!(video_ids(state.original()), original_order);
        assert_same_entries(&state);

        state.set_shuffle(false, &mut rng);
        assert!(!state.shuffle());
        assert_eq!(video_ids(state.entries()), original_order);
        assert_eq!(state.current().unwrap().entry_id, current);
        assert_eq!(state.position(), Some(3));
    }

    #[test]
    fn test_shuffle_without_cursor_keeps_none() {
        let mut state = state_with(&["a", "b", "c"], None);
        state.set_shuffle(true, &mut StdRng::seed_from_u64(1));
        assert_eq!(state.position(), None);
        assert_same_entries(&state);
    }

    #[test]
    fn test_remove_current_slides_next_in() {
        let mut state = state_with(&["a", "b", "c", "d"], Some(1));
        let b = state.entries()[1].entry_id;
        let a = state.entries()[0].entry_id;

        assert!(state.remove(&[a, b]));
        assert_eq!(video_ids(state.entries()), vec!["c", "d"]);
        assert_eq!(state.current().unwrap().video_id(), "c");
        assert_same_entries(&state);
    }

    #[test]
    fn test_remove_last_current_clamps_and_empty_clears() {
        let mut state = state_with(&["a", "b"], Some(1));
        let b = state.entries()[1].entry_id;
        assert!(state.remove(&[b]));
        assert_eq!(state.position(), Some(0));

        let a = state.entries()[0].entry_id;
        assert!(state.remove(&[a]));
        assert_eq!(state.position(), None);
        assert!(state.is_empty());
    }

    #[test]
    fn test_remove_before_cursor_keeps_current() {
        let mut state = state_with(&["a", "b", "c"], Some(2));
        let a = state.entries()[0].entry_id;
        assert!(!state.remove(&[a]));
        assert_eq!(state.current().unwrap().video_id(), "c");
        assert_eq!(state.position(), Some(1));
    }

    #[test]
    fn test_insert_before_cursor_shifts_it() {
        let mut state = state_with(&["a", "b"], Some(1));
        state.insert(0, entries(&["x", "y"]));
        assert_eq!(video_ids(state.entries()), vec!["x", "y", "a", "b"]);
        assert_eq!(video_ids(state.original()), vec!["x", "y", "a", "b"]);
        assert_eq!(state.current().unwrap().video_id(), "b");

        state.insert(99, entries(&["z"]));
        assert_eq!(state.entries().last().unwrap().video_id(), "z");
        assert_eq!(state.current().unwrap().video_id(), "b");
    }

    #[test]
    fn test_insert_while_shuffled_appends_to_original() {
        let mut state = state_with(&["a", "b", "c"], Some(0));
        state.set_shuffle(true, &mut StdRng::seed_from_u64(3));
        state.insert(1, entries(&["x"]));
        assert_eq!(state.entries()[1].video_id(), "x");
        assert_eq!(state.original().last().unwrap().video_id(), "x");
        assert_same_entries(&state);
    }

    #[test]
    fn test_change_position_reports_change() {
        let mut state = state_with(&["a", "b"], Some(0));
        assert!(!state.change_position(0).unwrap());
        assert!(state.change_position(1).unwrap());
        assert!(state.change_position(2).is_err());
        assert_eq!(state.position(), Some(1));
    }

    #[test]
    fn test_restore_shares_entries_between_orders() {
        let mut state = QueueState::new();
        state.restore(
            vec![track("c"), track("a"), track("b"), track("a")],
            vec![track("a"), track("a"), track("b"), track("zz")],
            true,
            RepeatMode::One,
        );

        assert_eq!(video_ids(state.entries()), vec!["c", "a", "b", "a"]);
        assert_eq!(video_ids(state.original()), vec!["a", "a", "b", "c"]);
        assert!(state.shuffle());
        assert_eq!(state.repeat(), RepeatMode::One);
        assert_eq!(state.position(), None);
        assert_same_entries(&state);
    }

    #[test]
    fn test_replace_respects_shuffle() {
        let mut state = QueueState::new();
        state.set_shuffle(true, &mut StdRng::seed_from_u64(5));
        state.replace(entries(&["a", "b", "c", "d"]), 2, &mut StdRng::seed_from_u64(5));
        assert_eq!(state.current().unwrap().video_id(), "c");
        assert_eq!(video_ids(state.original()), vec!["a", "b", "c", "d"]);
        assert_same_entries(&state);
    }

    struct StubCatalog {
        known: HashMap<String, QueueTrack>,
        batch_fails: bool,
    }

    #[async_trait]
    impl Catalog for StubCatalog {
        async fn fetch_song(&self, video_id: &str) -> std::result::Result<Song, CatalogError> {
            Err(CatalogError::NotFound(video_id.to_string()))
        }

        async fn fetch_track_settings(
            &self,
            _video_id: &str,
        ) -> std::result::Result<QueueSettings, CatalogError> {
            Ok(QueueSettings::default())
        }

        async fn fetch_tracklist(
            &self,
            video_ids: &[String],
        ) -> std::result::Result<Vec<QueueTrack>, CatalogError> {
            if self.batch_fails && video_ids.len() > 1 {
                return Err(CatalogError::Network("batch endpoint down".to_string()));
            }
            if video_ids.len() == 1 && !self.known.contains_key(&video_ids[0]) {
                return Err(CatalogError::NotFound(video_ids[0].clone()));
            }
            Ok(video_ids.iter().filter_map(|id| self.known.get(id).cloned()).collect())
        }
    }

    fn queue_with(known: &[&str], batch_fails: bool) -> (Queue, mpsc::UnboundedReceiver<QueueSignal>) {
        let catalog = StubCatalog {
            known: known.iter().map(|id| (id.to_string(), track(id))).collect(),
            batch_fails,
        };
        Queue::new(Arc::new(catalog), EventBus::new(64))
    }

    fn expect_current(rx: &mut mpsc::UnboundedReceiver<QueueSignal>) -> Option<String> {
        match rx.try_recv() {
            Ok(QueueSignal::CurrentChanged(entry)) => entry.map(|e| e.video_id().to_string()),
            other => panic!("expected CurrentChanged, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_songs_drops_unknown_ids() {
        let (queue, _rx) = queue_with(&["a", "c"], false);
        let added = queue
            .add_songs(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await;
        assert_eq!(added, 2);
        assert_eq!(video_ids(queue.snapshot().await.entries()), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_tracklist_falls_back_to_single_lookups() {
        let (queue, _rx) = queue_with(&["a", "c"], true);
        let tracks = queue
            .get_tracklist(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await;
        let ids: Vec<&str> = tracks.iter().map(|t| t.video_id()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_navigation_signals_in_order() {
        let (queue, mut rx) = queue_with(&[], false);
        queue.append(vec![track("a"), track("b")], None).await;
        assert!(rx.try_recv().is_err(), "append does not move the cursor");

        queue.next().await;
        queue.next().await;
        queue.next().await;
        assert_eq!(expect_current(&mut rx), Some("a".to_string()));
        assert_eq!(expect_current(&mut rx), Some("b".to_string()));
        assert_eq!(expect_current(&mut rx), None);

        // previous from None stays put and is silent
        queue.previous().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_repeat_one_resignals_same_entry() {
        let (queue, mut rx) = queue_with(&[], false);
        queue.play_tracks(vec![track("a"), track("b")], None, 0).await;
        assert!(matches!(rx.try_recv(), Ok(QueueSignal::WantsToPlay)));
        assert_eq!(expect_current(&mut rx), Some("a".to_string()));

        queue.set_repeat(RepeatMode::One).await;
        queue.repeat_or_next().await;
        assert_eq!(expect_current(&mut rx), Some("a".to_string()));
        assert_eq!(queue.position().await, Some(0));

        queue.set_repeat(RepeatMode::None).await;
        queue.repeat_or_next().await;
        assert_eq!(expect_current(&mut rx), Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_change_position_signals_only_on_change() {
        let (queue, mut rx) = queue_with(&[], false);
        queue.append(vec![track("a"), track("b")], None).await;

        queue.change_position(1).await.unwrap();
        assert_eq!(expect_current(&mut rx), Some("b".to_string()));

        queue.change_position(1).await.unwrap();
        assert!(rx.try_recv().is_err());

        assert!(queue.change_position(5).await.is_err());
    }

    #[tokio::test]
    async fn test_removing_current_resignals() {
        let (queue, mut rx) = queue_with(&[], false);
        queue.play_tracks(vec![track("a"), track("b")], None, 0).await;
        let _ = rx.try_recv();
        let _ = rx.try_recv();

        let current = queue.current().await.unwrap();
        queue.remove(&[current.entry_id]).await;
        assert_eq!(expect_current(&mut rx), Some("b".to_string()));

        queue.clear().await;
        assert_eq!(expect_current(&mut rx), None);
    }
}
