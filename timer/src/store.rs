//! The cycle store: a reducer over [`SessionState`] with write-through
//! persistence.
//!
//! Transitions are expressed as [`CycleAction`] values applied by the pure
//! [`reduce`] function. [`CycleStore`] wraps the state, dispatches actions,
//! and after every action that changed something serializes the whole state
//! to its [`KeyValueStorage`] under [`STORAGE_KEY`].
//!
//! # States
//!
//! ```text
//!            AddNewCycle
//!   Idle ------------------> Running
//!    ^                          |
//!    |  Interrupt / Pause       |
//!    +--------------------------+
//!    |  MarkCurrentCycleAsFinished
//!    +--------------------------+
//! ```
//!
//! Interrupt, pause and finish are no-ops while Idle. Adding a cycle while
//! Running is rejected so at most one cycle is ever non-terminal.
//!
//! # Recovery
//!
//! Loading never fails: a missing key, unreadable storage, or a corrupt
//! record all produce an empty session (the last two with a warning). A
//! failed write is logged and the in-memory state stays authoritative.
//!
//! Several processes may share one storage (the TUI, a foreground `start`,
//! a `stop` from another shell). Every transition first re-reads the stored
//! record, so a change written elsewhere is applied to rather than
//! overwritten.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::CycleError;
use crate::storage::{KeyValueStorage, MemoryStorage, StorageError, STORAGE_KEY};
use crate::types::{Cycle, CycleId, NewCycleData, SessionState};

/// A transition of the cycle state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleAction {
    /// Append a cycle and make it the active one.
    AddNewCycle(Cycle),
    /// Stop the active cycle early.
    InterruptCurrentCycle,
    /// Stop the active cycle at the user's request; recorded as an interruption.
    PauseCurrentCycle,
    /// Record that the active cycle ran out its countdown.
    MarkCurrentCycleAsFinished,
}

/// Applies `action` to `state`, returning `true` if the state changed.
///
/// `now` stamps the terminal date for interrupt, pause and finish.
pub fn reduce(state: &mut SessionState, action: CycleAction, now: DateTime<Utc>) -> bool {
    match action {
        CycleAction::AddNewCycle(cycle) => {
            if state.active_cycle_id.is_some() || state.find_cycle(&cycle.id).is_some() {
                return false;
            }
            state.active_cycle_id = Some(cycle.id.clone());
            state.cycles.push(cycle);
            true
        }
        CycleAction::InterruptCurrentCycle | CycleAction::PauseCurrentCycle => {
            close_active_cycle(state, |cycle| cycle.interrupted_date = Some(now))
        }
        CycleAction::MarkCurrentCycleAsFinished => {
            close_active_cycle(state, |cycle| cycle.finished_date = Some(now))
        }
    }
}

fn close_active_cycle(state: &mut SessionState, stamp: impl FnOnce(&mut Cycle)) -> bool {
    let Some(id) = state.active_cycle_id.take() else {
        return false;
    };
    match state.find_cycle_mut(&id) {
        Some(cycle) if !cycle.is_terminal() => stamp(cycle),
        _ => warn!(cycle_id = %id, "Active cycle id did not resolve to a running cycle"),
    }
    true
}

/// Owns the session state and persists it after every change.
pub struct CycleStore {
    state: SessionState,
    storage: Box<dyn KeyValueStorage>,
}

impl std::fmt::Debug for CycleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CycleStore {
    /// Rehydrates a store from `storage`.
    ///
    /// Falls back to an empty session when the key is missing, unreadable or
    /// corrupt. A stale `activeCycleId` is cleared.
    #[must_use]
    pub fn load(storage: Box<dyn KeyValueStorage>) -> Self {
        let state = load_state(storage.as_ref());
        info!(
            cycles = state.cycles.len(),
            active_cycle_id = ?state.active_cycle_id.as_ref().map(CycleId::as_str),
            "Cycle store loaded"
        );
        Self { state, storage }
    }

    /// Creates an empty store backed by throwaway in-memory storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: SessionState::default(),
            storage: Box::new(MemoryStorage::new()),
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// All cycles, oldest first.
    #[must_use]
    pub fn cycles(&self) -> &[Cycle] {
        &self.state.cycles
    }

    /// Id of the running cycle, if any.
    #[must_use]
    pub fn active_cycle_id(&self) -> Option<&CycleId> {
        self.state.active_cycle_id.as_ref()
    }

    /// The running cycle, if any.
    #[must_use]
    pub fn active_cycle(&self) -> Option<&Cycle> {
        self.state.active_cycle()
    }

    /// Replaces the in-memory state with the stored record, picking up
    /// changes written by another process.
    ///
    /// Keeps the in-memory state when the record is missing, unreadable or
    /// corrupt. Returns `true` if the state changed.
    pub fn refresh(&mut self) -> bool {
        let Some(stored) = read_state(self.storage.as_ref()) else {
            return false;
        };
        if stored == self.state {
            return false;
        }
        debug!(
            cycles = stored.cycles.len(),
            active_cycle_id = ?stored.active_cycle_id.as_ref().map(CycleId::as_str),
            "Cycle state changed in storage, reloading"
        );
        self.state = stored;
        true
    }

    /// Applies `action` to the latest stored state and persists the result
    /// if it changed.
    ///
    /// Returns whether the state changed.
    pub fn dispatch(&mut self, action: CycleAction, now: DateTime<Utc>) -> bool {
        self.refresh();
        let kind = action_name(&action);
        let changed = reduce(&mut self.state, action, now);
        if changed {
            info!(
                action = kind,
                cycles = self.state.cycles.len(),
                "Cycle state changed"
            );
            self.persist();
        }
        changed
    }

    /// Starts a new cycle at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::CycleAlreadyActive`] if a cycle is running; the
    /// state is left untouched.
    pub fn create_new_cycle(
        &mut self,
        data: &NewCycleData,
        now: DateTime<Utc>,
    ) -> Result<CycleId, CycleError> {
        self.refresh();
        if let Some(id) = self.active_cycle_id() {
            return Err(CycleError::CycleAlreadyActive { id: id.clone() });
        }
        let cycle = Cycle::new(data.task(), data.minutes_amount(), now);
        let id = cycle.id.clone();
        self.dispatch(CycleAction::AddNewCycle(cycle), now);
        Ok(id)
    }

    fn persist(&self) {
        if let Err(e) = save_state(self.storage.as_ref(), &self.state) {
            warn!(error = %e, "Failed to persist cycle state; keeping in-memory state");
        }
    }
}

/// Reads and parses the session state from `storage`.
///
/// Never fails; see the module docs for the fallback rules.
pub fn load_state(storage: &dyn KeyValueStorage) -> SessionState {
    read_state(storage).unwrap_or_default()
}

/// Reads the stored session state, or `None` when it is missing, unreadable
/// or corrupt. A stale `activeCycleId` is cleared.
fn read_state(storage: &dyn KeyValueStorage) -> Option<SessionState> {
    let raw = match storage.get_item(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Failed to read cycle state");
            return None;
        }
    };

    if raw.trim().is_empty() {
        warn!("Stored cycle state is empty");
        return None;
    }

    match serde_json::from_str::<SessionState>(&raw) {
        Ok(mut state) => {
            if state.repair_active_cycle() {
                warn!("Stored active cycle id was stale and has been cleared");
            }
            Some(state)
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse cycle state");
            None
        }
    }
}

/// Serializes `state` and writes it under [`STORAGE_KEY`].
///
/// # Errors
///
/// Returns a [`StorageError`] if serialization or the write fails.
pub fn save_state(storage: &dyn KeyValueStorage, state: &SessionState) -> Result<(), StorageError> {
    let json = serde_json::to_string(state)?;
    storage.set_item(STORAGE_KEY, &json)
}

fn action_name(action: &CycleAction) -> &'static str {
    match action {
        CycleAction::AddNewCycle(_) => "add_new_cycle",
        CycleAction::InterruptCurrentCycle => "interrupt_current_cycle",
        CycleAction::PauseCurrentCycle => "pause_current_cycle",
        CycleAction::MarkCurrentCycleAsFinished => "mark_current_cycle_as_finished",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CycleStatus;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn data(task: &str, minutes: u32) -> NewCycleData {
        NewCycleData::new(task, minutes).unwrap()
    }

    fn store_with(storage: &MemoryStorage) -> CycleStore {
        CycleStore::load(Box::new(storage.clone()))
    }

    struct FailingStorage;

    impl KeyValueStorage for FailingStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("offline".to_string()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn reduce_add_sets_active_id() {
        let mut state = SessionState::default();
        let cycle = Cycle::new("Write spec", 25, at(0));
        let id = cycle.id.clone();

        assert!(reduce(&mut state, CycleAction::AddNewCycle(cycle), at(0)));
        assert_eq!(state.cycles.len(), 1);
        assert_eq!(state.active_cycle_id, Some(id));
    }

    #[test]
    fn reduce_add_while_running_is_noop() {
        let mut state = SessionState::default();
        reduce(&mut state, CycleAction::AddNewCycle(Cycle::new("a", 5, at(0))), at(0));
        let before = state.clone();

        assert!(!reduce(
            &mut state,
            CycleAction::AddNewCycle(Cycle::new("b", 5, at(1))),
            at(1)
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn reduce_terminal_actions_are_noops_when_idle() {
        for action in [
            CycleAction::InterruptCurrentCycle,
            CycleAction::PauseCurrentCycle,
            CycleAction::MarkCurrentCycleAsFinished,
        ] {
            let mut state = SessionState::default();
            assert!(!reduce(&mut state, action, at(10)));
            assert_eq!(state, SessionState::default());
        }
    }

    #[test]
    fn reduce_pause_records_interruption() {
        let mut state = SessionState::default();
        reduce(&mut state, CycleAction::AddNewCycle(Cycle::new("a", 5, at(0))), at(0));

        assert!(reduce(&mut state, CycleAction::PauseCurrentCycle, at(42)));
        assert_eq!(state.cycles[0].interrupted_date, Some(at(42)));
        assert_eq!(state.cycles[0].status(), CycleStatus::Interrupted);
        assert!(state.active_cycle_id.is_none());
    }

    #[test]
    fn reduce_does_not_touch_terminal_cycle_behind_stale_id() {
        let mut finished = Cycle::new("a", 5, at(0));
        finished.finished_date = Some(at(300));
        let mut state = SessionState {
            active_cycle_id: Some(finished.id.clone()),
            cycles: vec![finished],
        };

        assert!(reduce(&mut state, CycleAction::InterruptCurrentCycle, at(400)));
        assert_eq!(state.cycles[0].finished_date, Some(at(300)));
        assert!(state.cycles[0].interrupted_date.is_none());
        assert!(state.active_cycle_id.is_none());
    }

    #[test]
    fn create_persists_state() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);

        let id = store.create_new_cycle(&data("Write spec", 25), at(100)).unwrap();

        let raw = storage.item(STORAGE_KEY).expect("state persisted");
        let persisted: SessionState = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.active_cycle_id, Some(id));
        assert_eq!(persisted.cycles.len(), 1);
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn create_while_running_is_rejected() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);
        let first = store.create_new_cycle(&data("a", 25), at(0)).unwrap();

        let err = store.create_new_cycle(&data("b", 25), at(5)).unwrap_err();

        assert_eq!(err, CycleError::CycleAlreadyActive { id: first });
        assert_eq!(store.cycles().len(), 1);
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn noop_dispatch_does_not_write() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);

        assert!(!store.dispatch(CycleAction::InterruptCurrentCycle, at(0)));
        assert!(!store.dispatch(CycleAction::MarkCurrentCycleAsFinished, at(0)));
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn dispatch_applies_to_state_written_by_another_store() {
        let storage = MemoryStorage::new();
        let mut foreground = store_with(&storage);
        foreground.create_new_cycle(&data("a", 1), at(0)).unwrap();

        let mut other = store_with(&storage);
        assert!(other.dispatch(CycleAction::InterruptCurrentCycle, at(30)));
        let writes = storage.write_count();

        assert!(!foreground.dispatch(CycleAction::MarkCurrentCycleAsFinished, at(70)));
        assert_eq!(foreground.cycles()[0].status(), CycleStatus::Interrupted);
        assert!(foreground.active_cycle_id().is_none());
        assert_eq!(storage.write_count(), writes);
    }

    #[test]
    fn create_sees_cycle_started_by_another_store() {
        let storage = MemoryStorage::new();
        let mut first = store_with(&storage);
        let mut second = store_with(&storage);
        let id = first.create_new_cycle(&data("a", 25), at(0)).unwrap();

        let err = second.create_new_cycle(&data("b", 25), at(5)).unwrap_err();
        assert_eq!(err, CycleError::CycleAlreadyActive { id });
        assert_eq!(second.cycles().len(), 1);
    }

    #[test]
    fn refresh_keeps_memory_when_record_is_corrupt() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);
        store.create_new_cycle(&data("a", 25), at(0)).unwrap();
        storage.set_item(STORAGE_KEY, "{not json").unwrap();

        assert!(!store.refresh());
        assert!(store.active_cycle().is_some());
    }

    #[test]
    fn load_missing_key_is_empty() {
        let store = store_with(&MemoryStorage::new());
        assert_eq!(store.state(), &SessionState::default());
    }

    #[test]
    fn load_corrupt_record_is_empty() {
        for raw in ["{not json", "", "   ", r#"{"cycles": 3}"#, "null"] {
            let storage = MemoryStorage::with_item(STORAGE_KEY, raw);
            let store = store_with(&storage);
            assert_eq!(store.state(), &SessionState::default(), "input: {raw:?}");
        }
    }

    #[test]
    fn load_unreadable_storage_is_empty() {
        let store = CycleStore::load(Box::new(FailingStorage));
        assert!(store.cycles().is_empty());
        assert!(store.active_cycle_id().is_none());
    }

    #[test]
    fn write_failure_keeps_in_memory_state() {
        let mut store = CycleStore::load(Box::new(FailingStorage));

        store.create_new_cycle(&data("a", 5), at(0)).unwrap();
        assert!(store.active_cycle().is_some());

        assert!(store.dispatch(CycleAction::MarkCurrentCycleAsFinished, at(300)));
        assert_eq!(store.cycles()[0].status(), CycleStatus::Completed);
    }

    #[test]
    fn load_clears_stale_active_id() {
        let raw = r#"{"cycles":[],"activeCycleId":"ghost"}"#;
        let store = store_with(&MemoryStorage::with_item(STORAGE_KEY, raw));
        assert!(store.active_cycle_id().is_none());
    }

    #[test]
    fn load_without_active_id_field_defaults_to_idle() {
        let raw = r#"{"cycles":[{"id":"1","task":"t","minutesAmount":5,
            "startDate":"2024-05-01T09:30:00.000Z","finishedDate":"2024-05-01T09:35:00.000Z"}]}"#;
        let store = store_with(&MemoryStorage::with_item(STORAGE_KEY, raw));
        assert_eq!(store.cycles().len(), 1);
        assert!(store.active_cycle_id().is_none());
    }
}
