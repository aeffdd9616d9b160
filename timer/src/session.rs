//! Session façade over the cycle store.
//!
//! [`Session`] is what the presentation layer talks to. It owns the
//! [`CycleStore`], the elapsed-seconds counter, and a [`Clock`], and exposes
//! derived values (active cycle, remaining time, countdown digits, title)
//! next to the mutating operations.
//!
//! # Elapsed Time
//!
//! Elapsed seconds are always measured from the active cycle's `startDate`,
//! never accumulated tick by tick. A session rebuilt after a restart resumes
//! with the correct remaining time, and a late or dropped tick never skews
//! the countdown.
//!
//! # Completion
//!
//! Completion is polled: each [`Session::tick`] compares elapsed seconds with
//! the planned duration and finishes the cycle once it is reached. The cycle
//! is finished at most one tick interval late.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::{self, CycleError};
use crate::store::{CycleAction, CycleStore};
use crate::types::{Cycle, CycleId, NewCycleData};

/// Title shown while no cycle is running.
pub const DEFAULT_TITLE: &str = "Pomodoro Timer";

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = instant;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Remaining time split into display digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    pub minutes: u64,
    pub seconds: u64,
}

impl Countdown {
    /// Splits a number of seconds into minutes and seconds.
    #[must_use]
    pub fn from_seconds(total: u64) -> Self {
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

/// Result of feeding a tick to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No cycle is running; the tick was ignored.
    Idle,
    /// The active cycle is still counting down.
    Running { elapsed: u64, remaining: u64 },
    /// The tick reached the planned duration and finished this cycle.
    Finished(CycleId),
}

/// The presentation layer's view of the cycle store.
pub struct Session {
    store: CycleStore,
    clock: Arc<dyn Clock>,
    amount_seconds_passed: u64,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("amount_seconds_passed", &self.amount_seconds_passed)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wraps `store`, reconstructing elapsed seconds for a rehydrated active
    /// cycle from its start date.
    #[must_use]
    pub fn new(store: CycleStore, clock: Arc<dyn Clock>) -> Self {
        let amount_seconds_passed = store
            .active_cycle()
            .map_or(0, |cycle| seconds_between(cycle.start_date, clock.now()));
        Self {
            store,
            clock,
            amount_seconds_passed,
        }
    }

    /// All cycles, oldest first.
    #[must_use]
    pub fn cycles(&self) -> &[Cycle] {
        self.store.cycles()
    }

    /// Id of the running cycle, if any.
    #[must_use]
    pub fn active_cycle_id(&self) -> Option<&CycleId> {
        self.store.active_cycle_id()
    }

    /// The running cycle, if any.
    #[must_use]
    pub fn active_cycle(&self) -> Option<&Cycle> {
        self.store.active_cycle()
    }

    /// Returns `true` while a cycle is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active_cycle().is_some()
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &CycleStore {
        &self.store
    }

    /// The current instant according to the session clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Seconds elapsed in the active cycle as of the last tick.
    #[must_use]
    pub fn amount_seconds_passed(&self) -> u64 {
        self.amount_seconds_passed
    }

    /// Reloads the stored record, picking up cycles started or stopped by
    /// another process. Returns `true` if anything changed.
    pub fn refresh(&mut self) -> bool {
        if !self.store.refresh() {
            return false;
        }
        self.amount_seconds_passed = self
            .store
            .active_cycle()
            .map_or(0, |cycle| seconds_between(cycle.start_date, self.clock.now()));
        true
    }

    /// Overrides the elapsed-seconds counter.
    pub fn set_seconds_passed(&mut self, seconds: u64) {
        self.amount_seconds_passed = seconds;
    }

    /// Planned duration of the active cycle in seconds, or 0 when idle.
    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        self.active_cycle().map_or(0, Cycle::total_seconds)
    }

    /// Seconds left in the active cycle, or 0 when idle.
    #[must_use]
    pub fn remaining_seconds(&self) -> u64 {
        self.total_seconds()
            .saturating_sub(self.amount_seconds_passed)
    }

    /// Remaining time as display digits.
    #[must_use]
    pub fn countdown(&self) -> Countdown {
        Countdown::from_seconds(self.remaining_seconds())
    }

    /// Window title: the countdown and task while running.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use pomodoro_timer::session::{Session, SystemClock, DEFAULT_TITLE};
    /// use pomodoro_timer::store::CycleStore;
    /// use pomodoro_timer::types::NewCycleData;
    ///
    /// let mut session = Session::new(CycleStore::in_memory(), Arc::new(SystemClock));
    /// assert_eq!(session.title(), DEFAULT_TITLE);
    ///
    /// session.create_new_cycle(&NewCycleData::new("Write spec", 25).unwrap()).unwrap();
    /// assert_eq!(session.title(), "25:00 | Write spec");
    /// ```
    #[must_use]
    pub fn title(&self) -> String {
        match self.active_cycle() {
            Some(cycle) => format!("{} | {}", self.countdown(), cycle.task),
            None => DEFAULT_TITLE.to_string(),
        }
    }

    /// Starts a new cycle now and resets the elapsed counter.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::CycleAlreadyActive`] while another cycle runs.
    pub fn create_new_cycle(&mut self, data: &NewCycleData) -> Result<CycleId, CycleError> {
        let id = self.store.create_new_cycle(data, self.clock.now())?;
        self.amount_seconds_passed = 0;
        info!(
            cycle_id = %id,
            task = data.task(),
            minutes_amount = data.minutes_amount(),
            "Cycle started"
        );
        Ok(id)
    }

    /// Validates raw input and starts a cycle from it.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Validation`](error::TimerError::Validation) for
    /// an empty task or a minutes amount outside `1..=max_minutes`, and
    /// [`TimerError::Cycle`](error::TimerError::Cycle) while
    /// another cycle runs.
    pub fn start_cycle(
        &mut self,
        task: &str,
        minutes_amount: u32,
        max_minutes: u32,
    ) -> error::Result<CycleId> {
        let data = NewCycleData::with_max_minutes(task, minutes_amount, max_minutes)?;
        Ok(self.create_new_cycle(&data)?)
    }

    /// Stops the active cycle early. Returns `false` when idle.
    pub fn interrupt_current_cycle(&mut self) -> bool {
        self.store
            .dispatch(CycleAction::InterruptCurrentCycle, self.clock.now())
    }

    /// Stops the active cycle at the user's request. Returns `false` when idle.
    ///
    /// Recorded the same way as an interruption.
    pub fn pause_current_cycle(&mut self) -> bool {
        self.store
            .dispatch(CycleAction::PauseCurrentCycle, self.clock.now())
    }

    /// Marks the active cycle as finished. Returns `false` when idle.
    pub fn mark_current_cycle_as_finished(&mut self) -> bool {
        self.store
            .dispatch(CycleAction::MarkCurrentCycleAsFinished, self.clock.now())
    }

    /// Records `elapsed_seconds` for the active cycle and finishes it once
    /// the planned duration is reached.
    ///
    /// The stored record is re-read first, so a cycle stopped by another
    /// process yields [`TickOutcome::Idle`].
    pub fn tick(&mut self, elapsed_seconds: u64) -> TickOutcome {
        self.store.refresh();
        self.apply_elapsed(elapsed_seconds)
    }

    /// Ticks with the elapsed time measured by the session clock.
    pub fn tick_now(&mut self) -> TickOutcome {
        self.store.refresh();
        let Some(cycle) = self.store.active_cycle() else {
            return TickOutcome::Idle;
        };
        let elapsed = seconds_between(cycle.start_date, self.clock.now());
        self.apply_elapsed(elapsed)
    }

    fn apply_elapsed(&mut self, elapsed_seconds: u64) -> TickOutcome {
        let Some(cycle) = self.store.active_cycle() else {
            return TickOutcome::Idle;
        };
        let total = cycle.total_seconds();
        let id = cycle.id.clone();

        if elapsed_seconds >= total {
            if !self.mark_current_cycle_as_finished() {
                return TickOutcome::Idle;
            }
            self.amount_seconds_passed = total;
            info!(cycle_id = %id, total_seconds = total, "Cycle finished");
            return TickOutcome::Finished(id);
        }

        self.amount_seconds_passed = elapsed_seconds;
        TickOutcome::Running {
            elapsed: elapsed_seconds,
            remaining: total - elapsed_seconds,
        }
    }
}

/// Whole seconds from `start` to `now`, clamped at zero.
fn seconds_between(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - start).num_seconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, STORAGE_KEY};
    use crate::error::{TimerError, ValidationError};
    use crate::types::{CycleStatus, SessionState};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn session_at(start: i64) -> (Session, ManualClock) {
        let clock = ManualClock::new(at(start));
        let session = Session::new(CycleStore::in_memory(), Arc::new(clock.clone()));
        (session, clock)
    }

    fn write_spec() -> NewCycleData {
        NewCycleData::new("Write spec", 25).unwrap()
    }

    #[test]
    fn countdown_formats_with_leading_zeros() {
        assert_eq!(Countdown::from_seconds(1500).to_string(), "25:00");
        assert_eq!(Countdown::from_seconds(65).to_string(), "01:05");
        assert_eq!(Countdown::from_seconds(0).to_string(), "00:00");
    }

    #[test]
    fn seconds_between_clamps_negative() {
        assert_eq!(seconds_between(at(100), at(50)), 0);
        assert_eq!(seconds_between(at(100), at(225)), 125);
    }

    #[test]
    fn idle_session_defaults() {
        let (session, _) = session_at(0);
        assert!(!session.is_running());
        assert_eq!(session.amount_seconds_passed(), 0);
        assert_eq!(session.remaining_seconds(), 0);
        assert_eq!(session.countdown().to_string(), "00:00");
        assert_eq!(session.title(), DEFAULT_TITLE);
    }

    #[test]
    fn create_resets_elapsed_and_activates() {
        let (mut session, _) = session_at(1_000);
        session.set_seconds_passed(99);

        let id = session.create_new_cycle(&write_spec()).unwrap();

        assert_eq!(session.active_cycle_id(), Some(&id));
        assert_eq!(session.amount_seconds_passed(), 0);
        assert_eq!(session.total_seconds(), 1500);
        assert_eq!(session.active_cycle().unwrap().start_date, at(1_000));
    }

    #[test]
    fn tick_updates_remaining_time() {
        let (mut session, _) = session_at(0);
        session.create_new_cycle(&write_spec()).unwrap();

        assert_eq!(
            session.tick(60),
            TickOutcome::Running {
                elapsed: 60,
                remaining: 1440
            }
        );
        assert_eq!(session.countdown().to_string(), "24:00");
        assert_eq!(session.title(), "24:00 | Write spec");
    }

    #[test]
    fn tick_finishes_exactly_once() {
        let (mut session, clock) = session_at(0);
        let id = session.create_new_cycle(&write_spec()).unwrap();

        clock.advance(Duration::seconds(1500));
        assert_eq!(session.tick(1500), TickOutcome::Finished(id));
        assert_eq!(session.tick(1501), TickOutcome::Idle);

        let finished: Vec<_> = session
            .cycles()
            .iter()
            .filter(|c| c.status() == CycleStatus::Completed)
            .collect();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].finished_date, Some(at(1500)));
        assert!(!session.is_running());
    }

    #[test]
    fn tick_now_measures_from_start_date() {
        let (mut session, clock) = session_at(0);
        session.create_new_cycle(&write_spec()).unwrap();

        clock.advance(Duration::seconds(90));
        assert_eq!(
            session.tick_now(),
            TickOutcome::Running {
                elapsed: 90,
                remaining: 1410
            }
        );
        assert_eq!(session.amount_seconds_passed(), 90);
    }

    #[test]
    fn tick_when_idle_is_ignored() {
        let (mut session, _) = session_at(0);
        assert_eq!(session.tick(10), TickOutcome::Idle);
        assert_eq!(session.tick_now(), TickOutcome::Idle);
        assert_eq!(session.amount_seconds_passed(), 0);
    }

    #[test]
    fn interrupt_and_pause_are_noops_when_idle() {
        let (mut session, _) = session_at(0);
        assert!(!session.interrupt_current_cycle());
        assert!(!session.pause_current_cycle());
        assert!(!session.mark_current_cycle_as_finished());
        assert!(session.cycles().is_empty());
    }

    #[test]
    fn interrupt_stamps_interrupted_date() {
        let (mut session, clock) = session_at(0);
        session.create_new_cycle(&write_spec()).unwrap();
        clock.advance(Duration::seconds(30));

        assert!(session.interrupt_current_cycle());

        let cycle = &session.cycles()[0];
        assert_eq!(cycle.interrupted_date, Some(at(30)));
        assert!(cycle.finished_date.is_none());
        assert!(session.active_cycle_id().is_none());
        assert_eq!(session.title(), DEFAULT_TITLE);
    }

    #[test]
    fn new_session_reconstructs_elapsed_from_storage() {
        let cycle = Cycle::new("Write spec", 25, at(10_000));
        let state = SessionState {
            active_cycle_id: Some(cycle.id.clone()),
            cycles: vec![cycle],
        };
        let storage = MemoryStorage::with_item(STORAGE_KEY, &serde_json::to_string(&state).unwrap());

        let clock = ManualClock::new(at(10_125));
        let session = Session::new(CycleStore::load(Box::new(storage)), Arc::new(clock));

        assert_eq!(session.amount_seconds_passed(), 125);
        assert_eq!(session.remaining_seconds(), 1375);
    }

    #[test]
    fn overdue_rehydrated_cycle_finishes_on_first_tick() {
        let cycle = Cycle::new("Write spec", 1, at(0));
        let id = cycle.id.clone();
        let state = SessionState {
            active_cycle_id: Some(id.clone()),
            cycles: vec![cycle],
        };
        let storage = MemoryStorage::with_item(STORAGE_KEY, &serde_json::to_string(&state).unwrap());

        let clock = ManualClock::new(at(3_600));
        let mut session = Session::new(CycleStore::load(Box::new(storage)), Arc::new(clock));

        assert_eq!(session.remaining_seconds(), 0);
        assert_eq!(session.tick_now(), TickOutcome::Finished(id));
    }

    #[test]
    fn tick_goes_idle_when_cycle_was_stopped_elsewhere() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(at(0));
        let mut foreground = Session::new(
            CycleStore::load(Box::new(storage.clone())),
            Arc::new(clock.clone()),
        );
        foreground.create_new_cycle(&NewCycleData::new("Write spec", 1).unwrap()).unwrap();

        let mut other = Session::new(
            CycleStore::load(Box::new(storage.clone())),
            Arc::new(clock.clone()),
        );
        clock.advance(Duration::seconds(30));
        assert!(other.interrupt_current_cycle());

        clock.advance(Duration::seconds(40));
        assert_eq!(foreground.tick_now(), TickOutcome::Idle);
        assert!(!foreground.is_running());

        let stored: SessionState =
            serde_json::from_str(&storage.item(STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(stored.cycles[0].status(), CycleStatus::Interrupted);
        assert_eq!(stored.cycles[0].interrupted_date, Some(at(30)));
    }

    #[test]
    fn start_cycle_reports_validation_and_rejection() {
        let (mut session, _) = session_at(0);

        assert!(matches!(
            session.start_cycle("  ", 25, 60),
            Err(TimerError::Validation(ValidationError::EmptyTask))
        ));
        assert!(matches!(
            session.start_cycle("Write spec", 90, 60),
            Err(TimerError::Validation(ValidationError::MinutesOutOfRange { value: 90, max: 60 }))
        ));
        assert!(session.cycles().is_empty());

        let id = session.start_cycle("Write spec", 90, 120).unwrap();
        assert_eq!(session.total_seconds(), 5400);
        assert_eq!(
            session.start_cycle("Other", 5, 120),
            Err(TimerError::Cycle(CycleError::CycleAlreadyActive { id }))
        );
    }
}
