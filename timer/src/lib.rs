//! Pomodoro Timer - terminal countdown timer with persistent cycle history.
//!
//! This crate provides the cycle state machine behind a Pomodoro timer, the
//! session façade the interfaces talk to, and a terminal user interface.
//!
//! # Overview
//!
//! A *cycle* is one timed work interval labelled with a task. At most one
//! cycle runs at a time. It ends either by running out (finished) or by the
//! user stopping it (interrupted). Every state change is written through to
//! durable storage, and the countdown survives restarts because elapsed time
//! is always recomputed from the cycle's start date.
//!
//! # Modules
//!
//! - [`types`]: Cycle, session state and validated new-cycle input
//! - [`store`]: Cycle state machine with write-through persistence
//! - [`storage`]: Key/value storage boundary (file-backed and in-memory)
//! - [`session`]: Session façade with countdown and title derivation
//! - [`ticker`]: Background countdown ticker
//! - [`history`]: History table rows with relative start times
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types for timer operations
//! - [`tui`]: Terminal user interface
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pomodoro_timer::{CycleStore, NewCycleData, Session, SystemClock};
//!
//! let mut session = Session::new(CycleStore::in_memory(), Arc::new(SystemClock));
//! let data = NewCycleData::new("Write spec", 25).unwrap();
//! session.create_new_cycle(&data).unwrap();
//!
//! assert_eq!(session.total_seconds(), 1500);
//! assert!(session.interrupt_current_cycle());
//! assert!(!session.is_running());
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod storage;
pub mod store;
pub mod ticker;
pub mod tui;
pub mod types;

pub use config::{Config, ConfigError};
pub use error::{CycleError, Result, TimerError, TuiError, ValidationError};
pub use history::{history_entries, HistoryEntry};
pub use session::{Clock, Countdown, ManualClock, Session, SystemClock, TickOutcome};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError, STORAGE_KEY};
pub use store::{CycleAction, CycleStore};
pub use ticker::{CountdownTick, CountdownTicker};
pub use types::{Cycle, CycleId, CycleStatus, NewCycleData, SessionState};
