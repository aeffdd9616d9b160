//! Error types for the Pomodoro Timer.
//!
//! This module defines the error types used throughout the timer crate,
//! providing structured error handling with clear, human-readable messages.
//!
//! Recoverable storage conditions (missing or corrupt state, failed writes)
//! never surface here: the store logs them and falls back to a safe default.
//! What remains are input validation failures, rejected transitions, and
//! terminal failures. Configuration errors live in
//! [`config`](crate::config).

use thiserror::Error;

use crate::types::CycleId;

/// Errors from starting a cycle through the library entry points.
///
/// Combines the input check and the state machine's rejection, so callers
/// holding raw input handle one type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// New-cycle input was rejected at the input boundary.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A cycle transition was rejected by the state machine.
    #[error("cycle error: {0}")]
    Cycle(#[from] CycleError),
}

/// Errors produced while validating new-cycle input.
///
/// These are raised before anything reaches the cycle store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task label is empty after trimming.
    #[error("task cannot be empty")]
    EmptyTask,

    /// Minutes amount could not be parsed as a whole number.
    #[error("minutes must be a whole number, got '{0}'")]
    InvalidMinutes(String),

    /// Minutes amount is outside the accepted range.
    #[error("minutes must be between 1 and {max}, got {value}")]
    MinutesOutOfRange { value: u32, max: u32 },
}

/// Errors produced by the cycle state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    /// A new cycle was requested while another one is still running.
    #[error("cycle {id} is still running; interrupt it before starting another")]
    CycleAlreadyActive { id: CycleId },
}

/// Errors that can occur during TUI operation.
#[derive(Error, Debug)]
pub enum TuiError {
    /// Terminal initialization failed.
    #[error("failed to initialize terminal: {0}")]
    TerminalInit(#[source] std::io::Error),

    /// Terminal rendering failed.
    #[error("render error: {0}")]
    Render(#[source] std::io::Error),

    /// Event handling error.
    #[error("event error: {0}")]
    Event(String),
}

/// A specialized `Result` type for timer operations.
pub type Result<T> = std::result::Result<T, TimerError>;
