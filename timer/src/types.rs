//! Cycle and session types for the Pomodoro Timer.
//!
//! This module defines the data model shared by the store, the session façade
//! and the presentation layer. Persisted types serialize to camelCase JSON so
//! the stored record keeps the `{ "cycles": [...], "activeCycleId": ... }`
//! layout.
//!
//! # Dates
//!
//! Dates are written as RFC 3339 strings with millisecond precision and a `Z`
//! suffix (`2024-05-01T09:30:00.000Z`). When reading, both RFC 3339 strings
//! (any offset) and epoch-millisecond numbers are accepted and converted to
//! [`DateTime<Utc>`] before any arithmetic happens.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Smallest planned duration accepted for a cycle.
pub const MIN_MINUTES_AMOUNT: u32 = 1;

/// Largest planned duration accepted when no limit is configured.
pub const DEFAULT_MAX_MINUTES_AMOUNT: u32 = 60;

/// Opaque cycle identifier.
///
/// Freshly generated ids are time-ordered UUIDs (v7). Ids read back from
/// storage are kept verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleId(String);

impl CycleId {
    /// Generates a new time-ordered identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CycleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CycleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle status of a cycle, derived from its terminal fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    /// No terminal timestamp set.
    Running,
    /// `finishedDate` is set: the countdown ran out.
    Completed,
    /// `interruptedDate` is set: the user stopped the cycle early.
    Interrupted,
}

impl CycleStatus {
    /// Human-readable label used by the history views.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "In progress",
            Self::Completed => "Completed",
            Self::Interrupted => "Interrupted",
        }
    }
}

/// One planned or executed work interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    /// Unique identifier assigned at creation.
    pub id: CycleId,

    /// User-supplied task label.
    pub task: String,

    /// Planned duration in minutes.
    pub minutes_amount: u32,

    /// When the cycle became active.
    #[serde(with = "date_format")]
    pub start_date: DateTime<Utc>,

    /// Set when the cycle was stopped before completion.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "date_format::option"
    )]
    pub interrupted_date: Option<DateTime<Utc>>,

    /// Set when the cycle ran to completion.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "date_format::option"
    )]
    pub finished_date: Option<DateTime<Utc>>,
}

impl Cycle {
    /// Creates a running cycle with a freshly generated id.
    #[must_use]
    pub fn new(task: impl Into<String>, minutes_amount: u32, start_date: DateTime<Utc>) -> Self {
        Self {
            id: CycleId::generate(),
            task: task.into(),
            minutes_amount,
            start_date,
            interrupted_date: None,
            finished_date: None,
        }
    }

    /// Derives the status from the terminal fields.
    #[must_use]
    pub fn status(&self) -> CycleStatus {
        if self.finished_date.is_some() {
            CycleStatus::Completed
        } else if self.interrupted_date.is_some() {
            CycleStatus::Interrupted
        } else {
            CycleStatus::Running
        }
    }

    /// Returns `true` once either terminal timestamp is set.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.interrupted_date.is_some() || self.finished_date.is_some()
    }

    /// Planned duration in seconds.
    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.minutes_amount) * 60
    }
}

/// Validated input for creating a cycle.
///
/// Construction is the input boundary: an empty task or an out-of-range
/// duration never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCycleData {
    task: String,
    minutes_amount: u32,
}

impl NewCycleData {
    /// Validates input against the default upper bound of
    /// [`DEFAULT_MAX_MINUTES_AMOUNT`] minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTask`] for a blank task and
    /// [`ValidationError::MinutesOutOfRange`] for a zero or too-large duration.
    ///
    /// # Examples
    ///
    /// ```
    /// use pomodoro_timer::types::NewCycleData;
    ///
    /// let data = NewCycleData::new("  Write spec ", 25).unwrap();
    /// assert_eq!(data.task(), "Write spec");
    /// assert!(NewCycleData::new("", 25).is_err());
    /// assert!(NewCycleData::new("Write spec", 0).is_err());
    /// ```
    pub fn new(task: &str, minutes_amount: u32) -> Result<Self, ValidationError> {
        Self::with_max_minutes(task, minutes_amount, DEFAULT_MAX_MINUTES_AMOUNT)
    }

    /// Validates input against a caller-supplied upper bound.
    ///
    /// # Errors
    ///
    /// See [`NewCycleData::new`].
    pub fn with_max_minutes(
        task: &str,
        minutes_amount: u32,
        max_minutes: u32,
    ) -> Result<Self, ValidationError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(ValidationError::EmptyTask);
        }

        if !(MIN_MINUTES_AMOUNT..=max_minutes).contains(&minutes_amount) {
            return Err(ValidationError::MinutesOutOfRange {
                value: minutes_amount,
                max: max_minutes,
            });
        }

        Ok(Self {
            task: task.to_string(),
            minutes_amount,
        })
    }

    /// Parses raw form input (minutes as text) and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidMinutes`] when `minutes` is not a
    /// whole number, otherwise the same errors as [`NewCycleData::new`].
    pub fn parse(task: &str, minutes: &str, max_minutes: u32) -> Result<Self, ValidationError> {
        let trimmed = minutes.trim();
        let minutes_amount = trimmed
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidMinutes(trimmed.to_string()))?;
        Self::with_max_minutes(task, minutes_amount, max_minutes)
    }

    /// The trimmed task label.
    #[must_use]
    pub fn task(&self) -> &str {
        &self.task
    }

    /// The planned duration in minutes.
    #[must_use]
    pub fn minutes_amount(&self) -> u32 {
        self.minutes_amount
    }
}

/// The persisted aggregate: every cycle plus the active cycle id.
///
/// `cycles` is append-only and kept in chronological order.
/// `active_cycle_id` is a lookup key into `cycles`, never an owning reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// All cycles, oldest first.
    pub cycles: Vec<Cycle>,

    /// Id of the running cycle, if any.
    #[serde(default)]
    pub active_cycle_id: Option<CycleId>,
}

impl SessionState {
    /// Resolves `active_cycle_id` by linear search.
    #[must_use]
    pub fn active_cycle(&self) -> Option<&Cycle> {
        let id = self.active_cycle_id.as_ref()?;
        self.find_cycle(id)
    }

    /// Looks up a cycle by id.
    #[must_use]
    pub fn find_cycle(&self, id: &CycleId) -> Option<&Cycle> {
        self.cycles.iter().find(|cycle| &cycle.id == id)
    }

    pub(crate) fn find_cycle_mut(&mut self, id: &CycleId) -> Option<&mut Cycle> {
        self.cycles.iter_mut().find(|cycle| &cycle.id == id)
    }

    /// Clears `active_cycle_id` if it points at a missing or terminal cycle.
    ///
    /// Returns `true` if the id was cleared.
    pub fn repair_active_cycle(&mut self) -> bool {
        let dangling = match self.active_cycle_id.as_ref() {
            Some(id) => self.find_cycle(id).map_or(true, Cycle::is_terminal),
            None => false,
        };
        if dangling {
            self.active_cycle_id = None;
        }
        dangling
    }
}

/// Serde adapters for cycle dates.
mod date_format {
    use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Text(String),
        Millis(i64),
    }

    fn parse(raw: RawDate) -> Result<DateTime<Utc>, String> {
        match raw {
            RawDate::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|date| date.with_timezone(&Utc))
                .map_err(|e| format!("invalid date '{text}': {e}")),
            RawDate::Millis(millis) => Utc
                .timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| format!("date out of range: {millis}")),
        }
    }

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = RawDate::deserialize(deserializer)?;
        parse(raw).map_err(<D::Error as serde::de::Error>::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        use super::RawDate;

        pub fn serialize<S: Serializer>(
            date: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<RawDate>::deserialize(deserializer)?
                .map(super::parse)
                .transpose()
                .map_err(<D::Error as serde::de::Error>::custom)
        }
    }
}
