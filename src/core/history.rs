//! Macrostep history tracking.
//!
//! Provides immutable tracking of the configurations a running service has
//! moved through, following functional programming principles.

use super::configuration::Configuration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single macrostep.
///
/// Records are immutable values representing a move from one configuration
/// to another, caused by one external event, at a specific point in time.
///
/// # Example
///
/// ```rust
/// use statecraft::core::{Configuration, TransitionRecord};
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     from: Configuration::new(["toggle.off"]),
///     to: Configuration::new(["toggle.on"]),
///     event: "TOGGLE".to_string(),
///     timestamp: Utc::now(),
///     microsteps: 1,
/// };
/// assert_eq!(record.event, "TOGGLE");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The configuration before the event
    pub from: Configuration,
    /// The configuration after the event
    pub to: Configuration,
    /// Name of the external event that caused the move
    pub event: String,
    /// When the move was applied
    pub timestamp: DateTime<Utc>,
    /// Microsteps taken, including those for internal done events
    pub microsteps: usize,
}

/// Ordered history of macrosteps.
///
/// History is immutable - the `record` method returns a new history
/// with the record added.
///
/// # Example
///
/// ```rust
/// use statecraft::core::{Configuration, StateHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let history = StateHistory::new();
///
/// let history = history.record(TransitionRecord {
///     from: Configuration::new(["light.green"]),
///     to: Configuration::new(["light.yellow"]),
///     event: "TIMER".to_string(),
///     timestamp: Utc::now(),
///     microsteps: 1,
/// });
///
/// let history = history.record(TransitionRecord {
///     from: Configuration::new(["light.yellow"]),
///     to: Configuration::new(["light.red"]),
///     event: "TIMER".to_string(),
///     timestamp: Utc::now(),
///     microsteps: 1,
/// });
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 3); // green -> yellow -> red
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHistory {
    records: Vec<TransitionRecord>,
}

impl StateHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record a macrostep, returning a new history.
    ///
    /// This is a pure function - it does not mutate the existing history
    /// but returns a new one with the record added.
    ///
    /// ```rust
    /// use statecraft::core::{Configuration, StateHistory, TransitionRecord};
    /// use chrono::Utc;
    ///
    /// let history = StateHistory::new();
    /// let new_history = history.record(TransitionRecord {
    ///     from: Configuration::new(["toggle.off"]),
    ///     to: Configuration::new(["toggle.on"]),
    ///     event: "TOGGLE".to_string(),
    ///     timestamp: Utc::now(),
    ///     microsteps: 1,
    /// });
    /// assert_eq!(new_history.records().len(), 1);
    /// assert_eq!(history.records().len(), 0); // Original unchanged
    /// ```
    pub fn record(&self, record: TransitionRecord) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// Get the path of configurations traversed.
    ///
    /// Returns the first `from` configuration, then the `to` configuration
    /// of each record.
    pub fn get_path(&self) -> Vec<&Configuration> {
        let mut path = Vec::new();
        if let Some(first) = self.records.first() {
            path.push(&first.from);
        }
        for record in &self.records {
            path.push(&record.to);
        }
        path
    }

    /// Calculate total duration from first to last record.
    ///
    /// Returns `None` if there are no records.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.first(), self.records.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all records, in order.
    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
