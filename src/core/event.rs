//! Events raised by the caller (or internally, for done events).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Prefix of internal events raised when a compound or parallel state completes.
pub const DONE_STATE_PREFIX: &str = "done.state.";

/// A named occurrence with an optional structured payload.
///
/// # Example
///
/// ```rust
/// use statecraft::core::Event;
/// use serde_json::json;
///
/// let event = Event::new("TYPE").with_payload(json!({ "text": "hello" }));
/// assert_eq!(event.name(), "TYPE");
/// assert_eq!(event.payload().unwrap()["text"], "hello");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    /// Attach a payload, replacing any existing one.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The done event raised when the state with `state_id` reaches a final state.
    pub fn done_state(state_id: &str) -> Self {
        Self::new(format!("{DONE_STATE_PREFIX}{state_id}"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Whether this is an internally raised done event.
    pub fn is_done_event(&self) -> bool {
        self.name.starts_with(DONE_STATE_PREFIX)
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
