//! Tunables applied to every interpreter call on a definition.

use serde::{Deserialize, Serialize};

/// Default bound on microsteps per call.
pub const DEFAULT_MAX_MICROSTEPS: usize = 64;

/// Interpreter settings, fixed at compile time.
///
/// Deserializable from any serde source; missing fields take their defaults.
///
/// ```rust
/// use statecraft::engine::InterpreterOptions;
///
/// let options: InterpreterOptions =
///     serde_json::from_str(r#"{ "max_microsteps": 8 }"#).unwrap();
/// assert_eq!(options.max_microsteps, 8);
/// assert!(options.validate_configuration);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterOptions {
    /// Upper bound on microsteps (the external event plus the internal done
    /// events it raises) taken by a single call.
    pub max_microsteps: usize,

    /// Check caller-supplied configurations against the definition before
    /// resolving an event.
    pub validate_configuration: bool,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            max_microsteps: DEFAULT_MAX_MICROSTEPS,
            validate_configuration: true,
        }
    }
}

impl InterpreterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_microsteps(mut self, limit: usize) -> Self {
        self.max_microsteps = limit;
        self
    }

    pub fn validate_configuration(mut self, enabled: bool) -> Self {
        self.validate_configuration = enabled;
        self
    }
}
