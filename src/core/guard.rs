//! Guard predicates for controlling transitions.
//!
//! Guards are pure boolean functions over the caller's context and the
//! incoming event. They decide whether a candidate transition may fire and
//! must never mutate anything: they only receive shared references.

use super::event::Event;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by a guard while evaluating its predicate.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct GuardError {
    message: String,
}

impl GuardError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

type Predicate<C> = dyn Fn(&C, &Event) -> Result<bool, GuardError> + Send + Sync;

/// Pure predicate that determines if a transition can fire.
///
/// # Example
///
/// ```rust
/// use statecraft::core::{Event, Guard};
///
/// struct Form {
///     text: String,
/// }
///
/// let is_filled = Guard::new(|form: &Form, _event: &Event| !form.text.is_empty());
///
/// let filled = Form { text: "hi".into() };
/// let empty = Form { text: String::new() };
/// assert_eq!(is_filled.check(&filled, &Event::new("SUBMIT")), Ok(true));
/// assert_eq!(is_filled.check(&empty, &Event::new("SUBMIT")), Ok(false));
/// ```
pub struct Guard<C> {
    predicate: Arc<Predicate<C>>,
}

impl<C> Guard<C> {
    /// Create a guard whose evaluation can fail.
    ///
    /// A failure is reported to the caller of the interpreter instead of
    /// being read as `false`.
    ///
    /// ```rust
    /// use statecraft::core::{Event, Guard, GuardError};
    ///
    /// let within_limit = Guard::try_new(|limit: &u32, event: &Event| {
    ///     let amount = event
    ///         .payload()
    ///         .and_then(|p| p["amount"].as_u64())
    ///         .ok_or_else(|| GuardError::new("payload has no amount"))?;
    ///     Ok(amount <= u64::from(*limit))
    /// });
    ///
    /// assert!(within_limit.check(&10, &Event::new("PAY")).is_err());
    /// ```
    pub fn try_new<F>(predicate: F) -> Self
    where
        F: Fn(&C, &Event) -> Result<bool, GuardError> + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the guard against a context and event.
    pub fn check(&self, context: &C, event: &Event) -> Result<bool, GuardError> {
        (self.predicate)(context, event)
    }
}

impl<C: 'static> Guard<C> {
    /// Create a guard from an infallible predicate.
    ///
    /// The predicate must be pure (deterministic, no side effects) and
    /// thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C, &Event) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(move |context: &C, event: &Event| -> Result<bool, GuardError> {
                Ok(predicate(context, event))
            }),
        }
    }

    /// A guard that passes when `self` fails.
    pub fn negate(self) -> Self {
        let inner = self.predicate;
        Guard {
            predicate: Arc::new(move |context: &C, event: &Event| -> Result<bool, GuardError> {
                inner(context, event).map(|ok| !ok)
            }),
        }
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("predicate", &"<function>")
            .finish()
    }
}

/// Named guards available to a machine definition.
///
/// Transitions reference guards by name (`cond`); compilation fails when a
/// name is missing from the registry.
pub struct GuardRegistry<C> {
    guards: BTreeMap<String, Guard<C>>,
}

impl<C> GuardRegistry<C> {
    pub fn new() -> Self {
        Self {
            guards: BTreeMap::new(),
        }
    }

    /// Register a guard, returning the registry for chaining.
    pub fn with(mut self, name: impl Into<String>, guard: Guard<C>) -> Self {
        self.register(name, guard);
        self
    }

    /// Register a guard, replacing any guard with the same name.
    pub fn register(&mut self, name: impl Into<String>, guard: Guard<C>) {
        self.guards.insert(name.into(), guard);
    }

    pub fn get(&self, name: &str) -> Option<&Guard<C>> {
        self.guards.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.guards.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.guards.keys().map(String::as_str)
    }

    /// Evaluate the named guard. A missing guard is an evaluation failure.
    pub fn evaluate(&self, name: &str, context: &C, event: &Event) -> Result<bool, GuardError> {
        match self.guards.get(name) {
            Some(guard) => guard.check(context, event),
            None => Err(GuardError::new(format!("guard '{name}' is not registered"))),
        }
    }
}

impl<C> Default for GuardRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for GuardRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            guards: self.guards.clone(),
        }
    }
}

impl<C> fmt::Debug for GuardRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.guards.keys()).finish()
    }
}
