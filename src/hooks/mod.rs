//! Hook failure handling.
//!
//! Capability and component hooks should not panic; they return
//! [`HookError`] to signal problems. Either way a failing hook never aborts
//! the pass: [`HookGuard`] turns errors and caught panics into a
//! [`HookFailure`] that is reported and the pass moves on to the next
//! capability.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

// ---------------------------------------------------------------------------
// HookError
// ---------------------------------------------------------------------------

/// Error returned by a hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookError {
    pub message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new(format!("panicked: {}", detail))
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HookError: {}", self.message)
    }
}

impl std::error::Error for HookError {}

impl From<String> for HookError {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for HookError {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// HookKind / HookFailure
// ---------------------------------------------------------------------------

/// Which hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Setup,
    ShouldActivate,
    ShouldDeactivate,
    Activate,
    Deactivate,
    Tick,
    ComponentSetup,
    ComponentTick,
    ComponentRemoved,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HookKind::Setup => "on_setup",
            HookKind::ShouldActivate => "should_activate",
            HookKind::ShouldDeactivate => "should_deactivate",
            HookKind::Activate => "on_activate",
            HookKind::Deactivate => "on_deactivate",
            HookKind::Tick => "on_tick",
            HookKind::ComponentSetup => "component.on_setup",
            HookKind::ComponentTick => "component.on_tick",
            HookKind::ComponentRemoved => "component.on_removed",
        };
        f.write_str(s)
    }
}

/// A failed hook invocation, attributed to the capability or component that
/// owns the hook.
#[derive(Debug, Clone, PartialEq)]
pub struct HookFailure {
    pub subject: String,
    pub hook: HookKind,
    pub pass: u64,
    pub error: HookError,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of '{}' failed in pass {}: {}",
            self.hook, self.subject, self.pass, self.error
        )
    }
}

// ---------------------------------------------------------------------------
// HookGuard
// ---------------------------------------------------------------------------

/// Runs hooks, optionally catching panics.
#[derive(Debug, Clone, Copy)]
pub struct HookGuard {
    catch_panics: bool,
}

impl HookGuard {
    pub fn new(catch_panics: bool) -> Self {
        Self { catch_panics }
    }

    /// Invoke `hook`, mapping a panic to a [`HookError`] when panics are caught.
    pub fn run<T>(&self, hook: impl FnOnce() -> Result<T, HookError>) -> Result<T, HookError> {
        if !self.catch_panics {
            return hook();
        }
        match catch_unwind(AssertUnwindSafe(hook)) {
            Ok(result) => result,
            Err(payload) => Err(HookError::from_panic(payload)),
        }
    }
}

impl Default for HookGuard {
    fn default() -> Self {
        Self::new(true)
    }
}
