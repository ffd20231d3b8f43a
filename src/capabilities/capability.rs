//! The capability trait.
//!
//! A capability is a behavior unit with an Active/Inactive lifecycle gated by
//! its activation and deactivation predicates. Implementors only write the
//! variant-specific logic; the lifecycle itself (state, ordering, blocking)
//! lives in [`super::state_machine`] and is never reachable from here.
//!
//! # Example
//!
//! ```ignore
//! struct Sprint { stamina: f32 }
//!
//! impl Capability for Sprint {
//!     fn should_activate(&self, ctx: &CapabilityContext<'_>) -> bool {
//!         ctx.component::<Input>().map_or(false, |i| i.sprint_held)
//!     }
//!
//!     fn should_deactivate(&self, _ctx: &CapabilityContext<'_>) -> bool {
//!         self.stamina <= 0.0
//!     }
//!
//!     fn on_tick(&mut self, _ctx: &mut CapabilityContext<'_>, dt: f32) -> Result<(), HookError> {
//!         self.stamina -= dt;
//!         Ok(())
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;

use serde::Serialize;

use super::context::CapabilityContext;
use crate::hooks::HookError;

/// Lifecycle hooks of a capability. All methods have defaults.
///
/// Predicates take `&self` and a shared context: they must not have side
/// effects. `on_activate` runs exactly once per Inactive -> Active
/// transition, `on_deactivate` exactly once per Active -> Inactive
/// transition, and `on_tick` once per pass while Active.
pub trait Capability: Any {
    /// Called once, right after the capability is registered.
    fn on_setup(&mut self, _ctx: &mut CapabilityContext<'_>) {}

    /// Queried only while Inactive.
    fn should_activate(&self, _ctx: &CapabilityContext<'_>) -> bool {
        false
    }

    /// Queried only while Active.
    fn should_deactivate(&self, _ctx: &CapabilityContext<'_>) -> bool {
        false
    }

    /// A failure here keeps the capability Inactive.
    fn on_activate(&mut self, _ctx: &mut CapabilityContext<'_>) -> Result<(), HookError> {
        Ok(())
    }

    /// A failure here is reported; the capability still becomes Inactive.
    fn on_deactivate(&mut self, _ctx: &mut CapabilityContext<'_>) -> Result<(), HookError> {
        Ok(())
    }

    fn on_tick(&mut self, _ctx: &mut CapabilityContext<'_>, _dt: f32) -> Result<(), HookError> {
        Ok(())
    }
}

pub(crate) fn as_any<'a>(capability: &'a (dyn Capability + 'static)) -> &'a (dyn Any + 'static) {
    capability
}

/// Activation state of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityState {
    #[default]
    Inactive,
    Active,
}

impl CapabilityState {
    pub fn is_active(self) -> bool {
        self == CapabilityState::Active
    }
}

impl fmt::Display for CapabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityState::Inactive => f.write_str("inactive"),
            CapabilityState::Active => f.write_str("active"),
        }
    }
}

/// Index of a capability in its orchestrator's arena. Indices follow
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CapabilityHandle(pub(crate) usize);

impl CapabilityHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CapabilityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
