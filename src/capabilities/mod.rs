//! # Capabilities
//!
//! Discrete, independently activatable behavior units. Each capability
//! declares a tick group, a tick order within that group, a tag set and a
//! cadence; the orchestrator owns the instance and drives it through the
//! Inactive/Active lifecycle once per pass of its cadence.

pub mod capability;
pub mod context;
pub mod state_machine;

pub use capability::{Capability, CapabilityHandle, CapabilityState};
pub use context::CapabilityContext;
pub use state_machine::{CapabilitySlot, CapabilityStats};
