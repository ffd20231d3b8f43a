//! # ecc - Entity Capability Composition
//!
//! Composes one entity's behavior out of independently activatable
//! capabilities and passive components, evaluated once per pass in a strict
//! tick-group / tick-order sequence.
//!
//! - [`sheets`] describe what an entity is made of, in code or YAML.
//! - [`orchestrator::Orchestrator`] instantiates sheets and drives passes.
//! - [`capabilities`] move between Inactive and Active through their hooks.
//! - [`blocking`] lets any actor veto capabilities by tag without touching
//!   their state.
//!
//! ```no_run
//! use ecc::prelude::*;
//!
//! #[derive(Default)]
//! struct Walk;
//! impl Capability for Walk {}
//!
//! let sheet = Sheet::builder("player")
//!     .capability(CapabilityTemplate::of::<Walk>("walk").tick_group(TickGroup::Movement))
//!     .build();
//! let mut orchestrator = Orchestrator::new(OrchestratorConfig::new("player"));
//! orchestrator.register_sheet(&sheet)?;
//! orchestrator.fixed_tick(0.02)?;
//! # Ok::<(), ecc::EccError>(())
//! ```

pub mod blocking;
pub mod capabilities;
pub mod components;
pub mod diagnostics;
pub mod error;
pub mod hooks;
pub mod orchestrator;
pub mod scheduler;
pub mod sheets;

pub use error::{EccError, Result};
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorId};

/// Everything needed to author capabilities and run an orchestrator.
pub mod prelude {
    pub use crate::blocking::{tags, InstigatorId, Tag};
    pub use crate::capabilities::{Capability, CapabilityContext, CapabilityHandle, CapabilityState};
    pub use crate::components::Component;
    pub use crate::hooks::HookError;
    pub use crate::orchestrator::{Orchestrator, OrchestratorConfig, PassReport};
    pub use crate::scheduler::{TickCadence, TickGroup};
    pub use crate::sheets::{CapabilityTemplate, ComponentTemplate, Sheet, SheetLibrary, TemplateRegistry};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
