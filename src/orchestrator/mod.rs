//! # Orchestrator
//!
//! The owning context for one entity's behavior graph. It ties the
//! composition loader, the tick scheduler, the component arena and the
//! blocking registry together:
//!
//! 1. [`Orchestrator::register_sheet`] expands sheets into instances. The
//!    whole call is validated before anything is created.
//! 2. [`Orchestrator::tick`] runs one pass of a cadence. The first pass seals
//!    registration.
//! 3. [`Orchestrator::teardown`] (or `Drop`) forces every Active capability
//!    to Inactive and removes every component.
//!
//! Everything runs on the caller's thread, in a fixed order.

pub mod config;
pub mod report;

pub use config::OrchestratorConfig;
pub use report::{CapabilityStatus, GroupStatus, PassReport, StatusReport, TeardownReport};

use std::fmt;

use uuid::Uuid;

use crate::blocking::{BlockingRegistry, InstigatorId, Tag};
use crate::capabilities::context::HookEnv;
use crate::capabilities::{Capability, CapabilityHandle, CapabilitySlot, CapabilityState};
use crate::components::{Component, ComponentStore};
use crate::diagnostics::{default_sink, DiagnosticEvent, SharedSink};
use crate::error::{EccError, Result};
use crate::hooks::HookGuard;
use crate::scheduler::{Registration, TickCadence, TickGroup, TickScheduler};
use crate::sheets::{
    CapabilityTemplate, CompositionLoader, CompositionSummary, ComponentTemplate, PlannedEntry, Sheet,
};

/// Unique identity of an orchestrator, handed to capabilities and
/// components as their non-owning back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrchestratorId(Uuid);

impl OrchestratorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrchestratorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrchestratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// A freshly built instance waiting to be attached.
enum Instance<'t> {
    Component(&'t ComponentTemplate, Box<dyn Component>),
    Capability(&'t CapabilityTemplate, TickGroup, Box<dyn Capability>),
}

/// Owns every capability and component of one entity.
pub struct Orchestrator {
    id: OrchestratorId,
    config: OrchestratorConfig,
    sink: SharedSink,
    guard: HookGuard,
    scheduler: TickScheduler,
    components: ComponentStore,
    blocking: BlockingRegistry,
    /// Root sheets registered, in order.
    sheets: Vec<String>,
    passes: u64,
    sealed: bool,
    torn_down: bool,
}

impl Orchestrator {
    /// Create an orchestrator reporting to the `log` facade.
    pub fn new(config: OrchestratorConfig) -> Self {
        Self::with_sink(config, default_sink())
    }

    pub fn with_sink(config: OrchestratorConfig, sink: SharedSink) -> Self {
        Self {
            id: OrchestratorId::new(),
            guard: HookGuard::new(config.catch_hook_panics),
            blocking: BlockingRegistry::with_sink(sink.clone()),
            config,
            sink,
            scheduler: TickScheduler::new(),
            components: ComponentStore::new(),
            sheets: Vec::new(),
            passes: 0,
            sealed: false,
            torn_down: false,
        }
    }

    pub fn id(&self) -> OrchestratorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Number of passes run so far, across cadences.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // -----------------------------------------------------------------------
    // Composition
    // -----------------------------------------------------------------------

    /// Expand one sheet tree and register everything in it.
    pub fn register_sheet(&mut self, sheet: &Sheet) -> Result<CompositionSummary> {
        self.register_sheets([sheet])
    }

    /// Expand several root sheets, in order, and register everything in them.
    ///
    /// Either every instance is registered or none is. Tick groups are
    /// validated before the first factory runs, and every factory runs
    /// before the first instance is attached, so a failing factory leaves
    /// the orchestrator untouched. Setup hooks run as each instance is
    /// attached.
    pub fn register_sheets<'a, I>(&mut self, sheets: I) -> Result<CompositionSummary>
    where
        I: IntoIterator<Item = &'a Sheet>,
    {
        if self.torn_down {
            return Err(EccError::TornDown(self.config.name.clone()));
        }
        if self.sealed {
            return Err(EccError::RegistrationSealed(self.config.name.clone()));
        }

        let roots: Vec<&Sheet> = sheets.into_iter().collect();
        let plan = CompositionLoader::new(self.sink.as_ref()).plan_all(roots.iter().copied())?;

        let instances: Vec<Instance<'_>> = plan
            .entries
            .iter()
            .map(|entry| match *entry {
                PlannedEntry::Component(template) => {
                    Instance::Component(template, template.instantiate())
                }
                PlannedEntry::Capability {
                    template,
                    tick_group,
                } => Instance::Capability(template, tick_group, template.instantiate()),
            })
            .collect();

        let Self {
            id,
            sink,
            guard,
            scheduler,
            components,
            blocking,
            ..
        } = self;
        let sink = sink.as_ref();

        for instance in instances {
            match instance {
                Instance::Component(template, behavior) => {
                    let handle =
                        components.attach(template.name(), template.tick_cadence(), behavior);
                    components.setup(handle, *id, *guard, sink);
                }
                Instance::Capability(template, tick_group, behavior) => {
                    let handle = scheduler.register(Registration {
                        name: template.name().to_string(),
                        tick_group,
                        tick_order: template.declared_tick_order(),
                        tags: template.declared_tags().to_vec(),
                        cadence: template.tick_cadence(),
                        behavior,
                    });
                    let mut env = HookEnv {
                        owner: *id,
                        pass: 0,
                        components: &mut *components,
                        blocking: &mut *blocking,
                        guard: *guard,
                        sink,
                    };
                    if let Some(slot) = scheduler.get_mut(handle) {
                        slot.setup(&mut env);
                    }
                }
            }
        }

        self.sheets
            .extend(roots.iter().map(|sheet| sheet.name().to_string()));

        let summary = CompositionSummary {
            sheets: plan.sheets.len(),
            components: plan.component_count(),
            capabilities: plan.capability_count(),
            skipped_slots: plan.skipped_slots,
        };
        self.sink.emit(
            DiagnosticEvent::debug("registered sheets")
                .with("orchestrator", &self.config.name)
                .with("sheets", summary.sheets)
                .with("components", summary.components)
                .with("capabilities", summary.capabilities),
        );
        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    /// First attached component of type `T`, if any.
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.components.first::<T>()
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.first_mut::<T>()
    }

    /// Every attached component of type `T`, in attach order.
    pub fn components_of<T: Component>(&self) -> impl Iterator<Item = &T> {
        self.components.all_of::<T>()
    }

    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    // -----------------------------------------------------------------------
    // Blocking
    // -----------------------------------------------------------------------

    /// Block every capability carrying any of `tags`, from the next pass on.
    pub fn block<I>(&mut self, tags: I, instigator: &InstigatorId)
    where
        I: IntoIterator<Item = Tag>,
    {
        self.blocking.block(tags, instigator);
    }

    /// Remove one block relation per tag. Returns how many were removed.
    pub fn unblock<I>(&mut self, tags: I, instigator: &InstigatorId) -> usize
    where
        I: IntoIterator<Item = Tag>,
    {
        self.blocking.unblock(tags, instigator)
    }

    pub fn is_blocked(&self, tag: &Tag) -> bool {
        self.blocking.is_blocked(tag)
    }

    pub fn blocking(&self) -> &BlockingRegistry {
        &self.blocking
    }

    // -----------------------------------------------------------------------
    // Passes
    // -----------------------------------------------------------------------

    /// Run one pass over every capability and component of `cadence`.
    ///
    /// Blocking is evaluated against a snapshot taken before the first
    /// capability runs. Hook failures are isolated and collected in the
    /// returned report; they never abort the pass.
    pub fn tick(&mut self, cadence: TickCadence, dt: f32) -> Result<PassReport> {
        if self.torn_down {
            return Err(EccError::TornDown(self.config.name.clone()));
        }
        if !self.sealed {
            self.sealed = true;
            if self.config.log_init_status {
                let status = self.status_report();
                self.sink.emit(
                    DiagnosticEvent::info(format!("init status\n{}", status))
                        .with("orchestrator", &self.config.name)
                        .with("components", status.components.len())
                        .with("capabilities", status.capability_count()),
                );
            }
        }

        self.passes += 1;
        let pass = self.passes;
        let mut report = PassReport::new(pass, cadence, dt);
        let snapshot = self.blocking.snapshot();

        let Self {
            id,
            sink,
            guard,
            scheduler,
            components,
            blocking,
            ..
        } = self;
        let sink = sink.as_ref();

        let mut env = HookEnv {
            owner: *id,
            pass,
            components: &mut *components,
            blocking: &mut *blocking,
            guard: *guard,
            sink,
        };
        scheduler.run_pass(&mut env, &snapshot, dt, &mut report);

        report.components_ticked =
            components.tick_all(cadence, dt, pass, *guard, sink, &mut report.failures);
        Ok(report)
    }

    pub fn fixed_tick(&mut self, dt: f32) -> Result<PassReport> {
        self.tick(TickCadence::Fixed, dt)
    }

    pub fn frame_tick(&mut self, dt: f32) -> Result<PassReport> {
        self.tick(TickCadence::Frame, dt)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn capability_state(&self, handle: CapabilityHandle) -> Option<CapabilityState> {
        self.scheduler.get(handle).map(CapabilitySlot::state)
    }

    /// The capability behind `handle`, if it is a `T`.
    pub fn capability<T: Capability>(&self, handle: CapabilityHandle) -> Option<&T> {
        self.scheduler.get(handle)?.downcast_ref::<T>()
    }

    pub fn capability_slot(&self, handle: CapabilityHandle) -> Option<&CapabilitySlot> {
        self.scheduler.get(handle)
    }

    /// Handle of the first capability registered under `name`.
    pub fn find_capability(&self, name: &str) -> Option<CapabilityHandle> {
        self.scheduler
            .slots()
            .iter()
            .find(|slot| slot.name() == name)
            .map(CapabilitySlot::handle)
    }

    /// Handles in the order a pass visits them.
    pub fn visit_order(&self) -> Vec<CapabilityHandle> {
        self.scheduler.visit_order()
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn status_report(&self) -> StatusReport {
        let tick_groups = self
            .scheduler
            .buckets()
            .filter(|bucket| !bucket.is_empty())
            .map(|bucket| GroupStatus {
                group: bucket.group(),
                capabilities: bucket
                    .handles()
                    .filter_map(|handle| self.scheduler.get(handle))
                    .map(|slot| CapabilityStatus {
                        handle: slot.handle(),
                        name: slot.name().to_string(),
                        tick_order: slot.tick_order(),
                        cadence: slot.cadence(),
                        state: slot.state(),
                        tags: slot.tags().iter().map(|t| t.as_str().to_string()).collect(),
                    })
                    .collect(),
            })
            .collect();

        let mut blocked_tags: Vec<String> = self
            .blocking
            .blocked_tags()
            .map(|t| t.as_str().to_string())
            .collect();
        blocked_tags.sort();

        StatusReport {
            name: self.config.name.clone(),
            sheets: self.sheets.clone(),
            components: self.components.names().map(str::to_string).collect(),
            tick_groups,
            blocked_tags,
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Force every Active capability to Inactive, then remove every
    /// component. No hook runs after this returns. Calling it again is a
    /// no-op returning an empty report.
    pub fn teardown(&mut self) -> TeardownReport {
        if self.torn_down {
            return TeardownReport::default();
        }
        self.torn_down = true;
        self.sealed = true;

        let mut report = TeardownReport::default();
        let Self {
            id,
            sink,
            guard,
            scheduler,
            components,
            blocking,
            ..
        } = self;
        let sink = sink.as_ref();

        let mut env = HookEnv {
            owner: *id,
            pass: 0,
            components: &mut *components,
            blocking: &mut *blocking,
            guard: *guard,
            sink,
        };
        report.deactivated = scheduler.force_deactivate_all(&mut env, &mut report.failures);
        report.components_removed = components.remove_all(*guard, sink);
        scheduler.clear();

        sink.emit(
            DiagnosticEvent::info("orchestrator torn down")
                .with("orchestrator", &self.config.name)
                .with("deactivated", report.deactivated)
                .with("components_removed", report.components_removed)
                .with("failures", report.failures.len()),
        );
        report
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("capabilities", &self.scheduler.len())
            .field("components", &self.components.len())
            .field("passes", &self.passes)
            .field("sealed", &self.sealed)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}
