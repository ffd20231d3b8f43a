//! Capability lifecycle.
//!
//! The state of a capability lives in [`CapabilitySlot`] and is private to
//! this module: the only writers are [`CapabilitySlot::evaluate`] (one
//! scheduler pass) and [`CapabilitySlot::force_deactivate`] (teardown). A
//! tick without a prior activation cannot be expressed.
//!
//! Per pass, for one unblocked capability:
//!
//! ```text
//! Inactive --should_activate--> on_activate --> Active --> on_tick
//! Active   --should_deactivate--> on_deactivate --> Inactive (no tick)
//! Active   --(no transition)--> on_tick
//! ```

use crate::blocking::Tag;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::hooks::{HookError, HookFailure, HookKind};
use crate::scheduler::{TickCadence, TickGroup};

use super::capability::{as_any, Capability, CapabilityHandle, CapabilityState};
use super::context::HookEnv;

/// What happened to the state during one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Stay,
    Activated,
    Deactivated,
    /// `should_activate` said yes but `on_activate` failed.
    ActivationFailed,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Evaluation {
    pub transition: Transition,
    pub ticked: bool,
}

/// Lifetime counters of one capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilityStats {
    pub activations: u64,
    pub deactivations: u64,
    pub ticks: u64,
}

/// A registered capability: declared scheduling data, lifecycle state and
/// the behavior itself.
pub struct CapabilitySlot {
    handle: CapabilityHandle,
    name: String,
    tick_group: TickGroup,
    tick_order: u32,
    tags: Vec<Tag>,
    cadence: TickCadence,
    state: CapabilityState,
    stats: CapabilityStats,
    behavior: Box<dyn Capability>,
}

impl CapabilitySlot {
    pub(crate) fn new(
        handle: CapabilityHandle,
        name: String,
        tick_group: TickGroup,
        tick_order: u32,
        tags: Vec<Tag>,
        cadence: TickCadence,
        behavior: Box<dyn Capability>,
    ) -> Self {
        Self {
            handle,
            name,
            tick_group,
            tick_order,
            tags,
            cadence,
            state: CapabilityState::Inactive,
            stats: CapabilityStats::default(),
            behavior,
        }
    }

    pub fn handle(&self) -> CapabilityHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tick_group(&self) -> TickGroup {
        self.tick_group
    }

    pub fn tick_order(&self) -> u32 {
        self.tick_order
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn cadence(&self) -> TickCadence {
        self.cadence
    }

    pub fn state(&self) -> CapabilityState {
        self.state
    }

    pub fn stats(&self) -> CapabilityStats {
        self.stats
    }

    pub fn behavior(&self) -> &dyn Capability {
        self.behavior.as_ref()
    }

    pub fn downcast_ref<T: Capability>(&self) -> Option<&T> {
        as_any(self.behavior.as_ref()).downcast_ref::<T>()
    }

    pub(crate) fn setup(&mut self, env: &mut HookEnv<'_>) {
        let guard = env.guard;
        let sink = env.sink;
        let mut ctx = env.context(self.handle);
        let behavior = &mut self.behavior;
        if let Err(error) = guard.run(|| {
            behavior.on_setup(&mut ctx);
            Ok(())
        }) {
            let failure = self.failure(HookKind::Setup, 0, error);
            report(sink, &failure);
        }
    }

    /// Run one pass for this capability: transition check, then tick if the
    /// post-transition state is Active. Blocking is the caller's concern.
    pub(crate) fn evaluate(
        &mut self,
        env: &mut HookEnv<'_>,
        dt: f32,
        failures: &mut Vec<HookFailure>,
    ) -> Evaluation {
        let guard = env.guard;
        let sink = env.sink;
        let pass = env.pass;
        let mut ctx = env.context(self.handle);

        let transition = match self.state {
            CapabilityState::Inactive => {
                let behavior = &self.behavior;
                match guard.run(|| Ok(behavior.should_activate(&ctx))) {
                    Ok(false) => Transition::Stay,
                    Ok(true) => {
                        let behavior = &mut self.behavior;
                        match guard.run(|| behavior.on_activate(&mut ctx)) {
                            Ok(()) => {
                                self.state = CapabilityState::Active;
                                self.stats.activations += 1;
                                Transition::Activated
                            }
                            Err(error) => {
                                self.record(sink, failures, HookKind::Activate, pass, error);
                                Transition::ActivationFailed
                            }
                        }
                    }
                    Err(error) => {
                        self.record(sink, failures, HookKind::ShouldActivate, pass, error);
                        Transition::Stay
                    }
                }
            }
            CapabilityState::Active => {
                let behavior = &self.behavior;
                match guard.run(|| Ok(behavior.should_deactivate(&ctx))) {
                    Ok(false) => Transition::Stay,
                    Ok(true) => {
                        let behavior = &mut self.behavior;
                        let result = guard.run(|| behavior.on_deactivate(&mut ctx));
                        self.state = CapabilityState::Inactive;
                        self.stats.deactivations += 1;
                        if let Err(error) = result {
                            self.record(sink, failures, HookKind::Deactivate, pass, error);
                        }
                        Transition::Deactivated
                    }
                    Err(error) => {
                        self.record(sink, failures, HookKind::ShouldDeactivate, pass, error);
                        Transition::Stay
                    }
                }
            }
        };

        let mut ticked = false;
        if self.state.is_active() {
            let behavior = &mut self.behavior;
            match guard.run(|| behavior.on_tick(&mut ctx, dt)) {
                Ok(()) => {
                    self.stats.ticks += 1;
                    ticked = true;
                }
                Err(error) => self.record(sink, failures, HookKind::Tick, pass, error),
            }
        }

        Evaluation { transition, ticked }
    }

    /// Teardown path: Active -> Inactive unconditionally, bypassing
    /// `should_deactivate` and blocking. Returns whether a transition happened.
    pub(crate) fn force_deactivate(
        &mut self,
        env: &mut HookEnv<'_>,
        failures: &mut Vec<HookFailure>,
    ) -> bool {
        if !self.state.is_active() {
            return false;
        }
        let guard = env.guard;
        let sink = env.sink;
        let pass = env.pass;
        let mut ctx = env.context(self.handle);
        let behavior = &mut self.behavior;
        let result = guard.run(|| behavior.on_deactivate(&mut ctx));
        self.state = CapabilityState::Inactive;
        self.stats.deactivations += 1;
        if let Err(error) = result {
            self.record(sink, failures, HookKind::Deactivate, pass, error);
        }
        true
    }

    fn failure(&self, hook: HookKind, pass: u64, error: HookError) -> HookFailure {
        HookFailure {
            subject: self.name.clone(),
            hook,
            pass,
            error,
        }
    }

    fn record(
        &self,
        sink: &dyn DiagnosticSink,
        failures: &mut Vec<HookFailure>,
        hook: HookKind,
        pass: u64,
        error: HookError,
    ) {
        let failure = self.failure(hook, pass, error);
        report(sink, &failure);
        failures.push(failure);
    }
}

fn report(sink: &dyn DiagnosticSink, failure: &HookFailure) {
    sink.emit(
        DiagnosticEvent::error("capability hook failed")
            .with("capability", &failure.subject)
            .with("hook", failure.hook)
            .with("pass", failure.pass)
            .with("error", &failure.error.message),
    );
}

impl std::fmt::Debug for CapabilitySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilitySlot")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("tick_group", &self.tick_group)
            .field("tick_order", &self.tick_order)
            .field("tags", &self.tags)
            .field("cadence", &self.cadence)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::BlockingRegistry;
    use crate::capabilities::CapabilityContext;
    use crate::components::ComponentStore;
    use crate::diagnostics::MemorySink;
    use crate::hooks::HookGuard;
    use crate::orchestrator::OrchestratorId;

    /// Scripted predicates plus a journal of hook calls.
    #[derive(Default)]
    struct Scripted {
        activate: bool,
        deactivate: bool,
        fail_activate: bool,
        fail_tick: bool,
        calls: Vec<&'static str>,
    }

    impl Capability for Scripted {
        fn should_activate(&self, _ctx: &CapabilityContext<'_>) -> bool {
            self.activate
        }

        fn should_deactivate(&self, _ctx: &CapabilityContext<'_>) -> bool {
            self.deactivate
        }

        fn on_activate(&mut self, _ctx: &mut CapabilityContext<'_>) -> Result<(), HookError> {
            self.calls.push("activate");
            if self.fail_activate {
                return Err("activation refused".into());
            }
            Ok(())
        }

        fn on_deactivate(&mut self, _ctx: &mut CapabilityContext<'_>) -> Result<(), HookError> {
            self.calls.push("deactivate");
            Ok(())
        }

        fn on_tick(&mut self, _ctx: &mut CapabilityContext<'_>, _dt: f32) -> Result<(), HookError> {
            self.calls.push("tick");
            if self.fail_tick {
                return Err("tick failed".into());
            }
            Ok(())
        }
    }

    struct Harness {
        components: ComponentStore,
        blocking: BlockingRegistry,
        sink: MemorySink,
        owner: OrchestratorId,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                components: ComponentStore::new(),
                blocking: BlockingRegistry::new(),
                sink: MemorySink::new(),
                owner: OrchestratorId::new(),
            }
        }

        fn env(&mut self, pass: u64) -> HookEnv<'_> {
            HookEnv {
                owner: self.owner,
                pass,
                components: &mut self.components,
                blocking: &mut self.blocking,
                guard: HookGuard::default(),
                sink: &self.sink,
            }
        }
    }

    fn slot(behavior: Scripted) -> CapabilitySlot {
        CapabilitySlot::new(
            CapabilityHandle(0),
            "scripted".into(),
            TickGroup::Gameplay,
            0,
            Vec::new(),
            TickCadence::Fixed,
            Box::new(behavior),
        )
    }

    fn calls(slot: &CapabilitySlot) -> Vec<&'static str> {
        slot.downcast_ref::<Scripted>().unwrap().calls.clone()
    }

    #[test]
    fn test_inactive_without_activation_never_ticks() {
        let mut h = Harness::new();
        let mut slot = slot(Scripted::default());
        let mut failures = Vec::new();
        let eval = slot.evaluate(&mut h.env(1), 0.1, &mut failures);
        assert_eq!(eval.transition, Transition::Stay);
        assert!(!eval.ticked);
        assert_eq!(slot.state(), CapabilityState::Inactive);
        assert!(calls(&slot).is_empty());
    }

    #[test]
    fn test_activate_and_tick_in_same_pass() {
        let mut h = Harness::new();
        let mut slot = slot(Scripted {
            activate: true,
            ..Default::default()
        });
        let mut failures = Vec::new();
        let eval = slot.evaluate(&mut h.env(1), 0.1, &mut failures);
        assert_eq!(eval.transition, Transition::Activated);
        assert!(eval.ticked);
        assert_eq!(calls(&slot), vec!["activate", "tick"]);
        assert_eq!(slot.stats().activations, 1);
    }

    #[test]
    fn test_deactivating_pass_does_not_tick() {
        let mut h = Harness::new();
        let mut slot = slot(Scripted {
            activate: true,
            deactivate: true,
            ..Default::default()
        });
        let mut failures = Vec::new();
        slot.evaluate(&mut h.env(1), 0.1, &mut failures);
        let eval = slot.evaluate(&mut h.env(2), 0.1, &mut failures);
        assert_eq!(eval.transition, Transition::Deactivated);
        assert!(!eval.ticked);
        assert_eq!(calls(&slot), vec!["activate", "tick", "deactivate"]);
        assert_eq!(slot.state(), CapabilityState::Inactive);
    }

    #[test]
    fn test_failed_activation_stays_inactive() {
        let mut h = Harness::new();
        let mut slot = slot(Scripted {
            activate: true,
            fail_activate: true,
            ..Default::default()
        });
        let mut failures = Vec::new();
        let eval = slot.evaluate(&mut h.env(1), 0.1, &mut failures);
        assert_eq!(eval.transition, Transition::ActivationFailed);
        assert!(!eval.ticked);
        assert_eq!(slot.state(), CapabilityState::Inactive);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].hook, HookKind::Activate);
        assert_eq!(h.sink.count(crate::diagnostics::Severity::Error), 1);
    }

    #[test]
    fn test_failed_tick_stays_active() {
        let mut h = Harness::new();
        let mut slot = slot(Scripted {
            activate: true,
            fail_tick: true,
            ..Default::default()
        });
        let mut failures = Vec::new();
        let eval = slot.evaluate(&mut h.env(1), 0.1, &mut failures);
        assert!(!eval.ticked);
        assert_eq!(slot.state(), CapabilityState::Active);
        assert_eq!(failures[0].hook, HookKind::Tick);
        assert_eq!(slot.stats().ticks, 0);
    }

    #[test]
    fn test_force_deactivate_bypasses_predicate() {
        let mut h = Harness::new();
        let mut slot = slot(Scripted {
            activate: true,
            deactivate: false,
            ..Default::default()
        });
        let mut failures = Vec::new();
        slot.evaluate(&mut h.env(1), 0.1, &mut failures);
        assert!(slot.force_deactivate(&mut h.env(0), &mut failures));
        assert_eq!(slot.state(), CapabilityState::Inactive);
        assert!(!slot.force_deactivate(&mut h.env(0), &mut failures));
        assert_eq!(calls(&slot), vec!["activate", "tick", "deactivate"]);
    }
}
