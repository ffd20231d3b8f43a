//! Tick scheduling.
//!
//! The scheduler owns the capability arena and one [`TickBucket`] per tick
//! group in use. A pass visits buckets in ascending group order and, inside
//! a bucket, capabilities in ascending tick order. For each capability of
//! the pass cadence it
//!
//! 1. skips it entirely if any of its tags is blocked in the pass snapshot,
//! 2. otherwise runs the transition check for its current state,
//! 3. and ticks it if it is Active afterwards.
//!
//! Evaluation is strictly sequential: every hook of an earlier group
//! completes before the next group starts.
//!
//! Schedulers only exist inside an orchestrator:
//!
//! ```compile_fail
//! let scheduler = ecc::scheduler::TickScheduler::new();
//! ```

pub mod bucket;
pub mod tick_group;

pub use bucket::TickBucket;
pub use tick_group::{TickCadence, TickGroup, TickGroupDecl};

use std::collections::BTreeMap;

use crate::blocking::{BlockSnapshot, Tag};
use crate::capabilities::context::HookEnv;
use crate::capabilities::state_machine::Transition;
use crate::capabilities::{Capability, CapabilityHandle, CapabilitySlot};
use crate::hooks::HookFailure;
use crate::orchestrator::report::PassReport;

/// Registration data for one capability instance.
pub(crate) struct Registration {
    pub name: String,
    pub tick_group: TickGroup,
    pub tick_order: u32,
    pub tags: Vec<Tag>,
    pub cadence: TickCadence,
    pub behavior: Box<dyn Capability>,
}

/// Owns registered capabilities and drives passes over them.
#[derive(Debug)]
pub struct TickScheduler {
    slots: Vec<CapabilitySlot>,
    buckets: BTreeMap<TickGroup, TickBucket>,
}

impl TickScheduler {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            buckets: BTreeMap::new(),
        }
    }

    /// Append a capability to the arena and to its group's bucket.
    pub(crate) fn register(&mut self, registration: Registration) -> CapabilityHandle {
        let handle = CapabilityHandle(self.slots.len());
        let Registration {
            name,
            tick_group,
            tick_order,
            tags,
            cadence,
            behavior,
        } = registration;

        self.buckets
            .entry(tick_group)
            .or_insert_with(|| TickBucket::new(tick_group))
            .insert(handle, tick_order);
        self.slots.push(CapabilitySlot::new(
            handle, name, tick_group, tick_order, tags, cadence, behavior,
        ));
        handle
    }

    pub fn get(&self, handle: CapabilityHandle) -> Option<&CapabilitySlot> {
        self.slots.get(handle.0)
    }

    pub(crate) fn get_mut(&mut self, handle: CapabilityHandle) -> Option<&mut CapabilitySlot> {
        self.slots.get_mut(handle.0)
    }

    /// Capabilities in registration order.
    pub fn slots(&self) -> &[CapabilitySlot] {
        &self.slots
    }

    /// Non-empty buckets in visiting order.
    pub fn buckets(&self) -> impl Iterator<Item = &TickBucket> {
        self.buckets.values()
    }

    /// Every capability handle in the order a pass visits them.
    pub fn visit_order(&self) -> Vec<CapabilityHandle> {
        self.buckets.values().flat_map(TickBucket::handles).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Evaluate every capability of `report.cadence` once.
    pub(crate) fn run_pass(
        &mut self,
        env: &mut HookEnv<'_>,
        snapshot: &BlockSnapshot,
        dt: f32,
        report: &mut PassReport,
    ) {
        let Self { slots, buckets } = self;
        for bucket in buckets.values() {
            for handle in bucket.handles() {
                let slot = &mut slots[handle.0];
                if slot.cadence() != report.cadence {
                    continue;
                }
                report.visited += 1;

                if snapshot.blocks_any(slot.tags()) {
                    report.blocked += 1;
                    continue;
                }

                let eval = slot.evaluate(env, dt, &mut report.failures);
                match eval.transition {
                    Transition::Activated => report.activated += 1,
                    Transition::Deactivated => report.deactivated += 1,
                    Transition::Stay | Transition::ActivationFailed => {}
                }
                if eval.ticked {
                    report.ticked += 1;
                }
            }
        }
    }

    /// Force every Active capability to Inactive, in visiting order.
    /// Returns how many were deactivated.
    pub(crate) fn force_deactivate_all(
        &mut self,
        env: &mut HookEnv<'_>,
        failures: &mut Vec<HookFailure>,
    ) -> usize {
        let Self { slots, buckets } = self;
        let mut deactivated = 0;
        for bucket in buckets.values() {
            for handle in bucket.handles() {
                if slots[handle.0].force_deactivate(env, failures) {
                    deactivated += 1;
                }
            }
        }
        deactivated
    }

    /// Drop every capability. Only valid once nothing is Active.
    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::{tags, BlockingRegistry, InstigatorId};
    use crate::capabilities::CapabilityContext;
    use crate::components::ComponentStore;
    use crate::diagnostics::MemorySink;
    use crate::hooks::{HookError, HookGuard};
    use crate::orchestrator::OrchestratorId;

    #[derive(Default)]
    struct Always;

    impl Capability for Always {
        fn should_activate(&self, _ctx: &CapabilityContext<'_>) -> bool {
            true
        }

        fn on_tick(&mut self, _ctx: &mut CapabilityContext<'_>, _dt: f32) -> Result<(), HookError> {
            Ok(())
        }
    }

    fn registration(name: &str, group: TickGroup, order: u32, tag: &str) -> Registration {
        Registration {
            name: name.to_string(),
            tick_group: group,
            tick_order: order,
            tags: tags([tag]),
            cadence: TickCadence::Fixed,
            behavior: Box::new(Always),
        }
    }

    #[test]
    fn test_visit_order_by_group_then_order() {
        let mut scheduler = TickScheduler::new();
        let a = scheduler.register(registration("a", TickGroup::Physics, 0, "x"));
        let b = scheduler.register(registration("b", TickGroup::Input, 5, "x"));
        let c = scheduler.register(registration("c", TickGroup::Input, 1, "x"));
        assert_eq!(scheduler.visit_order(), vec![c, b, a]);
        assert_eq!(scheduler.buckets().count(), 2);
    }

    #[test]
    fn test_run_pass_skips_blocked_and_filters_cadence() {
        let mut scheduler = TickScheduler::new();
        scheduler.register(registration("walk", TickGroup::Movement, 0, "movement"));
        scheduler.register(registration("aim", TickGroup::Gameplay, 0, "combat"));
        let mut frame = registration("camera", TickGroup::AfterPhysics, 0, "view");
        frame.cadence = TickCadence::Frame;
        scheduler.register(frame);

        let mut components = ComponentStore::new();
        let mut blocking = BlockingRegistry::new();
        blocking.block(tags(["movement"]), &InstigatorId::new("stun"));
        let snapshot = blocking.snapshot();
        let sink = MemorySink::new();

        let mut env = HookEnv {
            owner: OrchestratorId::new(),
            pass: 1,
            components: &mut components,
            blocking: &mut blocking,
            guard: HookGuard::default(),
            sink: &sink,
        };
        let mut report = PassReport::new(1, TickCadence::Fixed, 0.02);
        scheduler.run_pass(&mut env, &snapshot, 0.02, &mut report);

        assert_eq!(report.visited, 2);
        assert_eq!(report.blocked, 1);
        assert_eq!(report.activated, 1);
        assert_eq!(report.ticked, 1);
        let states: Vec<_> = scheduler.slots().iter().map(|s| s.state().is_active()).collect();
        assert_eq!(states, vec![false, true, false]);
    }
}
