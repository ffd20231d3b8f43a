//! Components: passive adjuncts owned by an orchestrator.
//!
//! A component has no activation state. Once attached it is ticked on every
//! pass of its cadence until the orchestrator is torn down. Capabilities
//! reach components through runtime type lookup, which is first-match:
//! several instances of one type may be attached.
//!
//! Stores only exist inside an orchestrator:
//!
//! ```compile_fail
//! let store = ecc::components::ComponentStore::new();
//! ```

use std::any::Any;

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::hooks::{HookError, HookFailure, HookGuard, HookKind};
use crate::orchestrator::OrchestratorId;
use crate::scheduler::TickCadence;

/// Behavior of an attached component. Every hook is optional.
pub trait Component: Any {
    /// Called once, right after the component is attached.
    fn on_setup(&mut self, _owner: OrchestratorId) {}

    /// Called once per pass of the component's cadence.
    fn on_tick(&mut self, _dt: f32) -> Result<(), HookError> {
        Ok(())
    }

    /// Called once when the owning orchestrator is torn down.
    fn on_removed(&mut self) {}
}

fn as_any<'a>(component: &'a (dyn Component + 'static)) -> &'a (dyn Any + 'static) {
    component
}

fn as_any_mut<'a>(component: &'a mut (dyn Component + 'static)) -> &'a mut (dyn Any + 'static) {
    component
}

/// Index of a component in its orchestrator's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentHandle(pub(crate) usize);

impl ComponentHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

struct ComponentSlot {
    name: String,
    cadence: TickCadence,
    behavior: Box<dyn Component>,
}

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// Arena of attached components, in attach order.
pub struct ComponentStore {
    slots: Vec<ComponentSlot>,
}

impl ComponentStore {
    pub(crate) fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub(crate) fn attach(
        &mut self,
        name: impl Into<String>,
        cadence: TickCadence,
        behavior: Box<dyn Component>,
    ) -> ComponentHandle {
        let handle = ComponentHandle(self.slots.len());
        self.slots.push(ComponentSlot {
            name: name.into(),
            cadence,
            behavior,
        });
        handle
    }

    /// First attached component of type `T`.
    pub fn first<T: Component>(&self) -> Option<&T> {
        self.slots
            .iter()
            .find_map(|slot| as_any(slot.behavior.as_ref()).downcast_ref::<T>())
    }

    /// First attached component of type `T`, mutably.
    pub fn first_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.slots
            .iter_mut()
            .find_map(|slot| as_any_mut(slot.behavior.as_mut()).downcast_mut::<T>())
    }

    /// Every attached component of type `T`, in attach order.
    pub fn all_of<T: Component>(&self) -> impl Iterator<Item = &T> {
        self.slots
            .iter()
            .filter_map(|slot| as_any(slot.behavior.as_ref()).downcast_ref::<T>())
    }

    pub fn get(&self, handle: ComponentHandle) -> Option<&dyn Component> {
        self.slots.get(handle.0).map(|slot| slot.behavior.as_ref())
    }

    pub fn name(&self, handle: ComponentHandle) -> Option<&str> {
        self.slots.get(handle.0).map(|slot| slot.name.as_str())
    }

    /// Component names in attach order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn setup(
        &mut self,
        handle: ComponentHandle,
        owner: OrchestratorId,
        guard: HookGuard,
        sink: &dyn DiagnosticSink,
    ) {
        let Some(slot) = self.slots.get_mut(handle.0) else {
            return;
        };
        let behavior = &mut slot.behavior;
        if let Err(error) = guard.run(|| {
            behavior.on_setup(owner);
            Ok(())
        }) {
            report(sink, HookFailure {
                subject: slot.name.clone(),
                hook: HookKind::ComponentSetup,
                pass: 0,
                error,
            });
        }
    }

    /// Tick every component of the given cadence. Returns how many ticked
    /// successfully and appends failures.
    pub(crate) fn tick_all(
        &mut self,
        cadence: TickCadence,
        dt: f32,
        pass: u64,
        guard: HookGuard,
        sink: &dyn DiagnosticSink,
        failures: &mut Vec<HookFailure>,
    ) -> usize {
        let mut ticked = 0;
        for slot in self.slots.iter_mut().filter(|s| s.cadence == cadence) {
            let behavior = &mut slot.behavior;
            match guard.run(|| behavior.on_tick(dt)) {
                Ok(()) => ticked += 1,
                Err(error) => {
                    let failure = HookFailure {
                        subject: slot.name.clone(),
                        hook: HookKind::ComponentTick,
                        pass,
                        error,
                    };
                    report(sink, failure.clone());
                    failures.push(failure);
                }
            }
        }
        ticked
    }

    /// Notify and drop every component. Returns the number removed.
    pub(crate) fn remove_all(&mut self, guard: HookGuard, sink: &dyn DiagnosticSink) -> usize {
        let count = self.slots.len();
        for mut slot in self.slots.drain(..) {
            let behavior = &mut slot.behavior;
            if let Err(error) = guard.run(|| {
                behavior.on_removed();
                Ok(())
            }) {
                report(sink, HookFailure {
                    subject: slot.name.clone(),
                    hook: HookKind::ComponentRemoved,
                    pass: 0,
                    error,
                });
            }
        }
        count
    }
}

fn report(sink: &dyn DiagnosticSink, failure: HookFailure) {
    sink.emit(
        DiagnosticEvent::error("component hook failed")
            .with("component", &failure.subject)
            .with("hook", failure.hook)
            .with("pass", failure.pass)
            .with("error", &failure.error.message),
    );
}

impl std::fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;

    #[derive(Default)]
    struct Health(u32);
    impl Component for Health {}

    #[derive(Default)]
    struct Motion {
        ticks: u32,
    }
    impl Component for Motion {
        fn on_tick(&mut self, _dt: f32) -> Result<(), HookError> {
            self.ticks += 1;
            Ok(())
        }
    }

    struct Faulty;
    impl Component for Faulty {
        fn on_tick(&mut self, _dt: f32) -> Result<(), HookError> {
            Err("sensor offline".into())
        }
    }

    #[test]
    fn test_first_match_lookup() {
        let mut store = ComponentStore::new();
        assert!(store.first::<Health>().is_none());

        store.attach("health_a", TickCadence::Fixed, Box::new(Health(10)));
        assert_eq!(store.first::<Health>().map(|h| h.0), Some(10));

        store.attach("motion", TickCadence::Fixed, Box::new(Motion::default()));
        store.attach("health_b", TickCadence::Fixed, Box::new(Health(20)));
        assert_eq!(store.first::<Health>().map(|h| h.0), Some(10));
        assert_eq!(store.all_of::<Health>().map(|h| h.0).collect::<Vec<_>>(), vec![10, 20]);

        store.first_mut::<Health>().unwrap().0 = 11;
        assert_eq!(store.first::<Health>().map(|h| h.0), Some(11));
    }

    #[test]
    fn test_tick_all_respects_cadence_and_isolates_failures() {
        let sink = MemorySink::new();
        let mut store = ComponentStore::new();
        store.attach("faulty", TickCadence::Fixed, Box::new(Faulty));
        store.attach("motion", TickCadence::Fixed, Box::new(Motion::default()));
        store.attach("frame_motion", TickCadence::Frame, Box::new(Motion::default()));

        let mut failures = Vec::new();
        let ticked = store.tick_all(
            TickCadence::Fixed,
            0.02,
            1,
            HookGuard::default(),
            &sink,
            &mut failures,
        );
        assert_eq!(ticked, 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].subject, "faulty");
        assert_eq!(store.all_of::<Motion>().map(|m| m.ticks).collect::<Vec<_>>(), vec![1, 0]);
    }
}
