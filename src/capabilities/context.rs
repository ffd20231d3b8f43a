//! What a capability hook can see and touch.

use crate::blocking::{BlockingRegistry, InstigatorId, Tag};
use crate::components::{Component, ComponentStore};
use crate::diagnostics::DiagnosticSink;
use crate::hooks::HookGuard;
use crate::orchestrator::OrchestratorId;

use super::capability::CapabilityHandle;

/// Handed to every capability hook.
///
/// Gives access to the owner's components and to the blocking registry.
/// Blocks issued through the context are recorded immediately but, because
/// every pass evaluates against a snapshot taken when it starts, they only
/// affect evaluation from the next pass on.
pub struct CapabilityContext<'a> {
    owner: OrchestratorId,
    handle: CapabilityHandle,
    pass: u64,
    components: &'a mut ComponentStore,
    blocking: &'a mut BlockingRegistry,
}

impl<'a> CapabilityContext<'a> {
    pub(crate) fn new(
        owner: OrchestratorId,
        handle: CapabilityHandle,
        pass: u64,
        components: &'a mut ComponentStore,
        blocking: &'a mut BlockingRegistry,
    ) -> Self {
        Self {
            owner,
            handle,
            pass,
            components,
            blocking,
        }
    }

    /// The orchestrator owning this capability.
    pub fn owner(&self) -> OrchestratorId {
        self.owner
    }

    pub fn handle(&self) -> CapabilityHandle {
        self.handle
    }

    /// Number of the pass being evaluated, 0 during setup and teardown.
    pub fn pass(&self) -> u64 {
        self.pass
    }

    /// First attached component of type `T`.
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components.first::<T>()
    }

    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.first_mut::<T>()
    }

    pub fn components_of<T: Component>(&self) -> impl Iterator<Item = &T> {
        self.components.all_of::<T>()
    }

    pub fn block<I>(&mut self, tags: I, instigator: &InstigatorId)
    where
        I: IntoIterator<Item = Tag>,
    {
        self.blocking.block(tags, instigator);
    }

    pub fn unblock<I>(&mut self, tags: I, instigator: &InstigatorId) -> usize
    where
        I: IntoIterator<Item = Tag>,
    {
        self.blocking.unblock(tags, instigator)
    }

    /// Live blocking state, including blocks issued during this pass.
    pub fn is_blocked(&self, tag: &Tag) -> bool {
        self.blocking.is_blocked(tag)
    }
}

/// Everything the scheduler lends to the state machine for one pass.
pub(crate) struct HookEnv<'a> {
    pub owner: OrchestratorId,
    pub pass: u64,
    pub components: &'a mut ComponentStore,
    pub blocking: &'a mut BlockingRegistry,
    pub guard: HookGuard,
    pub sink: &'a dyn DiagnosticSink,
}

impl HookEnv<'_> {
    pub fn context(&mut self, handle: CapabilityHandle) -> CapabilityContext<'_> {
        CapabilityContext::new(
            self.owner,
            handle,
            self.pass,
            &mut *self.components,
            &mut *self.blocking,
        )
    }
}
