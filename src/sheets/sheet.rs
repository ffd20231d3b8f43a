//! Sheets: immutable composition templates.
//!
//! A [`Sheet`] is a reusable tree of component templates, capability
//! templates and nested sheets. Templates carry factories rather than
//! instances, so one sheet can be expanded into any number of orchestrators,
//! concurrently, without interference. Sheets are built once and shared as
//! `Arc<Sheet>`; nothing mutates them afterwards.

use std::fmt;
use std::sync::Arc;

use crate::blocking::Tag;
use crate::capabilities::Capability;
use crate::components::Component;
use crate::scheduler::{TickCadence, TickGroupDecl};

/// Produces a fresh component instance.
pub type ComponentFactory = Arc<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// Produces a fresh capability instance.
pub type CapabilityFactory = Arc<dyn Fn() -> Box<dyn Capability> + Send + Sync>;

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// How to build one component.
#[derive(Clone)]
pub struct ComponentTemplate {
    name: String,
    cadence: TickCadence,
    factory: ComponentFactory,
}

impl ComponentTemplate {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Component> + Send + Sync + 'static,
    {
        Self::from_factory(name, Arc::new(factory))
    }

    pub fn from_factory(name: impl Into<String>, factory: ComponentFactory) -> Self {
        Self {
            name: name.into(),
            cadence: TickCadence::default(),
            factory,
        }
    }

    /// Template for a `Default`-constructible component type.
    pub fn of<T: Component + Default>(name: impl Into<String>) -> Self {
        Self::new(name, || Box::new(T::default()))
    }

    pub fn cadence(mut self, cadence: TickCadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tick_cadence(&self) -> TickCadence {
        self.cadence
    }

    pub fn instantiate(&self) -> Box<dyn Component> {
        (self.factory)()
    }
}

impl fmt::Debug for ComponentTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTemplate")
            .field("name", &self.name)
            .field("cadence", &self.cadence)
            .finish()
    }
}

/// How to build and schedule one capability.
#[derive(Clone)]
pub struct CapabilityTemplate {
    name: String,
    tick_group: Option<TickGroupDecl>,
    tick_order: u32,
    tags: Vec<Tag>,
    cadence: TickCadence,
    factory: CapabilityFactory,
}

impl CapabilityTemplate {
    /// A template with no tick group yet; registering it as-is is a
    /// configuration error.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Capability> + Send + Sync + 'static,
    {
        Self::from_factory(name, Arc::new(factory))
    }

    pub fn from_factory(name: impl Into<String>, factory: CapabilityFactory) -> Self {
        Self {
            name: name.into(),
            tick_group: None,
            tick_order: 0,
            tags: Vec::new(),
            cadence: TickCadence::default(),
            factory,
        }
    }

    /// Template for a `Default`-constructible capability type.
    pub fn of<T: Capability + Default>(name: impl Into<String>) -> Self {
        Self::new(name, || Box::new(T::default()))
    }

    /// Accepts a [`crate::scheduler::TickGroup`] or a raw ordinal.
    pub fn tick_group(mut self, group: impl Into<TickGroupDecl>) -> Self {
        self.tick_group = Some(group.into());
        self
    }

    pub fn tick_order(mut self, order: u32) -> Self {
        self.tick_order = order;
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn cadence(mut self, cadence: TickCadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_tick_group(&self) -> Option<TickGroupDecl> {
        self.tick_group
    }

    pub fn declared_tick_order(&self) -> u32 {
        self.tick_order
    }

    pub fn declared_tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn tick_cadence(&self) -> TickCadence {
        self.cadence
    }

    pub fn instantiate(&self) -> Box<dyn Capability> {
        (self.factory)()
    }
}

impl fmt::Debug for CapabilityTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityTemplate")
            .field("name", &self.name)
            .field("tick_group", &self.tick_group)
            .field("tick_order", &self.tick_order)
            .field("tags", &self.tags)
            .field("cadence", &self.cadence)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Sheet
// ---------------------------------------------------------------------------

/// A composition template. Every list may contain empty slots, which the
/// loader skips.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    components: Vec<Option<ComponentTemplate>>,
    capabilities: Vec<Option<CapabilityTemplate>>,
    sheets: Vec<Option<Arc<Sheet>>>,
}

impl Sheet {
    pub fn builder(name: impl Into<String>) -> SheetBuilder {
        SheetBuilder {
            sheet: Sheet {
                name: name.into(),
                components: Vec::new(),
                capabilities: Vec::new(),
                sheets: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[Option<ComponentTemplate>] {
        &self.components
    }

    pub fn capabilities(&self) -> &[Option<CapabilityTemplate>] {
        &self.capabilities
    }

    pub fn sheets(&self) -> &[Option<Arc<Sheet>>] {
        &self.sheets
    }
}

/// Assembles a [`Sheet`].
#[derive(Debug)]
pub struct SheetBuilder {
    sheet: Sheet,
}

impl SheetBuilder {
    pub fn component(mut self, template: ComponentTemplate) -> Self {
        self.sheet.components.push(Some(template));
        self
    }

    pub fn capability(mut self, template: CapabilityTemplate) -> Self {
        self.sheet.capabilities.push(Some(template));
        self
    }

    pub fn sheet(mut self, sheet: Arc<Sheet>) -> Self {
        self.sheet.sheets.push(Some(sheet));
        self
    }

    pub fn component_slot(mut self, template: Option<ComponentTemplate>) -> Self {
        self.sheet.components.push(template);
        self
    }

    pub fn capability_slot(mut self, template: Option<CapabilityTemplate>) -> Self {
        self.sheet.capabilities.push(template);
        self
    }

    pub fn sheet_slot(mut self, sheet: Option<Arc<Sheet>>) -> Self {
        self.sheet.sheets.push(sheet);
        self
    }

    pub fn build(self) -> Arc<Sheet> {
        Arc::new(self.sheet)
    }
}
