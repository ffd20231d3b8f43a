//! Template registry: maps the type names used in sheet YAML to factories.
//!
//! Resolution is by exact type name: `registry.component_template(def, sheet)`
//! looks up `def.type_name` and wraps the factory in a [`ComponentTemplate`]
//! carrying the definition's display name and cadence.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::capabilities::Capability;
use crate::components::Component;
use crate::error::{EccError, Result, TemplateKind};

use super::sheet::{CapabilityFactory, CapabilityTemplate, ComponentFactory, ComponentTemplate};
use super::sheet_def::{CapabilityDef, ComponentDef};

/// Factories indexed by template type name.
#[derive(Default)]
pub struct TemplateRegistry {
    components: HashMap<String, ComponentFactory>,
    capabilities: HashMap<String, CapabilityFactory>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `Default`-constructible component type. Re-registering a
    /// name replaces the previous factory.
    pub fn register_component<T: Component + Default>(&mut self, type_name: impl Into<String>) {
        self.register_component_with(type_name, || Box::new(T::default()));
    }

    pub fn register_component_with<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Component> + Send + Sync + 'static,
    {
        self.components.insert(type_name.into(), Arc::new(factory));
    }

    /// Register a `Default`-constructible capability type.
    pub fn register_capability<T: Capability + Default>(&mut self, type_name: impl Into<String>) {
        self.register_capability_with(type_name, || Box::new(T::default()));
    }

    pub fn register_capability_with<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Capability> + Send + Sync + 'static,
    {
        self.capabilities.insert(type_name.into(), Arc::new(factory));
    }

    pub fn has_component(&self, type_name: &str) -> bool {
        self.components.contains_key(type_name)
    }

    pub fn has_capability(&self, type_name: &str) -> bool {
        self.capabilities.contains_key(type_name)
    }

    /// Build a component template from its definition. `sheet` is only used
    /// for the error message.
    pub fn component_template(&self, def: &ComponentDef, sheet: &str) -> Result<ComponentTemplate> {
        let factory = self
            .components
            .get(&def.type_name)
            .ok_or_else(|| unknown(TemplateKind::Component, &def.type_name, sheet))?;
        Ok(ComponentTemplate::from_factory(def.display_name(), Arc::clone(factory)).cadence(def.cadence))
    }

    /// Build a capability template from its definition. The tick group is
    /// carried over as declared and validated later, at registration.
    pub fn capability_template(&self, def: &CapabilityDef, sheet: &str) -> Result<CapabilityTemplate> {
        let factory = self
            .capabilities
            .get(&def.type_name)
            .ok_or_else(|| unknown(TemplateKind::Capability, &def.type_name, sheet))?;

        let mut template = CapabilityTemplate::from_factory(def.display_name(), Arc::clone(factory))
            .tick_order(def.tick_order)
            .tags(def.tags.iter().cloned())
            .cadence(def.cadence);
        if let Some(group) = def.tick_group {
            template = template.tick_group(group);
        }
        Ok(template)
    }
}

fn unknown(kind: TemplateKind, type_name: &str, sheet: &str) -> EccError {
    EccError::UnknownTemplate {
        kind,
        type_name: type_name.to_string(),
        sheet: sheet.to_string(),
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut components: Vec<_> = self.components.keys().collect();
        let mut capabilities: Vec<_> = self.capabilities.keys().collect();
        components.sort();
        capabilities.sort();
        f.debug_struct("TemplateRegistry")
            .field("components", &components)
            .field("capabilities", &capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::Tag;
    use crate::scheduler::{TickCadence, TickGroup, TickGroupDecl};

    #[derive(Default)]
    struct Walk;
    impl Capability for Walk {}

    #[derive(Default)]
    struct Motion;
    impl Component for Motion {}

    fn registry() -> TemplateRegistry {
        let mut reg = TemplateRegistry::new();
        reg.register_component::<Motion>("motion");
        reg.register_capability::<Walk>("walk");
        reg
    }

    #[test]
    fn test_capability_template_carries_definition() {
        let def = CapabilityDef {
            type_name: "walk".into(),
            name: Some("walk_forward".into()),
            tick_group: Some(TickGroupDecl::Named(TickGroup::Movement)),
            tick_order: 20,
            tags: vec![Tag::new("movement")],
            cadence: TickCadence::Frame,
        };
        let template = registry().capability_template(&def, "player").unwrap();
        assert_eq!(template.name(), "walk_forward");
        assert_eq!(
            template.declared_tick_group(),
            Some(TickGroupDecl::Named(TickGroup::Movement))
        );
        assert_eq!(template.declared_tick_order(), 20);
        assert_eq!(template.declared_tags(), &[Tag::new("movement")]);
        assert_eq!(template.tick_cadence(), TickCadence::Frame);
        let instance = template.instantiate();
        assert!(crate::capabilities::capability::as_any(instance.as_ref()).is::<Walk>());
    }

    #[test]
    fn test_component_template_defaults_name_to_type() {
        let def = ComponentDef {
            type_name: "motion".into(),
            name: None,
            cadence: TickCadence::Fixed,
        };
        let template = registry().component_template(&def, "player").unwrap();
        assert_eq!(template.name(), "motion");
    }

    #[test]
    fn test_unknown_type_is_error() {
        let def = ComponentDef {
            type_name: "jetpack".into(),
            name: None,
            cadence: TickCadence::Fixed,
        };
        let err = registry().component_template(&def, "player").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "unknown component template type 'jetpack' in sheet 'player'"
        );
    }

    #[test]
    fn test_register_with_closure() {
        let mut reg = TemplateRegistry::new();
        reg.register_capability_with("walk", || Box::new(Walk));
        assert!(reg.has_capability("walk"));
        assert!(!reg.has_component("walk"));
    }
}
