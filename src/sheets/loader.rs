//! Composition loader: expands sheets into an ordered registration plan.
//!
//! Expansion is depth-first and pre-order: at each level the sheet's
//! component templates come first, then its capability templates, then its
//! nested sheets in declaration order. Empty slots are skipped with a
//! warning. Every capability's tick group is validated while planning, so a
//! faulty sheet is rejected before a single instance exists.
//!
//! The loader does not detect cycles. Sheets built from `Arc`s cannot form
//! one; named references are checked by [`super::library::SheetLibrary`].

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::error::{EccError, Result};
use crate::scheduler::TickGroup;

use super::sheet::{CapabilityTemplate, ComponentTemplate, Sheet};

/// One instance to create, in registration order.
#[derive(Debug, Clone, Copy)]
pub enum PlannedEntry<'a> {
    Component(&'a ComponentTemplate),
    Capability {
        template: &'a CapabilityTemplate,
        tick_group: TickGroup,
    },
}

/// The flattened, validated expansion of one or more sheets.
#[derive(Debug, Default)]
pub struct CompositionPlan<'a> {
    /// Names of every expanded sheet, in visiting order.
    pub sheets: Vec<&'a str>,
    pub entries: Vec<PlannedEntry<'a>>,
    pub skipped_slots: usize,
}

impl<'a> CompositionPlan<'a> {
    pub fn component_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, PlannedEntry::Component(_)))
            .count()
    }

    pub fn capability_count(&self) -> usize {
        self.entries.len() - self.component_count()
    }

    fn append(&mut self, other: CompositionPlan<'a>) {
        self.sheets.extend(other.sheets);
        self.entries.extend(other.entries);
        self.skipped_slots += other.skipped_slots;
    }
}

/// Counts from one registration call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositionSummary {
    pub sheets: usize,
    pub components: usize,
    pub capabilities: usize,
    pub skipped_slots: usize,
}

/// Expands sheets into [`CompositionPlan`]s.
pub struct CompositionLoader<'s> {
    sink: &'s dyn DiagnosticSink,
}

impl<'s> CompositionLoader<'s> {
    pub fn new(sink: &'s dyn DiagnosticSink) -> Self {
        Self { sink }
    }

    /// Expand one sheet tree.
    pub fn plan<'a>(&self, sheet: &'a Sheet) -> Result<CompositionPlan<'a>> {
        let mut plan = CompositionPlan::default();
        self.expand(sheet, &mut plan)?;
        Ok(plan)
    }

    /// Expand several root sheets, in order, into one plan. Fails on the
    /// first invalid sheet.
    pub fn plan_all<'a, I>(&self, sheets: I) -> Result<CompositionPlan<'a>>
    where
        I: IntoIterator<Item = &'a Sheet>,
    {
        let mut plan = CompositionPlan::default();
        for sheet in sheets {
            plan.append(self.plan(sheet)?);
        }
        Ok(plan)
    }

    fn expand<'a>(&self, sheet: &'a Sheet, plan: &mut CompositionPlan<'a>) -> Result<()> {
        plan.sheets.push(sheet.name());

        for (index, slot) in sheet.components().iter().enumerate() {
            match slot {
                Some(template) => plan.entries.push(PlannedEntry::Component(template)),
                None => self.skip(plan, sheet, "component", index),
            }
        }

        for (index, slot) in sheet.capabilities().iter().enumerate() {
            match slot {
                Some(template) => {
                    let tick_group = resolve_tick_group(sheet, template)?;
                    plan.entries.push(PlannedEntry::Capability {
                        template,
                        tick_group,
                    });
                }
                None => self.skip(plan, sheet, "capability", index),
            }
        }

        for (index, slot) in sheet.sheets().iter().enumerate() {
            match slot {
                Some(child) => self.expand(child, plan)?,
                None => self.skip(plan, sheet, "sheet", index),
            }
        }

        Ok(())
    }

    fn skip(&self, plan: &mut CompositionPlan<'_>, sheet: &Sheet, kind: &str, index: usize) {
        plan.skipped_slots += 1;
        self.sink.emit(
            DiagnosticEvent::warning("skipping empty template slot")
                .with("sheet", sheet.name())
                .with("kind", kind)
                .with("index", index),
        );
    }
}

fn resolve_tick_group(sheet: &Sheet, template: &CapabilityTemplate) -> Result<TickGroup> {
    let decl = template
        .declared_tick_group()
        .ok_or_else(|| EccError::MissingTickGroup {
            sheet: sheet.name().to_string(),
            capability: template.name().to_string(),
        })?;
    decl.resolve()
        .map_err(|ordinal| EccError::TickGroupOutOfRange {
            sheet: sheet.name().to_string(),
            capability: template.name().to_string(),
            ordinal,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capability;
    use crate::components::Component;
    use crate::diagnostics::{MemorySink, Severity};

    #[derive(Default)]
    struct Noop;
    impl Capability for Noop {}
    impl Component for Noop {}

    fn cap(name: &str, group: TickGroup) -> CapabilityTemplate {
        CapabilityTemplate::of::<Noop>(name).tick_group(group)
    }

    fn names(plan: &CompositionPlan<'_>) -> Vec<String> {
        plan.entries
            .iter()
            .map(|e| match e {
                PlannedEntry::Component(t) => format!("component:{}", t.name()),
                PlannedEntry::Capability { template, .. } => format!("capability:{}", template.name()),
            })
            .collect()
    }

    #[test]
    fn test_pre_order_components_before_capabilities() {
        let nested = Sheet::builder("nested")
            .component(ComponentTemplate::of::<Noop>("n_comp"))
            .capability(cap("n_cap", TickGroup::Input))
            .build();
        let root = Sheet::builder("root")
            .sheet(nested)
            .capability(cap("r_cap1", TickGroup::Movement))
            .component(ComponentTemplate::of::<Noop>("r_comp1"))
            .capability(cap("r_cap2", TickGroup::Gameplay))
            .component(ComponentTemplate::of::<Noop>("r_comp2"))
            .build();

        let sink = MemorySink::new();
        let plan = CompositionLoader::new(&sink).plan(&root).unwrap();
        assert_eq!(plan.sheets, vec!["root", "nested"]);
        assert_eq!(
            names(&plan),
            vec![
                "component:r_comp1",
                "component:r_comp2",
                "capability:r_cap1",
                "capability:r_cap2",
                "component:n_comp",
                "capability:n_cap",
            ]
        );
        assert_eq!(plan.component_count(), 3);
        assert_eq!(plan.capability_count(), 3);
    }

    #[test]
    fn test_empty_slots_are_skipped_with_warning() {
        let root = Sheet::builder("root")
            .component_slot(None)
            .capability_slot(None)
            .sheet_slot(None)
            .capability(cap("walk", TickGroup::Movement))
            .build();

        let sink = MemorySink::new();
        let plan = CompositionLoader::new(&sink).plan(&root).unwrap();
        assert_eq!(plan.skipped_slots, 3);
        assert_eq!(plan.capability_count(), 1);
        assert_eq!(sink.count(Severity::Warning), 3);
    }

    #[test]
    fn test_missing_tick_group_rejected() {
        let child = Sheet::builder("child")
            .capability(CapabilityTemplate::of::<Noop>("floating"))
            .build();
        let root = Sheet::builder("root").sheet(child).build();

        let sink = MemorySink::new();
        let err = CompositionLoader::new(&sink).plan(&root).unwrap_err();
        match err {
            EccError::MissingTickGroup { sheet, capability } => {
                assert_eq!(sheet, "child");
                assert_eq!(capability, "floating");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_tick_group_rejected() {
        let root = Sheet::builder("root")
            .capability(CapabilityTemplate::of::<Noop>("far").tick_group(10u32))
            .build();

        let sink = MemorySink::new();
        let err = CompositionLoader::new(&sink).plan(&root).unwrap_err();
        assert!(matches!(err, EccError::TickGroupOutOfRange { ordinal: 10, .. }));
    }

    #[test]
    fn test_shared_child_expands_each_time() {
        let shared = Sheet::builder("shared")
            .capability(cap("s", TickGroup::Physics))
            .build();
        let root = Sheet::builder("root")
            .sheet(shared.clone())
            .sheet(shared)
            .build();

        let sink = MemorySink::new();
        let plan = CompositionLoader::new(&sink).plan(&root).unwrap();
        assert_eq!(plan.capability_count(), 2);
        assert_eq!(plan.sheets, vec!["root", "shared", "shared"]);
    }
}
