//! # Sheets
//!
//! Immutable composition templates and everything that turns them into
//! registration plans: the in-code [`Sheet`] builder, the YAML schema
//! ([`SheetDef`]), the [`TemplateRegistry`] mapping type names to factories,
//! the [`SheetLibrary`] resolving named references, and the
//! [`CompositionLoader`] that flattens a sheet tree.

pub mod library;
pub mod loader;
pub mod registry;
pub mod sheet;
pub mod sheet_def;

pub use library::SheetLibrary;
pub use loader::{CompositionLoader, CompositionPlan, CompositionSummary, PlannedEntry};
pub use registry::TemplateRegistry;
pub use sheet::{
    CapabilityFactory, CapabilityTemplate, ComponentFactory, ComponentTemplate, Sheet,
    SheetBuilder,
};
pub use sheet_def::{CapabilityDef, ComponentDef, SheetDef, SheetInner};
