//! Sheet definition types: the YAML schema for authored sheets.
//!
//! A `SheetDef` is pure data. Template types are plain strings resolved
//! through a [`super::registry::TemplateRegistry`], and nested sheets are
//! referenced by name and resolved by [`super::library::SheetLibrary`].
//!
//! # Example YAML
//!
//! ```yaml
//! sheet:
//!   name: player
//!   components:
//!     - type: motion
//!     - ~
//!   capabilities:
//!     - type: walk
//!       tick_group: movement
//!       tick_order: 10
//!       tags: [movement]
//!   sheets: [locomotion_base]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blocking::Tag;
use crate::error::Result;
use crate::scheduler::{TickCadence, TickGroupDecl};

/// A complete sheet definition loaded from YAML.
///
/// The top-level `sheet:` key keeps files self-describing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetDef {
    pub sheet: SheetInner,
}

impl SheetDef {
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&content)?)
    }

    pub fn name(&self) -> &str {
        &self.sheet.name
    }
}

/// The sheet payload. `~` entries in any list are empty slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetInner {
    pub name: String,

    #[serde(default)]
    pub components: Vec<Option<ComponentDef>>,

    #[serde(default)]
    pub capabilities: Vec<Option<CapabilityDef>>,

    /// Names of nested sheets, expanded after this sheet's own templates.
    #[serde(default)]
    pub sheets: Vec<Option<String>>,
}

/// One component template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDef {
    /// Registered template type.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Display name; defaults to the type.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub cadence: TickCadence,
}

impl ComponentDef {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.type_name)
    }
}

/// One capability template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDef {
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Group name (`movement`) or ordinal (`2`). Left unset, the sheet is
    /// rejected at registration.
    #[serde(default)]
    pub tick_group: Option<TickGroupDecl>,

    #[serde(default)]
    pub tick_order: u32,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub cadence: TickCadence,
}

impl CapabilityDef {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.type_name)
    }
}
