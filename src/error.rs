//! Error types for composition, registration and the tick loop.
//!
//! Everything in [`EccError`] is raised before a pass ever runs, with the
//! single exception of [`EccError::TornDown`]. Failures inside capability or
//! component hooks never surface here; they are isolated per hook and
//! reported through [`crate::hooks::HookFailure`].

use thiserror::Error;

use crate::scheduler::TickGroup;

/// Errors raised by the orchestrator, the composition loader and the sheet
/// library.
#[derive(Debug, Error)]
pub enum EccError {
    /// A capability template was registered without a tick group.
    #[error("capability '{capability}' in sheet '{sheet}' has no tick group")]
    MissingTickGroup { sheet: String, capability: String },

    /// A capability template declared a tick group ordinal that does not exist.
    #[error(
        "capability '{capability}' in sheet '{sheet}' declares tick group {ordinal}, \
         valid range is 0..={max}",
        max = TickGroup::MAX_ORDINAL
    )]
    TickGroupOutOfRange {
        sheet: String,
        capability: String,
        ordinal: u32,
    },

    /// A sheet definition referenced a template type nobody registered.
    #[error("unknown {kind} template type '{type_name}' in sheet '{sheet}'")]
    UnknownTemplate {
        kind: TemplateKind,
        type_name: String,
        sheet: String,
    },

    /// A sheet reference could not be found in the library.
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    /// Two sheet definitions share one name.
    #[error("sheet already defined: {0}")]
    DuplicateSheet(String),

    /// Named sheet references form a cycle.
    #[error("cyclic sheet reference: {}", .chain.join(" -> "))]
    SheetCycle { chain: Vec<String> },

    /// Registration was attempted after the first pass ran.
    #[error("orchestrator '{0}' already started ticking, registration is sealed")]
    RegistrationSealed(String),

    /// A pass was requested on an orchestrator that was torn down.
    #[error("orchestrator '{0}' has been torn down")]
    TornDown(String),

    /// YAML parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EccError {
    /// Whether this error is a configuration error, i.e. something wrong with
    /// the authored composition rather than with the runtime.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, EccError::TornDown(_))
    }
}

/// Which side of a sheet a template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Component,
    Capability,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKind::Component => f.write_str("component"),
            TemplateKind::Capability => f.write_str("capability"),
        }
    }
}

pub type Result<T> = std::result::Result<T, EccError>;
