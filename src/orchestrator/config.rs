//! Orchestrator configuration.
//!
//! Loaded from YAML, from `ECC_*` environment variables, or built in code.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for one [`super::Orchestrator`].
///
/// # Attributes
///
/// * `name` - Label used in diagnostics and the status report.
/// * `log_init_status` - Emit the status report as an Info diagnostic when
///   the first pass runs.
/// * `catch_hook_panics` - Turn panicking hooks into reported failures
///   instead of unwinding through the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub name: String,
    pub log_init_status: bool,
    pub catch_hook_panics: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            name: "orchestrator".to_string(),
            log_init_status: true,
            catch_hook_panics: true,
        }
    }
}

impl OrchestratorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_log_init_status(mut self, enabled: bool) -> Self {
        self.log_init_status = enabled;
        self
    }

    pub fn with_catch_hook_panics(mut self, enabled: bool) -> Self {
        self.catch_hook_panics = enabled;
        self
    }

    /// Parse from YAML. Missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read `ECC_NAME`, `ECC_LOG_INIT_STATUS` and `ECC_CATCH_HOOK_PANICS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(name) = lookup("ECC_NAME").filter(|n| !n.trim().is_empty()) {
            config.name = name;
        }
        if let Some(value) = lookup("ECC_LOG_INIT_STATUS") {
            config.log_init_status = parse_flag("ECC_LOG_INIT_STATUS", &value, config.log_init_status);
        }
        if let Some(value) = lookup("ECC_CATCH_HOOK_PANICS") {
            config.catch_hook_panics =
                parse_flag("ECC_CATCH_HOOK_PANICS", &value, config.catch_hook_panics);
        }
        config
    }
}

fn parse_flag(key: &str, value: &str, fallback: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        other => {
            log::warn!("Ignoring {}={:?}: expected a boolean", key, other);
            fallback
        }
    }
}
