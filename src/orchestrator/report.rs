//! Reports produced by the orchestrator: one per pass, one per teardown and
//! the structured init status.

use std::fmt;

use serde::Serialize;

use crate::capabilities::{CapabilityHandle, CapabilityState};
use crate::hooks::HookFailure;
use crate::scheduler::{TickCadence, TickGroup};

/// What happened during one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// 1-based pass number, counted across cadences.
    pub pass: u64,
    pub cadence: TickCadence,
    pub dt: f32,
    /// Capabilities of this cadence that were considered.
    pub visited: usize,
    /// Of those, how many were skipped because a tag was blocked.
    pub blocked: usize,
    pub activated: usize,
    pub deactivated: usize,
    pub ticked: usize,
    pub components_ticked: usize,
    pub failures: Vec<HookFailure>,
}

impl PassReport {
    pub fn new(pass: u64, cadence: TickCadence, dt: f32) -> Self {
        Self {
            pass,
            cadence,
            dt,
            visited: 0,
            blocked: 0,
            activated: 0,
            deactivated: 0,
            ticked: 0,
            components_ticked: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pass {} ({}, dt={:.4}): visited={} blocked={} activated={} deactivated={} \
             ticked={} components={} failures={}",
            self.pass,
            self.cadence,
            self.dt,
            self.visited,
            self.blocked,
            self.activated,
            self.deactivated,
            self.ticked,
            self.components_ticked,
            self.failures.len()
        )
    }
}

/// Result of tearing an orchestrator down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeardownReport {
    /// Capabilities forced from Active to Inactive.
    pub deactivated: usize,
    pub components_removed: usize,
    pub failures: Vec<HookFailure>,
}

// ---------------------------------------------------------------------------
// Status report
// ---------------------------------------------------------------------------

/// Snapshot of what an orchestrator is composed of.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub name: String,
    /// Root sheets registered, in registration order.
    pub sheets: Vec<String>,
    /// Component names in attach order.
    pub components: Vec<String>,
    /// Non-empty tick groups in visiting order.
    pub tick_groups: Vec<GroupStatus>,
    pub blocked_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupStatus {
    pub group: TickGroup,
    pub capabilities: Vec<CapabilityStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapabilityStatus {
    pub handle: CapabilityHandle,
    pub name: String,
    pub tick_order: u32,
    pub cadence: TickCadence,
    pub state: CapabilityState,
    pub tags: Vec<String>,
}

impl StatusReport {
    pub fn capability_count(&self) -> usize {
        self.tick_groups.iter().map(|g| g.capabilities.len()).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} init status ==", self.name)?;

        writeln!(f, "Sheets: {}", self.sheets.len())?;
        for sheet in &self.sheets {
            writeln!(f, "  - {}", sheet)?;
        }

        writeln!(f, "Components: {}", self.components.len())?;
        for component in &self.components {
            writeln!(f, "  - {}", component)?;
        }

        writeln!(f, "Tick groups: {}", self.tick_groups.len())?;
        for group in &self.tick_groups {
            writeln!(
                f,
                "  {} ({} capabilities)",
                group.group,
                group.capabilities.len()
            )?;
            for cap in &group.capabilities {
                write!(
                    f,
                    "    - {} [order {}, {}, {}]",
                    cap.name, cap.tick_order, cap.cadence, cap.state
                )?;
                if !cap.tags.is_empty() {
                    write!(f, " tags: {}", cap.tags.join(", "))?;
                }
                writeln!(f)?;
            }
        }

        if !self.blocked_tags.is_empty() {
            writeln!(f, "Blocked tags: {}", self.blocked_tags.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> StatusReport {
        StatusReport {
            name: "player".into(),
            sheets: vec!["player".into()],
            components: vec!["motion".into()],
            tick_groups: vec![GroupStatus {
                group: TickGroup::Movement,
                capabilities: vec![CapabilityStatus {
                    handle: CapabilityHandle(0),
                    name: "walk".into(),
                    tick_order: 10,
                    cadence: TickCadence::Fixed,
                    state: CapabilityState::Inactive,
                    tags: vec!["movement".into()],
                }],
            }],
            blocked_tags: Vec::new(),
        }
    }

    #[test]
    fn test_status_text_tree() {
        let text = status().to_string();
        assert!(text.contains("Sheets: 1"));
        assert!(text.contains("movement (1 capabilities)"));
        assert!(text.contains("- walk [order 10, fixed, inactive] tags: movement"));
        assert!(!text.contains("Blocked tags"));
    }

    #[test]
    fn test_status_json() {
        let json = status().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tick_groups"][0]["group"], "movement");
        assert_eq!(value["tick_groups"][0]["capabilities"][0]["state"], "inactive");
        assert_eq!(status().capability_count(), 1);
    }

    #[test]
    fn test_pass_report_display() {
        let mut report = PassReport::new(3, TickCadence::Frame, 0.016);
        report.visited = 2;
        assert!(report.is_clean());
        assert!(report.to_string().starts_with("pass 3 (frame, dt=0.0160): visited=2"));
    }
}
