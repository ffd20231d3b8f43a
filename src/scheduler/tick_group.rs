//! Tick groups and cadences.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordinal category imposing a total evaluation order across one pass.
///
/// Every capability in an earlier group finishes its hooks before any
/// capability in a later group is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TickGroup {
    Input = 0,
    BeforeMovement = 1,
    Movement = 2,
    AfterMovement = 3,
    BeforeGameplay = 4,
    Gameplay = 5,
    AfterGameplay = 6,
    BeforePhysics = 7,
    Physics = 8,
    AfterPhysics = 9,
}

impl TickGroup {
    /// Every group, in visiting order.
    pub const ALL: [TickGroup; 10] = [
        TickGroup::Input,
        TickGroup::BeforeMovement,
        TickGroup::Movement,
        TickGroup::AfterMovement,
        TickGroup::BeforeGameplay,
        TickGroup::Gameplay,
        TickGroup::AfterGameplay,
        TickGroup::BeforePhysics,
        TickGroup::Physics,
        TickGroup::AfterPhysics,
    ];

    pub const MAX_ORDINAL: u32 = 9;

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    /// Map an ordinal back to its group, `None` when out of range.
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TickGroup::Input => "input",
            TickGroup::BeforeMovement => "before_movement",
            TickGroup::Movement => "movement",
            TickGroup::AfterMovement => "after_movement",
            TickGroup::BeforeGameplay => "before_gameplay",
            TickGroup::Gameplay => "gameplay",
            TickGroup::AfterGameplay => "after_gameplay",
            TickGroup::BeforePhysics => "before_physics",
            TickGroup::Physics => "physics",
            TickGroup::AfterPhysics => "after_physics",
        }
    }
}

impl fmt::Display for TickGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tick group as authored: either a named group or a raw ordinal that is
/// only validated at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TickGroupDecl {
    Named(TickGroup),
    Ordinal(u32),
}

impl TickGroupDecl {
    /// The declared group, or the offending ordinal.
    pub fn resolve(self) -> Result<TickGroup, u32> {
        match self {
            TickGroupDecl::Named(group) => Ok(group),
            TickGroupDecl::Ordinal(n) => TickGroup::from_ordinal(n).ok_or(n),
        }
    }
}

impl From<TickGroup> for TickGroupDecl {
    fn from(group: TickGroup) -> Self {
        TickGroupDecl::Named(group)
    }
}

impl From<u32> for TickGroupDecl {
    fn from(ordinal: u32) -> Self {
        TickGroupDecl::Ordinal(ordinal)
    }
}

/// The drive signal a capability or component is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickCadence {
    /// Fixed-rate simulation step.
    #[default]
    Fixed,
    /// Variable-rate frame step.
    Frame,
}

impl fmt::Display for TickCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickCadence::Fixed => f.write_str("fixed"),
            TickCadence::Frame => f.write_str("frame"),
        }
    }
}
