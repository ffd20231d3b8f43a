//! Tag blocking.
//!
//! Any actor may veto evaluation of every capability carrying a tag by
//! recording a `(tag, instigator)` relation. Relations are counted: blocking
//! the same tag twice with the same instigator needs two unblocks before the
//! tag is free again.
//!
//! The scheduler never reads the live registry during a pass. It takes a
//! [`BlockSnapshot`] when the pass starts, so a block issued from inside a
//! hook only takes effect from the next pass.

pub mod instigator;
pub mod tag;

pub use instigator::InstigatorId;
pub use tag::{tags, Tag};

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::diagnostics::{default_sink, DiagnosticEvent, SharedSink};

// ---------------------------------------------------------------------------
// BlockingRegistry
// ---------------------------------------------------------------------------

/// Tracks which tags are blocked and by whom.
pub struct BlockingRegistry {
    /// Tag -> every instigator relation currently recorded for it.
    /// A tag key exists only while it has at least one relation.
    blockers: HashMap<Tag, Vec<InstigatorId>>,
    sink: SharedSink,
}

impl BlockingRegistry {
    /// Create an empty registry reporting to the default log sink.
    pub fn new() -> Self {
        Self::with_sink(default_sink())
    }

    pub fn with_sink(sink: SharedSink) -> Self {
        Self {
            blockers: HashMap::new(),
            sink,
        }
    }

    /// Record one `(tag, instigator)` relation for every tag.
    pub fn block<I>(&mut self, tags: I, instigator: &InstigatorId)
    where
        I: IntoIterator<Item = Tag>,
    {
        let mut blocked = Vec::new();
        for tag in tags {
            self.blockers
                .entry(tag.clone())
                .or_default()
                .push(instigator.clone());
            blocked.push(tag);
        }

        self.sink.emit(
            DiagnosticEvent::debug("blocking capability tags")
                .with("instigator", instigator)
                .with("tags", join_tags(&blocked)),
        );
    }

    /// Remove one `(tag, instigator)` relation for every tag.
    ///
    /// A tag with no matching relation is reported as a warning and skipped.
    /// Returns how many relations were actually removed.
    pub fn unblock<I>(&mut self, tags: I, instigator: &InstigatorId) -> usize
    where
        I: IntoIterator<Item = Tag>,
    {
        let mut removed = Vec::new();
        for tag in tags {
            let found = match self.blockers.get_mut(&tag) {
                Some(relations) => match relations.iter().position(|i| i == instigator) {
                    Some(pos) => {
                        relations.remove(pos);
                        if relations.is_empty() {
                            self.blockers.remove(&tag);
                        }
                        true
                    }
                    None => false,
                },
                None => false,
            };

            if found {
                removed.push(tag);
            } else {
                self.sink.emit(
                    DiagnosticEvent::warning("attempted to unblock a tag that was never blocked")
                        .with("tag", &tag)
                        .with("instigator", instigator),
                );
            }
        }

        if !removed.is_empty() {
            self.sink.emit(
                DiagnosticEvent::debug("unblocking capability tags")
                    .with("instigator", instigator)
                    .with("tags", join_tags(&removed)),
            );
        }
        removed.len()
    }

    /// True iff the tag has at least one recorded relation.
    pub fn is_blocked(&self, tag: &Tag) -> bool {
        self.blockers.contains_key(tag)
    }

    /// True iff any of the given tags is blocked.
    pub fn blocks_any(&self, tags: &[Tag]) -> bool {
        tags.iter().any(|t| self.is_blocked(t))
    }

    /// Instigators currently blocking a tag, one entry per relation.
    pub fn blockers(&self, tag: &Tag) -> &[InstigatorId] {
        self.blockers.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// All blocked tags.
    pub fn blocked_tags(&self) -> impl Iterator<Item = &Tag> {
        self.blockers.keys()
    }

    /// Drop every relation held by an instigator. Returns how many were removed.
    pub fn release_all(&mut self, instigator: &InstigatorId) -> usize {
        let mut removed = 0;
        self.blockers.retain(|_, relations| {
            let before = relations.len();
            relations.retain(|i| i != instigator);
            removed += before - relations.len();
            !relations.is_empty()
        });
        removed
    }

    /// Freeze the current set of blocked tags for one pass.
    pub fn snapshot(&self) -> BlockSnapshot {
        BlockSnapshot {
            blocked: self.blockers.keys().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blockers.is_empty()
    }
}

impl Default for BlockingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BlockingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingRegistry")
            .field("blockers", &self.blockers)
            .finish()
    }
}

fn join_tags(tags: &[Tag]) -> String {
    tags.iter()
        .map(Tag::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

// ---------------------------------------------------------------------------
// BlockSnapshot
// ---------------------------------------------------------------------------

/// The set of blocked tags as seen by one pass.
#[derive(Debug, Clone, Default)]
pub struct BlockSnapshot {
    blocked: HashSet<Tag>,
}

impl BlockSnapshot {
    pub fn is_blocked(&self, tag: &Tag) -> bool {
        self.blocked.contains(tag)
    }

    pub fn blocks_any(&self, tags: &[Tag]) -> bool {
        !self.blocked.is_empty() && tags.iter().any(|t| self.blocked.contains(t))
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}
