//! Identities of actors that block tags.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static INSTIGATOR_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies whoever is responsible for a block relation.
///
/// Two ids are equal only if one was cloned from the other; the name is for
/// attribution in diagnostics and never enforced.
#[derive(Clone)]
pub struct InstigatorId {
    name: Arc<str>,
    id: u64,
}

impl InstigatorId {
    /// Create a fresh instigator identity with a human-readable name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            id: INSTIGATOR_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for InstigatorId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for InstigatorId {}

impl Hash for InstigatorId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for InstigatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstigatorId({}:{})", self.id, self.name)
    }
}

impl fmt::Display for InstigatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}
