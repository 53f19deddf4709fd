//! Identifier interning
//!
//! Studio ids, department ids, path-type keys and variable names recur in
//! every snapshot. Interning them gives one allocation per distinct id and
//! O(1) `Arc` clones everywhere they are stored.
//!
//! The table never shrinks, so only identifiers read from pipeline documents
//! go through it. Request strings (context keys, project names, entity
//! names) use plain `Arc::from`.

use std::sync::{Arc, LazyLock};

use dashmap::DashSet;

/// Process-wide interner shared by every snapshot
static IDENTIFIERS: LazyLock<Interner> = LazyLock::new(Interner::new);

/// Intern an identifier in the process-wide table
#[inline]
pub fn intern(s: &str) -> Arc<str> {
    IDENTIFIERS.intern(s)
}

#[cfg(test)]
pub(crate) fn is_interned(s: &str) -> bool {
    IDENTIFIERS.ids.contains(s)
}

/// Thread-safe identifier table
#[derive(Debug, Default)]
pub struct Interner {
    ids: DashSet<Arc<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared `Arc<str>` for `s`, inserting it on first sight
    pub fn intern(&self, s: &str) -> Arc<str> {
        if let Some(existing) = self.ids.get(s) {
            return Arc::clone(existing.key());
        }
        let id: Arc<str> = Arc::from(s);
        // A concurrent insert of the same id may win; either Arc is equal.
        self.ids.insert(Arc::clone(&id));
        id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
