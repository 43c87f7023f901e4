//! KEEPSAKE - Pending Log
//! Ordered log of staged region mutations, replayed over the committed table
//! for every read and folded into it on save.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::region::Region;

/// A staged mutation against the region directory.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOperation {
    /// Insert or overwrite a region (keyed by its canonical name).
    Upsert(Region),
    /// Remove the region with this canonical name.
    Delete(String),
}

impl PendingOperation {
    /// Canonical name of the region this operation targets.
    pub fn region_name(&self) -> &str {
        match self {
            PendingOperation::Upsert(region) => region.name(),
            PendingOperation::Delete(name) => name,
        }
    }
}

/// Ordered, volatile log of staged operations.
#[derive(Debug, Default)]
pub struct PendingLog {
    ops: Vec<PendingOperation>,
}

impl PendingLog {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Append an operation; later operations win over earlier ones.
    pub fn push(&mut self, op: PendingOperation) {
        self.ops.push(op);
    }

    /// Drop every staged operation.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Most recent decision for `name`, if any.
    ///
    /// - `Some(Some(region))`: last staged operation was an upsert
    /// - `Some(None)`: last staged operation was a delete
    /// - `None`: nothing staged for this name
    pub fn resolve(&self, name: &str) -> Option<Option<&Region>> {
        self.ops
            .iter()
            .rev()
            .find(|op| op.region_name() == name)
            .map(|op| match op {
                PendingOperation::Upsert(region) => Some(region),
                PendingOperation::Delete(_) => None,
            })
    }

    /// Effective region names: committed names with the log applied.
    /// A single backward pass; the first operation seen per name decides it.
    pub fn effective_names<'a>(
        &self,
        committed: impl IntoIterator<Item = &'a String>,
    ) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = committed.into_iter().cloned().collect();
        let mut decided = HashSet::new();
        for op in self.ops.iter().rev() {
            let name = op.region_name();
            if !decided.insert(name) {
                continue;
            }
            match op {
                PendingOperation::Upsert(_) => {
                    names.insert(name.to_string());
                }
                PendingOperation::Delete(_) => {
                    names.remove(name);
                }
            }
        }
        names
    }

    /// Replay the log in order onto `committed` and empty it.
    pub fn apply_to(&mut self, committed: &mut BTreeMap<String, Region>) {
        for op in self.ops.drain(..) {
            match op {
                PendingOperation::Upsert(region) => {
                    committed.insert(region.name().to_string(), region);
                }
                PendingOperation::Delete(name) => {
                    committed.remove(&name);
                }
            }
        }
    }
}
