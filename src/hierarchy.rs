//! In-memory operation tree reconstructed from begin/end events.
//!
//! Records are keyed by operation id and never removed. Parent/child edges are
//! recorded when a child begins; the parent does not need to exist yet.
//! Roots and each parent's children keep insertion order so printing is
//! deterministic.

use indexmap::IndexMap;
use std::collections::BTreeMap;
use thiserror::Error;

pub type OperationId = u64;

/// Opaque, monotonically comparable timestamp.
pub type OperationTime = u64;

/// One timed unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub display_name: String,
    pub start_time: OperationTime,
    pub end_time: OperationTime,
    pub parent: Option<OperationId>,
}

impl Operation {
    fn new(display_name: String, start_time: OperationTime, parent: Option<OperationId>) -> Self {
        Self {
            display_name,
            start_time,
            end_time: start_time,
            parent,
        }
    }

    /// Duration of the operation. Zero while still open.
    pub fn value(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// Significant operations are the only ones printed below the top level.
    pub fn is_significant(&self) -> bool {
        self.value() > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("operation {0} was already begun; keeping the first record")]
    DuplicateId(OperationId),

    #[error("operation {0} was never begun")]
    UnknownId(OperationId),
}

#[derive(Debug, Default)]
pub struct Hierarchy {
    operations: IndexMap<OperationId, Operation>,
    roots: Vec<OperationId>,
    children: BTreeMap<OperationId, Vec<OperationId>>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for `id`. A duplicate id leaves the existing record
    /// and edges untouched.
    pub fn begin(
        &mut self,
        id: OperationId,
        display_name: impl Into<String>,
        start_time: OperationTime,
        parent_id: Option<OperationId>,
    ) -> Result<(), HierarchyError> {
        if self.operations.contains_key(&id) {
            return Err(HierarchyError::DuplicateId(id));
        }

        self.operations
            .insert(id, Operation::new(display_name.into(), start_time, parent_id));

        match parent_id {
            Some(parent) => self.children.entry(parent).or_default().push(id),
            None => self.roots.push(id),
        }
        Ok(())
    }

    /// Overwrite the end time of `id`. A repeated end replaces the previous
    /// end time. Returns the updated operation.
    pub fn end(
        &mut self,
        id: OperationId,
        end_time: OperationTime,
    ) -> Result<&Operation, HierarchyError> {
        let op = self
            .operations
            .get_mut(&id)
            .ok_or(HierarchyError::UnknownId(id))?;
        op.end_time = end_time;
        Ok(op)
    }

    pub fn record(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(&id)
    }

    /// Child ids of `id` in registration order. Empty if none.
    pub fn children(&self, id: OperationId) -> &[OperationId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[OperationId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations whose declared parent was never begun, in creation order.
    ///
    /// These hang off a missing node and cannot be reached from any root.
    pub fn orphans(&self) -> Vec<OperationId> {
        self.operations
            .iter()
            .filter_map(|(id, op)| match op.parent {
                Some(parent) if !self.operations.contains_key(&parent) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn begin_opens_with_zero_value() {
        let mut h = Hierarchy::new();
        h.begin(1, "Run build", 10, None).unwrap();

        let op = h.record(1).unwrap();
        assert_eq!(op.end_time, 10);
        assert_eq!(op.value(), 0);
        assert_eq!(h.roots(), &[1]);
    }

    #[test]
    fn end_sets_value() {
        let mut h = Hierarchy::new();
        h.begin(1, "Run build", 10, None).unwrap();
        let op = h.end(1, 25).unwrap();
        assert_eq!(op.value(), 15);
        assert!(op.is_significant());
    }

    #[test]
    fn children_keep_registration_order() {
        let mut h = Hierarchy::new();
        h.begin(1, "root", 0, None).unwrap();
        for id in [9, 3, 7, 5] {
            h.begin(id, format!("child {id}"), 1, Some(1)).unwrap();
        }
        assert_eq!(h.children(1), &[9, 3, 7, 5]);
        assert!(h.children(9).is_empty());
        assert!(h.children(42).is_empty());
    }

    #[test]
    fn roots_keep_insertion_order() {
        let mut h = Hierarchy::new();
        for id in [30, 10, 20] {
            h.begin(id, "root", 0, None).unwrap();
        }
        assert_eq!(h.roots(), &[30, 10, 20]);
    }

    #[test]
    fn duplicate_begin_keeps_first_record() {
        let mut h = Hierarchy::new();
        h.begin(1, "root", 0, None).unwrap();
        h.begin(2, "first", 5, Some(1)).unwrap();

        let err = h.begin(2, "second", 7, None).unwrap_err();
        assert_eq!(err, HierarchyError::DuplicateId(2));

        let op = h.record(2).unwrap();
        assert_eq!(op.display_name, "first");
        assert_eq!(op.start_time, 5);
        assert_eq!(op.parent, Some(1));
        // The rejected begin must not register a second edge or a new root.
        assert_eq!(h.children(1), &[2]);
        assert_eq!(h.roots(), &[1]);
    }

    #[test]
    fn end_for_unknown_id_is_rejected() {
        let mut h = Hierarchy::new();
        h.begin(1, "root", 0, None).unwrap();
        assert_eq!(h.end(2, 5).unwrap_err(), HierarchyError::UnknownId(2));
        assert_eq!(h.record(1).unwrap().end_time, 0);
        assert!(h.record(2).is_none());
    }

    #[test]
    fn repeated_end_keeps_last_end_time() {
        let mut h = Hierarchy::new();
        h.begin(1, "root", 1, None).unwrap();
        h.end(1, 3).unwrap();
        assert_eq!(h.end(1, 9).unwrap().value(), 8);
        assert_eq!(h.record(1).unwrap().end_time, 9);
    }

    #[test]
    fn end_before_start_is_insignificant() {
        let mut h = Hierarchy::new();
        h.begin(1, "root", 10, None).unwrap();
        let op = h.end(1, 3).unwrap();
        assert_eq!(op.value(), 0);
        assert!(!op.is_significant());
    }

    #[test]
    fn parent_may_begin_after_child() {
        let mut h = Hierarchy::new();
        h.begin(2, "child", 1, Some(1)).unwrap();
        assert_eq!(h.orphans(), vec![2]);

        h.begin(1, "parent", 0, None).unwrap();
        assert!(h.orphans().is_empty());
        assert_eq!(h.children(1), &[2]);
        assert_eq!(h.len(), 2);
    }
}
