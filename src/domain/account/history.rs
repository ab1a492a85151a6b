use std::collections::VecDeque;

use super::operation::Operation;

// ============================================================================
// Operation History
// ============================================================================
//
// Ordered most recent first by (at, insertion sequence), both descending.
// Operations stamped with the same instant keep the later insertion first.
//
// ============================================================================

#[derive(Debug, Clone)]
struct Entry {
    sequence: u64,
    operation: Operation,
}

#[derive(Debug, Clone, Default)]
pub struct OperationHistory {
    entries: VecDeque<Entry>,
    next_sequence: u64,
}

impl OperationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored operations in any order.
    ///
    /// Operations sharing a timestamp keep their relative input order, so a
    /// list that is already most-recent-first comes back unchanged.
    pub fn from_operations(mut operations: Vec<Operation>) -> Self {
        operations.sort_by(|a, b| b.at().cmp(&a.at()));

        let count = operations.len() as u64;
        let entries = operations
            .into_iter()
            .enumerate()
            .map(|(index, operation)| Entry {
                sequence: count - 1 - index as u64,
                operation,
            })
            .collect();

        Self {
            entries,
            next_sequence: count,
        }
    }

    pub fn insert(&mut self, operation: Operation) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let key = (operation.at(), sequence);
        let position = self
            .entries
            .partition_point(|entry| (entry.operation.at(), entry.sequence) > key);

        self.entries.insert(position, Entry { sequence, operation });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> + '_ {
        self.entries.iter().map(|entry| &entry.operation)
    }

    pub fn latest(&self) -> Option<&Operation> {
        self.entries.front().map(|entry| &entry.operation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Operation> {
        self.iter().cloned().collect()
    }
}
