//! Bounded undo/redo history of whole block-list snapshots.

use std::collections::VecDeque;

use crate::editing::block::{Block, BlockKey};

/// Default number of snapshots kept in `past`
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Undo/redo stacks of block lists
///
/// Every mutating store operation pushes the pre-mutation list onto `past` and
/// clears `future`. `past` drops its oldest entry once it exceeds `capacity`.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Vec<Block>>,
    future: Vec<Vec<Block>>,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record the list as it was before a mutation
    pub fn record(&mut self, before: Vec<Block>) {
        self.future.clear();
        self.past.push_back(before);
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
    }

    /// Step back; `current` moves onto the redo stack
    pub fn undo(&mut self, current: Vec<Block>) -> Option<Vec<Block>> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward; `current` moves back onto the undo stack
    pub fn redo(&mut self, current: Vec<Block>) -> Option<Vec<Block>> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn len(&self) -> usize {
        self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Rewrite a block key in every stored snapshot
    pub fn rekey(&mut self, old: BlockKey, new: BlockKey) {
        let snapshots = self.past.iter_mut().chain(self.future.iter_mut());
        for snapshot in snapshots {
            for block in snapshot.iter_mut().filter(|b| b.key == old) {
                block.key = new;
            }
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
