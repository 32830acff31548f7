//! Ordered child list that stays stable while it is being iterated.
//!
//! Traversal locks the container; any add/remove issued while locked is
//! staged and applied when the outermost lock is released. Locks nest.

use crate::api::types::NodeId;

/// Ordered list with a re-entrant lock and deferred mutation.
#[derive(Debug, Clone)]
pub struct Container<T> {
    items: Vec<T>,
    locked: u32,
    pending_add: Vec<T>,
    pending_remove: Vec<T>,
}

/// Child list of a node or the root list of a layer.
pub type NodeContainer = Container<NodeId>;

impl<T> Default for Container<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            locked: 0,
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
        }
    }
}

impl<T: Copy + PartialEq> Container<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked > 0
    }

    pub fn lock(&mut self) {
        self.locked += 1;
    }

    /// Release one lock level. Releasing the last one applies staged
    /// removes, then staged adds, in the order they were staged.
    pub fn unlock(&mut self) {
        if self.locked == 0 {
            return;
        }
        self.locked -= 1;
        if self.locked == 0 {
            for item in std::mem::take(&mut self.pending_remove) {
                self.items.retain(|&c| c != item);
            }
            for item in std::mem::take(&mut self.pending_add) {
                if !self.items.contains(&item) {
                    self.items.push(item);
                }
            }
        }
    }

    /// Append `item`, or stage it while locked. Returns false if it is
    /// already present (or already staged).
    pub fn add(&mut self, item: T) -> bool {
        if self.locked > 0 {
            if let Some(i) = self.pending_remove.iter().position(|&c| c == item) {
                self.pending_remove.remove(i);
                return true;
            }
            if self.items.contains(&item) || self.pending_add.contains(&item) {
                return false;
            }
            self.pending_add.push(item);
            true
        } else {
            if self.items.contains(&item) {
                return false;
            }
            self.items.push(item);
            true
        }
    }

    /// Remove `item`, or stage the removal while locked. Returns false if
    /// it is not present.
    pub fn remove(&mut self, item: T) -> bool {
        if self.locked > 0 {
            if let Some(i) = self.pending_add.iter().position(|&c| c == item) {
                self.pending_add.remove(i);
                return true;
            }
            if !self.items.contains(&item) || self.pending_remove.contains(&item) {
                return false;
            }
            self.pending_remove.push(item);
            true
        } else {
            match self.items.iter().position(|&c| c == item) {
                Some(i) => {
                    self.items.remove(i);
                    true
                }
                None => false,
            }
        }
    }

    /// Membership as it will be once pending changes are applied.
    pub fn will_contain(&self, item: T) -> bool {
        (self.items.contains(&item) && !self.pending_remove.contains(&item))
            || self.pending_add.contains(&item)
    }

    /// Items in the order they will have once pending changes are applied.
    pub fn resolved(&self) -> Vec<T> {
        self.items
            .iter()
            .filter(|item| !self.pending_remove.contains(item))
            .chain(self.pending_add.iter())
            .copied()
            .collect()
    }

    /// Current (applied) membership.
    pub fn contains(&self, item: T) -> bool {
        self.items.contains(&item)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the applied order with `order`, which must be a permutation
    /// of the current items. Ignored while locked or when `order` is not a
    /// permutation, so iteration order is never disturbed.
    pub fn set_order(&mut self, order: Vec<T>) -> bool {
        if self.locked > 0
            || order.len() != self.items.len()
            || !order.iter().all(|item| self.items.contains(item))
        {
            return false;
        }
        self.items = order;
        true
    }

    /// Drop every item, applied and staged. Returns what was applied.
    pub fn drain(&mut self) -> Vec<T> {
        self.pending_add.clear();
        self.pending_remove.clear();
        std::mem::take(&mut self.items)
    }

    /// Forget `item` everywhere, including pending lists, regardless of lock.
    pub(crate) fn purge(&mut self, item: T) {
        self.items.retain(|&c| c != item);
        self.pending_add.retain(|&c| c != item);
        self.pending_remove.retain(|&c| c != item);
    }
}
