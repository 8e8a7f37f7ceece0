//! Fixed-capacity watchpoint pool
//!
//! Records live in an arena indexed by their id. Two index lists partition
//! the arena: `free` is a stack of reusable slots and `active` holds the
//! watched slots in creation order.

use log::debug;
use serde::{Deserialize, Serialize};

use super::{WatchError, WatchpointId};

/// Default number of watchpoints
pub const DEFAULT_CAPACITY: usize = 32;

/// A watched expression and the value it had at the last check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchpoint {
    pub id: WatchpointId,
    pub expression: String,
    pub last_value: u32,
}

/// A value change reported by [`WatchpointPool::sweep`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchChange {
    pub id: WatchpointId,
    pub expression: String,
    pub old_value: u32,
    pub new_value: u32,
}

#[derive(Debug, Clone)]
pub struct WatchpointPool {
    slots: Vec<Watchpoint>,
    /// Reusable slot indices; the next allocation pops from the end
    free: Vec<usize>,
    /// Watched slot indices, oldest first
    active: Vec<usize>,
}

impl WatchpointPool {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|i| Watchpoint {
                id: WatchpointId(i as u32),
                expression: String::new(),
                last_value: 0,
            })
            .collect();

        Self {
            slots,
            free: (0..capacity).rev().collect(),
            active: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Take a record from the free set and make it the newest active one.
    ///
    /// The record keeps whatever expression and value it last held; the
    /// caller overwrites both.
    pub fn allocate(&mut self) -> Result<&mut Watchpoint, WatchError> {
        let index = self.free.pop().ok_or(WatchError::PoolExhausted {
            capacity: self.capacity(),
        })?;
        self.active.push(index);
        Ok(&mut self.slots[index])
    }

    /// Return the active record with `id` to the free set.
    pub fn release(&mut self, id: WatchpointId) -> Result<(), WatchError> {
        let position = self
            .active
            .iter()
            .position(|&i| self.slots[i].id == id)
            .ok_or(WatchError::NotFound { id })?;
        let index = self.active.remove(position);
        self.free.push(index);
        debug!("released watchpoint {}", id);
        Ok(())
    }

    pub fn get(&self, id: WatchpointId) -> Option<&Watchpoint> {
        self.active
            .iter()
            .map(|&i| &self.slots[i])
            .find(|wp| wp.id == id)
    }

    /// Active records, most recently created first.
    pub fn iter(&self) -> impl Iterator<Item = &Watchpoint> {
        self.active.iter().rev().map(|&i| &self.slots[i])
    }

    pub fn list(&self) -> Vec<Watchpoint> {
        self.iter().cloned().collect()
    }

    /// Re-evaluate every active expression and report the ones whose value
    /// changed, updating their stored value.
    ///
    /// The first evaluation failure aborts the sweep and leaves every stored
    /// value untouched, so the next successful sweep reports the changes.
    pub fn sweep<F, E>(&mut self, mut eval: F) -> Result<Vec<WatchChange>, E>
    where
        F: FnMut(&str) -> Result<u32, E>,
    {
        let values = self
            .active
            .iter()
            .rev()
            .map(|&index| eval(&self.slots[index].expression).map(|value| (index, value)))
            .collect::<Result<Vec<_>, E>>()?;

        let mut changes = Vec::new();
        for (index, new_value) in values {
            let wp = &mut self.slots[index];
            if new_value != wp.last_value {
                debug!(
                    "watchpoint {}: {} changed {} -> {}",
                    wp.id, wp.expression, wp.last_value, new_value
                );
                changes.push(WatchChange {
                    id: wp.id,
                    expression: wp.expression.clone(),
                    old_value: wp.last_value,
                    new_value,
                });
                wp.last_value = new_value;
            }
        }

        Ok(changes)
    }

    /// Release every active record, newest first.
    pub fn clear(&mut self) {
        while let Some(index) = self.active.pop() {
            self.free.push(index);
        }
    }
}

impl Default for WatchpointPool {
    fn default() -> Self {
        Self::new()
    }
}
