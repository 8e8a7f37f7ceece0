//! Watchpoints
//!
//! A watchpoint is an expression plus its last observed value. The monitor
//! re-evaluates all of them after every execution step and reports the
//! ones that changed.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod pool;

pub use pool::{WatchChange, Watchpoint, WatchpointPool, DEFAULT_CAPACITY};

/// Unique identifier for a watchpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchpointId(pub u32);

impl fmt::Display for WatchpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    #[error("No more watchpoints (capacity {capacity})")]
    PoolExhausted { capacity: usize },

    #[error("No such watchpoint: {id}")]
    NotFound { id: WatchpointId },
}
