//! Append-only mapping from execution units to lanes.

use indexmap::IndexSet;
use parking_lot::Mutex;

use crate::ExecutionUnitId;

/// Result of resolving an execution unit to a lane.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Lane {
    /// 0-based lane index, which is also the indentation depth.
    pub index: usize,
    /// Whether this lane was allocated by the call that returned it.
    pub is_new: bool,
}
impl Lane {
    /// Returns the 1-based lane number shown to humans.
    pub fn number(self) -> usize {
        self.index + 1
    }
}

/// Thread-safe registry assigning each execution unit a stable lane index.
///
/// Lanes are handed out in first-seen order and are never reclaimed, even
/// after the execution unit terminates. A process that spawns many short-lived
/// threads will therefore grow this table without bound; reclaiming lanes
/// would change the numbering of existing output.
#[derive(Debug, Default)]
pub struct LaneRegistry {
    units: Mutex<IndexSet<ExecutionUnitId>>,
}
impl LaneRegistry {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lane for `id`, allocating the next one if `id` has never
    /// been seen before.
    pub fn resolve_lane(&self, id: ExecutionUnitId) -> Lane {
        let (index, is_new) = self.units.lock().insert_full(id);
        if is_new {
            log::trace!("allocated lane {} for execution unit {id}", index + 1);
        }
        Lane { index, is_new }
    }

    /// Returns the lane index for `id` without allocating one.
    pub fn lane_of(&self, id: ExecutionUnitId) -> Option<usize> {
        self.units.lock().get_index_of(&id)
    }

    /// Returns the number of lanes allocated so far.
    pub fn len(&self) -> usize {
        self.units.lock().len()
    }
    /// Returns whether no lanes have been allocated yet.
    pub fn is_empty(&self) -> bool {
        self.units.lock().is_empty()
    }

    /// Returns every known execution unit, ordered by lane index.
    pub fn snapshot(&self) -> Vec<ExecutionUnitId> {
        self.units.lock().iter().copied().collect()
    }
}
