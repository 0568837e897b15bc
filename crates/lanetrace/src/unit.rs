//! Identification of the calling execution unit.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Opaque identifier for an execution unit (a thread or task).
///
/// Unique among execution units that are alive at the same time. This crate
/// never creates or destroys execution units; it only observes their IDs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionUnitId(pub u64);
impl fmt::Display for ExecutionUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
impl From<u64> for ExecutionUnitId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Capability to determine which execution unit is currently running.
///
/// Returning `None` is not an error: callers fall back to lane 0.
pub trait UnitIdSource: Send + Sync {
    /// Returns the ID of the calling execution unit, if it can be determined.
    fn current_unit_id(&self) -> Option<ExecutionUnitId>;
}

impl<F> UnitIdSource for F
where
    F: Fn() -> Option<ExecutionUnitId> + Send + Sync,
{
    fn current_unit_id(&self) -> Option<ExecutionUnitId> {
        self()
    }
}

static NEXT_THREAD_NUMBER: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_NUMBER: u64 = NEXT_THREAD_NUMBER.fetch_add(1, Ordering::Relaxed);
}

/// Numbers OS threads in the order they first ask for an ID.
///
/// Numbers are drawn from a process-wide counter and cached in thread-local
/// storage, so they are stable for the lifetime of the thread and never
/// reused. This is the default source.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadLocalCounter;
impl UnitIdSource for ThreadLocalCounter {
    fn current_unit_id(&self) -> Option<ExecutionUnitId> {
        // Fails only while thread-locals are being torn down.
        THREAD_NUMBER.try_with(|&n| ExecutionUnitId(n)).ok()
    }
}

/// Reads the standard library's own thread ID.
///
/// There is no stable accessor for the numeric value, so this parses the
/// `Debug` output of [`std::thread::ThreadId`], which currently looks like
/// `ThreadId(3)`. If the format ever changes, this source returns `None`.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadIdIntrospection;
impl UnitIdSource for ThreadIdIntrospection {
    fn current_unit_id(&self) -> Option<ExecutionUnitId> {
        parse_thread_id(&format!("{:?}", std::thread::current().id()))
    }
}

fn parse_thread_id(s: &str) -> Option<ExecutionUnitId> {
    let digits = s.strip_prefix("ThreadId(")?.strip_suffix(')')?;
    digits.parse().ok().map(ExecutionUnitId)
}
