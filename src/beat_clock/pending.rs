//! Pending visual callbacks
//!
//! Every delayed beat callback is a spawned task whose abort handle is kept
//! here until it fires. `stop()` aborts whatever is left so no stale beat
//! reaches the observer after a logical stop.
//!
//! Entries are keyed by run generation and sequence number: sequence numbers
//! restart at 0 on every start, so a late completion from an older run must
//! not drop the handle of the current run's beat.

use std::collections::HashMap;

use tokio::task::AbortHandle;

#[derive(Debug, Default)]
pub struct PendingBeats {
    handles: HashMap<(u64, u64), AbortHandle>,
}

impl PendingBeats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, generation: u64, sequence_number: u64, handle: AbortHandle) {
        if let Some(previous) = self.handles.insert((generation, sequence_number), handle) {
            previous.abort();
        }
    }

    /// Forgets a callback that has fired.
    pub fn complete(&mut self, generation: u64, sequence_number: u64) {
        self.handles.remove(&(generation, sequence_number));
    }

    /// Aborts every outstanding callback and returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.handles.len();
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
