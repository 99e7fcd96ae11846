//! Bounded, newest-first list of received ticks.

use crate::models::DisplayRecord;
use std::collections::VecDeque;
use tracing::info;

pub const DISPLAY_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct TickDisplay {
    entries: VecDeque<DisplayRecord>,
    capacity: usize,
}

impl Default for TickDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TickDisplay {
    pub fn new() -> Self {
        Self::with_capacity(DISPLAY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Put a record at the front, evicting from the back past capacity.
    pub fn record_tick(&mut self, record: DisplayRecord) {
        info!("[TICK] {}", record.render());
        self.entries.push_front(record);
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &DisplayRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
