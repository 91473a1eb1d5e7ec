use chrono::NaiveDate;

use crate::task::{Priority, Task};
use crate::view::FilterMode;

/// Sidebar badge values, derived from the full collection.
/// Recompute after every store mutation; never cache across one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub due_today: usize,
    pub high_priority_active: usize,
}

impl Counters {
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        tasks.iter().fold(Self::default(), |mut acc, task| {
            acc.total += 1;
            if task.completed {
                acc.completed += 1;
            } else {
                acc.active += 1;
                if task.is_due_on(today) {
                    acc.due_today += 1;
                }
                if task.priority == Priority::High {
                    acc.high_priority_active += 1;
                }
            }
            acc
        })
    }

    /// Badge for a sidebar entry; tag entries carry none.
    pub fn count_for(&self, mode: FilterMode) -> Option<usize> {
        match mode {
            FilterMode::All => Some(self.total),
            FilterMode::Active => Some(self.active),
            FilterMode::Completed => Some(self.completed),
            FilterMode::Today => Some(self.due_today),
            FilterMode::High => Some(self.high_priority_active),
            FilterMode::Tag => None,
        }
    }
}
