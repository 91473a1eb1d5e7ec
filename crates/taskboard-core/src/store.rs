use std::collections::BTreeSet;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::kv::{KvStore, TASKS_KEY};
use crate::seed;
use crate::task::{NewTask, Task};

/// Authoritative task collection. Every mutation is written through to the
/// backing [`KvStore`] before returning.
///
/// Callers must re-run the view filter and the counters after calling any
/// mutator here.
#[derive(Debug)]
pub struct TaskStore<S: KvStore> {
    kv: S,
    tasks: Vec<Task>,
}

impl<S: KvStore> TaskStore<S> {
    /// Reads the saved collection. Anything unusable (missing key, read
    /// failure, bad JSON, empty list) falls back to the built-in samples.
    #[tracing::instrument(skip(kv))]
    pub fn load(kv: S) -> Self {
        let tasks = match kv.get(TASKS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(saved) if !saved.is_empty() => {
                    debug!(count = saved.len(), "loaded saved tasks");
                    Some(saved)
                }
                Ok(_) => {
                    debug!("saved task list is empty");
                    None
                }
                Err(err) => {
                    warn!(error = %err, "saved tasks are malformed; ignoring them");
                    None
                }
            },
            Ok(None) => {
                debug!("no saved tasks");
                None
            }
            Err(err) => {
                warn!(error = %err, "failed reading saved tasks; ignoring them");
                None
            }
        };

        let tasks = tasks.unwrap_or_else(|| {
            info!("seeding default tasks");
            seed::default_tasks()
        });

        Self { kv, tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    /// Every tag in use, de-duplicated case-sensitively and sorted.
    pub fn distinct_tags(&self) -> Vec<String> {
        self.tasks
            .iter()
            .flat_map(|t| t.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Ids are creation time in epoch milliseconds, bumped past the current
    /// maximum when two adds land in the same millisecond.
    pub fn next_id(&self, now: DateTime<Utc>) -> u64 {
        let from_clock = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        match self.tasks.iter().map(|t| t.id).max() {
            Some(max) if from_clock <= max => max + 1,
            _ => from_clock,
        }
    }

    #[tracing::instrument(skip(self, new, now), fields(title = %new.title))]
    pub fn add(&mut self, new: NewTask, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let id = self.next_id(now);
        self.tasks.push(Task::from_new(id, new));
        info!(id, "added task");
        self.persist()?;
        Ok(id)
    }

    /// Returns whether a task with `id` existed.
    #[tracing::instrument(skip(self))]
    pub fn toggle_completion(&mut self, id: u64) -> anyhow::Result<bool> {
        let found = match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                debug!(id, completed = task.completed, "toggled task");
                true
            }
            None => {
                debug!(id, "toggle on unknown id ignored");
                false
            }
        };
        self.persist()?;
        Ok(found)
    }

    /// Returns whether a task with `id` existed.
    #[tracing::instrument(skip(self))]
    pub fn remove(&mut self, id: u64) -> anyhow::Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let found = self.tasks.len() != before;
        if found {
            info!(id, "removed task");
        } else {
            debug!(id, "remove on unknown id ignored");
        }
        self.persist()?;
        Ok(found)
    }

    #[tracing::instrument(skip(self), fields(count = self.tasks.len()))]
    pub fn persist(&mut self) -> anyhow::Result<()> {
        let serialized =
            serde_json::to_string(&self.tasks).context("failed to serialize tasks")?;
        self.kv
            .set(TASKS_KEY, &serialized)
            .context("failed to save tasks")
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::TaskStore;
    use crate::kv::{KvStore, MemoryStore, TASKS_KEY};
    use crate::task::{NewTask, Priority};

    fn seeded() -> TaskStore<MemoryStore> {
        TaskStore::load(MemoryStore::new())
    }

    #[test]
    fn missing_data_seeds_five_samples() {
        let store = seeded();
        let ids: Vec<u64> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn malformed_or_empty_data_seeds_samples() {
        let mut kv = MemoryStore::new();
        kv.set(TASKS_KEY, "{broken").unwrap();
        assert_eq!(TaskStore::load(kv).len(), 5);

        let mut kv = MemoryStore::new();
        kv.set(TASKS_KEY, "[]").unwrap();
        assert_eq!(TaskStore::load(kv).len(), 5);
    }

    #[test]
    fn add_then_remove_restores_collection() {
        let mut store = seeded();
        let before = store.tasks().to_vec();
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 12, 0, 0).unwrap();

        let id = store
            .add(NewTask::new("Water plants", Priority::Low), now)
            .unwrap();
        assert_eq!(store.len(), 6);
        assert!(!store.get(id).unwrap().completed);

        assert!(store.remove(id).unwrap());
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn same_millisecond_adds_get_distinct_increasing_ids() {
        let mut store = seeded();
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 12, 0, 0).unwrap();

        let a = store.add(NewTask::new("a", Priority::Low), now).unwrap();
        let b = store.add(NewTask::new("b", Priority::Low), now).unwrap();
        assert_eq!(a, now.timestamp_millis() as u64);
        assert_eq!(b, a + 1);
    }

    #[test]
    fn double_toggle_is_identity() {
        let mut store = seeded();
        assert!(store.toggle_completion(3).unwrap());
        assert!(!store.get(3).unwrap().completed);
        assert!(store.toggle_completion(3).unwrap());
        assert!(store.get(3).unwrap().completed);
    }

    #[test]
    fn unknown_ids_are_silent_noops() {
        let mut store = seeded();
        let before = store.tasks().to_vec();
        assert!(!store.toggle_completion(999).unwrap());
        assert!(!store.remove(999).unwrap());
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn mutations_are_written_through() {
        let mut store = seeded();
        store.toggle_completion(1).unwrap();

        let raw = store.kv().get(TASKS_KEY).unwrap().unwrap();
        let reloaded = TaskStore::load(crate::kv::MemoryStore::new());
        assert!(raw.contains("\"dueDate\":\"2023-06-15\""));
        assert_ne!(reloaded.tasks(), store.tasks());

        let mut kv = MemoryStore::new();
        kv.set(TASKS_KEY, &raw).unwrap();
        assert_eq!(TaskStore::load(kv).tasks(), store.tasks());
    }

    #[test]
    fn distinct_tags_are_sorted() {
        let store = seeded();
        assert_eq!(
            store.distinct_tags(),
            vec!["Health", "Learning", "Personal", "Work"]
        );
    }
}
