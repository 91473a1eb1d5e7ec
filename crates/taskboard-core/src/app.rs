use chrono::{DateTime, NaiveDate, Utc};

use crate::counters::Counters;
use crate::datetime::Zone;
use crate::filter::compute_visible;
use crate::kv::KvStore;
use crate::prefs::{self, Theme};
use crate::store::TaskStore;
use crate::task::{NewTask, Task};
use crate::view::{FilterMode, SortMode, ViewState};

/// Single owner of all mutable state: the task collection, the view
/// parameters and the theme.
///
/// After any mutator, call [`App::screen`] to get the re-filtered list
/// and fresh counters.
#[derive(Debug)]
pub struct App<S: KvStore> {
    pub store: TaskStore<S>,
    pub view: ViewState,
    pub theme: Theme,
    pub zone: Zone,
}

/// Everything a front-end needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub title: String,
    pub visible: Vec<Task>,
    pub counters: Counters,
    pub view: ViewState,
    pub today: NaiveDate,
}

impl<S: KvStore> App<S> {
    pub fn new(kv: S, zone: Zone) -> Self {
        let theme = prefs::load_theme(&kv);
        Self {
            store: TaskStore::load(kv),
            view: ViewState::default(),
            theme,
            zone,
        }
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.zone.today(now)
    }

    pub fn add(&mut self, new: NewTask, now: DateTime<Utc>) -> anyhow::Result<u64> {
        self.store.add(new, now)
    }

    pub fn toggle(&mut self, id: u64) -> anyhow::Result<bool> {
        self.store.toggle_completion(id)
    }

    pub fn delete(&mut self, id: u64) -> anyhow::Result<bool> {
        self.store.remove(id)
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.view.set_filter(mode);
    }

    pub fn set_tag_filter(&mut self, tag: &str) {
        self.view.set_tag_filter(tag);
    }

    pub fn set_search_query(&mut self, text: &str) {
        self.view.set_search_query(text);
    }

    pub fn set_sort_by(&mut self, mode: SortMode) {
        self.view.set_sort_by(mode);
    }

    pub fn toggle_theme(&mut self) -> anyhow::Result<Theme> {
        self.theme = prefs::toggle_theme(self.store.kv_mut())?;
        Ok(self.theme)
    }

    pub fn set_theme(&mut self, theme: Theme) -> anyhow::Result<()> {
        prefs::save_theme(self.store.kv_mut(), theme)?;
        self.theme = theme;
        Ok(())
    }

    pub fn screen(&self, now: DateTime<Utc>) -> Screen {
        let today = self.today(now);
        let tasks = self.store.tasks();
        Screen {
            title: content_title(&self.view),
            visible: compute_visible(tasks, &self.view, today)
                .into_iter()
                .cloned()
                .collect(),
            counters: Counters::compute(tasks, today),
            view: self.view.clone(),
            today,
        }
    }
}

pub fn content_title(view: &ViewState) -> String {
    match view.current_filter {
        FilterMode::All => "All Tasks".to_string(),
        FilterMode::Active => "Active Tasks".to_string(),
        FilterMode::Completed => "Completed Tasks".to_string(),
        FilterMode::Today => "Today's Tasks".to_string(),
        FilterMode::High => "High Priority Tasks".to_string(),
        FilterMode::Tag => match view.tag_label.as_deref() {
            Some(tag) => format!("{tag} Tasks"),
            None => format!("{} Tasks", view.search_query),
        },
    }
}

/// Empty-state message per filter; the tag case names the tag needle.
pub fn empty_message(view: &ViewState) -> String {
    match view.current_filter {
        FilterMode::All => {
            "You don't have any tasks yet. Add your first task to get started!".to_string()
        }
        FilterMode::Active => "You don't have any active tasks. Enjoy your free time!".to_string(),
        FilterMode::Completed => "You haven't completed any tasks yet.".to_string(),
        FilterMode::High => "No high priority tasks. Great job!".to_string(),
        FilterMode::Today => "No tasks due today. Enjoy your day!".to_string(),
        FilterMode::Tag => format!("No tasks found with the tag \"{}\"", view.search_query),
    }
}
