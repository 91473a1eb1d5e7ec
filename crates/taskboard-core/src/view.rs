use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
    Today,
    High,
    Tag,
}

impl FilterMode {
    pub const SIDEBAR: [FilterMode; 5] = [
        FilterMode::All,
        FilterMode::Active,
        FilterMode::Completed,
        FilterMode::Today,
        FilterMode::High,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Active => "active",
            FilterMode::Completed => "completed",
            FilterMode::Today => "today",
            FilterMode::High => "high",
            FilterMode::Tag => "tag",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FilterMode::All),
            "active" => Ok(FilterMode::Active),
            "completed" | "done" => Ok(FilterMode::Completed),
            "today" => Ok(FilterMode::Today),
            "high" => Ok(FilterMode::High),
            "tag" => Ok(FilterMode::Tag),
            other => Err(anyhow!(
                "unknown filter: {other} (expected all, active, completed, today, high or tag)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Newest,
    Oldest,
    DueDate,
    Priority,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::Oldest => "oldest",
            SortMode::DueDate => "dueDate",
            SortMode::Priority => "priority",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortMode::Newest),
            "oldest" => Ok(SortMode::Oldest),
            "duedate" | "due-date" | "due" => Ok(SortMode::DueDate),
            "priority" => Ok(SortMode::Priority),
            other => Err(anyhow!(
                "unknown sort: {other} (expected newest, oldest, dueDate or priority)"
            )),
        }
    }
}

/// Transient parameters of the visible list. Never persisted.
///
/// Every mutator is followed, by contract, by a re-run of
/// [`crate::filter::compute_visible`] and a re-render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub current_filter: FilterMode,
    /// Lowercase. Doubles as the tag needle while in tag mode.
    pub search_query: String,
    pub sort_by: SortMode,
    /// Tag as the user picked it, kept for the heading.
    pub tag_label: Option<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaving tag mode drops the tag needle from the search query.
    pub fn set_filter(&mut self, mode: FilterMode) {
        if self.current_filter == FilterMode::Tag && mode != FilterMode::Tag {
            self.search_query.clear();
            self.tag_label = None;
        }
        debug!(from = %self.current_filter, to = %mode, "filter changed");
        self.current_filter = mode;
    }

    pub fn set_tag_filter(&mut self, tag: &str) {
        debug!(tag, "tag filter selected");
        self.current_filter = FilterMode::Tag;
        self.search_query = tag.to_lowercase();
        self.tag_label = Some(tag.to_string());
    }

    pub fn set_search_query(&mut self, text: &str) {
        self.search_query = text.to_lowercase();
    }

    pub fn set_sort_by(&mut self, mode: SortMode) {
        self.sort_by = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterMode, SortMode, ViewState};

    #[test]
    fn defaults_are_all_empty_newest() {
        let view = ViewState::new();
        assert_eq!(view.current_filter, FilterMode::All);
        assert_eq!(view.search_query, "");
        assert_eq!(view.sort_by, SortMode::Newest);
    }

    #[test]
    fn tag_filter_lowercases_query_and_keeps_label() {
        let mut view = ViewState::new();
        view.set_tag_filter("Work");
        assert_eq!(view.current_filter, FilterMode::Tag);
        assert_eq!(view.search_query, "work");
        assert_eq!(view.tag_label.as_deref(), Some("Work"));
    }

    #[test]
    fn leaving_tag_mode_clears_tag_search() {
        let mut view = ViewState::new();
        view.set_tag_filter("Work");
        view.set_filter(FilterMode::Active);
        assert_eq!(view.current_filter, FilterMode::Active);
        assert_eq!(view.search_query, "");
        assert_eq!(view.tag_label, None);
    }

    #[test]
    fn plain_filter_change_keeps_typed_search() {
        let mut view = ViewState::new();
        view.set_search_query("GYM");
        view.set_filter(FilterMode::Active);
        assert_eq!(view.search_query, "gym");
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("dueDate".parse::<SortMode>().unwrap(), SortMode::DueDate);
        assert_eq!("due-date".parse::<SortMode>().unwrap(), SortMode::DueDate);
        assert_eq!("High".parse::<FilterMode>().unwrap(), FilterMode::High);
        assert!("someday".parse::<FilterMode>().is_err());
        assert_eq!(SortMode::DueDate.to_string(), "dueDate");
    }
}
