use std::cmp::Ordering;

use chrono::NaiveDate;
use tracing::trace;

use crate::task::Task;
use crate::view::{
  FilterMode,
  SortMode,
  ViewState
};

/// Produces the visible, ordered subset
/// of `tasks` for `view`. Pure: no I/O,
/// never mutates the input.
///
/// `today` is the current local
/// calendar date. In tag mode the
/// search query is the tag needle, so
/// the title check is skipped there.
#[tracing::instrument(skip(
  tasks, view
), fields(
  total = tasks.len(),
  filter = %view.current_filter,
  sort = %view.sort_by
))]
pub fn compute_visible<'a>(
  tasks: &'a [Task],
  view: &ViewState,
  today: NaiveDate
) -> Vec<&'a Task> {
  let query =
    view.search_query.to_lowercase();

  let mut visible: Vec<&Task> = tasks
    .iter()
    .filter(|task| {
      matches_mode(
        task,
        view.current_filter,
        &query,
        today
      ) && (view.current_filter
        == FilterMode::Tag
        || matches_search(task, &query))
    })
    .collect();

  // slice::sort_by is stable; ties keep
  // collection order.
  visible.sort_by(|a, b| {
    compare(view.sort_by, a, b)
  });

  trace!(
    visible = visible.len(),
    "computed visible tasks"
  );
  visible
}

/// `needle` must be lowercase.
pub fn matches_mode(
  task: &Task,
  mode: FilterMode,
  needle: &str,
  today: NaiveDate
) -> bool {
  match mode {
    | FilterMode::All => true,
    | FilterMode::Active => {
      !task.completed
    }
    | FilterMode::Completed => {
      task.completed
    }
    // Completed tasks stay in the
    // high view; only today hides them.
    | FilterMode::High => {
      task.priority
        == crate::task::Priority::High
    }
    | FilterMode::Today => {
      task.is_due_on(today)
        && !task.completed
    }
    | FilterMode::Tag => {
      task.has_tag_containing(needle)
    }
  }
}

/// `needle` must be lowercase.
pub fn matches_search(
  task: &Task,
  needle: &str
) -> bool {
  task.title_contains(needle)
}

pub fn compare(
  sort: SortMode,
  a: &Task,
  b: &Task
) -> Ordering {
  match sort {
    | SortMode::Newest => b.id.cmp(&a.id),
    | SortMode::Oldest => a.id.cmp(&b.id),
    | SortMode::DueDate => {
      match (a.due_date, b.due_date) {
        | (Some(x), Some(y)) => x.cmp(&y),
        | (Some(_), None) => {
          Ordering::Less
        }
        | (None, Some(_)) => {
          Ordering::Greater
        }
        | (None, None) => Ordering::Equal
      }
    }
    | SortMode::Priority => {
      b.priority
        .rank()
        .cmp(&a.priority.rank())
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::compute_visible;
  use crate::seed::default_tasks;
  use crate::task::{
    Priority,
    Task
  };
  use crate::view::{
    FilterMode,
    SortMode,
    ViewState
  };

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 11)
      .unwrap()
  }

  fn ids(tasks: &[&Task]) -> Vec<u64> {
    tasks.iter().map(|t| t.id).collect()
  }

  fn sorted_ids(
    tasks: &[&Task]
  ) -> Vec<u64> {
    let mut out = ids(tasks);
    out.sort_unstable();
    out
  }

  fn task(
    id: u64,
    priority: Priority,
    due: Option<(i32, u32, u32)>
  ) -> Task {
    Task {
      id,
      title: format!("task {id}"),
      completed: false,
      priority,
      due_date: due.and_then(
        |(y, m, d)| {
          NaiveDate::from_ymd_opt(y, m, d)
        }
      ),
      tags: vec![]
    }
  }

  #[test]
  fn active_filter_on_seed() {
    let tasks = default_tasks();
    let mut view = ViewState::new();
    view.set_filter(FilterMode::Active);
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(
      sorted_ids(&visible),
      vec![1, 2, 4, 5]
    );
  }

  #[test]
  fn completed_and_active_partition() {
    let tasks = default_tasks();
    let mut view = ViewState::new();

    view.set_filter(FilterMode::Completed);
    let done = compute_visible(
      &tasks, &view, today()
    );
    view.set_filter(FilterMode::Active);
    let active = compute_visible(
      &tasks, &view, today()
    );

    for t in tasks.iter().filter(|t| t.completed) {
      assert!(done.iter().any(|v| v.id == t.id));
      assert!(!active.iter().any(|v| v.id == t.id));
    }
  }

  #[test]
  fn high_filter_keeps_completed_tasks() {
    let mut tasks = default_tasks();
    tasks[0].completed = true;
    let mut view = ViewState::new();
    view.set_filter(FilterMode::High);
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(
      sorted_ids(&visible),
      vec![1, 5]
    );
  }

  #[test]
  fn today_filter_hides_completed_tasks()
  {
    let mut tasks = default_tasks();
    let mut view = ViewState::new();
    view.set_filter(FilterMode::Today);

    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(ids(&visible), vec![4]);

    tasks[3].completed = true;
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert!(visible.is_empty());
  }

  #[test]
  fn search_matches_title_case_insensitively()
   {
    let tasks = default_tasks();
    let mut view = ViewState::new();
    view.set_search_query("GYM");
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(ids(&visible), vec![4]);
  }

  #[test]
  fn search_combines_with_mode_filter() {
    let tasks = default_tasks();
    let mut view = ViewState::new();
    view.set_search_query("gym");

    view.set_filter(FilterMode::Completed);
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(
      ids(&visible),
      Vec::<u64>::new()
    );

    view.set_filter(FilterMode::Active);
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(ids(&visible), vec![4]);

    view.set_filter(FilterMode::High);
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert!(visible.is_empty());
    assert_eq!(view.search_query, "gym");
  }

  #[test]
  fn tag_filter_matches_work_tasks() {
    let tasks = default_tasks();
    let mut view = ViewState::new();
    view.set_tag_filter("Work");
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(
      sorted_ids(&visible),
      vec![1, 3]
    );
  }

  #[test]
  fn oldest_puts_smallest_id_first() {
    let tasks = default_tasks();
    let mut view = ViewState::new();
    view.set_sort_by(SortMode::Oldest);
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(
      ids(&visible),
      vec![1, 2, 3, 4, 5]
    );

    view.set_sort_by(SortMode::Newest);
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(
      ids(&visible),
      vec![5, 4, 3, 2, 1]
    );
  }

  #[test]
  fn priority_sort_is_stable_within_rank()
  {
    let tasks = vec![
      task(1, Priority::Low, None),
      task(2, Priority::High, None),
      task(3, Priority::Medium, None),
      task(4, Priority::High, None),
      task(5, Priority::Low, None),
    ];
    let mut view = ViewState::new();
    view.set_sort_by(SortMode::Priority);
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(
      ids(&visible),
      vec![2, 4, 3, 1, 5]
    );
  }

  #[test]
  fn due_date_sort_puts_undated_last() {
    let tasks = vec![
      task(1, Priority::Low, None),
      task(
        2,
        Priority::Low,
        Some((2023, 6, 20))
      ),
      task(3, Priority::Low, None),
      task(
        4,
        Priority::Low,
        Some((2023, 6, 1))
      ),
    ];
    let mut view = ViewState::new();
    view.set_sort_by(SortMode::DueDate);
    let visible = compute_visible(
      &tasks, &view, today()
    );
    assert_eq!(
      ids(&visible),
      vec![4, 2, 1, 3]
    );
  }

  #[test]
  fn reapplying_is_idempotent() {
    let tasks = default_tasks();
    let mut view = ViewState::new();
    view.set_search_query("e");
    view.set_sort_by(SortMode::DueDate);

    let first: Vec<Task> =
      compute_visible(&tasks, &view, today())
        .into_iter()
        .cloned()
        .collect();
    let second = compute_visible(
      &first, &view, today()
    );
    assert!(second.len() <= tasks.len());
    assert_eq!(
      ids(&second),
      first.iter().map(|t| t.id).collect::<Vec<_>>()
    );
  }
}
