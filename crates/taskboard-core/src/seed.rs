use chrono::NaiveDate;

use crate::task::{Priority, Task};

/// The five sample tasks shown to a user with no saved data.
pub fn default_tasks() -> Vec<Task> {
    vec![
        sample(1, "Complete project proposal", false, Priority::High, (2023, 6, 15), "Work"),
        sample(2, "Buy groceries for the week", false, Priority::Medium, (2023, 6, 12), "Personal"),
        sample(3, "Schedule team meeting", true, Priority::Low, (2023, 6, 10), "Work"),
        sample(4, "Gym workout", false, Priority::Medium, (2023, 6, 11), "Health"),
        sample(5, "Read React documentation", false, Priority::High, (2023, 6, 20), "Learning"),
    ]
}

fn sample(
    id: u64,
    title: &str,
    completed: bool,
    priority: Priority,
    (y, m, d): (i32, u32, u32),
    tag: &str,
) -> Task {
    Task {
        id,
        title: title.to_string(),
        completed,
        priority,
        due_date: NaiveDate::from_ymd_opt(y, m, d),
        tags: vec![tag.to_string()],
    }
}
