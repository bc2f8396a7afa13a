use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::model::state::{ActiveTimer, SortBy, SortDirection, TaskFilters, TaskSort};
use crate::model::task::Task;
use crate::util::time::{end_of_day, parse_timestamp, start_of_day, timestamp_millis_or_zero};

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Apply every active filter (AND), keeping repository order
pub fn filtered_tasks<'a>(tasks: &'a [Task], filters: &TaskFilters) -> Vec<&'a Task> {
    let search = filters.search.trim().to_lowercase();
    let window = date_window(filters);
    tasks
        .iter()
        .filter(|task| matches_search(task, &search))
        .filter(|task| is_unset(&filters.category) || task.category == filters.category)
        .filter(|task| is_unset(&filters.priority) || task.priority.as_str() == filters.priority)
        .filter(|task| match filters.status.as_str() {
            "Completed" => task.completed,
            "Active" => !task.completed,
            _ => true,
        })
        .filter(|task| match window {
            Some((start, end)) => match parse_timestamp(&task.due_date) {
                Some(due) => due >= start && due <= end,
                // An unreadable due date never falls outside the window
                None => true,
            },
            None => true,
        })
        .collect()
}

fn is_unset(value: &str) -> bool {
    value.is_empty() || value == "all"
}

fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty()
        || task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
}

/// Normalized `[start-of-day, end-of-day]` window, only when both ends parse
fn date_window(filters: &TaskFilters) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = parse_timestamp(filters.date_range.start.as_deref()?)?;
    let end = parse_timestamp(filters.date_range.end.as_deref()?)?;
    Some((start_of_day(start), end_of_day(end)))
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Stable sort. Incomplete tasks always come before completed ones; within
/// each group the sort key and direction apply.
pub fn sorted_tasks<'a>(mut tasks: Vec<&'a Task>, sort: &TaskSort) -> Vec<&'a Task> {
    tasks.sort_by(|a, b| {
        a.completed.cmp(&b.completed).then_with(|| {
            let ord = compare_by(a, b, sort.by);
            match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        })
    });
    tasks
}

fn compare_by(a: &Task, b: &Task, by: SortBy) -> Ordering {
    match by {
        SortBy::None => Ordering::Equal,
        SortBy::DueDate => {
            timestamp_millis_or_zero(&a.due_date).cmp(&timestamp_millis_or_zero(&b.due_date))
        }
        SortBy::Priority => a.priority.rank().cmp(&b.priority.rank()),
        SortBy::Title => a
            .title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.title.cmp(&b.title)),
        SortBy::Created => {
            timestamp_millis_or_zero(&a.created).cmp(&timestamp_millis_or_zero(&b.created))
        }
    }
}

// ---------------------------------------------------------------------------
// Scores and timers
// ---------------------------------------------------------------------------

/// `round(100 * completed / total)`, 0 for an empty list
pub fn productivity_score(tasks: &[Task]) -> u32 {
    if tasks.is_empty() {
        return 0;
    }
    let completed = tasks.iter().filter(|t| t.completed).count();
    ((completed as f64 / tasks.len() as f64) * 100.0).round() as u32
}

/// Tracked time to display for `task`, including the live timer segment
pub fn elapsed_for_task(task: &Task, timer: &ActiveTimer, now: DateTime<Utc>) -> u64 {
    if timer.task_id != Some(task.id) {
        return task.timer;
    }
    task.timer + timer.elapsed + timer.running_segment(now)
}

/// Selected ids that still exist, in selection order
pub fn selected_tasks<'a>(tasks: &'a [Task], selection: &[u64]) -> Vec<&'a Task> {
    selection
        .iter()
        .filter_map(|id| tasks.iter().find(|t| t.id == *id))
        .collect()
}

// ---------------------------------------------------------------------------
// Dashboard statistics
// ---------------------------------------------------------------------------

/// Summary counters shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Incomplete and due before now
    pub overdue: usize,
    /// Incomplete and due within the next 48 hours
    pub upcoming: usize,
    pub completion_percentage: u32,
    /// Mean tracked milliseconds over completed tasks with a timer
    pub average_completion_ms: u64,
}

pub fn task_stats(tasks: &[Task], now: DateTime<Utc>) -> TaskStats {
    let completed = tasks.iter().filter(|t| t.completed).count();
    let horizon = now + Duration::days(2);
    let mut overdue = 0;
    let mut upcoming = 0;
    for task in tasks.iter().filter(|t| !t.completed) {
        if let Some(due) = parse_timestamp(&task.due_date) {
            if due < now {
                overdue += 1;
            } else if due <= horizon {
                upcoming += 1;
            }
        }
    }
    let timed: Vec<u64> = tasks
        .iter()
        .filter(|t| t.completed && t.timer > 0)
        .map(|t| t.timer)
        .collect();
    let average_completion_ms = if timed.is_empty() {
        0
    } else {
        timed.iter().sum::<u64>() / timed.len() as u64
    };

    TaskStats {
        total: tasks.len(),
        completed,
        pending: tasks.len() - completed,
        overdue,
        upcoming,
        completion_percentage: productivity_score(tasks),
        average_completion_ms,
    }
}
