use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive due-date window. Only applied when both ends are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// Active list filters. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskFilters {
    /// Case-insensitive substring matched against title and description
    pub search: String,
    /// Exact category; `"all"` is treated as unset
    pub category: String,
    /// Exact priority name; `"all"` is treated as unset
    pub priority: String,
    /// `"Completed"`, `"Active"`, anything else is unset
    pub status: String,
    pub date_range: DateRange,
}

impl TaskFilters {
    pub fn is_cleared(&self) -> bool {
        *self == TaskFilters::default()
    }

    pub fn set(&mut self, key: FilterKey, value: String) {
        match key {
            FilterKey::Search => self.search = value,
            FilterKey::Category => self.category = value,
            FilterKey::Priority => self.priority = value,
            FilterKey::Status => self.status = value,
        }
    }
}

/// The string-valued filter fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Search,
    Category,
    Priority,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    None,
    DueDate,
    Priority,
    Title,
    Created,
}

impl SortBy {
    pub fn parse(s: &str) -> Option<SortBy> {
        match s {
            "none" => Some(SortBy::None),
            "dueDate" | "due" | "due-date" => Some(SortBy::DueDate),
            "priority" => Some(SortBy::Priority),
            "title" => Some(SortBy::Title),
            "created" => Some(SortBy::Created),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskSort {
    #[serde(default)]
    pub by: SortBy,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Which dashboard view is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Graph,
}

/// The single per-task stopwatch.
///
/// `start_time == None` means paused. When `task_id` is `None` the timer is
/// idle and both other fields are at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveTimer {
    pub task_id: Option<u64>,
    pub start_time: Option<DateTime<Utc>>,
    /// Milliseconds accumulated for this task but not yet folded into `Task::timer`
    pub elapsed: u64,
}

impl ActiveTimer {
    pub fn is_running(&self) -> bool {
        self.task_id.is_some() && self.start_time.is_some()
    }

    /// Milliseconds in the currently running segment (0 when paused)
    pub fn running_segment(&self, now: DateTime<Utc>) -> u64 {
        match self.start_time {
            Some(start) => millis_between(start, now),
            None => 0,
        }
    }
}

/// Session clock driven by the user's status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkTimer {
    pub start_time: Option<DateTime<Utc>>,
    pub elapsed: u64,
}

impl WorkTimer {
    pub fn total(&self, now: DateTime<Utc>) -> u64 {
        self.elapsed
            + self
                .start_time
                .map(|start| millis_between(start, now))
                .unwrap_or(0)
    }
}

/// A toast-style notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
}

/// Non-negative milliseconds from `from` to `to` (clock skew clamps to 0)
pub fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_milliseconds()).unwrap_or(0)
}
