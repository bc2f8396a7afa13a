use serde::Serialize;

use crate::model::state::{ActiveTimer, Notification};
use crate::model::task::Task;
use crate::model::user::User;
use crate::ops::view::TaskStats;
use crate::store::{HistoryRecord, Ledger};
use crate::util::time::format_duration;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    /// Tracked time including a live timer segment
    pub elapsed: u64,
    pub timing: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryJson<'a> {
    pub position: i64,
    pub can_undo: bool,
    pub can_redo: bool,
    pub entries: Vec<HistoryEntryJson<'a>>,
}

#[derive(Serialize)]
pub struct HistoryEntryJson<'a> {
    pub index: usize,
    pub applied: bool,
    pub description: String,
    pub record: &'a HistoryRecord,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeJson<'a> {
    pub action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<&'a HistoryRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerJson {
    pub task_id: Option<u64>,
    pub running: bool,
    pub elapsed: u64,
    pub display: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsJson {
    #[serde(flatten)]
    pub stats: TaskStats,
    pub productivity: u32,
    pub work_time: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJson<'a> {
    pub id: u64,
    pub name: &'a str,
    pub email: &'a str,
    pub role: &'a str,
}

pub fn user_to_json(user: &User) -> UserJson<'_> {
    UserJson {
        id: user.id,
        name: &user.name,
        email: &user.email,
        role: user.role.as_str(),
    }
}

pub fn history_to_json(ledger: &Ledger) -> HistoryJson<'_> {
    HistoryJson {
        position: ledger.position(),
        can_undo: ledger.can_undo(),
        can_redo: ledger.can_redo(),
        entries: ledger
            .records()
            .iter()
            .enumerate()
            .map(|(index, record)| HistoryEntryJson {
                index,
                applied: (index as i64) <= ledger.position(),
                description: record.describe(),
                record,
            })
            .collect(),
    }
}

pub fn timer_to_json(timer: &ActiveTimer, elapsed: u64) -> TimerJson {
    TimerJson {
        task_id: timer.task_id,
        running: timer.is_running(),
        elapsed,
        display: format_duration(elapsed),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn check_char(task: &Task) -> char {
    if task.completed { 'x' } else { ' ' }
}

/// One-line summary: `[ ]   3 High   Title (Category, due 2025-03-01) 00:10:00`
pub fn format_task_line(task: &Task, elapsed: u64) -> String {
    let mut details = Vec::new();
    if !task.category.is_empty() {
        details.push(task.category.clone());
    }
    if !task.due_date.is_empty() {
        details.push(format!("due {}", task.due_date));
    }
    let details = if details.is_empty() {
        String::new()
    } else {
        format!(" ({})", details.join(", "))
    };
    let time = if elapsed > 0 {
        format!(" {}", format_duration(elapsed))
    } else {
        String::new()
    };
    format!(
        "[{}] {:>3} {:<6} {}{}{}",
        check_char(task),
        task.id,
        task.priority.as_str(),
        task.title,
        details,
        time
    )
}

/// Detailed task view
pub fn format_task_detail(task: &Task, elapsed: u64) -> Vec<String> {
    let mut lines = vec![format!("[{}] {} {}", check_char(task), task.id, task.title)];
    lines.push(format!("priority: {}", task.priority));
    if !task.category.is_empty() {
        lines.push(format!("category: {}", task.category));
    }
    if !task.due_date.is_empty() {
        lines.push(format!("due: {}", task.due_date));
    }
    if task.assigned_to != 0 {
        lines.push(format!("assigned: {}", task.assigned_to));
    }
    if !task.created.is_empty() {
        lines.push(format!("created: {}", task.created));
    }
    if let Some(ref edited) = task.last_edited {
        lines.push(format!("edited: {}", edited));
    }
    lines.push(format!("time: {}", format_duration(elapsed)));
    if !task.description.is_empty() {
        lines.push("description:".to_string());
        for line in task.description.lines() {
            lines.push(format!("  {}", line));
        }
    }
    if let Some(ref notes) = task.notes {
        lines.push("notes:".to_string());
        for line in notes.lines() {
            lines.push(format!("  {}", line));
        }
    }
    if !task.subtasks.is_empty() {
        lines.push("subtasks:".to_string());
        for sub in &task.subtasks {
            lines.push(format!("  - {}", sub));
        }
    }
    lines
}

/// History, oldest first. `>` marks the cursor; undone entries are tagged.
pub fn format_history(ledger: &Ledger) -> Vec<String> {
    if ledger.is_empty() {
        return vec!["no history".to_string()];
    }
    ledger
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let pos = i as i64;
            let marker = if pos == ledger.position() { '>' } else { ' ' };
            let undone = if pos > ledger.position() {
                " (undone)"
            } else {
                ""
            };
            format!("{} {:>3} {}{}", marker, i + 1, record.describe(), undone)
        })
        .collect()
}

pub fn format_timer(timer: &ActiveTimer, elapsed: u64, title: Option<&str>) -> String {
    match timer.task_id {
        None => "no timer".to_string(),
        Some(id) => {
            let state = if timer.is_running() { "running" } else { "paused" };
            let title = title.map(|t| format!(" {}", t)).unwrap_or_default();
            format!("{} {}{} [{}]", format_duration(elapsed), id, title, state)
        }
    }
}

pub fn format_stats(stats: &TaskStats, productivity: u32, work_time: u64) -> Vec<String> {
    vec![
        format!("total:       {}", stats.total),
        format!("completed:   {}", stats.completed),
        format!("pending:     {}", stats.pending),
        format!("overdue:     {}", stats.overdue),
        format!("upcoming:    {}", stats.upcoming),
        format!("done:        {}%", stats.completion_percentage),
        format!("score:       {}%", productivity),
        format!(
            "avg time:    {}",
            format_duration(stats.average_completion_ms)
        ),
        format!("work time:   {}", format_duration(work_time)),
    ]
}

pub fn format_notification(n: &Notification) -> String {
    let mark = if n.read { ' ' } else { '*' };
    format!("{} {:>3} {}: {}", mark, n.id, n.title, n.message)
}

/// Describe an undo or redo for the terminal
pub fn format_change(action: &str, record: Option<&HistoryRecord>) -> String {
    match record {
        Some(r) => format!("{}: {}", action, r.describe()),
        None => format!("nothing to {}", action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;
    use insta::assert_snapshot;

    #[test]
    fn task_line_layout() {
        let mut task = Task::new("Write report")
            .with_priority(Priority::High)
            .with_category("Business")
            .with_due_date("2025-03-10");
        task.id = 7;
        assert_snapshot!(format_task_line(&task, 0), @"[ ]   7 High   Write report (Business, due 2025-03-10)");
        task.completed = true;
        assert_snapshot!(format_task_line(&task, 61_000), @"[x]   7 High   Write report (Business, due 2025-03-10) 00:01:01");
    }

    #[test]
    fn history_marks_cursor_and_undone() {
        let mut ledger = Ledger::new();
        let mut task = Task::new("A");
        task.id = 1;
        ledger.record(HistoryRecord::AddTask { task: task.clone() });
        ledger.record(HistoryRecord::ToggleCompletion {
            task_id: 1,
            previous_state: false,
        });
        let mut repo = crate::store::TaskRepository::from_tasks(vec![task]);
        ledger.undo(&mut repo);
        assert_eq!(
            format_history(&ledger),
            vec![
                ">   1 add task 1 \"A\"".to_string(),
                "    2 mark task 1 complete (undone)".to_string(),
            ]
        );
    }

    #[test]
    fn timer_line() {
        let timer = ActiveTimer {
            task_id: Some(3),
            start_time: None,
            elapsed: 0,
        };
        assert_eq!(
            format_timer(&timer, 3_600_000, Some("Deploy")),
            "01:00:00 3 Deploy [paused]"
        );
        assert_eq!(format_timer(&ActiveTimer::default(), 0, None), "no timer");
    }
}
