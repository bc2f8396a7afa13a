use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::task::Task;

use super::repository::TaskRepository;

/// A single undoable mutation, holding whatever is needed to invert it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HistoryRecord {
    /// A task was appended (the record holds it with its assigned id)
    AddTask { task: Task },
    /// A task was removed from `index`
    DeleteTask {
        task: Task,
        #[serde(default)]
        index: Option<usize>,
    },
    /// Several tasks were removed; `indices[i]` is where `tasks[i]` was
    DeleteMultipleTasks {
        tasks: Vec<Task>,
        #[serde(default)]
        indices: Vec<usize>,
    },
    /// A task was edited; `previous_state` is the full pre-edit snapshot
    EditTask { task_id: u64, previous_state: Task },
    /// A task's completion flag was flipped
    #[serde(rename = "toggleCompletion")]
    ToggleCompletion { task_id: u64, previous_state: bool },
    /// Several tasks were forced to completed
    #[serde(rename = "bulkToggleCompletion")]
    BulkToggleCompletion {
        task_ids: Vec<u64>,
        previous_state: IndexMap<u64, bool>,
    },
    /// Two tasks were swapped; `previous_tasks` is the whole prior sequence
    ReorderTasks { previous_tasks: Vec<Task> },
}

impl HistoryRecord {
    /// The persisted `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryRecord::AddTask { .. } => "addTask",
            HistoryRecord::DeleteTask { .. } => "deleteTask",
            HistoryRecord::DeleteMultipleTasks { .. } => "deleteMultipleTasks",
            HistoryRecord::EditTask { .. } => "editTask",
            HistoryRecord::ToggleCompletion { .. } => "toggleCompletion",
            HistoryRecord::BulkToggleCompletion { .. } => "bulkToggleCompletion",
            HistoryRecord::ReorderTasks { .. } => "reorderTasks",
        }
    }

    /// Short human-readable summary
    pub fn describe(&self) -> String {
        match self {
            HistoryRecord::AddTask { task } => format!("add task {} \"{}\"", task.id, task.title),
            HistoryRecord::DeleteTask { task, .. } => {
                format!("delete task {} \"{}\"", task.id, task.title)
            }
            HistoryRecord::DeleteMultipleTasks { tasks, .. } => {
                format!("delete {} tasks", tasks.len())
            }
            HistoryRecord::EditTask {
                task_id,
                previous_state,
            } => format!("edit task {} \"{}\"", task_id, previous_state.title),
            HistoryRecord::ToggleCompletion {
                task_id,
                previous_state,
            } => {
                let to = if *previous_state { "incomplete" } else { "complete" };
                format!("mark task {} {}", task_id, to)
            }
            HistoryRecord::BulkToggleCompletion { task_ids, .. } => {
                format!("complete {} tasks", task_ids.len())
            }
            HistoryRecord::ReorderTasks { .. } => "reorder tasks".to_string(),
        }
    }
}

/// Linear undo/redo history.
///
/// `actions[..=position]` have been applied to the repository; anything
/// after `position` is the redo buffer. `position == -1` means there is
/// nothing to undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    actions: Vec<HistoryRecord>,
    #[serde(default = "empty_position")]
    position: i64,
}

fn empty_position() -> i64 {
    -1
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            actions: Vec::new(),
            position: -1,
        }
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.actions
    }

    pub fn can_undo(&self) -> bool {
        self.position >= 0
    }

    pub fn can_redo(&self) -> bool {
        self.position + 1 < self.actions.len() as i64
    }

    /// The record the next `undo` would replay
    pub fn peek_undo(&self) -> Option<&HistoryRecord> {
        usize::try_from(self.position)
            .ok()
            .and_then(|i| self.actions.get(i))
    }

    /// The record the next `redo` would replay
    pub fn peek_redo(&self) -> Option<&HistoryRecord> {
        usize::try_from(self.position + 1)
            .ok()
            .and_then(|i| self.actions.get(i))
    }

    /// Append a record after the cursor, discarding the redo buffer
    pub fn record(&mut self, record: HistoryRecord) {
        let keep = usize::try_from(self.position + 1).unwrap_or(0);
        self.actions.truncate(keep);
        self.actions.push(record);
        self.position = self.actions.len() as i64 - 1;
    }

    /// Pull an out-of-range cursor (e.g. from hand-edited storage) back into
    /// `[-1, len - 1]`
    pub fn normalize(&mut self) {
        let max = self.actions.len() as i64 - 1;
        self.position = self.position.clamp(-1, max);
    }

    /// Undo the record at the cursor. Returns it, or `None` when there is
    /// nothing to undo.
    pub fn undo(&mut self, repo: &mut TaskRepository) -> Option<&HistoryRecord> {
        let idx = usize::try_from(self.position).ok()?;
        let record = self.actions.get(idx)?;
        apply_inverse(record, repo);
        self.position -= 1;
        tracing::trace!(kind = record.kind(), position = self.position, "undo");
        Some(record)
    }

    /// Redo the record after the cursor. Returns it, or `None` when there
    /// is nothing to redo.
    pub fn redo(&mut self, repo: &mut TaskRepository) -> Option<&HistoryRecord> {
        let idx = usize::try_from(self.position + 1).ok()?;
        let record = self.actions.get(idx)?;
        apply_forward(record, repo);
        self.position += 1;
        tracing::trace!(kind = record.kind(), position = self.position, "redo");
        Some(record)
    }
}

/// Apply the inverse of a record (for undo)
fn apply_inverse(record: &HistoryRecord, repo: &mut TaskRepository) {
    match record {
        HistoryRecord::AddTask { task } => {
            repo.remove_by_id(task.id);
        }
        HistoryRecord::DeleteTask { task, index } => {
            let idx = index.unwrap_or(repo.len());
            repo.insert_at(idx, task.clone());
        }
        HistoryRecord::DeleteMultipleTasks { tasks, indices } => {
            // Indices ascend, so inserting in order rebuilds the original layout
            for (i, task) in tasks.iter().enumerate() {
                let idx = indices.get(i).copied().unwrap_or(usize::MAX);
                repo.insert_at(idx, task.clone());
            }
        }
        HistoryRecord::EditTask {
            task_id,
            previous_state,
        } => {
            repo.replace(*task_id, previous_state.clone());
        }
        HistoryRecord::ToggleCompletion {
            task_id,
            previous_state,
        } => {
            if let Some(task) = repo.get_mut(*task_id) {
                task.completed = *previous_state;
            }
        }
        HistoryRecord::BulkToggleCompletion {
            task_ids,
            previous_state,
        } => {
            for id in task_ids {
                if let Some(prev) = previous_state.get(id)
                    && let Some(task) = repo.get_mut(*id)
                {
                    task.completed = *prev;
                }
            }
        }
        HistoryRecord::ReorderTasks { previous_tasks } => {
            repo.set_order(previous_tasks.clone());
        }
    }
}

/// Re-apply a record (for redo)
fn apply_forward(record: &HistoryRecord, repo: &mut TaskRepository) {
    match record {
        HistoryRecord::AddTask { task } => {
            repo.insert(task.clone());
        }
        HistoryRecord::DeleteTask { task, .. } => {
            repo.remove_by_id(task.id);
        }
        HistoryRecord::DeleteMultipleTasks { tasks, .. } => {
            let ids: Vec<u64> = tasks.iter().map(|t| t.id).collect();
            repo.remove_by_ids(&ids);
        }
        HistoryRecord::EditTask { task_id, .. } => {
            // No forward delta is stored: the live value is re-read and
            // moved to the end of the sequence. After an undo this is the
            // pre-edit snapshot, so the edit itself is not restored.
            if let Some((_, current)) = repo.remove_by_id(*task_id) {
                repo.insert(current);
            }
        }
        HistoryRecord::ToggleCompletion {
            task_id,
            previous_state,
        } => {
            if let Some(task) = repo.get_mut(*task_id) {
                task.completed = !*previous_state;
            }
        }
        HistoryRecord::BulkToggleCompletion { task_ids, .. } => {
            for id in task_ids {
                if let Some(task) = repo.get_mut(*id) {
                    task.completed = true;
                }
            }
        }
        // The new order is not stored, so reorders cannot be redone
        HistoryRecord::ReorderTasks { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn task(id: u64, title: &str) -> Task {
        let mut t = Task::new(title);
        t.id = id;
        t
    }

    fn sample_repo() -> TaskRepository {
        TaskRepository::from_tasks(vec![task(1, "First"), task(2, "Second"), task(3, "Third")])
    }

    fn titles(repo: &TaskRepository) -> Vec<&str> {
        repo.iter().map(|t| t.title.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // Ledger core
    // -----------------------------------------------------------------------

    #[test]
    fn new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.position(), -1);
        assert!(!ledger.can_undo());
        assert!(!ledger.can_redo());
        assert!(ledger.peek_undo().is_none());
        assert!(ledger.peek_redo().is_none());
    }

    #[test]
    fn record_advances_cursor() {
        let mut ledger = Ledger::new();
        ledger.record(HistoryRecord::AddTask { task: task(1, "A") });
        ledger.record(HistoryRecord::AddTask { task: task(2, "B") });
        assert_eq!(ledger.position(), 1);
        assert!(ledger.can_undo());
        assert!(!ledger.can_redo());
    }

    #[test]
    fn record_after_undo_discards_redo_buffer() {
        let mut ledger = Ledger::new();
        let mut repo = TaskRepository::new();
        for (id, title) in [(1, "A"), (2, "B"), (3, "C")] {
            repo.insert(task(id, title));
            ledger.record(HistoryRecord::AddTask {
                task: task(id, title),
            });
        }
        ledger.undo(&mut repo);
        ledger.undo(&mut repo);
        assert!(ledger.can_redo());

        repo.insert(task(2, "D"));
        ledger.record(HistoryRecord::AddTask { task: task(2, "D") });
        assert_eq!(ledger.len(), 2);
        assert!(!ledger.can_redo());
        assert!(ledger.redo(&mut repo).is_none());
        assert_eq!(titles(&repo), vec!["A", "D"]);
    }

    #[test]
    fn undo_on_empty_ledger_returns_none() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        assert!(ledger.undo(&mut repo).is_none());
        assert_eq!(ledger.position(), -1);
        assert_eq!(repo, sample_repo());
    }

    #[test]
    fn redo_at_end_returns_none() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        ledger.record(HistoryRecord::ToggleCompletion {
            task_id: 1,
            previous_state: false,
        });
        assert!(ledger.redo(&mut repo).is_none());
        assert_eq!(ledger.position(), 0);
    }

    #[test]
    fn normalize_clamps_cursor() {
        let mut ledger: Ledger = serde_json::from_str(r#"{"actions":[],"position":7}"#).unwrap();
        ledger.normalize();
        assert_eq!(ledger.position(), -1);
    }

    #[test]
    fn missing_position_defaults_to_empty_cursor() {
        let ledger: Ledger = serde_json::from_str(r#"{"actions":[]}"#).unwrap();
        assert_eq!(ledger.position(), -1);
    }

    // -----------------------------------------------------------------------
    // Per-record replay
    // -----------------------------------------------------------------------

    #[test]
    fn add_task_undo_removes_and_redo_appends() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        repo.insert(task(4, "Fourth"));
        ledger.record(HistoryRecord::AddTask {
            task: task(4, "Fourth"),
        });

        ledger.undo(&mut repo);
        assert_eq!(repo.ids(), vec![1, 2, 3]);
        ledger.redo(&mut repo);
        assert_eq!(repo.ids(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn delete_task_undo_restores_position() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        let (index, removed) = repo.remove_by_id(2).unwrap();
        ledger.record(HistoryRecord::DeleteTask {
            task: removed,
            index: Some(index),
        });

        ledger.undo(&mut repo);
        assert_eq!(titles(&repo), vec!["First", "Second", "Third"]);
        ledger.redo(&mut repo);
        assert_eq!(titles(&repo), vec!["First", "Third"]);
    }

    #[test]
    fn delete_task_without_index_appends_on_undo() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        let (_, removed) = repo.remove_by_id(1).unwrap();
        ledger.record(HistoryRecord::DeleteTask {
            task: removed,
            index: None,
        });
        ledger.undo(&mut repo);
        assert_eq!(repo.ids(), vec![2, 3, 1]);
    }

    #[test]
    fn delete_multiple_undo_restores_layout() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        repo.insert(task(4, "Fourth"));
        let removed = repo.remove_by_ids(&[1, 3]);
        let (indices, tasks): (Vec<usize>, Vec<Task>) = removed.into_iter().unzip();
        ledger.record(HistoryRecord::DeleteMultipleTasks { tasks, indices });
        assert_eq!(repo.ids(), vec![2, 4]);

        ledger.undo(&mut repo);
        assert_eq!(repo.ids(), vec![1, 2, 3, 4]);
        ledger.redo(&mut repo);
        assert_eq!(repo.ids(), vec![2, 4]);
    }

    #[test]
    fn edit_task_undo_restores_snapshot() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        let previous = repo.get(2).unwrap().clone();
        repo.get_mut(2).unwrap().title = "Renamed".into();
        ledger.record(HistoryRecord::EditTask {
            task_id: 2,
            previous_state: previous,
        });

        ledger.undo(&mut repo);
        assert_eq!(repo.get(2).unwrap().title, "Second");
        assert_eq!(repo.position(2), Some(1));
    }

    #[test]
    fn edit_task_redo_promotes_live_value() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        let previous = repo.get(1).unwrap().clone();
        repo.get_mut(1).unwrap().title = "Renamed".into();
        ledger.record(HistoryRecord::EditTask {
            task_id: 1,
            previous_state: previous,
        });

        ledger.undo(&mut repo);
        ledger.redo(&mut repo);
        // The edit is not re-applied; the live task moves to the end
        assert_eq!(titles(&repo), vec!["Second", "Third", "First"]);
        assert_eq!(ledger.position(), 0);
    }

    #[test]
    fn toggle_completion_undo_redo() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        repo.get_mut(2).unwrap().completed = true;
        ledger.record(HistoryRecord::ToggleCompletion {
            task_id: 2,
            previous_state: false,
        });

        ledger.undo(&mut repo);
        assert!(!repo.get(2).unwrap().completed);
        ledger.redo(&mut repo);
        assert!(repo.get(2).unwrap().completed);
    }

    #[test]
    fn bulk_toggle_undo_restores_each_and_redo_forces_true() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        repo.get_mut(3).unwrap().completed = true;
        let mut previous = IndexMap::new();
        previous.insert(1, false);
        previous.insert(3, true);
        for id in [1, 3] {
            repo.get_mut(id).unwrap().completed = true;
        }
        ledger.record(HistoryRecord::BulkToggleCompletion {
            task_ids: vec![1, 3],
            previous_state: previous,
        });

        ledger.undo(&mut repo);
        assert!(!repo.get(1).unwrap().completed);
        assert!(repo.get(3).unwrap().completed);
        ledger.redo(&mut repo);
        assert!(repo.get(1).unwrap().completed);
        assert!(repo.get(3).unwrap().completed);
    }

    #[test]
    fn reorder_undo_restores_and_redo_is_noop() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        let previous: Vec<Task> = repo.iter().cloned().collect();
        repo.swap(1, 3);
        ledger.record(HistoryRecord::ReorderTasks {
            previous_tasks: previous,
        });

        ledger.undo(&mut repo);
        assert_eq!(repo.ids(), vec![1, 2, 3]);
        let replayed = ledger.redo(&mut repo).map(|r| r.kind());
        assert_eq!(replayed, Some("reorderTasks"));
        assert_eq!(repo.ids(), vec![1, 2, 3]);
        assert_eq!(ledger.position(), 0);
    }

    #[test]
    fn undo_for_missing_task_is_silent() {
        let mut ledger = Ledger::new();
        let mut repo = sample_repo();
        ledger.record(HistoryRecord::ToggleCompletion {
            task_id: 99,
            previous_state: true,
        });
        assert!(ledger.undo(&mut repo).is_some());
        assert_eq!(repo, sample_repo());
        assert_eq!(ledger.position(), -1);
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    #[test]
    fn records_use_dashboard_type_tags() {
        let record = HistoryRecord::ToggleCompletion {
            task_id: 5,
            previous_state: false,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "toggleCompletion");
        assert_eq!(json["taskId"], 5);
        assert_eq!(json["previousState"], false);
    }

    #[test]
    fn bulk_record_reads_string_keyed_map() {
        let json = r#"{"type":"bulkToggleCompletion","taskIds":[2,1],"previousState":{"2":true,"1":false}}"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        match record {
            HistoryRecord::BulkToggleCompletion {
                task_ids,
                previous_state,
            } => {
                assert_eq!(task_ids, vec![2, 1]);
                assert_eq!(previous_state.get(&2), Some(&true));
                assert_eq!(previous_state.keys().copied().collect::<Vec<_>>(), vec![2, 1]);
            }
            other => panic!("expected BulkToggleCompletion, got {:?}", other),
        }
    }

    #[test]
    fn legacy_delete_record_without_index_loads() {
        let json = r#"{"type":"deleteTask","task":{"id":3,"title":"Old"}}"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record,
            HistoryRecord::DeleteTask {
                task: task(3, "Old"),
                index: None,
            }
        );
    }
}
