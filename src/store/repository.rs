use serde::{Deserialize, Serialize};

use crate::model::task::Task;

/// The canonical ordered task sequence.
///
/// Primitive structural operations only; nothing here records history.
/// Every operation on an absent id is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskRepository {
    tasks: Vec<Task>,
}

impl TaskRepository {
    pub fn new() -> Self {
        TaskRepository { tasks: Vec::new() }
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        TaskRepository { tasks }
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.position(id).is_some()
    }

    /// `max(existing ids) + 1`, or 1 for an empty repository. Saturates at
    /// `u64::MAX` rather than wrapping.
    pub fn next_id(&self) -> u64 {
        self.tasks
            .iter()
            .map(|t| t.id)
            .max()
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// Append a task, assigning a fresh id when `task.id == 0`.
    /// Explicit ids are kept as-is, duplicates included. Returns the id.
    pub fn insert(&mut self, mut task: Task) -> u64 {
        if task.id == 0 {
            task.id = self.next_id();
        }
        let id = task.id;
        self.tasks.push(task);
        id
    }

    /// Insert at `index` (clamped to the end) without touching the id
    pub fn insert_at(&mut self, index: usize, task: Task) {
        let idx = index.min(self.tasks.len());
        self.tasks.insert(idx, task);
    }

    /// Remove the first task with this id, returning it and its old index
    pub fn remove_by_id(&mut self, id: u64) -> Option<(usize, Task)> {
        let idx = self.position(id)?;
        Some((idx, self.tasks.remove(idx)))
    }

    /// Remove every task whose id is listed. Returns `(old_index, task)`
    /// pairs in ascending index order.
    pub fn remove_by_ids(&mut self, ids: &[u64]) -> Vec<(usize, Task)> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.tasks.len());
        for (idx, task) in std::mem::take(&mut self.tasks).into_iter().enumerate() {
            if ids.contains(&task.id) {
                removed.push((idx, task));
            } else {
                kept.push(task);
            }
        }
        self.tasks = kept;
        removed
    }

    /// Replace the task with this id in place. Returns the old value.
    pub fn replace(&mut self, id: u64, task: Task) -> Option<Task> {
        let slot = self.get_mut(id)?;
        Some(std::mem::replace(slot, task))
    }

    /// Exchange the positions of two tasks. Returns false (and does
    /// nothing) when either id is missing.
    pub fn swap(&mut self, a: u64, b: u64) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(ia), Some(ib)) => {
                self.tasks.swap(ia, ib);
                true
            }
            _ => false,
        }
    }

    /// Replace the whole sequence
    pub fn set_order(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    pub fn ids(&self) -> Vec<u64> {
        self.tasks.iter().map(|t| t.id).collect()
    }
}
