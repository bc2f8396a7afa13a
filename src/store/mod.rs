pub mod clock;
pub mod repository;
pub mod state;
pub mod timer;
pub mod undo;

pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::TaskRepository;
pub use state::AppState;
pub use undo::{HistoryRecord, Ledger};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::io::persist::PersistenceAdapter;
use crate::model::state::{
    DateRange, FilterKey, Notification, SortBy, SortDirection, TaskFilters, TaskSort, ViewMode,
};
use crate::model::task::{Task, TaskPatch};
use crate::model::user::User;
use crate::ops::view::{self, TaskStats};
use crate::util::time::format_timestamp;

type Listener = Box<dyn FnMut(&Notification)>;

/// The single owner of application state and the only way to mutate tasks.
///
/// Every task mutation captures its inverse, applies the change, appends a
/// history record and then saves through the attached persistence adapter.
/// Each method runs to completion under `&mut self`, so no reader can see a
/// half-applied change.
pub struct Store {
    state: AppState,
    clock: Box<dyn Clock>,
    persistence: Option<PersistenceAdapter>,
    last_save_ok: bool,
    listeners: Vec<Listener>,
}

impl Store {
    /// A store over `state` with no persistence attached
    pub fn new(state: AppState, clock: impl Clock + 'static) -> Self {
        Store {
            state,
            clock: Box::new(clock),
            persistence: None,
            last_save_ok: true,
            listeners: Vec::new(),
        }
    }

    /// Fresh default state on the system clock
    pub fn in_memory() -> Self {
        Self::new(AppState::default(), SystemClock::new())
    }

    /// Restore from `persistence`, falling back to `fallback` when nothing
    /// usable is stored. Every later mutation is saved through it.
    pub fn open(
        persistence: PersistenceAdapter,
        clock: impl Clock + 'static,
        fallback: AppState,
    ) -> Self {
        let state = persistence.load().unwrap_or(fallback);
        Store {
            state,
            clock: Box::new(clock),
            persistence: Some(persistence),
            last_save_ok: true,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn tasks(&self) -> &TaskRepository {
        &self.state.tasks
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.state.tasks.get(id)
    }

    pub fn history(&self) -> &Ledger {
        &self.state.history
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Register a callback for every new notification
    pub fn subscribe(&mut self, listener: impl FnMut(&Notification) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Save through the adapter, if any. Failures are logged by the adapter
    /// and remembered in `last_save_ok`; the in-memory state stays current.
    pub fn persist(&mut self) {
        if let Some(persistence) = self.persistence.as_mut() {
            self.last_save_ok = persistence.save(&self.state);
        }
    }

    /// False when the most recent save failed, meaning the stored copy is
    /// behind the in-memory state. Always true without persistence.
    pub fn last_save_ok(&self) -> bool {
        self.last_save_ok
    }

    // -----------------------------------------------------------------------
    // Task mutations (recorded in history)
    // -----------------------------------------------------------------------

    /// Append a task. An id of 0 is replaced with the next free id; an empty
    /// `created` is stamped with the current time. Returns the task's id.
    pub fn add_task(&mut self, task: Task) -> u64 {
        let id = self.insert_task(task);
        self.persist();
        id
    }

    /// Add every task in order, saving once. Returns the assigned ids.
    pub fn import_tasks(&mut self, tasks: Vec<Task>) -> Vec<u64> {
        let ids: Vec<u64> = tasks.into_iter().map(|t| self.insert_task(t)).collect();
        tracing::debug!(count = ids.len(), "tasks imported");
        self.persist();
        ids
    }

    fn insert_task(&mut self, mut task: Task) -> u64 {
        if task.created.is_empty() {
            task.created = format_timestamp(self.now());
        }
        let title = task.title.clone();
        let id = self.state.tasks.insert(task);
        if let Some(stored) = self.state.tasks.as_slice().last() {
            self.state.history.record(HistoryRecord::AddTask {
                task: stored.clone(),
            });
        }
        tracing::debug!(id, "task added");
        self.add_notification("Task Added", format!("\"{}\" has been added", title));
        id
    }

    /// Remove a task. Returns false (and records nothing) if it is absent.
    /// A timer on the task is stopped first, so its time travels with the
    /// deleted snapshot.
    pub fn delete_task(&mut self, id: u64) -> bool {
        self.release_timer_for(&[id]);
        let Some((index, task)) = self.state.tasks.remove_by_id(id) else {
            return false;
        };
        let title = task.title.clone();
        self.state.history.record(HistoryRecord::DeleteTask {
            task,
            index: Some(index),
        });
        tracing::debug!(id, index, "task deleted");
        self.add_notification("Task Deleted", format!("\"{}\" has been deleted", title));
        self.persist();
        true
    }

    /// Remove every listed task that exists and clear the selection.
    /// Returns how many were removed.
    pub fn delete_multiple_tasks(&mut self, ids: &[u64]) -> usize {
        self.release_timer_for(ids);
        let removed = self.state.tasks.remove_by_ids(ids);
        self.state.selected_tasks.clear();
        let count = removed.len();
        if count > 0 {
            let (indices, tasks): (Vec<usize>, Vec<Task>) = removed.into_iter().unzip();
            self.state
                .history
                .record(HistoryRecord::DeleteMultipleTasks { tasks, indices });
            tracing::debug!(count, "tasks deleted");
        }
        self.persist();
        count
    }

    /// Merge `patch` into a task and stamp `last_edited`
    pub fn edit_task(&mut self, id: u64, patch: &TaskPatch) -> bool {
        let stamp = format_timestamp(self.now());
        let Some(task) = self.state.tasks.get_mut(id) else {
            return false;
        };
        let previous_state = task.clone();
        patch.apply(task);
        task.last_edited = Some(stamp);
        let title = task.title.clone();
        self.state.history.record(HistoryRecord::EditTask {
            task_id: id,
            previous_state,
        });
        tracing::debug!(id, "task edited");
        self.add_notification("Task Updated", format!("\"{}\" has been updated", title));
        self.persist();
        true
    }

    /// Flip a task's completion flag
    pub fn toggle_task_completion(&mut self, id: u64) -> bool {
        let Some(task) = self.state.tasks.get_mut(id) else {
            return false;
        };
        let previous_state = task.completed;
        task.completed = !previous_state;
        self.state.history.record(HistoryRecord::ToggleCompletion {
            task_id: id,
            previous_state,
        });
        tracing::debug!(id, completed = !previous_state, "task toggled");
        self.persist();
        true
    }

    /// Mark every listed task completed (one direction only) and clear the
    /// selection. Returns how many tasks were found.
    pub fn toggle_multiple_tasks_completion(&mut self, ids: &[u64]) -> usize {
        let mut previous_state = IndexMap::new();
        for &id in ids {
            if let Some(task) = self.state.tasks.get_mut(id) {
                previous_state.entry(id).or_insert(task.completed);
                task.completed = true;
            }
        }
        self.state.selected_tasks.clear();
        let count = previous_state.len();
        if count > 0 {
            self.state.history.record(HistoryRecord::BulkToggleCompletion {
                task_ids: ids.to_vec(),
                previous_state,
            });
            tracing::debug!(count, "tasks completed");
        }
        self.persist();
        count
    }

    /// Swap the positions of two tasks. No-op unless both exist and differ.
    pub fn reorder_tasks(&mut self, source_id: u64, target_id: u64) -> bool {
        if source_id == target_id
            || !self.state.tasks.contains(source_id)
            || !self.state.tasks.contains(target_id)
        {
            return false;
        }
        let previous_tasks = self.state.tasks.as_slice().to_vec();
        self.state.tasks.swap(source_id, target_id);
        self.state
            .history
            .record(HistoryRecord::ReorderTasks { previous_tasks });
        tracing::debug!(source_id, target_id, "tasks reordered");
        self.persist();
        true
    }

    /// Step back one record. Returns the record undone.
    pub fn undo(&mut self) -> Option<HistoryRecord> {
        let record = self.state.history.undo(&mut self.state.tasks).cloned();
        if record.is_some() {
            self.persist();
        }
        record
    }

    /// Step forward one record. Returns the record redone.
    pub fn redo(&mut self) -> Option<HistoryRecord> {
        let record = self.state.history.redo(&mut self.state.tasks).cloned();
        if record.is_some() {
            self.persist();
        }
        record
    }

    // -----------------------------------------------------------------------
    // Selection, filters, sort, view
    // -----------------------------------------------------------------------

    /// Add `id` to the selection, or remove it if already selected.
    /// Returns whether it is selected afterwards.
    pub fn toggle_task_selection(&mut self, id: u64) -> bool {
        let selection = &mut self.state.selected_tasks;
        let selected = match selection.iter().position(|&s| s == id) {
            Some(pos) => {
                selection.remove(pos);
                false
            }
            None => {
                selection.push(id);
                true
            }
        };
        self.persist();
        selected
    }

    pub fn clear_task_selection(&mut self) {
        self.state.selected_tasks.clear();
        self.persist();
    }

    pub fn set_filters(&mut self, filters: TaskFilters) {
        self.state.filters = filters;
        self.persist();
    }

    pub fn set_filter(&mut self, key: FilterKey, value: impl Into<String>) {
        self.state.filters.set(key, value.into());
        self.persist();
    }

    pub fn set_date_range(&mut self, start: Option<String>, end: Option<String>) {
        self.state.filters.date_range = DateRange { start, end };
        self.persist();
    }

    pub fn clear_filters(&mut self) {
        self.state.filters = TaskFilters::default();
        self.persist();
    }

    /// Change the sort; `None` keeps the current value of that half
    pub fn set_sort(&mut self, by: Option<SortBy>, direction: Option<SortDirection>) {
        let current = self.state.sort;
        self.state.sort = TaskSort {
            by: by.unwrap_or(current.by),
            direction: direction.unwrap_or(current.direction),
        };
        self.persist();
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.state.view = view;
        self.persist();
    }

    /// Returns the new setting
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.state.dark_mode = !self.state.dark_mode;
        self.persist();
        self.state.dark_mode
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    /// Returns false for blank or already present names
    pub fn add_category(&mut self, category: impl Into<String>) -> bool {
        let category = category.into().trim().to_string();
        if category.is_empty() || self.state.categories.contains(&category) {
            return false;
        }
        self.state.categories.push(category);
        self.persist();
        true
    }

    /// Tasks keep their category string when it is removed from the list
    pub fn remove_category(&mut self, category: &str) -> bool {
        let before = self.state.categories.len();
        self.state.categories.retain(|c| c != category);
        let removed = self.state.categories.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.state.categories = categories;
        self.persist();
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    /// Push an unread notification to the front and tell subscribers.
    /// Does not save; callers persist as part of their own operation.
    pub fn add_notification(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        let id = self
            .state
            .notifications
            .iter()
            .map(|n| n.id)
            .max()
            .map_or(1, |max| max + 1);
        let notification = Notification {
            id,
            title: title.into(),
            message: message.into(),
            read: false,
        };
        for listener in self.listeners.iter_mut() {
            listener(&notification);
        }
        self.state.notifications.insert(0, notification);
        id
    }

    pub fn mark_notification_as_read(&mut self, id: u64) -> bool {
        let Some(n) = self.state.notifications.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        n.read = true;
        self.persist();
        true
    }

    pub fn mark_all_notifications_as_read(&mut self) {
        for n in self.state.notifications.iter_mut() {
            n.read = true;
        }
        self.persist();
    }

    pub fn unread_notifications(&self) -> usize {
        self.state.notifications.iter().filter(|n| !n.read).count()
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn set_current_user(&mut self, user: Option<User>) {
        self.state.current_user = user;
        self.persist();
    }

    /// Replace the user with the same id, or append a new one
    pub fn update_user(&mut self, user: User) {
        match self.state.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => self.state.users.push(user),
        }
        self.persist();
    }

    // -----------------------------------------------------------------------
    // Derived reads
    // -----------------------------------------------------------------------

    /// Tasks after the stored filters and sort
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let filtered = view::filtered_tasks(self.state.tasks.as_slice(), &self.state.filters);
        view::sorted_tasks(filtered, &self.state.sort)
    }

    pub fn selected_tasks(&self) -> Vec<&Task> {
        view::selected_tasks(self.state.tasks.as_slice(), &self.state.selected_tasks)
    }

    /// Tracked time for a task including any live segment
    pub fn elapsed_for(&self, id: u64) -> Option<u64> {
        let task = self.state.tasks.get(id)?;
        Some(view::elapsed_for_task(
            task,
            &self.state.active_timer,
            self.now(),
        ))
    }

    pub fn productivity(&self) -> u32 {
        view::productivity_score(self.state.tasks.as_slice())
    }

    pub fn stats(&self) -> TaskStats {
        view::task_stats(self.state.tasks.as_slice(), self.now())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("tasks", &self.state.tasks.len())
            .field("history", &self.state.history.position())
            .field("persistence", &self.persistence)
            .field("last_save_ok", &self.last_save_ok)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::{FileStore, MemoryStore};
    use crate::model::task::Priority;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn clock() -> ManualClock {
        ManualClock::at(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap())
    }

    fn store() -> Store {
        let mut state = AppState::default();
        state.categories = vec!["Work".into()];
        Store::new(state, clock())
    }

    fn store_with(titles: &[&str]) -> Store {
        let mut s = store();
        for title in titles {
            s.add_task(Task::new(*title));
        }
        s
    }

    fn titles(s: &Store) -> Vec<String> {
        s.tasks().iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn add_delete_undo_scenario() {
        let mut s = store();
        let a = s.add_task(Task::new("A").with_priority(Priority::High));
        let b = s.add_task(Task::new("B"));
        assert_eq!((a, b), (1, 2));

        assert!(s.delete_task(1));
        assert_eq!(titles(&s), vec!["B"]);

        let undone = s.undo().unwrap();
        assert_eq!(undone.kind(), "deleteTask");
        assert_eq!(titles(&s), vec!["A", "B"]);
        assert_eq!(s.task(1).unwrap().priority, Priority::High);

        s.undo();
        assert_eq!(titles(&s), vec!["A"]);
        s.undo();
        assert!(s.tasks().is_empty());
        assert_eq!(s.history().position(), -1);
    }

    #[test]
    fn add_task_stamps_created_and_keeps_explicit_id() {
        let mut s = store();
        let mut t = Task::new("Imported");
        t.id = 40;
        t.created = "2024-12-01T00:00:00.000Z".into();
        assert_eq!(s.add_task(t), 40);
        assert_eq!(s.task(40).unwrap().created, "2024-12-01T00:00:00.000Z");

        let id = s.add_task(Task::new("Fresh"));
        assert_eq!(id, 41);
        assert_eq!(s.task(41).unwrap().created, "2025-03-01T09:00:00.000Z");
    }

    #[test]
    fn toggle_undo_redo_scenario() {
        let mut s = store_with(&["A", "B"]);
        assert!(s.toggle_task_completion(2));
        assert!(s.task(2).unwrap().completed);
        s.undo();
        assert!(!s.task(2).unwrap().completed);
        s.redo();
        assert!(s.task(2).unwrap().completed);
    }

    #[test]
    fn reorder_undo_then_redo_is_noop() {
        let mut s = store_with(&["one", "two", "three"]);
        assert!(s.reorder_tasks(1, 3));
        assert_eq!(titles(&s), vec!["three", "two", "one"]);

        s.undo();
        assert_eq!(titles(&s), vec!["one", "two", "three"]);

        let redone = s.redo().unwrap();
        assert_eq!(redone.kind(), "reorderTasks");
        assert_eq!(titles(&s), vec!["one", "two", "three"]);
        assert!(!s.history().can_redo());
    }

    #[test]
    fn reorder_requires_two_distinct_existing_tasks() {
        let mut s = store_with(&["one", "two"]);
        let before = s.history().len();
        assert!(!s.reorder_tasks(1, 1));
        assert!(!s.reorder_tasks(1, 9));
        assert_eq!(s.history().len(), before);
    }

    #[test]
    fn absent_ids_record_nothing() {
        let mut s = store_with(&["A"]);
        let history = s.history().clone();
        assert!(!s.delete_task(9));
        assert!(!s.edit_task(9, &TaskPatch::default()));
        assert!(!s.toggle_task_completion(9));
        assert_eq!(s.delete_multiple_tasks(&[9]), 0);
        assert_eq!(s.toggle_multiple_tasks_completion(&[9]), 0);
        assert_eq!(s.history(), &history);
    }

    #[test]
    fn boundary_undo_and_redo_are_noops() {
        let mut s = store_with(&["A"]);
        assert!(s.redo().is_none());
        s.undo();
        let snapshot = s.state().clone();
        assert!(s.undo().is_none());
        assert_eq!(s.state(), &snapshot);
    }

    #[test]
    fn new_mutation_discards_redo_buffer() {
        let mut s = store_with(&["A", "B", "C"]);
        s.undo();
        s.undo();
        assert_eq!(s.history().len(), 3);
        s.add_task(Task::new("D"));
        assert_eq!(s.history().len(), 2);
        assert!(s.redo().is_none());
        assert_eq!(titles(&s), vec!["A", "D"]);
    }

    #[test]
    fn edit_stamps_and_undo_restores_snapshot() {
        let mut s = store_with(&["Draft"]);
        let patch = TaskPatch {
            title: Some("Final".into()),
            priority: Some(Priority::Low),
            ..Default::default()
        };
        assert!(s.edit_task(1, &patch));
        let edited = s.task(1).unwrap();
        assert_eq!(edited.title, "Final");
        assert_eq!(
            edited.last_edited.as_deref(),
            Some("2025-03-01T09:00:00.000Z")
        );

        s.undo();
        let restored = s.task(1).unwrap();
        assert_eq!(restored.title, "Draft");
        assert_eq!(restored.last_edited, None);
    }

    #[test]
    fn edit_redo_promotes_live_value_to_end() {
        let mut s = store_with(&["first", "second"]);
        s.edit_task(1, &TaskPatch {
            title: Some("first, edited".into()),
            ..Default::default()
        });
        s.undo();
        s.redo();
        // The pre-edit value is re-read and moved to the end
        assert_eq!(titles(&s), vec!["second", "first"]);
    }

    #[test]
    fn bulk_complete_and_undo() {
        let mut s = store_with(&["A", "B", "C"]);
        s.toggle_task_completion(2);
        s.toggle_task_selection(1);
        s.toggle_task_selection(3);

        assert_eq!(s.toggle_multiple_tasks_completion(&[1, 2, 3]), 3);
        assert!(s.tasks().iter().all(|t| t.completed));
        assert!(s.state().selected_tasks.is_empty());

        s.undo();
        let flags: Vec<bool> = s.tasks().iter().map(|t| t.completed).collect();
        assert_eq!(flags, vec![false, true, false]);

        s.redo();
        assert!(s.tasks().iter().all(|t| t.completed));
    }

    #[test]
    fn delete_multiple_restores_original_positions() {
        let mut s = store_with(&["a", "b", "c", "d"]);
        s.toggle_task_selection(2);
        assert_eq!(s.delete_multiple_tasks(&[4, 2]), 2);
        assert_eq!(titles(&s), vec!["a", "c"]);
        assert!(s.state().selected_tasks.is_empty());

        s.undo();
        assert_eq!(titles(&s), vec!["a", "b", "c", "d"]);
        s.redo();
        assert_eq!(titles(&s), vec!["a", "c"]);
    }

    #[test]
    fn notifications_for_add_edit_delete_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut s = store();
        s.subscribe(move |n| sink.borrow_mut().push(n.title.clone()));

        s.add_task(Task::new("Report"));
        s.toggle_task_completion(1);
        s.edit_task(1, &TaskPatch::default());
        s.reorder_tasks(1, 1);
        s.delete_task(1);

        assert_eq!(
            *seen.borrow(),
            vec!["Task Added", "Task Updated", "Task Deleted"]
        );
        let newest = &s.state().notifications[0];
        assert_eq!(newest.id, 3);
        assert_eq!(newest.message, "\"Report\" has been deleted");
        assert_eq!(s.unread_notifications(), 3);

        assert!(s.mark_notification_as_read(2));
        assert!(!s.mark_notification_as_read(99));
        assert_eq!(s.unread_notifications(), 2);
        s.mark_all_notifications_as_read();
        assert_eq!(s.unread_notifications(), 0);
    }

    #[test]
    fn selection_toggles() {
        let mut s = store_with(&["a", "b"]);
        assert!(s.toggle_task_selection(2));
        assert!(s.toggle_task_selection(1));
        assert!(!s.toggle_task_selection(2));
        let selected: Vec<u64> = s.selected_tasks().iter().map(|t| t.id).collect();
        assert_eq!(selected, vec![1]);
        s.clear_task_selection();
        assert!(s.selected_tasks().is_empty());
    }

    #[test]
    fn visible_tasks_follow_stored_filters_and_sort() {
        let mut s = store();
        s.add_task(Task::new("beta").with_priority(Priority::Low));
        s.add_task(Task::new("alpha").with_priority(Priority::High));
        s.add_task(Task::new("gamma").with_category("Work"));
        s.toggle_task_completion(2);

        s.set_sort(Some(SortBy::Title), None);
        let order: Vec<&str> = s.visible_tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(order, vec!["beta", "gamma", "alpha"]);

        s.set_sort(None, Some(SortDirection::Desc));
        assert_eq!(s.state().sort.by, SortBy::Title);

        s.set_filter(FilterKey::Category, "Work");
        let order: Vec<&str> = s.visible_tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(order, vec!["gamma"]);

        s.clear_filters();
        assert!(s.state().filters.is_cleared());
        assert_eq!(s.visible_tasks().len(), 3);
    }

    #[test]
    fn categories_skip_duplicates() {
        let mut s = store();
        assert!(s.add_category("Design"));
        assert!(!s.add_category("Design"));
        assert!(!s.add_category("  "));
        assert!(s.remove_category("Work"));
        assert!(!s.remove_category("Work"));
        assert_eq!(s.state().categories, vec!["Design"]);
    }

    #[test]
    fn update_user_upserts() {
        let mut s = store();
        let mut user = User {
            id: 1,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "pw".into(),
            phone: String::new(),
            country: String::new(),
            role: Default::default(),
            avatar: String::new(),
            bio: None,
        };
        s.update_user(user.clone());
        user.name = "Ada L.".into();
        s.update_user(user);
        assert_eq!(s.state().users.len(), 1);
        assert_eq!(s.state().users[0].name, "Ada L.");
    }

    #[test]
    fn mutations_are_saved_and_reloaded() {
        let backing = MemoryStore::new();
        let adapter = PersistenceAdapter::new(backing.clone(), "todo-app-storage");
        let mut s = Store::open(adapter, clock(), AppState::default());
        s.add_task(Task::new("persist me"));
        s.toggle_dark_mode();

        let reopened = Store::open(
            PersistenceAdapter::new(backing, "todo-app-storage"),
            clock(),
            AppState::default(),
        );
        assert_eq!(reopened.task(1).unwrap().title, "persist me");
        assert!(reopened.state().dark_mode);
        assert_eq!(reopened.history().position(), 0);
    }

    #[test]
    fn failed_save_is_remembered() {
        let dir = tempfile::TempDir::new().unwrap();
        let adapter = PersistenceAdapter::new(FileStore::new(dir.path()), "bad/key");
        let mut s = Store::open(adapter, clock(), AppState::default());
        assert!(s.last_save_ok());

        s.add_task(Task::new("lost"));
        assert!(!s.last_save_ok());
        assert_eq!(titles(&s), vec!["lost"]);

        assert!(store().last_save_ok());
    }

    #[test]
    fn open_falls_back_when_nothing_stored() {
        let mut fallback = AppState::default();
        fallback.categories = vec!["Only".into()];
        let s = Store::open(
            PersistenceAdapter::new(MemoryStore::new(), "k"),
            clock(),
            fallback,
        );
        assert_eq!(s.state().categories, vec!["Only"]);
    }

    #[test]
    fn import_assigns_fresh_ids() {
        let mut s = store_with(&["existing"]);
        let ids = s.import_tasks(vec![Task::new("x"), Task::new("y")]);
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(s.history().len(), 3);
    }
}
