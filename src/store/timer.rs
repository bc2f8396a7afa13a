//! Task stopwatch and session work timer.
//!
//! Timer changes are saved but never recorded in history.

use crate::model::state::{ActiveTimer, millis_between};
use crate::model::user::UserStatus;

use super::Store;

impl Store {
    /// Start timing `id`. A timer running on another task is stopped first
    /// and its time folded into that task; restarting the current task
    /// folds the running segment before starting a new one.
    pub fn start_task_timer(&mut self, id: u64) -> bool {
        if !self.state.tasks.contains(id) {
            return false;
        }
        let now = self.now();
        match self.state.active_timer.task_id {
            Some(current) if current == id => {
                self.fold_running_segment();
                self.state.active_timer.start_time = Some(now);
            }
            Some(_) => {
                self.fold_and_reset_timer();
                self.state.active_timer = ActiveTimer {
                    task_id: Some(id),
                    start_time: Some(now),
                    elapsed: 0,
                };
            }
            None => {
                self.state.active_timer = ActiveTimer {
                    task_id: Some(id),
                    start_time: Some(now),
                    elapsed: 0,
                };
            }
        }
        tracing::debug!(id, "task timer started");
        self.persist();
        true
    }

    /// Freeze the running timer, adding the segment to the task's `timer`.
    /// The timer keeps its task so it can be resumed.
    pub fn pause_task_timer(&mut self) -> bool {
        if !self.state.active_timer.is_running() {
            return false;
        }
        self.fold_running_segment();
        self.state.active_timer.start_time = None;
        tracing::debug!(id = ?self.state.active_timer.task_id, "task timer paused");
        self.persist();
        true
    }

    /// Restart a paused timer
    pub fn resume_task_timer(&mut self) -> bool {
        let timer = &self.state.active_timer;
        if timer.task_id.is_none() || timer.start_time.is_some() {
            return false;
        }
        self.state.active_timer.start_time = Some(self.now());
        tracing::debug!(id = ?self.state.active_timer.task_id, "task timer resumed");
        self.persist();
        true
    }

    /// Fold everything into the task and return to the idle timer
    pub fn stop_task_timer(&mut self) -> bool {
        if self.state.active_timer.task_id.is_none() {
            return false;
        }
        self.fold_and_reset_timer();
        tracing::debug!("task timer stopped");
        self.persist();
        true
    }

    /// Stop the task timer if it belongs to one of `ids`, folding its time
    /// into the task while the task is still present.
    pub(super) fn release_timer_for(&mut self, ids: &[u64]) {
        if let Some(id) = self.state.active_timer.task_id
            && ids.contains(&id)
            && self.state.tasks.contains(id)
        {
            self.fold_and_reset_timer();
            tracing::debug!(id, "task timer released by delete");
        }
    }

    fn fold_running_segment(&mut self) {
        let segment = self.state.active_timer.running_segment(self.now());
        if let Some(id) = self.state.active_timer.task_id
            && let Some(task) = self.state.tasks.get_mut(id)
        {
            task.timer += segment;
        }
    }

    fn fold_and_reset_timer(&mut self) {
        let timer = std::mem::take(&mut self.state.active_timer);
        let total = timer.elapsed + timer.running_segment(self.now());
        if let Some(id) = timer.task_id
            && let Some(task) = self.state.tasks.get_mut(id)
        {
            task.timer += total;
        }
    }

    // -----------------------------------------------------------------------
    // Work timer
    // -----------------------------------------------------------------------

    pub fn start_work_timer(&mut self) {
        self.run_work_timer();
        self.persist();
    }

    pub fn pause_work_timer(&mut self) {
        if self.halt_work_timer() {
            self.persist();
        }
    }

    pub fn stop_work_timer(&mut self) {
        self.state.work_timer = Default::default();
        self.persist();
    }

    fn run_work_timer(&mut self) {
        let now = self.now();
        let timer = &mut self.state.work_timer;
        if let Some(start) = timer.start_time {
            timer.elapsed += millis_between(start, now);
        }
        timer.start_time = Some(now);
    }

    fn halt_work_timer(&mut self) -> bool {
        let now = self.now();
        let timer = &mut self.state.work_timer;
        let Some(start) = timer.start_time.take() else {
            return false;
        };
        timer.elapsed += millis_between(start, now);
        true
    }

    /// Session time including the running segment
    pub fn work_time(&self) -> u64 {
        self.state.work_timer.total(self.now())
    }

    /// Set presence; online starts the work timer, break and shadow pause
    /// it, offline resets it.
    pub fn set_status(&mut self, status: UserStatus) {
        self.state.status = status;
        tracing::debug!(status = status.as_str(), "status changed");
        match status {
            UserStatus::Online => self.run_work_timer(),
            UserStatus::Break | UserStatus::Shadow => {
                self.halt_work_timer();
            }
            UserStatus::Offline => self.state.work_timer = Default::default(),
        }
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use crate::model::state::ActiveTimer;
    use crate::model::task::Task;
    use crate::model::user::UserStatus;
    use crate::store::{AppState, ManualClock, Store};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn setup(count: usize) -> (Store, ManualClock) {
        let clock = ManualClock::at(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
        let mut store = Store::new(AppState::default(), clock.clone());
        for i in 1..=count {
            store.add_task(Task::new(format!("task {}", i)));
        }
        (store, clock)
    }

    #[test]
    fn pause_after_ten_seconds_freezes_elapsed() {
        let (mut store, clock) = setup(5);
        assert!(store.start_task_timer(5));
        clock.advance_ms(10_000);
        assert_eq!(store.elapsed_for(5), Some(10_000));

        assert!(store.pause_task_timer());
        let timer = &store.state().active_timer;
        assert_eq!(timer.task_id, Some(5));
        assert_eq!(timer.start_time, None);
        assert_eq!(store.task(5).unwrap().timer, 10_000);

        clock.advance_ms(5_000);
        assert_eq!(store.elapsed_for(5), Some(10_000));
    }

    #[test]
    fn resume_then_stop_accumulates() {
        let (mut store, clock) = setup(1);
        store.start_task_timer(1);
        clock.advance_ms(1_000);
        store.pause_task_timer();
        assert!(!store.pause_task_timer());

        assert!(store.resume_task_timer());
        assert!(!store.resume_task_timer());
        clock.advance_ms(2_500);
        assert!(store.stop_task_timer());

        assert_eq!(store.task(1).unwrap().timer, 3_500);
        assert_eq!(store.state().active_timer, ActiveTimer::default());
        assert!(!store.stop_task_timer());
    }

    #[test]
    fn starting_another_task_folds_previous() {
        let (mut store, clock) = setup(2);
        store.start_task_timer(1);
        clock.advance_ms(4_000);
        store.start_task_timer(2);
        clock.advance_ms(1_000);

        assert_eq!(store.task(1).unwrap().timer, 4_000);
        assert_eq!(store.elapsed_for(1), Some(4_000));
        assert_eq!(store.elapsed_for(2), Some(1_000));
        assert_eq!(store.state().active_timer.task_id, Some(2));
    }

    #[test]
    fn restarting_same_task_does_not_lose_time() {
        let (mut store, clock) = setup(1);
        store.start_task_timer(1);
        clock.advance_ms(2_000);
        store.start_task_timer(1);
        clock.advance_ms(3_000);
        assert_eq!(store.elapsed_for(1), Some(5_000));
    }

    #[test]
    fn legacy_elapsed_is_folded_on_stop() {
        let (mut store, clock) = setup(1);
        store.start_task_timer(1);
        store.pause_task_timer();
        let mut state = store.state().clone();
        state.active_timer.elapsed = 700;
        let mut store = Store::new(state, clock.clone());
        assert_eq!(store.elapsed_for(1), Some(700));
        store.stop_task_timer();
        assert_eq!(store.task(1).unwrap().timer, 700);
    }

    #[test]
    fn timer_needs_existing_task_and_skips_history() {
        let (mut store, _clock) = setup(1);
        let before = store.history().len();
        assert!(!store.start_task_timer(42));
        assert!(!store.resume_task_timer());
        store.start_task_timer(1);
        store.stop_task_timer();
        assert_eq!(store.history().len(), before);
    }

    #[test]
    fn status_drives_work_timer() {
        let (mut store, clock) = setup(0);
        store.set_status(UserStatus::Online);
        clock.advance_ms(60_000);
        store.set_status(UserStatus::Break);
        clock.advance_ms(30_000);
        assert_eq!(store.work_time(), 60_000);

        store.set_status(UserStatus::Online);
        clock.advance_ms(15_000);
        assert_eq!(store.work_time(), 75_000);
        store.set_status(UserStatus::Online);
        assert_eq!(store.state().work_timer.elapsed, 75_000);

        store.set_status(UserStatus::Offline);
        assert_eq!(store.work_time(), 0);
        assert_eq!(store.state().status, UserStatus::Offline);
    }

    #[test]
    fn deleting_timed_task_keeps_its_time() {
        let (mut store, clock) = setup(2);
        store.start_task_timer(2);
        clock.advance_ms(7_000);

        assert!(store.delete_task(2));
        assert_eq!(store.state().active_timer, ActiveTimer::default());
        assert!(!store.stop_task_timer());

        store.undo();
        assert_eq!(store.task(2).unwrap().timer, 7_000);
        assert_eq!(store.elapsed_for(2), Some(7_000));
    }

    #[test]
    fn bulk_delete_releases_paused_timer() {
        let (mut store, clock) = setup(3);
        store.start_task_timer(3);
        clock.advance_ms(2_000);
        store.pause_task_timer();

        assert_eq!(store.delete_multiple_tasks(&[1, 3]), 2);
        assert_eq!(store.state().active_timer.task_id, None);

        store.undo();
        assert_eq!(store.task(3).unwrap().timer, 2_000);
    }

    #[test]
    fn deleting_other_task_leaves_timer_running() {
        let (mut store, clock) = setup(2);
        store.start_task_timer(1);
        store.delete_task(2);
        clock.advance_ms(500);
        assert_eq!(store.state().active_timer.task_id, Some(1));
        assert_eq!(store.elapsed_for(1), Some(500));
    }
}
