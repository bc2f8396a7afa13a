use serde::{Deserialize, Serialize};

use crate::model::config::{Config, default_categories};
use crate::model::state::{ActiveTimer, Notification, TaskFilters, TaskSort, ViewMode, WorkTimer};
use crate::model::user::{User, UserStatus};

use super::repository::TaskRepository;
use super::undo::Ledger;

/// Everything that is persisted under the storage key.
///
/// Missing fields load as their initial values; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub tasks: TaskRepository,
    pub categories: Vec<String>,
    pub users: Vec<User>,
    pub current_user: Option<User>,
    pub notifications: Vec<Notification>,
    pub status: UserStatus,
    pub filters: TaskFilters,
    pub sort: TaskSort,
    pub view: ViewMode,
    pub selected_tasks: Vec<u64>,
    pub active_timer: ActiveTimer,
    pub work_timer: WorkTimer,
    pub history: Ledger,
    pub dark_mode: bool,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            tasks: TaskRepository::new(),
            categories: default_categories(),
            users: Vec::new(),
            current_user: None,
            notifications: Vec::new(),
            status: UserStatus::Online,
            filters: TaskFilters::default(),
            sort: TaskSort::default(),
            view: ViewMode::List,
            selected_tasks: Vec::new(),
            active_timer: ActiveTimer::default(),
            work_timer: WorkTimer::default(),
            history: Ledger::new(),
            dark_mode: false,
        }
    }
}

impl AppState {
    /// Initial state seeded from config
    pub fn from_config(config: &Config) -> Self {
        AppState {
            categories: config.defaults.categories.clone(),
            ..Default::default()
        }
    }

    /// Repair invariants that hand-edited or stale storage may break
    pub fn normalize(&mut self) {
        self.history.normalize();
        if self.active_timer.task_id.is_none() {
            self.active_timer = ActiveTimer::default();
        }
    }
}
