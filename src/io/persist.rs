use crate::store::AppState;

use super::storage::{KeyValueStore, StorageError};

/// Saves and restores the whole `AppState` under one storage key.
///
/// Neither direction fails to the caller: a failed save leaves in-memory
/// state authoritative, and missing or corrupt data loads as `None`.
pub struct PersistenceAdapter {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl PersistenceAdapter {
    pub fn new(store: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        PersistenceAdapter {
            store: Box::new(store),
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serialize and write the state. Returns whether the write succeeded;
    /// failures are logged, never propagated.
    pub fn save(&mut self, state: &AppState) -> bool {
        match self.try_save(state) {
            Ok(()) => {
                tracing::debug!(key = %self.key, tasks = state.tasks.len(), "state saved");
                true
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "could not save state");
                false
            }
        }
    }

    fn try_save(&mut self, state: &AppState) -> Result<(), StorageError> {
        let content = serde_json::to_string(state)?;
        self.store.set(&self.key, &content)
    }

    /// Read the stored state. `None` when absent, unreadable or corrupt.
    pub fn load(&self) -> Option<AppState> {
        let content = match self.store.get(&self.key) {
            Ok(Some(content)) => content,
            Ok(None) => {
                tracing::debug!(key = %self.key, "no stored state");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "could not read stored state");
                return None;
            }
        };
        match serde_json::from_str::<AppState>(&content) {
            Ok(mut state) => {
                state.normalize();
                tracing::debug!(key = %self.key, tasks = state.tasks.len(), "state loaded");
                Some(state)
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "stored state is corrupt, ignoring");
                None
            }
        }
    }

    /// Delete the stored state
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove(&self.key)
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
