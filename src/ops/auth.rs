use crate::model::user::{Role, User, UserStatus};
use crate::store::Store;

/// Avatar given to newly registered accounts
pub const DEFAULT_AVATAR: &str = "https://i.imgur.com/8Km9tLL.jpg";

/// Error type for the mock account operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email already in use: {0}")]
    EmailInUse(String),
}

/// Log in with a stored account. The session starts offline.
pub fn login(store: &mut Store, email: &str, password: &str) -> Result<User, AuthError> {
    let user = store
        .state()
        .users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .cloned()
        .ok_or(AuthError::InvalidCredentials)?;
    tracing::debug!(id = user.id, "logged in");
    store.set_current_user(Some(user.clone()));
    store.set_status(UserStatus::Offline);
    Ok(user)
}

/// Create an account and log it in. The id and avatar of `user` are
/// replaced.
pub fn register(store: &mut Store, mut user: User) -> Result<User, AuthError> {
    if store.state().users.iter().any(|u| u.email == user.email) {
        return Err(AuthError::EmailInUse(user.email));
    }
    user.id = store
        .state()
        .users
        .iter()
        .map(|u| u.id)
        .max()
        .map_or(1, |max| max + 1);
    user.avatar = DEFAULT_AVATAR.to_string();
    tracing::debug!(id = user.id, "registered");
    store.update_user(user.clone());
    store.set_current_user(Some(user.clone()));
    store.set_status(UserStatus::Offline);
    Ok(user)
}

pub fn logout(store: &mut Store) {
    store.set_current_user(None);
}

/// Save `user` and refresh the session copy when it is the current user
pub fn update_profile(store: &mut Store, user: User) {
    let is_current = store
        .state()
        .current_user
        .as_ref()
        .is_some_and(|c| c.id == user.id);
    store.update_user(user.clone());
    if is_current {
        store.set_current_user(Some(user));
    }
}

/// True when `user` holds `required` or a higher role
pub fn has_permission(user: Option<&User>, required: Role) -> bool {
    user.is_some_and(|u| u.role >= required)
}
