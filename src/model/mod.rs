pub mod task;
pub mod state;
pub mod user;
pub mod config;

pub use task::*;
pub use state::*;
pub use user::*;
pub use config::*;
