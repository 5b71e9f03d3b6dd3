pub mod health;
pub mod users;

pub use health::{health_handler, readiness_handler};
pub use users::{get_all_users, get_user_by_id};
