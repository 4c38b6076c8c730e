//! Database record structures matching table schemas.

pub mod content_history;
pub mod profiles;
pub mod trial_usage;
pub mod users;
pub mod youtube;
