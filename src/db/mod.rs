pub mod recovery_tokens;
pub mod sessions;
pub mod users;
