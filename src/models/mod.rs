pub mod recovery_token;
pub mod session;
pub mod user;

pub use recovery_token::RecoveryToken;
pub use session::Session;
pub use user::User;
