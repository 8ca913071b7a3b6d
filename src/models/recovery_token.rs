use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A one-time password reset credential. The `id` is the secret sent by
/// email, so it never appears in API responses.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RecoveryToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub used: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
