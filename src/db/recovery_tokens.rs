use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::RecoveryToken;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<RecoveryToken, sqlx::Error> {
    sqlx::query_as::<_, RecoveryToken>(
        "INSERT INTO recovery_tokens (user_id, expires_at) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(expires_at)
    .fetch_one(executor)
    .await
}

/// Mark an unused, unexpired token as used and return it. `None` when the
/// token does not exist, was already used, or has expired. The single
/// conditional UPDATE keeps concurrent redemptions of one token exclusive.
pub async fn claim_valid<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<RecoveryToken>, sqlx::Error> {
    sqlx::query_as::<_, RecoveryToken>(
        "UPDATE recovery_tokens SET used = true, updated_at = now()
         WHERE id = $1 AND used = false AND expires_at > now()
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}
