//! Recovery token lifecycle: issue a token and mail it, then redeem it to set
//! a new password.

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::models::{RecoveryToken, User};
use crate::state::AppState;

/// Identity to recover. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateRecoveryInput {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResetPasswordInput {
    pub token_id: Uuid,
    pub password: String,
}

/// What a client may see of a recovery token.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecoveryTokenOutput {
    pub used: bool,
    pub expires_at: chrono::DateTime<Utc>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<&RecoveryToken> for RecoveryTokenOutput {
    fn from(token: &RecoveryToken) -> Self {
        Self {
            used: token.used,
            expires_at: token.expires_at,
            created_at: token.created_at,
            updated_at: token.updated_at,
        }
    }
}

enum Identity {
    Username(String),
    Email(String),
}

impl Identity {
    fn from_input(input: CreateRecoveryInput) -> Result<Self, AppError> {
        match (input.username, input.email) {
            (Some(username), _) => Ok(Identity::Username(username)),
            (None, Some(email)) => Ok(Identity::Email(email.trim().to_lowercase())),
            (None, None) => Err(AppError::BadRequest(
                "Provide a \"username\" or an \"email\" to recover the account".to_string(),
            )),
        }
    }

    fn limiter_key(&self) -> String {
        match self {
            Identity::Username(username) => format!("username:{username}"),
            Identity::Email(email) => format!("email:{email}"),
        }
    }
}

/// Issue a recovery token for the identified user and mail the recovery link.
///
/// An unknown email still yields a token-shaped value (never stored, never
/// mailed) so the response does not disclose which addresses are registered.
pub async fn create_and_send_recovery_email(
    state: &AppState,
    input: CreateRecoveryInput,
) -> Result<RecoveryToken, AppError> {
    let identity = Identity::from_input(input)?;
    let ttl = Duration::minutes(state.config.recovery.token_ttl_minutes);

    state
        .recovery_limiter
        .check(&identity.limiter_key())
        .map_err(|retry_after| {
            AppError::RateLimited(format!(
                "Too many recovery requests. Try again in {retry_after} seconds."
            ))
        })?;

    let user = match identity {
        Identity::Username(username) => db::users::find_by_username(&state.pool, &username)
            .await?
            .ok_or_else(|| AppError::NotFound("No account uses this username".to_string()))?,
        Identity::Email(email) => match db::users::find_by_email(&state.pool, &email).await? {
            Some(user) => user,
            None => {
                tracing::info!("Recovery requested for an unregistered email");
                return Ok(unsaved_token(ttl));
            }
        },
    };

    let token = db::recovery_tokens::create(&state.pool, user.id, Utc::now() + ttl).await?;
    send_recovery_email(state, &user, &token).await?;

    tracing::info!(user_id = %user.id, expires_at = %token.expires_at, "Recovery token issued");
    Ok(token)
}

/// Redeem a recovery token: set the new password, burn the token and end
/// every session of the user, all in one transaction.
pub async fn reset_user_password(
    state: &AppState,
    input: ResetPasswordInput,
) -> Result<RecoveryToken, AppError> {
    // Hash before the transaction; claiming below locks the token row
    let pw_hash = password::hash(&input.password).map_err(AppError::Internal)?;

    let mut tx = state.pool.begin().await?;

    let token = db::recovery_tokens::claim_valid(&mut *tx, input.token_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Recovery token not found or expired".to_string())
        })?;

    db::users::update_password(&mut *tx, token.user_id, &pw_hash).await?;
    let sessions_expired = db::sessions::expire_all_for_user(&mut *tx, token.user_id).await?;

    tx.commit().await?;

    tracing::info!(
        user_id = %token.user_id,
        sessions_expired,
        "Password reset with recovery token"
    );
    Ok(token)
}

pub fn recovery_url(base_url: &str, token_id: Uuid) -> String {
    format!("{base_url}/recover/{token_id}")
}

async fn send_recovery_email(
    state: &AppState,
    user: &User,
    token: &RecoveryToken,
) -> Result<(), AppError> {
    let url = recovery_url(&state.config.base_url, token.id);

    match &state.system_mailer {
        Some(mailer) => mailer
            .send_recovery(
                &user.email,
                &user.username,
                &url,
                state.config.recovery.token_ttl_minutes,
            )
            .await
            .map_err(AppError::Internal),
        None => {
            tracing::warn!(user_id = %user.id, "System SMTP not configured. Recovery link: {url}");
            Ok(())
        }
    }
}

fn unsaved_token(ttl: Duration) -> RecoveryToken {
    let now = Utc::now();
    RecoveryToken {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        used: false,
        expires_at: now + ttl,
        created_at: now,
        updated_at: now,
    }
}
