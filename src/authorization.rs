//! Feature based permissions and the input/output filters applied around the
//! recovery model.

use crate::auth::RequestUser;
use crate::error::AppError;
use crate::models::RecoveryToken;
use crate::recovery::{CreateRecoveryInput, RecoveryTokenOutput, ResetPasswordInput};

pub const CREATE_SESSION: &str = "create:session";
pub const READ_SESSION: &str = "read:session";
pub const CREATE_RECOVERY_TOKEN: &str = "create:recovery_token";
pub const CREATE_RECOVERY_TOKEN_BY_USERNAME: &str = "create:recovery_token:username";
pub const READ_RECOVERY_TOKEN: &str = "read:recovery_token";
pub const UPDATE_RECOVERY_TOKEN: &str = "update:recovery_token";

/// Features held by every request that carries no credentials.
pub const ANONYMOUS_FEATURES: &[&str] = &[
    CREATE_SESSION,
    CREATE_RECOVERY_TOKEN,
    READ_RECOVERY_TOKEN,
    UPDATE_RECOVERY_TOKEN,
];

/// Features granted to a newly created user.
pub fn default_user_features() -> Vec<String> {
    [
        CREATE_SESSION,
        READ_SESSION,
        CREATE_RECOVERY_TOKEN,
        READ_RECOVERY_TOKEN,
        UPDATE_RECOVERY_TOKEN,
    ]
    .iter()
    .map(|f| f.to_string())
    .collect()
}

pub fn can_request(user: &RequestUser, feature: &str) -> Result<(), AppError> {
    if user.has_feature(feature) {
        return Ok(());
    }

    tracing::info!(user_id = ?user.user_id(), feature, "Request denied");
    Err(AppError::Forbidden(format!(
        "You are not allowed to perform \"{feature}\""
    )))
}

/// Recovering by username is a privileged operation; everybody else may only
/// name an email address.
pub fn filter_create_recovery_input(
    user: &RequestUser,
    input: CreateRecoveryInput,
) -> CreateRecoveryInput {
    let username = input
        .username
        .filter(|_| user.has_feature(CREATE_RECOVERY_TOKEN_BY_USERNAME));

    CreateRecoveryInput {
        username,
        email: input.email,
    }
}

pub fn filter_update_recovery_input(
    _user: &RequestUser,
    input: ResetPasswordInput,
) -> ResetPasswordInput {
    ResetPasswordInput {
        token_id: input.token_id,
        password: input.password,
    }
}

pub fn filter_recovery_token_output(
    user: &RequestUser,
    feature: &str,
    token: &RecoveryToken,
) -> Result<RecoveryTokenOutput, AppError> {
    can_request(user, feature)?;
    Ok(RecoveryTokenOutput::from(token))
}
