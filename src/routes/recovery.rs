use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::RequestUser;
use crate::authorization::{self, CREATE_RECOVERY_TOKEN, READ_RECOVERY_TOKEN, UPDATE_RECOVERY_TOKEN};
use crate::error::AppError;
use crate::recovery::{self, CreateRecoveryInput, RecoveryTokenOutput, ResetPasswordInput};
use crate::state::SharedState;
use crate::validation::{trimmed, validate_username, validate_uuid, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecoveryRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_username"))]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(
        email(message = "\"email\" must be a valid email address"),
        length(max = 254, message = "\"email\" must be at most 254 characters")
    )]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(
        required(message = "\"token_id\" is required"),
        custom(function = "validate_uuid")
    )]
    pub token_id: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "\"password\" is required"),
        length(min = 8, max = 72, message = "\"password\" must be 8 to 72 characters")
    )]
    pub password: Option<String>,
}

impl TryFrom<ResetPasswordRequest> for ResetPasswordInput {
    type Error = AppError;

    fn try_from(req: ResetPasswordRequest) -> Result<Self, Self::Error> {
        let token_id = req
            .token_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| AppError::BadRequest("\"token_id\" must be a UUID".to_string()))?;
        let password = req
            .password
            .ok_or_else(|| AppError::BadRequest("\"password\" is required".to_string()))?;

        Ok(ResetPasswordInput { token_id, password })
    }
}

pub async fn create(
    State(state): State<SharedState>,
    user: RequestUser,
    ValidatedJson(req): ValidatedJson<CreateRecoveryRequest>,
) -> Result<(StatusCode, Json<RecoveryTokenOutput>), AppError> {
    authorization::can_request(&user, CREATE_RECOVERY_TOKEN)?;

    let insecure = CreateRecoveryInput {
        username: req.username,
        email: req.email,
    };
    let secure = authorization::filter_create_recovery_input(&user, insecure);

    let token = recovery::create_and_send_recovery_email(&state, secure).await?;

    let output = authorization::filter_recovery_token_output(&user, READ_RECOVERY_TOKEN, &token)?;
    Ok((StatusCode::CREATED, Json(output)))
}

pub async fn update(
    State(state): State<SharedState>,
    user: RequestUser,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<RecoveryTokenOutput>, AppError> {
    authorization::can_request(&user, UPDATE_RECOVERY_TOKEN)?;

    let insecure = ResetPasswordInput::try_from(req)?;
    let secure = authorization::filter_update_recovery_input(&user, insecure);

    let token = recovery::reset_user_password(&state, secure).await?;

    let output = authorization::filter_recovery_token_output(&user, READ_RECOVERY_TOKEN, &token)?;
    Ok(Json(output))
}
