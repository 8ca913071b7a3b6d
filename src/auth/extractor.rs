use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::jwt;
use crate::authorization::ANONYMOUS_FEATURES;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "session_token";

/// The requester: either anonymous or a user with a live session.
#[derive(Debug, Clone)]
pub enum RequestUser {
    Anonymous,
    User(User),
}

impl RequestUser {
    pub fn has_feature(&self, feature: &str) -> bool {
        match self {
            RequestUser::Anonymous => ANONYMOUS_FEATURES.contains(&feature),
            RequestUser::User(user) => user.features.iter().any(|f| f == feature),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            RequestUser::Anonymous => None,
            RequestUser::User(user) => Some(user.id),
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(header) = parts.headers.get("authorization") else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    Ok(value.strip_prefix("Bearer ").map(|t| t.trim().to_string()))
}

impl FromRequestParts<SharedState> for RequestUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        // Bearer header wins over the cookie
        let token = match bearer_token(parts)? {
            Some(token) => Some(token),
            None => CookieJar::from_headers(&parts.headers)
                .get(SESSION_COOKIE)
                .map(|c| c.value().to_string()),
        };

        let Some(token) = token else {
            return Ok(RequestUser::Anonymous);
        };

        let claims = jwt::decode_token(&token, &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        let session = db::sessions::find_valid(&state.pool, claims.sid, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        let user = db::users::find_by_id(&state.pool, session.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        tracing::debug!(user_id = %user.id, session_id = %session.id, "Request authenticated");

        Ok(RequestUser::User(user))
    }
}
