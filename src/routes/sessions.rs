use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{encode_token, Claims};
use crate::auth::{password, RequestUser, SESSION_COOKIE};
use crate::authorization::{self, CREATE_SESSION};
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;
use crate::validation::{trimmed, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(
        required(message = "\"email\" is required"),
        email(message = "\"email\" must be a valid email address")
    )]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(required(message = "\"password\" is required"))]
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn session_cookie(token: &str, ttl: Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

pub async fn create(
    State(state): State<SharedState>,
    user: RequestUser,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>), AppError> {
    authorization::can_request(&user, CREATE_SESSION)?;

    let (Some(email), Some(pw)) = (req.email, req.password) else {
        return Err(AppError::BadRequest("\"email\" and \"password\" are required".to_string()));
    };

    if state.login_limiter.check(&email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let found = db::users::find_by_email(&state.pool, &email).await?;
    let valid = match &found {
        Some(u) => password::verify(&pw, &u.password_hash).map_err(AppError::Internal)?,
        None => false,
    };

    let Some(found) = found.filter(|_| valid) else {
        state.login_limiter.record_failure(&email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let ttl = Duration::hours(state.config.session_ttl_hours);
    let session = db::sessions::create(&state.pool, found.id, Utc::now() + ttl).await?;

    let claims = Claims::new(found.id, session.id, session.expires_at);
    let token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    tracing::info!(user_id = %found.id, session_id = %session.id, "Session created");

    let jar = CookieJar::new().add(session_cookie(&token, ttl));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(SessionResponse {
            token,
            expires_at: session.expires_at,
        }),
    ))
}
