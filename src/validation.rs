//! Request body validation.
//!
//! [`ValidatedJson`] parses a JSON body and runs its `validator` rules, turning
//! every failure (bad JSON, missing content type, rule violations) into a
//! `400 Bad Request` with a readable message. Oversized bodies stay `413`.

use std::borrow::Cow;
use std::sync::LazyLock;

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{3,30}$").expect("valid username regex"));

pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
                _ => AppError::BadRequest(rejection.body_text()),
            })?;

        value
            .validate()
            .map_err(|errors| AppError::BadRequest(describe(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

/// Flatten field errors into one message, ordered by field name.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("\"{field}\" is invalid"),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME.is_match(username) {
        return Ok(());
    }
    Err(ValidationError::new("username").with_message(Cow::from(
        "\"username\" must be 3 to 30 letters or digits",
    )))
}

pub fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("uuid").with_message(Cow::from("\"token_id\" must be a UUID")))
}

/// Trim surrounding whitespace from an optional string; blank becomes `None`.
pub fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}
