//! Validating Extractors
//!
//! `Json` and `Query` wrappers that run `validator` rules after decoding and
//! report every failure as a 422 in the service's error shape.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use validator::Validate;

use crate::utils::error::{AppError, FieldError};

/// Message for a required field the payload left out
pub const FIELD_REQUIRED: &str = "Field required";

/// JSON body that has been decoded and validated
#[derive(Debug, Clone)]
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
            .map_err(json_rejection)?;

        value
            .validate()
            .map_err(|errors| AppError::from_validation(&errors, "body"))?;

        Ok(Self(value))
    }
}

/// Query string that has been decoded and validated
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;

        value
            .validate()
            .map_err(|errors| AppError::from_validation(&errors, "query"))?;

        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => decode_error("body", &err.body_text()),
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
        other => AppError::malformed("body", other.body_text()),
    }
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    match rejection {
        QueryRejection::FailedToDeserializeQueryString(err) => {
            decode_error("query", &err.body_text())
        }
        other => AppError::malformed("query", other.body_text()),
    }
}

/// Turn a serde decoding failure into a per-field error.
///
/// Rejection text reads `<summary>: [<path>: ]<serde message>[ at line L column C]`.
/// A missing field becomes `<location> -> <field>` / "Field required"; any
/// other error with a path is reported against that path.
fn decode_error(location: &str, text: &str) -> AppError {
    static MISSING_FIELD: OnceLock<Regex> = OnceLock::new();
    static FIELD_PATH: OnceLock<Regex> = OnceLock::new();
    static POSITION: OnceLock<Regex> = OnceLock::new();

    let missing_field = MISSING_FIELD.get_or_init(|| {
        Regex::new(r"^(?:([\w.\[\]]+): )?missing field `([^`]+)`")
            .expect("Failed to compile missing field regex")
    });
    let field_path = FIELD_PATH.get_or_init(|| {
        Regex::new(r"^([\w\[\]]+(?:\.[\w\[\]]+)*): (.+)$").expect("Failed to compile field path regex")
    });
    let position = POSITION.get_or_init(|| {
        Regex::new(r" at line \d+ column \d+$").expect("Failed to compile position regex")
    });

    let detail = text.split_once(": ").map_or(text, |(_, rest)| rest);
    let detail = position.replace(detail, "");

    if let Some(captures) = missing_field.captures(&detail) {
        let field = match captures.get(1) {
            Some(parent) => format!("{} -> {}", field_location(location, parent.as_str()), &captures[2]),
            None => format!("{} -> {}", location, &captures[2]),
        };
        return AppError::Validation(vec![FieldError::new(field, FIELD_REQUIRED)]);
    }

    if let Some(captures) = field_path.captures(&detail) {
        return AppError::Validation(vec![FieldError::new(
            field_location(location, &captures[1]),
            &captures[2],
        )]);
    }

    AppError::malformed(location, detail)
}

/// `ids[2]` under `body` becomes `body -> ids -> 2`
fn field_location(location: &str, path: &str) -> String {
    path.split('.')
        .flat_map(|segment| segment.split(['[', ']']))
        .filter(|segment| !segment.is_empty())
        .fold(location.to_string(), |acc, segment| format!("{} -> {}", acc, segment))
}
