//! HTTP Request Handlers
//!
//! Axum handlers for processing HTTP requests and responses.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;

use crate::{
    api::{
        extract::{ValidatedJson, ValidatedQuery},
        middleware::AuthUser,
    },
    models::{requests::*, HeartRateResponse, UserProfile},
    service::{HeartRateService, JwtService, UserService},
    utils::error::AppResult,
    VERSION,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub heart_rate_service: Arc<HeartRateService>,
    pub jwt_service: Arc<JwtService>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthCheckResponse>> {
    state.user_service.health_check().await?;

    Ok(Json(HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    }))
}

/// Create an account
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let response = state.user_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchange credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = state.user_service.login(request).await?;
    Ok(Json(response))
}

/// Get the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let profile = state.user_service.get_profile(user.user_id).await?;
    Ok(Json(profile))
}

/// Update the caller's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<UserProfile>> {
    let profile = state
        .user_service
        .update_profile(user.user_id, request)
        .await?;
    Ok(Json(profile))
}

/// Revoke the token used for this request
pub async fn logout(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<MessageResponse>> {
    let response = state.user_service.logout(&user).await?;
    Ok(Json(response))
}

/// Record a heart rate sample
pub async fn create_heart_rate(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ValidatedJson(request): ValidatedJson<CreateHeartRateRequest>,
) -> AppResult<(StatusCode, Json<HeartRateResponse>)> {
    let record = state
        .heart_rate_service
        .create(user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// List the caller's samples, newest first
pub async fn list_heart_rates(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ListHeartRateQuery>,
) -> AppResult<Json<Vec<HeartRateResponse>>> {
    let records = state.heart_rate_service.list(user.user_id, query).await?;
    Ok(Json(records))
}

/// Delete one sample
pub async fn delete_heart_rate(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(entry_id): Path<String>,
) -> AppResult<StatusCode> {
    state
        .heart_rate_service
        .delete(user.user_id, &entry_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete several samples at once
pub async fn batch_delete_heart_rates(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ValidatedJson(request): ValidatedJson<BatchDeleteRequest>,
) -> AppResult<Json<BatchDeleteResponse>> {
    let response = state
        .heart_rate_service
        .batch_delete(user.user_id, request)
        .await?;
    Ok(Json(response))
}
