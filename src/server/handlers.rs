//! HTTP handlers over the access layer
//!
//! Thin adapters: parse the request, call the resolver or authorizer, and
//! serialize the tagged result. None of these surface store failures.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::auth::{AccessStats, AuthorizationResult};
use crate::error::AppError;
use crate::models::{Origin, Role, UserProfile};

#[derive(Debug, Deserialize)]
pub struct ProfilesQuery {
    /// Comma-separated user ids
    #[serde(default)]
    pub ids: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub profile: UserProfile,
    pub origin: Origin,
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesResponse {
    pub profiles: HashMap<String, ProfileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    pub user_id: String,
    pub role: Role,
    pub origin: Origin,
    pub cached: bool,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub owner: String,
}

/// GET /api/profiles?ids=a,b
pub async fn get_profiles(
    State(state): State<AppState>,
    Query(query): Query<ProfilesQuery>,
) -> Json<ProfilesResponse> {
    let ids = query.ids.split(',').map(str::trim);
    let resolved = state.components.profiles.resolve_profiles(ids).await;

    let profiles = resolved
        .into_iter()
        .map(|(id, resolved)| {
            let entry = ProfileEntry {
                origin: resolved.origin,
                cached: resolved.cached,
                profile: resolved.value,
            };
            (id, entry)
        })
        .collect();

    Json(ProfilesResponse { profiles })
}

/// GET /api/roles/{user_id}
pub async fn get_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<RoleResponse> {
    let resolved = state.components.roles().resolve_role(&user_id).await;

    Json(RoleResponse {
        user_id,
        role: resolved.value,
        origin: resolved.origin,
        cached: resolved.cached,
    })
}

/// GET /api/authorize?requester=&owner=
pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Json<AuthorizationResult>, AppError> {
    if query.requester.trim().is_empty() {
        return Err(AppError::InvalidInput("requester is required".to_string()));
    }

    let result = state
        .components
        .authorizer
        .check_authorization(&query.requester, &query.owner)
        .await;

    Ok(Json(result))
}

/// DELETE /api/cache/users/{user_id}
pub async fn invalidate_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> StatusCode {
    state.components.invalidate_user(&user_id).await;
    StatusCode::NO_CONTENT
}

/// GET /api/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<AccessStats> {
    Json(state.components.stats().await)
}
