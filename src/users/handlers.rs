use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{error, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    missions::{engine, rules::MissionEvent},
    state::AppState,
    users::{
        dto::{ProfileResponse, UpdateProfileRequest},
        repo::{ProfileUpdate, User},
    },
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(ProfileResponse::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    if payload.nickname.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Nickname is required".into()));
    }
    if payload.preferred_sport.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Preferred sport is required".into()));
    }

    let user = User::update_profile(
        &state.db,
        user_id,
        ProfileUpdate {
            nickname: payload.nickname.trim(),
            preferred_sport: payload.preferred_sport.trim(),
            phone: payload.phone.as_deref(),
            city: payload.city.as_deref(),
            district: payload.district.as_deref(),
        },
    )
    .await
    .map_err(internal)?
    .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    if let Err(e) = engine::process_event(&state.db, user_id, MissionEvent::ProfileUpdate).await {
        warn!(error = %e, user_id = %user_id, "mission event after profile update failed");
    }

    Ok(Json(ProfileResponse::from(user)))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "users handler error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
