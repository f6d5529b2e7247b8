use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    admin::dto::{
        AdjustPointsRequest, AdjustResponse, AdminUserItem, CreateMissionRequest,
        LedgerCheckResponse, Pagination, UpdateMissionRequest,
    },
    auth::jwt::AdminUser,
    missions::{
        engine::{self, LedgerError},
        repo::{Mission, MissionPatch, NewMission, PrismTransaction},
        rules::VerificationRule,
    },
    state::AppState,
    users::repo::User,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", delete(delete_user))
        .route("/admin/users/:id/adjust", post(adjust_points))
        .route("/admin/users/:id/ledger", get(check_ledger))
        .route("/admin/missions", post(create_mission))
        .route("/admin/missions/:id", patch(update_mission))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<AdminUserItem>>, (StatusCode, String)> {
    let users = User::list(&state.db, p.limit, p.offset)
        .await
        .map_err(internal)?;
    Ok(Json(users.into_iter().map(AdminUserItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = User::delete(&state.db, id).await.map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "User not found".into()));
    }
    info!(admin_id = %admin_id, user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn adjust_points(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustPointsRequest>,
) -> Result<Json<AdjustResponse>, (StatusCode, String)> {
    if payload.amount == 0 {
        return Err((StatusCode::BAD_REQUEST, "Amount must not be zero".into()));
    }
    let description = payload
        .description
        .as_deref()
        .unwrap_or("Admin adjustment")
        .trim();

    match engine::adjust_points(&state.db, id, payload.amount, description).await {
        Ok(new_balance) => {
            info!(admin_id = %admin_id, user_id = %id, amount = payload.amount, "balance adjusted by admin");
            Ok(Json(AdjustResponse { new_balance }))
        }
        Err(e @ LedgerError::InsufficientBalance { .. }) => {
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(LedgerError::UserNotFound) => Err((StatusCode::NOT_FOUND, "User not found".into())),
        Err(LedgerError::Db(e)) => {
            error!(error = %e, user_id = %id, "adjust failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Recomputes the ledger sum and compares it with the stored balance.
#[instrument(skip(state))]
pub async fn check_ledger(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LedgerCheckResponse>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let ledger_sum = PrismTransaction::ledger_sum(&state.db, id)
        .await
        .map_err(internal)?;

    Ok(Json(LedgerCheckResponse {
        user_id: user.id,
        balance: user.prism_balance,
        ledger_sum,
        consistent: user.prism_balance == ledger_sum,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_mission(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<CreateMissionRequest>,
) -> Result<(StatusCode, Json<Mission>), (StatusCode, String)> {
    if payload.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".into()));
    }
    if payload.reward < 0 {
        return Err((StatusCode::BAD_REQUEST, "Reward must be non-negative".into()));
    }
    validate_rules(payload.verification_rules.as_ref())?;

    let mission = match Mission::create(
        &state.db,
        NewMission {
            mission_type: payload.mission_type,
            title: payload.title.trim(),
            description: payload.description.trim(),
            reward: payload.reward,
            is_repeatable: payload.is_repeatable,
            is_active: payload.is_active,
            verification_rules: payload.verification_rules.as_ref(),
        },
    )
    .await
    {
        Ok(m) => m,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err((StatusCode::CONFLICT, "Mission type already exists".into()));
        }
        Err(e) => {
            error!(error = %e, "create mission failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    info!(admin_id = %admin_id, mission = %mission.mission_type, "mission created");
    Ok((StatusCode::CREATED, Json(mission)))
}

#[instrument(skip(state, payload))]
pub async fn update_mission(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMissionRequest>,
) -> Result<Json<Mission>, (StatusCode, String)> {
    if let Some(reward) = payload.reward {
        if reward < 0 {
            return Err((StatusCode::BAD_REQUEST, "Reward must be non-negative".into()));
        }
    }
    validate_rules(payload.verification_rules.as_ref())?;

    let mission = Mission::update(
        &state.db,
        id,
        MissionPatch {
            title: payload.title.as_deref(),
            description: payload.description.as_deref(),
            reward: payload.reward,
            is_repeatable: payload.is_repeatable,
            is_active: payload.is_active,
            verification_rules: payload.verification_rules.as_ref(),
        },
    )
    .await
    .map_err(internal)?
    .ok_or((StatusCode::NOT_FOUND, "Mission not found".to_string()))?;

    info!(admin_id = %admin_id, mission = %mission.mission_type, "mission updated");
    Ok(Json(mission))
}

/// The catalog only stores rules the evaluator understands.
fn validate_rules(rules: Option<&serde_json::Value>) -> Result<(), (StatusCode, String)> {
    if let Some(value) = rules {
        serde_json::from_value::<VerificationRule>(value.clone()).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Invalid verification rule: {}", e),
            )
        })?;
    }
    Ok(())
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "database error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
