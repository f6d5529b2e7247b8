use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    missions::{
        dto::{
            BalanceResponse, CompleteMissionRequest, CompleteMissionResponse, MissionItem,
            Pagination, RedeemRequest, RedeemResponse, TransactionItem,
        },
        engine::{self, LedgerError, MissionError},
        repo::{Mission, PrismTransaction},
    },
    state::AppState,
    users::repo::User,
};

pub fn mission_routes() -> Router<AppState> {
    Router::new()
        .route("/missions", get(list_missions))
        .route("/missions/complete", post(complete_mission))
}

pub fn point_routes() -> Router<AppState> {
    Router::new()
        .route("/points/balance", get(get_balance))
        .route("/points/transactions", get(list_transactions))
        .route("/points/redeem", post(redeem))
}

#[instrument(skip(state))]
pub async fn list_missions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<MissionItem>>, (StatusCode, String)> {
    let rows = Mission::list_with_progress(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(MissionItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn complete_mission(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CompleteMissionRequest>,
) -> Result<Json<CompleteMissionResponse>, (StatusCode, String)> {
    match engine::complete_mission(&state.db, user_id, payload.mission_type).await {
        Ok(reward) => Ok(Json(CompleteMissionResponse::completed(reward))),
        Err(MissionError::NotFound) => {
            Err((StatusCode::NOT_FOUND, "Mission not found".into()))
        }
        Err(MissionError::UserNotFound) => {
            warn!(%user_id, "token subject has no user row");
            Err((StatusCode::UNAUTHORIZED, "User not found".into()))
        }
        Err(MissionError::Db(e)) => {
            error!(error = %e, %user_id, mission = %payload.mission_type, "complete mission failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
        Err(e @ MissionError::AlreadyCompleted) => Ok(Json(CompleteMissionResponse::denied(
            payload.mission_type,
            true,
            e.to_string(),
        ))),
        Err(e) => Ok(Json(CompleteMissionResponse::denied(
            payload.mission_type,
            false,
            e.to_string(),
        ))),
    }
}

#[instrument(skip(state))]
pub async fn get_balance(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<BalanceResponse>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let sums = PrismTransaction::sums_for_user(&state.db, user_id)
        .await
        .map_err(internal)?;

    Ok(Json(BalanceResponse {
        balance: user.prism_balance,
        earned: sums.earned,
        spent: sums.spent,
    }))
}

#[instrument(skip(state))]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<TransactionItem>>, (StatusCode, String)> {
    let rows = PrismTransaction::list_for_user(&state.db, user_id, p.limit, p.offset)
        .await
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(TransactionItem::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn redeem(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, (StatusCode, String)> {
    if payload.amount <= 0 {
        return Err((StatusCode::BAD_REQUEST, "Amount must be positive".into()));
    }
    let description = payload
        .description
        .as_deref()
        .unwrap_or("Points redeemed")
        .trim();

    match engine::redeem_points(&state.db, user_id, payload.amount, description).await {
        Ok(new_balance) => {
            info!(%user_id, amount = payload.amount, "redeem succeeded");
            Ok(Json(RedeemResponse { new_balance }))
        }
        Err(e @ LedgerError::InsufficientBalance { .. }) => {
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(LedgerError::UserNotFound) => {
            Err((StatusCode::UNAUTHORIZED, "User not found".into()))
        }
        Err(LedgerError::Db(e)) => {
            error!(error = %e, %user_id, "redeem failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "database error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
