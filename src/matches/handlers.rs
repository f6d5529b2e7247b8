use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    matches::{
        dto::{ListMatchesQuery, MatchResponse, ProposeMatchRequest, RecordResultRequest},
        repo::{Match, NewMatch},
        services::result_deltas,
    },
    missions::{engine, rules::MissionEvent},
    state::AppState,
    teams::repo::Team,
};

pub fn match_routes() -> Router<AppState> {
    Router::new()
        .route("/matches", post(propose_match).get(list_matches))
        .route("/matches/:id", get(get_match))
        .route("/matches/:id/confirm", post(confirm_match))
        .route("/matches/:id/result", post(record_result))
        .route("/matches/:id/cancel", post(cancel_match))
}

#[instrument(skip(state, payload))]
pub async fn propose_match(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ProposeMatchRequest>,
) -> Result<(StatusCode, Json<MatchResponse>), (StatusCode, String)> {
    if payload.home_team_id == payload.away_team_id {
        return Err((StatusCode::BAD_REQUEST, "A team cannot play itself".into()));
    }

    let home = Team::find_by_id(&state.db, payload.home_team_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Home team not found".to_string()))?;
    let away = Team::find_by_id(&state.db, payload.away_team_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Away team not found".to_string()))?;

    if home.owner_id != user_id {
        return Err((
            StatusCode::FORBIDDEN,
            "Only the home team owner can propose a match".into(),
        ));
    }
    if home.sport != away.sport {
        return Err((StatusCode::BAD_REQUEST, "Teams play different sports".into()));
    }

    let m = Match::create(
        &state.db,
        NewMatch {
            sport: &home.sport,
            home_team_id: home.id,
            away_team_id: away.id,
            created_by: user_id,
            match_date: payload.match_date,
            location: payload.location.as_deref(),
        },
    )
    .await
    .map_err(internal)?;

    info!(match_id = %m.id, home = %home.id, away = %away.id, "match proposed");
    Ok((StatusCode::CREATED, Json(MatchResponse::from(m))))
}

#[instrument(skip(state))]
pub async fn list_matches(
    State(state): State<AppState>,
    Query(q): Query<ListMatchesQuery>,
) -> Result<Json<Vec<MatchResponse>>, (StatusCode, String)> {
    let rows = Match::list(&state.db, q.team_id, q.status, q.limit, q.offset)
        .await
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(MatchResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, (StatusCode, String)> {
    let m = Match::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Match not found".to_string()))?;
    Ok(Json(MatchResponse::from(m)))
}

#[instrument(skip(state))]
pub async fn confirm_match(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, (StatusCode, String)> {
    let m = Match::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Match not found".to_string()))?;

    let away = Team::find_by_id(&state.db, m.away_team_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Away team not found".to_string()))?;

    if away.owner_id != user_id {
        return Err((
            StatusCode::FORBIDDEN,
            "Only the away team owner can confirm a match".into(),
        ));
    }

    let confirmed = Match::confirm(&state.db, m.id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::CONFLICT,
            "Match is not awaiting confirmation".to_string(),
        ))?;

    let home = Team::find_by_id(&state.db, confirmed.home_team_id)
        .await
        .map_err(internal)?;
    let mut participants = vec![confirmed.created_by, away.owner_id];
    if let Some(home) = home {
        participants.push(home.owner_id);
    }
    participants.sort();
    participants.dedup();
    for uid in participants {
        if let Err(e) = engine::process_event(&state.db, uid, MissionEvent::MatchConfirmed).await {
            warn!(error = %e, user_id = %uid, match_id = %confirmed.id, "match mission processing failed");
        }
    }

    info!(match_id = %confirmed.id, "match confirmed");
    Ok(Json(MatchResponse::from(confirmed)))
}

#[instrument(skip(state, payload))]
pub async fn record_result(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordResultRequest>,
) -> Result<Json<MatchResponse>, (StatusCode, String)> {
    if payload.home_score < 0 || payload.away_score < 0 {
        return Err((StatusCode::BAD_REQUEST, "Scores must be non-negative".into()));
    }

    let m = Match::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Match not found".to_string()))?;

    let home = Team::find_by_id(&state.db, m.home_team_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Home team not found".to_string()))?;
    let away = Team::find_by_id(&state.db, m.away_team_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Away team not found".to_string()))?;

    if home.owner_id != user_id && away.owner_id != user_id {
        return Err((
            StatusCode::FORBIDDEN,
            "Only a participating team owner can record the result".into(),
        ));
    }

    let (home_delta, away_delta) = result_deltas(payload.home_score, payload.away_score);
    let completed = Match::complete_with_result(
        &state.db,
        m.id,
        payload.home_score,
        payload.away_score,
        home_delta,
        away_delta,
    )
    .await
    .map_err(internal)?
    .ok_or((
        StatusCode::CONFLICT,
        "Result can only be recorded for a confirmed match".to_string(),
    ))?;

    let mut participants = vec![completed.created_by, home.owner_id, away.owner_id];
    participants.sort();
    participants.dedup();
    for uid in participants {
        if let Err(e) = engine::process_event(&state.db, uid, MissionEvent::MatchCompleted).await {
            warn!(error = %e, user_id = %uid, match_id = %completed.id, "match mission processing failed");
        }
    }

    info!(
        match_id = %completed.id,
        home_score = payload.home_score,
        away_score = payload.away_score,
        "match result recorded"
    );
    Ok(Json(MatchResponse::from(completed)))
}

#[instrument(skip(state))]
pub async fn cancel_match(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, (StatusCode, String)> {
    let m = Match::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Match not found".to_string()))?;

    let home = Team::find_by_id(&state.db, m.home_team_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Home team not found".to_string()))?;
    let away = Team::find_by_id(&state.db, m.away_team_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Away team not found".to_string()))?;

    if home.owner_id != user_id && away.owner_id != user_id {
        return Err((
            StatusCode::FORBIDDEN,
            "Only a participating team owner can cancel the match".into(),
        ));
    }

    let cancelled = Match::cancel(&state.db, m.id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::CONFLICT,
            "Match already completed or cancelled".to_string(),
        ))?;

    info!(match_id = %cancelled.id, "match cancelled");
    Ok(Json(MatchResponse::from(cancelled)))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "database error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
