use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    rankings::{
        dto::{RankScope, RankedTeam, RankingsQuery},
        repo, services,
    },
    state::AppState,
};

pub fn ranking_routes() -> Router<AppState> {
    Router::new().route("/rankings", get(get_rankings))
}

#[instrument(skip(state))]
pub async fn get_rankings(
    State(state): State<AppState>,
    Query(q): Query<RankingsQuery>,
) -> Result<Json<Vec<RankedTeam>>, (StatusCode, String)> {
    let sport = q.sport.trim();
    if sport.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Sport is required".into()));
    }

    let (city, district) = match q.scope {
        RankScope::District => {
            let city = require(q.city.as_deref(), "District scope requires city and district")?;
            let district =
                require(q.district.as_deref(), "District scope requires city and district")?;
            (Some(city), Some(district))
        }
        RankScope::City => {
            let city = require(q.city.as_deref(), "City scope requires city")?;
            (Some(city), None)
        }
        RankScope::National => (None, None),
    };

    let teams = repo::teams_in_scope(&state.db, sport, city, district)
        .await
        .map_err(|e| {
            error!(error = %e, sport, "rankings query failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(services::rank_teams(teams)))
}

fn require<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, (StatusCode, String)> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err((StatusCode::BAD_REQUEST, message.to_string())),
    }
}
