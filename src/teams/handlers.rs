use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    missions::{
        engine::{self, MissionError},
        repo::MissionType,
        rules::MissionEvent,
    },
    state::AppState,
    teams::{
        dto::{
            CreateTeamRequest, InvitationResponse, InviteRequest, JoinResponse, ListTeamsQuery,
            MemberResponse, TeamDetailResponse, TeamResponse,
        },
        repo::{MemberStatus, NewTeam, Team, TeamInvitation, TeamMember},
        services::canonical_name,
    },
};

pub fn team_routes() -> Router<AppState> {
    Router::new()
        .route("/teams", post(create_team).get(list_teams))
        .route("/teams/:id", get(get_team))
        .route("/teams/:id/join", post(join_team))
        .route("/teams/:id/members/:user_id/approve", post(approve_member))
        .route("/teams/:id/invitations", post(create_invitation))
}

#[instrument(skip(state, payload))]
pub async fn create_team(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), (StatusCode, String)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Team name is required".into()));
    }
    let sport = payload.sport.trim();
    let city = payload.city.trim();
    let district = payload.district.trim();
    if sport.is_empty() || city.is_empty() || district.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Sport, city and district are required".into(),
        ));
    }

    let canonical = canonical_name(name);
    if canonical.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Team name must contain letters or digits".into(),
        ));
    }

    // Friendly pre-check; the scoped unique constraint still backstops races.
    let taken = Team::exists_in_scope(&state.db, sport, city, district, &canonical)
        .await
        .map_err(internal)?;
    if taken {
        warn!(%user_id, team_name = %name, "team name collision");
        return Err((
            StatusCode::CONFLICT,
            "Team name already taken in this area".into(),
        ));
    }

    let team = match Team::create(
        &state.db,
        NewTeam {
            name,
            canonical_name: &canonical,
            sport,
            city,
            district,
            description: payload.description.as_deref(),
            owner_id: user_id,
        },
    )
    .await
    {
        Ok(t) => t,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            warn!(%user_id, team_name = %name, "team name collision");
            return Err((
                StatusCode::CONFLICT,
                "Team name already taken in this area".into(),
            ));
        }
        Err(e) => {
            error!(error = %e, %user_id, "create team failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    // The owner counts as an active member from the start.
    if let Err(e) = engine::process_event(&state.db, user_id, MissionEvent::TeamJoin).await {
        warn!(error = %e, %user_id, "team join mission processing failed");
    }

    info!(team_id = %team.id, %user_id, "team created");
    Ok((StatusCode::CREATED, Json(TeamResponse::from(team))))
}

#[instrument(skip(state))]
pub async fn list_teams(
    State(state): State<AppState>,
    Query(q): Query<ListTeamsQuery>,
) -> Result<Json<Vec<TeamResponse>>, (StatusCode, String)> {
    let teams = Team::list(
        &state.db,
        q.sport.as_deref(),
        q.city.as_deref(),
        q.district.as_deref(),
        q.limit,
        q.offset,
    )
    .await
    .map_err(internal)?;
    Ok(Json(teams.into_iter().map(TeamResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamDetailResponse>, (StatusCode, String)> {
    let team = Team::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Team not found".to_string()))?;

    let members = TeamMember::roster(&state.db, id).await.map_err(internal)?;

    Ok(Json(TeamDetailResponse {
        team: TeamResponse::from(team),
        members: members.into_iter().map(MemberResponse::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn join_team(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<JoinResponse>), (StatusCode, String)> {
    let team = Team::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Team not found".to_string()))?;

    let member = match TeamMember::request_join(&state.db, team.id, user_id).await {
        Ok(m) => m,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err((
                StatusCode::CONFLICT,
                "Join request already exists".into(),
            ));
        }
        Err(e) => {
            error!(error = %e, %user_id, team_id = %id, "join request failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    info!(team_id = %team.id, %user_id, "join requested");
    Ok((StatusCode::CREATED, Json(JoinResponse::from(member))))
}

#[instrument(skip(state))]
pub async fn approve_member(
    State(state): State<AppState>,
    AuthUser(caller_id): AuthUser,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<JoinResponse>, (StatusCode, String)> {
    let team = Team::find_by_id(&state.db, team_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Team not found".to_string()))?;

    if team.owner_id != caller_id {
        return Err((
            StatusCode::FORBIDDEN,
            "Only the team owner can approve members".into(),
        ));
    }

    let member = TeamMember::approve(&state.db, team_id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "No pending join request for this user".to_string(),
        ))?;

    if let Err(e) = engine::process_event(&state.db, member.user_id, MissionEvent::TeamJoin).await
    {
        warn!(error = %e, user_id = %member.user_id, "team join mission processing failed");
    }

    info!(team_id = %team_id, user_id = %member.user_id, "member approved");
    Ok(Json(JoinResponse::from(member)))
}

#[instrument(skip(state, payload))]
pub async fn create_invitation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InviteRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), (StatusCode, String)> {
    let phone = payload.phone.trim();
    if phone.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Phone is required".into()));
    }

    let team = Team::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Team not found".to_string()))?;

    let membership = TeamMember::find(&state.db, team.id, user_id)
        .await
        .map_err(internal)?;
    if !matches!(membership, Some(m) if m.status == MemberStatus::Active) {
        return Err((
            StatusCode::FORBIDDEN,
            "Active team membership required".into(),
        ));
    }

    let invitation = TeamInvitation::create(&state.db, team.id, user_id, phone)
        .await
        .map_err(internal)?;

    // The invitation row itself is what makes the inviter eligible.
    match engine::complete_mission(&state.db, user_id, MissionType::InviteMember).await {
        Ok(reward) => {
            info!(%user_id, reward = reward.reward, "invite mission completed")
        }
        Err(MissionError::Db(e)) => {
            warn!(error = %e, %user_id, "invite mission processing failed")
        }
        Err(e) => debug!(%user_id, reason = %e, "invite mission not credited"),
    }

    info!(team_id = %team.id, %user_id, "invitation created");
    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse {
            id: invitation.id,
            team_id: invitation.team_id,
            phone: invitation.phone,
            status: invitation.status,
            created_at: invitation.created_at,
        }),
    ))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "database error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
