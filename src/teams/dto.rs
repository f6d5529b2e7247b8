use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::teams::repo::{MemberRole, MemberStatus, RosterEntry, Team, TeamMember};

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub sport: String,
    pub city: String,
    pub district: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub sport: String,
    pub city: String,
    pub district: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub points: i32,
    pub created_at: OffsetDateTime,
}

impl From<Team> for TeamResponse {
    fn from(t: Team) -> Self {
        TeamResponse {
            id: t.id,
            name: t.name,
            sport: t.sport,
            city: t.city,
            district: t.district,
            description: t.description,
            owner_id: t.owner_id,
            wins: t.wins,
            draws: t.draws,
            losses: t.losses,
            points: t.points,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub nickname: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub joined_at: OffsetDateTime,
}

impl From<RosterEntry> for MemberResponse {
    fn from(m: RosterEntry) -> Self {
        MemberResponse {
            id: m.id,
            user_id: m.user_id,
            nickname: m.nickname,
            role: m.role,
            status: m.status,
            joined_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TeamDetailResponse {
    pub team: TeamResponse,
    pub members: Vec<MemberResponse>,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub status: MemberStatus,
}

impl From<TeamMember> for JoinResponse {
    fn from(m: TeamMember) -> Self {
        JoinResponse {
            id: m.id,
            team_id: m.team_id,
            status: m.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub phone: String,
    pub status: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ListTeamsQuery {
    pub sport: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_status_serializes_lowercase() {
        let json = serde_json::to_string(&MemberStatus::Pending).unwrap();
        assert_eq!(json, r#""pending""#);
        let json = serde_json::to_string(&MemberRole::Owner).unwrap();
        assert_eq!(json, r#""owner""#);
    }

    #[test]
    fn test_list_query_defaults() {
        let q: ListTeamsQuery = serde_json::from_str(r#"{"sport":"futsal"}"#).unwrap();
        assert_eq!(q.sport.as_deref(), Some("futsal"));
        assert_eq!(q.limit, 20);
        assert_eq!(q.offset, 0);
        assert!(q.city.is_none());
    }
}
