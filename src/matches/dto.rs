use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::matches::repo::{Match, MatchStatus};

#[derive(Debug, Deserialize)]
pub struct ProposeMatchRequest {
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub match_date: OffsetDateTime,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordResultRequest {
    pub home_score: i32,
    pub away_score: i32,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub id: Uuid,
    pub sport: String,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub created_by: Uuid,
    pub status: MatchStatus,
    pub match_date: OffsetDateTime,
    pub location: Option<String>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub created_at: OffsetDateTime,
}

impl From<Match> for MatchResponse {
    fn from(m: Match) -> Self {
        MatchResponse {
            id: m.id,
            sport: m.sport,
            home_team_id: m.home_team_id,
            away_team_id: m.away_team_id,
            created_by: m.created_by,
            status: m.status,
            match_date: m.match_date,
            location: m.location,
            home_score: m.home_score,
            away_score: m.away_score,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListMatchesQuery {
    pub team_id: Option<Uuid>,
    pub status: Option<MatchStatus>,
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
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&MatchStatus::Proposed).unwrap();
        assert_eq!(json, r#""proposed""#);
    }

    #[test]
    fn test_list_query_parses_status() {
        let q: ListMatchesQuery = serde_json::from_str(r#"{"status":"confirmed"}"#).unwrap();
        assert_eq!(q.status, Some(MatchStatus::Confirmed));
        assert!(q.team_id.is_none());
        assert_eq!(q.limit, 20);
    }
}
