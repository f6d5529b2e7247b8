use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RankScope {
    District,
    City,
    #[default]
    National,
}

#[derive(Debug, Deserialize)]
pub struct RankingsQuery {
    pub sport: String,
    #[serde(default)]
    pub scope: RankScope,
    pub city: Option<String>,
    pub district: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedTeam {
    pub rank: i64,
    pub team_id: Uuid,
    pub name: String,
    pub city: String,
    pub district: String,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub points: i32,
    pub win_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_parses_lowercase() {
        let q: RankingsQuery =
            serde_json::from_str(r#"{"sport":"futsal","scope":"district"}"#).unwrap();
        assert_eq!(q.scope, RankScope::District);
    }

    #[test]
    fn test_scope_defaults_to_national() {
        let q: RankingsQuery = serde_json::from_str(r#"{"sport":"futsal"}"#).unwrap();
        assert_eq!(q.scope, RankScope::National);
    }
}
