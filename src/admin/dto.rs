use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::missions::repo::MissionType;
use crate::users::repo::User;

#[derive(Debug, Deserialize)]
pub struct CreateMissionRequest {
    pub mission_type: MissionType,
    pub title: String,
    pub description: String,
    pub reward: i64,
    #[serde(default)]
    pub is_repeatable: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub verification_rules: Option<serde_json::Value>,
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateMissionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reward: Option<i64>,
    pub is_repeatable: Option<bool>,
    pub is_active: Option<bool>,
    pub verification_rules: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustPointsRequest {
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    pub new_balance: i64,
}

#[derive(Debug, Serialize)]
pub struct LedgerCheckResponse {
    pub user_id: Uuid,
    pub balance: i64,
    pub ledger_sum: i64,
    pub consistent: bool,
}

#[derive(Debug, Serialize)]
pub struct AdminUserItem {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub preferred_sport: String,
    pub is_admin: bool,
    pub prism_balance: i64,
    pub created_at: OffsetDateTime,
}

impl From<User> for AdminUserItem {
    fn from(u: User) -> Self {
        AdminUserItem {
            id: u.id,
            email: u.email,
            nickname: u.nickname,
            preferred_sport: u.preferred_sport,
            is_admin: u.is_admin,
            prism_balance: u.prism_balance,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
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
    fn test_create_mission_request_defaults() {
        let req: CreateMissionRequest = serde_json::from_str(
            r#"{"mission_type":"TEAM_JOIN","title":"t","description":"d","reward":50}"#,
        )
        .unwrap();
        assert!(!req.is_repeatable);
        assert!(req.is_active);
        assert!(req.verification_rules.is_none());
    }
}
