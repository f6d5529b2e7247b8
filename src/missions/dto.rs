use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::missions::{
    engine::MissionReward,
    repo::{MissionStatus, MissionType, MissionWithProgress, PrismTransaction, TxType},
};

#[derive(Debug, Deserialize)]
pub struct CompleteMissionRequest {
    pub mission_type: MissionType,
}

/// Body of POST /missions/complete. Business denials are part of the normal
/// result shape, not error responses.
#[derive(Debug, Serialize)]
pub struct CompleteMissionResponse {
    pub success: bool,
    pub mission_type: MissionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<i64>,
    pub already_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CompleteMissionResponse {
    pub fn completed(r: MissionReward) -> Self {
        CompleteMissionResponse {
            success: true,
            mission_type: r.mission_type,
            reward: Some(r.reward),
            new_balance: Some(r.new_balance),
            already_completed: false,
            message: None,
        }
    }

    pub fn denied(mission_type: MissionType, already_completed: bool, message: String) -> Self {
        CompleteMissionResponse {
            success: false,
            mission_type,
            reward: None,
            new_balance: None,
            already_completed,
            message: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MissionItem {
    pub mission_type: MissionType,
    pub title: String,
    pub description: String,
    pub reward: i64,
    pub is_repeatable: bool,
    pub completed: bool,
    pub completed_at: Option<OffsetDateTime>,
    pub times_completed: i32,
}

impl From<MissionWithProgress> for MissionItem {
    fn from(m: MissionWithProgress) -> Self {
        MissionItem {
            mission_type: m.mission_type,
            title: m.title,
            description: m.description,
            reward: m.reward,
            is_repeatable: m.is_repeatable,
            completed: m.status == Some(MissionStatus::Completed),
            completed_at: m.completed_at,
            times_completed: m.count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: i64,
    pub earned: i64,
    pub spent: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionItem {
    pub id: Uuid,
    pub amount: i64,
    pub tx_type: TxType,
    pub description: String,
    pub mission_type: Option<MissionType>,
    pub balance_after: i64,
    pub created_at: OffsetDateTime,
}

impl From<PrismTransaction> for TransactionItem {
    fn from(t: PrismTransaction) -> Self {
        TransactionItem {
            id: t.id,
            amount: t.amount,
            tx_type: t.tx_type,
            description: t.description,
            mission_type: t.mission_type,
            balance_after: t.balance_after,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub new_balance: i64,
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
    fn test_denied_response_omits_reward_fields() {
        let resp = CompleteMissionResponse::denied(
            MissionType::TeamJoin,
            false,
            "join a team first".into(),
        );
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""success":false"#));
        assert!(json.contains("join a team first"));
        assert!(!json.contains("reward"));
        assert!(!json.contains("new_balance"));
    }

    #[test]
    fn test_completed_response_carries_balance() {
        let resp = CompleteMissionResponse::completed(MissionReward {
            mission_type: MissionType::DailyCheckIn,
            reward: 10,
            new_balance: 110,
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""success":true"#));
        assert!(json.contains(r#""reward":10"#));
        assert!(json.contains(r#""new_balance":110"#));
        assert!(json.contains(r#""already_completed":false"#));
    }

    #[test]
    fn test_complete_request_parses_wire_name() {
        let req: CompleteMissionRequest =
            serde_json::from_str(r#"{"mission_type":"DAILY_CHECK_IN"}"#).unwrap();
        assert_eq!(req.mission_type, MissionType::DailyCheckIn);
    }
}
