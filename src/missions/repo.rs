use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Catalog mission types. Matches the Postgres `mission_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mission_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionType {
    SportSelect,
    TeamJoin,
    InviteMember,
    MatchVerify,
    DailyCheckIn,
    TeamMatch,
    FirstMatch,
    ProfileComplete,
    WeeklyActivity,
}

impl MissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionType::SportSelect => "SPORT_SELECT",
            MissionType::TeamJoin => "TEAM_JOIN",
            MissionType::InviteMember => "INVITE_MEMBER",
            MissionType::MatchVerify => "MATCH_VERIFY",
            MissionType::DailyCheckIn => "DAILY_CHECK_IN",
            MissionType::TeamMatch => "TEAM_MATCH",
            MissionType::FirstMatch => "FIRST_MATCH",
            MissionType::ProfileComplete => "PROFILE_COMPLETE",
            MissionType::WeeklyActivity => "WEEKLY_ACTIVITY",
        }
    }
}

impl std::fmt::Display for MissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "prism_tx_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    MissionReward,
    Redeem,
    AdminAdjust,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Mission {
    pub id: Uuid,
    pub mission_type: MissionType,
    pub title: String,
    pub description: String,
    pub reward: i64,
    pub is_repeatable: bool,
    pub is_active: bool,
    pub verification_rules: Option<serde_json::Value>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserMission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mission_id: Uuid,
    pub status: MissionStatus,
    pub completed_at: Option<OffsetDateTime>,
    pub count: i32,
}

/// One append-only ledger row. `balance_after` snapshots the running balance
/// at the time the row was written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PrismTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub tx_type: TxType,
    pub description: String,
    pub mission_type: Option<MissionType>,
    pub balance_after: i64,
    pub created_at: OffsetDateTime,
}

/// Catalog row joined with the caller's completion state.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MissionWithProgress {
    pub mission_type: MissionType,
    pub title: String,
    pub description: String,
    pub reward: i64,
    pub is_repeatable: bool,
    pub status: Option<MissionStatus>,
    pub completed_at: Option<OffsetDateTime>,
    pub count: Option<i32>,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct BalanceSums {
    pub earned: i64,
    pub spent: i64,
}

#[derive(Debug)]
pub struct NewMission<'a> {
    pub mission_type: MissionType,
    pub title: &'a str,
    pub description: &'a str,
    pub reward: i64,
    pub is_repeatable: bool,
    pub is_active: bool,
    pub verification_rules: Option<&'a serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct MissionPatch<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub reward: Option<i64>,
    pub is_repeatable: Option<bool>,
    pub is_active: Option<bool>,
    pub verification_rules: Option<&'a serde_json::Value>,
}

impl Mission {
    pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<Mission>> {
        let rows = sqlx::query_as::<_, Mission>(
            r#"
            SELECT id, mission_type, title, description, reward, is_repeatable, is_active,
                   verification_rules, created_at
            FROM missions
            WHERE is_active = TRUE
            ORDER BY mission_type
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_with_progress(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<MissionWithProgress>> {
        let rows = sqlx::query_as::<_, MissionWithProgress>(
            r#"
            SELECT m.mission_type, m.title, m.description, m.reward, m.is_repeatable,
                   um.status, um.completed_at, um.count
            FROM missions m
            LEFT JOIN user_missions um ON um.mission_id = m.id AND um.user_id = $1
            WHERE m.is_active = TRUE
            ORDER BY m.mission_type
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Duplicate mission types hit the catalog unique key; the raw error is
    /// returned so callers can answer with a conflict.
    pub async fn create(db: &PgPool, new: NewMission<'_>) -> Result<Mission, sqlx::Error> {
        sqlx::query_as::<_, Mission>(
            r#"
            INSERT INTO missions (mission_type, title, description, reward, is_repeatable,
                                  is_active, verification_rules)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, mission_type, title, description, reward, is_repeatable, is_active,
                      verification_rules, created_at
            "#,
        )
        .bind(new.mission_type)
        .bind(new.title)
        .bind(new.description)
        .bind(new.reward)
        .bind(new.is_repeatable)
        .bind(new.is_active)
        .bind(new.verification_rules)
        .fetch_one(db)
        .await
    }

    /// Partial update; absent fields keep their current value.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        patch: MissionPatch<'_>,
    ) -> anyhow::Result<Option<Mission>> {
        let row = sqlx::query_as::<_, Mission>(
            r#"
            UPDATE missions
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                reward = COALESCE($4, reward),
                is_repeatable = COALESCE($5, is_repeatable),
                is_active = COALESCE($6, is_active),
                verification_rules = COALESCE($7, verification_rules)
            WHERE id = $1
            RETURNING id, mission_type, title, description, reward, is_repeatable, is_active,
                      verification_rules, created_at
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.reward)
        .bind(patch.is_repeatable)
        .bind(patch.is_active)
        .bind(patch.verification_rules)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

impl PrismTransaction {
    pub async fn list_for_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PrismTransaction>> {
        let rows = sqlx::query_as::<_, PrismTransaction>(
            r#"
            SELECT id, user_id, amount, tx_type, description, mission_type, balance_after, created_at
            FROM prism_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn sums_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<BalanceSums> {
        let sums = sqlx::query_as::<_, BalanceSums>(
            r#"
            SELECT COALESCE(SUM(amount) FILTER (WHERE amount > 0), 0)::BIGINT AS earned,
                   COALESCE(-SUM(amount) FILTER (WHERE amount < 0), 0)::BIGINT AS spent
            FROM prism_transactions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(sums)
    }

    pub async fn ledger_sum(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
        let sum = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM prism_transactions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mission_type_wire_names() {
        let json = serde_json::to_string(&MissionType::DailyCheckIn).unwrap();
        assert_eq!(json, r#""DAILY_CHECK_IN""#);
        let parsed: MissionType = serde_json::from_str(r#""SPORT_SELECT""#).unwrap();
        assert_eq!(parsed, MissionType::SportSelect);
    }

    #[test]
    fn test_mission_type_display_matches_serde() {
        for mt in [
            MissionType::SportSelect,
            MissionType::TeamJoin,
            MissionType::InviteMember,
            MissionType::MatchVerify,
            MissionType::DailyCheckIn,
            MissionType::TeamMatch,
            MissionType::FirstMatch,
            MissionType::ProfileComplete,
            MissionType::WeeklyActivity,
        ] {
            let json = serde_json::to_string(&mt).unwrap();
            assert_eq!(json, format!("\"{}\"", mt.as_str()));
        }
    }

    #[test]
    fn test_tx_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&TxType::MissionReward).unwrap(),
            r#""MISSION_REWARD""#
        );
        assert_eq!(
            serde_json::to_string(&TxType::AdminAdjust).unwrap(),
            r#""ADMIN_ADJUST""#
        );
    }
}
