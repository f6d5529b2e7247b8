use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    missions::{
        repo::{Mission, MissionStatus, MissionType, TxType, UserMission},
        rules::{self, MissionEvent, RuleContext, VerificationRule},
    },
    users::repo::User,
};

/// Outcomes of the completion operation that are business results, not
/// infrastructure faults. Everything except `Db` leaves the ledger untouched.
#[derive(Debug, Error)]
pub enum MissionError {
    #[error("mission not found")]
    NotFound,
    #[error("mission is not active")]
    Inactive,
    #[error("mission already completed")]
    AlreadyCompleted,
    #[error("{0}")]
    NotEligible(&'static str),
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("user not found")]
    UserNotFound,
    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: i64, required: i64 },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct MissionReward {
    pub mission_type: MissionType,
    pub reward: i64,
    pub new_balance: i64,
}

/// Completes a mission for a user: catalog lookup, per-user row lock,
/// repeat check, eligibility, then balance update + ledger row + progress
/// upsert, all in one transaction. Concurrent calls for the same user
/// serialize on the row lock; the (user_id, mission_id) unique key backstops
/// the non-repeatable guarantee.
#[instrument(skip(db))]
pub async fn complete_mission(
    db: &PgPool,
    user_id: Uuid,
    mission_type: MissionType,
) -> Result<MissionReward, MissionError> {
    let mut tx = db.begin().await?;

    let mission = find_mission(&mut tx, mission_type)
        .await?
        .ok_or(MissionError::NotFound)?;
    if !mission.is_active {
        return Err(MissionError::Inactive);
    }

    let user = User::lock_for_update(&mut tx, user_id)
        .await?
        .ok_or(MissionError::UserNotFound)?;

    let progress = find_progress(&mut tx, user_id, mission.id).await?;
    if !mission.is_repeatable
        && matches!(&progress, Some(p) if p.status == MissionStatus::Completed)
    {
        return Err(MissionError::AlreadyCompleted);
    }

    let rule = rules::effective_rule(&mission).map_err(|e| {
        warn!(error = %e, mission = %mission_type, "stored verification rule does not parse");
        MissionError::NotEligible("unrecognized verification rule")
    })?;

    if let Some(rule) = &rule {
        let now = OffsetDateTime::now_utc();
        let ctx = load_context(&mut tx, &user, progress.as_ref(), rule, now).await?;
        rules::evaluate(rule, &ctx).map_err(MissionError::NotEligible)?;
    }

    let new_balance = apply_ledger_entry(
        &mut tx,
        user_id,
        mission.reward,
        TxType::MissionReward,
        &format!("Mission reward: {}", mission.title),
        Some(mission_type),
    )
    .await?;

    if mission_type == MissionType::DailyCheckIn {
        stamp_check_in(&mut tx, user_id).await?;
    }

    upsert_progress(&mut tx, user_id, mission.id).await?;

    tx.commit().await?;

    info!(
        %user_id,
        mission = %mission_type,
        reward = mission.reward,
        new_balance,
        "mission completed"
    );
    Ok(MissionReward {
        mission_type,
        reward: mission.reward,
        new_balance,
    })
}

/// Auto-verification: runs `complete_mission` for every active mission whose
/// effective rule responds to the event. Business failures are skipped;
/// database failures propagate.
#[instrument(skip(db))]
pub async fn process_event(
    db: &PgPool,
    user_id: Uuid,
    event: MissionEvent,
) -> anyhow::Result<Vec<MissionReward>> {
    let missions = Mission::list_active(db).await?;

    let mut rewards = Vec::new();
    for mission in missions {
        let rule = match rules::effective_rule(&mission) {
            Ok(Some(rule)) => rule,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, mission = %mission.mission_type, "skipping mission with bad rule");
                continue;
            }
        };
        if !rule.responds_to(event) {
            continue;
        }

        match complete_mission(db, user_id, mission.mission_type).await {
            Ok(reward) => rewards.push(reward),
            Err(MissionError::Db(e)) => return Err(e.into()),
            Err(e) => {
                debug!(%user_id, mission = %mission.mission_type, reason = %e, "mission not credited")
            }
        }
    }
    Ok(rewards)
}

/// Spends points at a partner merchant. The same per-user lock that guards
/// mission credits guards the balance check, so a spend can never race a
/// credit into a negative balance.
#[instrument(skip(db, description))]
pub async fn redeem_points(
    db: &PgPool,
    user_id: Uuid,
    amount: i64,
    description: &str,
) -> Result<i64, LedgerError> {
    let mut tx = db.begin().await?;

    let user = User::lock_for_update(&mut tx, user_id)
        .await?
        .ok_or(LedgerError::UserNotFound)?;

    if user.prism_balance < amount {
        return Err(LedgerError::InsufficientBalance {
            balance: user.prism_balance,
            required: amount,
        });
    }

    let new_balance =
        apply_ledger_entry(&mut tx, user_id, -amount, TxType::Redeem, description, None).await?;

    tx.commit().await?;
    info!(%user_id, amount, new_balance, "points redeemed");
    Ok(new_balance)
}

/// Signed admin correction. The balance may never go negative.
#[instrument(skip(db, description))]
pub async fn adjust_points(
    db: &PgPool,
    user_id: Uuid,
    amount: i64,
    description: &str,
) -> Result<i64, LedgerError> {
    let mut tx = db.begin().await?;

    let user = User::lock_for_update(&mut tx, user_id)
        .await?
        .ok_or(LedgerError::UserNotFound)?;

    if user.prism_balance + amount < 0 {
        return Err(LedgerError::InsufficientBalance {
            balance: user.prism_balance,
            required: -amount,
        });
    }

    let new_balance =
        apply_ledger_entry(&mut tx, user_id, amount, TxType::AdminAdjust, description, None)
            .await?;

    tx.commit().await?;
    info!(%user_id, amount, new_balance, "balance adjusted");
    Ok(new_balance)
}

/// Moves the balance and appends the matching ledger row. Callers must hold
/// the user row lock so balance_after snapshots stay a correct prefix sum.
async fn apply_ledger_entry(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
    tx_type: TxType,
    description: &str,
    mission_type: Option<MissionType>,
) -> Result<i64, sqlx::Error> {
    let new_balance = sqlx::query_scalar::<_, i64>(
        "UPDATE users SET prism_balance = prism_balance + $2 WHERE id = $1 RETURNING prism_balance",
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO prism_transactions (user_id, amount, tx_type, description, mission_type, balance_after)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(tx_type)
    .bind(description)
    .bind(mission_type)
    .bind(new_balance)
    .execute(&mut **tx)
    .await?;

    Ok(new_balance)
}

async fn find_mission(
    tx: &mut Transaction<'_, Postgres>,
    mission_type: MissionType,
) -> Result<Option<Mission>, sqlx::Error> {
    sqlx::query_as::<_, Mission>(
        r#"
        SELECT id, mission_type, title, description, reward, is_repeatable, is_active,
               verification_rules, created_at
        FROM missions
        WHERE mission_type = $1
        "#,
    )
    .bind(mission_type)
    .fetch_optional(&mut **tx)
    .await
}

async fn find_progress(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    mission_id: Uuid,
) -> Result<Option<UserMission>, sqlx::Error> {
    sqlx::query_as::<_, UserMission>(
        r#"
        SELECT id, user_id, mission_id, status, completed_at, count
        FROM user_missions
        WHERE user_id = $1 AND mission_id = $2
        "#,
    )
    .bind(user_id)
    .bind(mission_id)
    .fetch_optional(&mut **tx)
    .await
}

async fn upsert_progress(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    mission_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_missions (user_id, mission_id, status, completed_at, count)
        VALUES ($1, $2, 'completed', now(), 1)
        ON CONFLICT (user_id, mission_id)
        DO UPDATE SET status = 'completed', completed_at = now(), count = user_missions.count + 1
        "#,
    )
    .bind(user_id)
    .bind(mission_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn stamp_check_in(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_check_in = now() WHERE id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Loads only the snapshot fields the given rule inspects.
async fn load_context<'a>(
    tx: &mut Transaction<'_, Postgres>,
    user: &'a User,
    progress: Option<&UserMission>,
    rule: &VerificationRule,
    now: OffsetDateTime,
) -> Result<RuleContext<'a>, sqlx::Error> {
    let mut ctx = RuleContext {
        now,
        last_check_in: user.last_check_in,
        nickname: &user.nickname,
        phone: user.phone.as_deref(),
        city: user.city.as_deref(),
        district: user.district.as_deref(),
        preferred_sport: &user.preferred_sport,
        is_team_member: false,
        has_sent_invitation: false,
        has_match_participation: false,
        has_completed_match: false,
        rewards_last_7_days: 0,
        completed_within_7_days: false,
    };

    match rule {
        VerificationRule::CheckTeamMember => {
            ctx.is_team_member = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM team_members WHERE user_id = $1 AND status = 'active'
                )
                "#,
            )
            .bind(user.id)
            .fetch_one(&mut **tx)
            .await?;
        }
        VerificationRule::CheckInvitation => {
            ctx.has_sent_invitation = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM team_invitations WHERE inviter_id = $1)",
            )
            .bind(user.id)
            .fetch_one(&mut **tx)
            .await?;
        }
        VerificationRule::CheckMatchParticipation => {
            ctx.has_match_participation = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM matches m
                    JOIN teams h ON h.id = m.home_team_id
                    JOIN teams a ON a.id = m.away_team_id
                    WHERE m.created_by = $1 OR h.owner_id = $1 OR a.owner_id = $1
                )
                "#,
            )
            .bind(user.id)
            .fetch_one(&mut **tx)
            .await?;
        }
        VerificationRule::FirstMatchComplete => {
            ctx.has_completed_match = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM matches m
                    JOIN teams h ON h.id = m.home_team_id
                    JOIN teams a ON a.id = m.away_team_id
                    WHERE m.status = 'completed'
                      AND (m.created_by = $1 OR h.owner_id = $1 OR a.owner_id = $1)
                )
                "#,
            )
            .bind(user.id)
            .fetch_one(&mut **tx)
            .await?;
        }
        VerificationRule::WeeklyActivity { .. } => {
            ctx.rewards_last_7_days = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM prism_transactions
                WHERE user_id = $1 AND amount > 0 AND created_at >= now() - INTERVAL '7 days'
                "#,
            )
            .bind(user.id)
            .fetch_one(&mut **tx)
            .await?;
            ctx.completed_within_7_days = progress
                .and_then(|p| p.completed_at)
                .is_some_and(|ts| now - ts < Duration::days(7));
        }
        VerificationRule::AutoOnSignup
        | VerificationRule::DailyCheck
        | VerificationRule::CheckProfile { .. } => {}
    }

    Ok(ctx)
}
