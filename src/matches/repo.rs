use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::matches::services::ResultDelta;
use crate::teams::repo::Team;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Proposed,
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Match {
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

#[derive(Debug)]
pub struct NewMatch<'a> {
    pub sport: &'a str,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub created_by: Uuid,
    pub match_date: OffsetDateTime,
    pub location: Option<&'a str>,
}

impl Match {
    pub async fn create(db: &PgPool, new: NewMatch<'_>) -> anyhow::Result<Match> {
        let m = sqlx::query_as::<_, Match>(
            r#"
            INSERT INTO matches (sport, home_team_id, away_team_id, created_by, match_date, location)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sport, home_team_id, away_team_id, created_by, status,
                      match_date, location, home_score, away_score, created_at
            "#,
        )
        .bind(new.sport)
        .bind(new.home_team_id)
        .bind(new.away_team_id)
        .bind(new.created_by)
        .bind(new.match_date)
        .bind(new.location)
        .fetch_one(db)
        .await?;
        Ok(m)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Match>> {
        let m = sqlx::query_as::<_, Match>(
            r#"
            SELECT id, sport, home_team_id, away_team_id, created_by, status,
                   match_date, location, home_score, away_score, created_at
            FROM matches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(m)
    }

    pub async fn list(
        db: &PgPool,
        team_id: Option<Uuid>,
        status: Option<MatchStatus>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Match>> {
        let rows = sqlx::query_as::<_, Match>(
            r#"
            SELECT id, sport, home_team_id, away_team_id, created_by, status,
                   match_date, location, home_score, away_score, created_at
            FROM matches
            WHERE ($1::UUID IS NULL OR home_team_id = $1 OR away_team_id = $1)
              AND ($2::match_status IS NULL OR status = $2)
            ORDER BY match_date DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(team_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Proposed -> confirmed. Returns None when the match is not in the
    /// proposed state.
    pub async fn confirm(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Match>> {
        let m = sqlx::query_as::<_, Match>(
            r#"
            UPDATE matches
            SET status = 'confirmed'
            WHERE id = $1 AND status = 'proposed'
            RETURNING id, sport, home_team_id, away_team_id, created_by, status,
                      match_date, location, home_score, away_score, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(m)
    }

    /// Confirmed -> completed, writing the score and both teams' ladder
    /// counters in one transaction. Returns None when the match is not
    /// confirmed (nothing written).
    pub async fn complete_with_result(
        db: &PgPool,
        id: Uuid,
        home_score: i32,
        away_score: i32,
        home: ResultDelta,
        away: ResultDelta,
    ) -> anyhow::Result<Option<Match>> {
        let mut tx = db.begin().await?;

        let m = sqlx::query_as::<_, Match>(
            r#"
            UPDATE matches
            SET status = 'completed', home_score = $2, away_score = $3
            WHERE id = $1 AND status = 'confirmed'
            RETURNING id, sport, home_team_id, away_team_id, created_by, status,
                      match_date, location, home_score, away_score, created_at
            "#,
        )
        .bind(id)
        .bind(home_score)
        .bind(away_score)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(m) = m else {
            tx.rollback().await?;
            return Ok(None);
        };

        Team::apply_result(&mut tx, m.home_team_id, home.wins, home.draws, home.losses, home.points)
            .await?;
        Team::apply_result(&mut tx, m.away_team_id, away.wins, away.draws, away.losses, away.points)
            .await?;

        tx.commit().await?;
        Ok(Some(m))
    }

    /// Proposed|confirmed -> cancelled. Returns None for completed or
    /// already-cancelled matches.
    pub async fn cancel(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Match>> {
        let m = sqlx::query_as::<_, Match>(
            r#"
            UPDATE matches
            SET status = 'cancelled'
            WHERE id = $1 AND status IN ('proposed', 'confirmed')
            RETURNING id, sport, home_team_id, away_team_id, created_by, status,
                      match_date, location, home_score, away_score, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(m)
    }
}
