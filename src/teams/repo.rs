use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Pending,
    Active,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub canonical_name: String,
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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub created_at: OffsetDateTime,
}

/// Membership row joined with the member's nickname.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RosterEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub nickname: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamInvitation {
    pub id: Uuid,
    pub team_id: Uuid,
    pub inviter_id: Uuid,
    pub phone: String,
    pub status: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewTeam<'a> {
    pub name: &'a str,
    pub canonical_name: &'a str,
    pub sport: &'a str,
    pub city: &'a str,
    pub district: &'a str,
    pub description: Option<&'a str>,
    pub owner_id: Uuid,
}

impl Team {
    /// Inserts the team together with an active owner membership. Returns the
    /// raw sqlx error so callers can map the scoped-name unique violation to
    /// a conflict response.
    pub async fn create(db: &PgPool, new: NewTeam<'_>) -> Result<Team, sqlx::Error> {
        let mut tx = db.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name, canonical_name, sport, city, district, description, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, canonical_name, sport, city, district, description,
                      owner_id, wins, draws, losses, points, created_at
            "#,
        )
        .bind(new.name)
        .bind(new.canonical_name)
        .bind(new.sport)
        .bind(new.city)
        .bind(new.district)
        .bind(new.description)
        .bind(new.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO team_members (team_id, user_id, role, status)
            VALUES ($1, $2, 'owner', 'active')
            "#,
        )
        .bind(team.id)
        .bind(new.owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(team)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, canonical_name, sport, city, district, description,
                   owner_id, wins, draws, losses, points, created_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(team)
    }

    pub async fn exists_in_scope(
        db: &PgPool,
        sport: &str,
        city: &str,
        district: &str,
        canonical: &str,
    ) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM teams
                WHERE sport = $1 AND city = $2 AND district = $3 AND canonical_name = $4
            )
            "#,
        )
        .bind(sport)
        .bind(city)
        .bind(district)
        .bind(canonical)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn list(
        db: &PgPool,
        sport: Option<&str>,
        city: Option<&str>,
        district: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Team>> {
        let rows = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, canonical_name, sport, city, district, description,
                   owner_id, wins, draws, losses, points, created_at
            FROM teams
            WHERE ($1::TEXT IS NULL OR sport = $1)
              AND ($2::TEXT IS NULL OR city = $2)
              AND ($3::TEXT IS NULL OR district = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(sport)
        .bind(city)
        .bind(district)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Adds a result to the ladder counters inside the caller's transaction.
    pub async fn apply_result(
        tx: &mut Transaction<'_, Postgres>,
        team_id: Uuid,
        wins: i32,
        draws: i32,
        losses: i32,
        points: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE teams
            SET wins = wins + $2, draws = draws + $3, losses = losses + $4, points = points + $5
            WHERE id = $1
            "#,
        )
        .bind(team_id)
        .bind(wins)
        .bind(draws)
        .bind(losses)
        .bind(points)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

impl TeamMember {
    pub async fn find(
        db: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT id, team_id, user_id, role, status, created_at
            FROM team_members
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    /// Creates a pending join request. Duplicate requests hit the
    /// (team_id, user_id) unique key.
    pub async fn request_join(
        db: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<TeamMember, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (team_id, user_id, role, status)
            VALUES ($1, $2, 'member', 'pending')
            RETURNING id, team_id, user_id, role, status, created_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    /// Flips a pending membership to active. Returns None when there is no
    /// pending row to approve.
    pub async fn approve(
        db: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            UPDATE team_members
            SET status = 'active'
            WHERE team_id = $1 AND user_id = $2 AND status = 'pending'
            RETURNING id, team_id, user_id, role, status, created_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn roster(db: &PgPool, team_id: Uuid) -> anyhow::Result<Vec<RosterEntry>> {
        let rows = sqlx::query_as::<_, RosterEntry>(
            r#"
            SELECT m.id, m.user_id, u.nickname, m.role, m.status, m.created_at
            FROM team_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.team_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

impl TeamInvitation {
    pub async fn create(
        db: &PgPool,
        team_id: Uuid,
        inviter_id: Uuid,
        phone: &str,
    ) -> anyhow::Result<TeamInvitation> {
        let invitation = sqlx::query_as::<_, TeamInvitation>(
            r#"
            INSERT INTO team_invitations (team_id, inviter_id, phone)
            VALUES ($1, $2, $3)
            RETURNING id, team_id, inviter_id, phone, status, created_at
            "#,
        )
        .bind(team_id)
        .bind(inviter_id)
        .bind(phone)
        .fetch_one(db)
        .await?;
        Ok(invitation)
    }
}
