use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub nickname: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub preferred_sport: String,
    pub is_admin: bool,
    pub prism_balance: i64,
    pub last_check_in: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Fields collected at registration.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub nickname: &'a str,
    pub preferred_sport: &'a str,
    pub phone: Option<&'a str>,
    pub city: Option<&'a str>,
    pub district: Option<&'a str>,
}

/// Profile fields a user may edit.
#[derive(Debug)]
pub struct ProfileUpdate<'a> {
    pub nickname: &'a str,
    pub preferred_sport: &'a str,
    pub phone: Option<&'a str>,
    pub city: Option<&'a str>,
    pub district: Option<&'a str>,
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, nickname, phone, city, district,
                   preferred_sport, is_admin, prism_balance, last_check_in, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by ID.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, nickname, phone, city, district,
                   preferred_sport, is_admin, prism_balance, last_check_in, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, nickname, preferred_sport, phone, city, district)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, email, password_hash, nickname, phone, city, district,
                      preferred_sport, is_admin, prism_balance, last_check_in, created_at
            "#,
        )
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.nickname)
        .bind(new.preferred_sport)
        .bind(new.phone)
        .bind(new.city)
        .bind(new.district)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Replace the editable profile fields.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        update: ProfileUpdate<'_>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET nickname = $2, preferred_sport = $3, phone = $4, city = $5, district = $6
            WHERE id = $1
            RETURNING id, email, password_hash, nickname, phone, city, district,
                      preferred_sport, is_admin, prism_balance, last_check_in, created_at
            "#,
        )
        .bind(id)
        .bind(update.nickname)
        .bind(update.preferred_sport)
        .bind(update.phone)
        .bind(update.city)
        .bind(update.district)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Load and row-lock a user inside a transaction. Every balance mutation
    /// goes through this lock, which serializes mission completions and
    /// ledger writes per user.
    pub async fn lock_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, nickname, phone, city, district,
                   preferred_sport, is_admin, prism_balance, last_check_in, created_at
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Page through all users, newest first. Admin tooling.
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, nickname, phone, city, district,
                   preferred_sport, is_admin, prism_balance, last_check_in, created_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Hard-delete a user. Only reachable from admin cleanup tooling;
    /// dependent rows cascade.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
