use sqlx::PgPool;

use crate::teams::repo::Team;

/// Every team for a sport within the given scope. Unpaged: the ladder is
/// ranked in memory.
pub async fn teams_in_scope(
    db: &PgPool,
    sport: &str,
    city: Option<&str>,
    district: Option<&str>,
) -> anyhow::Result<Vec<Team>> {
    let rows = sqlx::query_as::<_, Team>(
        r#"
        SELECT id, name, canonical_name, sport, city, district, description,
               owner_id, wins, draws, losses, points, created_at
        FROM teams
        WHERE sport = $1
          AND ($2::TEXT IS NULL OR city = $2)
          AND ($3::TEXT IS NULL OR district = $3)
        "#,
    )
    .bind(sport)
    .bind(city)
    .bind(district)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
