use std::cmp::Ordering;

use crate::rankings::dto::RankedTeam;
use crate::teams::repo::Team;

/// Win rate over recorded games. Zero games is 0.0, never NaN.
pub fn win_rate(wins: i32, draws: i32, losses: i32) -> f64 {
    let games = wins + draws + losses;
    if games == 0 {
        0.0
    } else {
        f64::from(wins) / f64::from(games)
    }
}

/// Sorts by ladder points, ties broken by win rate, and assigns 1-based
/// ranks. Recomputed per request; no rank is persisted.
pub fn rank_teams(teams: Vec<Team>) -> Vec<RankedTeam> {
    let mut rows: Vec<RankedTeam> = teams
        .into_iter()
        .map(|t| RankedTeam {
            rank: 0,
            team_id: t.id,
            name: t.name,
            city: t.city,
            district: t.district,
            wins: t.wins,
            draws: t.draws,
            losses: t.losses,
            points: t.points,
            win_rate: win_rate(t.wins, t.draws, t.losses),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points.cmp(&a.points).then_with(|| {
            b.win_rate
                .partial_cmp(&a.win_rate)
                .unwrap_or(Ordering::Equal)
        })
    });

    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = (i + 1) as i64;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    fn team(name: &str, wins: i32, draws: i32, losses: i32, points: i32) -> Team {
        Team {
            id: Uuid::new_v4(),
            name: name.into(),
            canonical_name: name.to_lowercase(),
            sport: "futsal".into(),
            city: "서울".into(),
            district: "강남구".into(),
            description: None,
            owner_id: Uuid::new_v4(),
            wins,
            draws,
            losses,
            points,
            created_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn test_zero_games_is_zero_not_nan() {
        let rate = win_rate(0, 0, 0);
        assert_eq!(rate, 0.0);
        assert!(!rate.is_nan());
    }

    #[test]
    fn test_zero_game_team_sorts_below_scoring_team() {
        let ranked = rank_teams(vec![team("idle", 0, 0, 0, 0), team("busy", 1, 0, 0, 3)]);
        assert_eq!(ranked[0].name, "busy");
        assert_eq!(ranked[1].name, "idle");
    }

    #[test]
    fn test_points_order_dominates() {
        let ranked = rank_teams(vec![
            team("third", 1, 0, 5, 3),
            team("first", 4, 0, 0, 12),
            team("second", 2, 0, 2, 6),
        ]);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_equal_points_tie_broken_by_win_rate() {
        // A: 5W/5L, rate 0.5. B: 8W/2L, rate 0.8. Equal points, B first.
        let ranked = rank_teams(vec![team("a", 5, 0, 5, 10), team("b", 8, 0, 2, 10)]);
        assert_eq!(ranked[0].name, "b");
        assert!(ranked[0].win_rate > ranked[1].win_rate);
    }

    #[test]
    fn test_ranks_are_one_based_and_sequential() {
        let ranked = rank_teams(vec![
            team("a", 1, 0, 0, 3),
            team("b", 2, 0, 0, 6),
            team("c", 3, 0, 0, 9),
        ]);
        let ranks: Vec<i64> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [1, 2, 3]);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_teams(Vec::new()).is_empty());
    }
}
