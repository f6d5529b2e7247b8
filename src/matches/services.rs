/// Ladder points for a single recorded result.
pub const WIN_POINTS: i32 = 3;
pub const DRAW_POINTS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultDelta {
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub points: i32,
}

/// Counter deltas for (home, away) given a final score.
pub fn result_deltas(home_score: i32, away_score: i32) -> (ResultDelta, ResultDelta) {
    let win = ResultDelta {
        wins: 1,
        draws: 0,
        losses: 0,
        points: WIN_POINTS,
    };
    let draw = ResultDelta {
        wins: 0,
        draws: 1,
        losses: 0,
        points: DRAW_POINTS,
    };
    let loss = ResultDelta {
        wins: 0,
        draws: 0,
        losses: 1,
        points: 0,
    };

    if home_score > away_score {
        (win, loss)
    } else if home_score < away_score {
        (loss, win)
    } else {
        (draw, draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_win() {
        let (home, away) = result_deltas(3, 1);
        assert_eq!(home.wins, 1);
        assert_eq!(home.points, 3);
        assert_eq!(away.losses, 1);
        assert_eq!(away.points, 0);
    }

    #[test]
    fn test_away_win() {
        let (home, away) = result_deltas(0, 2);
        assert_eq!(home.losses, 1);
        assert_eq!(home.points, 0);
        assert_eq!(away.wins, 1);
        assert_eq!(away.points, 3);
    }

    #[test]
    fn test_draw() {
        let (home, away) = result_deltas(2, 2);
        assert_eq!(home.draws, 1);
        assert_eq!(home.points, 1);
        assert_eq!(away.draws, 1);
        assert_eq!(away.points, 1);
    }
}
