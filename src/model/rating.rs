use crate::model::{config::RankingConfig, error::DomainError};

/// Outcome of a single pairwise rating adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingAdjustment {
    pub winner_delta: i32,
    pub loser_delta: i32,
    pub new_winner_rating: i32,
    pub new_loser_rating: i32
}

/// Adjusts two ratings after a decided contest.
///
/// The tier is picked from the gap `loser - winner`: beating a stronger
/// opponent pays the strong deltas, an even match (gap within the threshold,
/// boundaries inclusive) pays the even deltas, beating a weaker opponent
/// pays the weak deltas.
///
/// Floor handling is deliberately asymmetric: the winner's new rating is
/// never clamped, while the loser's is held at the floor with the overshoot
/// silently truncated. Both inputs must already be at or above the floor.
pub fn adjust(winner_rating: i32, loser_rating: i32, config: &RankingConfig) -> Result<RatingAdjustment, DomainError> {
    if winner_rating < config.rating_floor || loser_rating < config.rating_floor {
        return Err(DomainError::RatingBelowFloor);
    }

    let gap = loser_rating - winner_rating;

    let (winner_delta, loser_delta) = if gap > config.gap_threshold {
        // Beat a stronger opponent
        (config.strong_win_delta, -config.strong_loss_delta)
    } else if gap >= -config.gap_threshold {
        // Even match
        (config.even_win_delta, -config.even_loss_delta)
    } else {
        // Beat a weaker opponent
        (config.weak_win_delta, -config.weak_loss_delta)
    };

    Ok(RatingAdjustment {
        winner_delta,
        loser_delta,
        new_winner_rating: winner_rating + winner_delta,
        new_loser_rating: (loser_rating + loser_delta).max(config.rating_floor)
    })
}

#[cfg(test)]
mod tests {
    use super::adjust;
    use crate::model::{config::RankingConfig, error::DomainError};

    fn config() -> RankingConfig {
        RankingConfig::default()
    }

    #[test]
    fn test_even_match() {
        let result = adjust(1000, 1000, &config()).unwrap();

        assert_eq!(result.winner_delta, 15);
        assert_eq!(result.loser_delta, -15);
        assert_eq!(result.new_winner_rating, 1015);
        assert_eq!(result.new_loser_rating, 985);
    }

    #[test]
    fn test_beat_stronger_opponent() {
        // Loser is 51 above the winner, past the threshold
        let result = adjust(1000, 1051, &config()).unwrap();

        assert_eq!(result.winner_delta, 25);
        assert_eq!(result.loser_delta, -15);
        assert_eq!(result.new_winner_rating, 1025);
        assert_eq!(result.new_loser_rating, 1036);
    }

    #[test]
    fn test_beat_weaker_opponent() {
        let result = adjust(1100, 1000, &config()).unwrap();

        assert_eq!(result.winner_delta, 8);
        assert_eq!(result.loser_delta, -25);
        assert_eq!(result.new_winner_rating, 1108);
        assert_eq!(result.new_loser_rating, 975);
    }

    #[test]
    fn test_boundaries_are_even() {
        // gap == threshold and gap == -threshold both fall into the even tier
        let upper = adjust(1000, 1050, &config()).unwrap();
        let lower = adjust(1050, 1000, &config()).unwrap();

        assert_eq!(upper.winner_delta, 15);
        assert_eq!(upper.loser_delta, -15);
        assert_eq!(lower.winner_delta, 15);
        assert_eq!(lower.loser_delta, -15);
    }

    #[test]
    fn test_loser_clamps_at_floor() {
        let result = adjust(1200, 810, &config()).unwrap();

        // Weak loss would land at 785; the floor truncates it
        assert_eq!(result.loser_delta, -25);
        assert_eq!(result.new_loser_rating, 800);
    }

    #[test]
    fn test_winner_is_never_clamped() {
        let result = adjust(2000, 1990, &config()).unwrap();

        assert_eq!(result.new_winner_rating, 2015);
    }

    #[test]
    fn test_rejects_ratings_below_floor() {
        assert_eq!(adjust(799, 1000, &config()), Err(DomainError::RatingBelowFloor));
        assert_eq!(adjust(1000, 799, &config()), Err(DomainError::RatingBelowFloor));
    }

    #[test]
    fn test_deterministic() {
        let first = adjust(1234, 987, &config()).unwrap();
        let second = adjust(1234, 987, &config()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_winner_gains_loser_drops() {
        let cfg = config();
        for (w, l) in [(800, 800), (900, 1200), (1500, 820), (1050, 1000)] {
            let result = adjust(w, l, &cfg).unwrap();

            assert!(result.winner_delta > 0);
            assert!(result.loser_delta < 0);
            assert!(result.new_loser_rating >= cfg.rating_floor);
        }
    }
}
