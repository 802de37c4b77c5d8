use serde::{Deserialize, Serialize};

use crate::model::constants::{
    EVEN_LOSS_DELTA, EVEN_WIN_DELTA, RACE_POINTS_FIRST, RACE_POINTS_OTHER, RACE_POINTS_SECOND, RACE_POINTS_THIRD,
    RATING_FLOOR, RATING_GAP_THRESHOLD, STRONG_LOSS_DELTA, STRONG_WIN_DELTA, WEAK_LOSS_DELTA, WEAK_WIN_DELTA
};

/// Tunable ranking coefficients. Admins edit these through the config store;
/// the calculators read them at computation time, so a change only affects
/// settlements that start after it was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingConfig {
    pub rating_floor: i32,
    /// Rating gap beyond which a match stops counting as even
    pub gap_threshold: i32,
    pub strong_win_delta: i32,
    pub strong_loss_delta: i32,
    pub even_win_delta: i32,
    pub even_loss_delta: i32,
    pub weak_win_delta: i32,
    pub weak_loss_delta: i32,
    /// Flat rating points for the podium-only race settlement
    pub race_points_first: i32,
    pub race_points_second: i32,
    pub race_points_third: i32,
    pub race_points_other: i32
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            rating_floor: RATING_FLOOR,
            gap_threshold: RATING_GAP_THRESHOLD,
            strong_win_delta: STRONG_WIN_DELTA,
            strong_loss_delta: STRONG_LOSS_DELTA,
            even_win_delta: EVEN_WIN_DELTA,
            even_loss_delta: EVEN_LOSS_DELTA,
            weak_win_delta: WEAK_WIN_DELTA,
            weak_loss_delta: WEAK_LOSS_DELTA,
            race_points_first: RACE_POINTS_FIRST,
            race_points_second: RACE_POINTS_SECOND,
            race_points_third: RACE_POINTS_THIRD,
            race_points_other: RACE_POINTS_OTHER
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RankingConfig;

    #[test]
    fn test_defaults() {
        let config = RankingConfig::default();

        assert_eq!(config.rating_floor, 800);
        assert_eq!(config.gap_threshold, 50);
        assert_eq!(config.strong_win_delta, 25);
        assert_eq!(config.strong_loss_delta, 15);
        assert_eq!(config.even_win_delta, 15);
        assert_eq!(config.even_loss_delta, 15);
        assert_eq!(config.weak_win_delta, 8);
        assert_eq!(config.weak_loss_delta, 25);
    }
}
