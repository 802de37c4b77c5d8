use crate::model::{
    config::RankingConfig,
    constants::{FINAL_POT_RATE, FIRST_PLACE_SPLIT, MIN_RACE_DRIVERS, SECOND_PLACE_SPLIT, THIRD_PLACE_SPLIT},
    error::DomainError,
    rating,
    structures::commission_rate::CommissionRate
};

/// One driver's entry into a race, in finish order when passed to a policy.
#[derive(Debug, Clone, Copy)]
pub struct RaceEntry {
    pub driver_id: i32,
    pub stake: i64,
    pub rating: i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodiumPayouts {
    pub first: i64,
    pub second: i64,
    pub third: i64
}

/// Monetary breakdown of a race pool. Any rounding remainder left after the
/// fee and the three payouts stays with the house and is never redistributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceFinance {
    pub total_pool: i64,
    pub organizer_fee: i64,
    /// Skim taken out of the organizer fee, accumulated into the season pot
    pub final_pot_cut: i64,
    pub prize_pool: i64,
    pub payouts: PodiumPayouts
}

/// A driver's settled result: position, money, and the rating movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RacePlacement {
    pub driver_id: i32,
    pub position: i32,
    pub payout: i64,
    pub rating_before: i32,
    pub rating_after: i32
}

#[derive(Debug, Clone)]
pub struct RaceSettlementOutcome {
    pub finance: RaceFinance,
    pub placements: Vec<RacePlacement>
}

/// Splits a race pool into the organizer fee, the house's final-pot cut and
/// the podium payouts. Every division floors; amounts are exact integers.
pub fn split_pool(stakes: &[i64], rate: CommissionRate) -> Result<RaceFinance, DomainError> {
    if stakes.len() < MIN_RACE_DRIVERS {
        return Err(DomainError::InsufficientParticipants);
    }

    if stakes.iter().any(|s| *s <= 0) {
        return Err(DomainError::InvalidStake);
    }

    let total_pool: i64 = stakes.iter().sum();
    let organizer_fee = (total_pool as f64 * rate.as_fraction()).floor() as i64;
    let final_pot_cut = (organizer_fee as f64 * FINAL_POT_RATE).floor() as i64;
    let prize_pool = total_pool - organizer_fee;

    Ok(RaceFinance {
        total_pool,
        organizer_fee,
        final_pot_cut,
        prize_pool,
        payouts: PodiumPayouts {
            first: (prize_pool as f64 * FIRST_PLACE_SPLIT).floor() as i64,
            second: (prize_pool as f64 * SECOND_PLACE_SPLIT).floor() as i64,
            third: (prize_pool as f64 * THIRD_PLACE_SPLIT).floor() as i64
        }
    })
}

/// A race settlement flow. Implementations receive the entries already in
/// finish order (winner first) and return the full outcome without touching
/// storage.
pub trait RaceSettlementPolicy {
    fn settle(
        &self,
        entries: &[RaceEntry],
        rate: CommissionRate,
        config: &RankingConfig
    ) -> Result<RaceSettlementOutcome, DomainError>;
}

/// Full settlement: podium payouts plus one rating adjustment per adjacent
/// pair in finish order (1st vs 2nd, 2nd vs 3rd, ...). Each pair sees the
/// ratings left behind by the previous pair, so a middle finisher both
/// gains as a winner and loses as a loser within the same race.
pub struct StakeWeightedSettlement;

impl RaceSettlementPolicy for StakeWeightedSettlement {
    fn settle(
        &self,
        entries: &[RaceEntry],
        rate: CommissionRate,
        config: &RankingConfig
    ) -> Result<RaceSettlementOutcome, DomainError> {
        let stakes: Vec<i64> = entries.iter().map(|e| e.stake).collect();
        let finance = split_pool(&stakes, rate)?;

        let mut ratings: Vec<i32> = entries.iter().map(|e| e.rating).collect();
        for i in 0..ratings.len() - 1 {
            let adjustment = rating::adjust(ratings[i], ratings[i + 1], config)?;
            ratings[i] = adjustment.new_winner_rating;
            ratings[i + 1] = adjustment.new_loser_rating;
        }

        let placements = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| RacePlacement {
                driver_id: entry.driver_id,
                position: idx as i32 + 1,
                payout: podium_payout(&finance, idx as i32 + 1),
                rating_before: entry.rating,
                rating_after: ratings[idx]
            })
            .collect();

        Ok(RaceSettlementOutcome { finance, placements })
    }
}

/// Podium-only settlement: the same three payouts, but ratings move by flat
/// config-driven points instead of the pairwise chain. Positions past 3rd
/// earn points only, never money.
pub struct PodiumSettlement;

impl RaceSettlementPolicy for PodiumSettlement {
    fn settle(
        &self,
        entries: &[RaceEntry],
        rate: CommissionRate,
        config: &RankingConfig
    ) -> Result<RaceSettlementOutcome, DomainError> {
        let stakes: Vec<i64> = entries.iter().map(|e| e.stake).collect();
        let finance = split_pool(&stakes, rate)?;

        let placements = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let position = idx as i32 + 1;
                let points = match position {
                    1 => config.race_points_first,
                    2 => config.race_points_second,
                    3 => config.race_points_third,
                    _ => config.race_points_other
                };

                RacePlacement {
                    driver_id: entry.driver_id,
                    position,
                    payout: podium_payout(&finance, position),
                    rating_before: entry.rating,
                    rating_after: entry.rating + points
                }
            })
            .collect();

        Ok(RaceSettlementOutcome { finance, placements })
    }
}

fn podium_payout(finance: &RaceFinance, position: i32) -> i64 {
    match position {
        1 => finance.payouts.first,
        2 => finance.payouts.second,
        3 => finance.payouts.third,
        _ => 0
    }
}

#[cfg(test)]
mod tests {
    use super::{split_pool, PodiumSettlement, RaceEntry, RaceSettlementPolicy, StakeWeightedSettlement};
    use crate::model::{config::RankingConfig, error::DomainError, structures::commission_rate::CommissionRate};

    fn entries(ratings: &[i32]) -> Vec<RaceEntry> {
        ratings
            .iter()
            .enumerate()
            .map(|(i, r)| RaceEntry {
                driver_id: i as i32 + 1,
                stake: 1000,
                rating: *r
            })
            .collect()
    }

    #[test]
    fn test_split_pool_quarter_commission() {
        let finance = split_pool(&[1000, 1000, 1000], CommissionRate::TwentyFivePercent).unwrap();

        assert_eq!(finance.total_pool, 3000);
        assert_eq!(finance.organizer_fee, 750);
        assert_eq!(finance.final_pot_cut, 37);
        assert_eq!(finance.prize_pool, 2250);
        assert_eq!(finance.payouts.first, 1350);
        assert_eq!(finance.payouts.second, 562);
        assert_eq!(finance.payouts.third, 337);
    }

    #[test]
    fn test_split_pool_thirty_commission() {
        let finance = split_pool(&[1000, 1000, 1000], CommissionRate::ThirtyPercent).unwrap();

        assert_eq!(finance.organizer_fee, 900);
        assert_eq!(finance.final_pot_cut, 45);
        assert_eq!(finance.prize_pool, 2100);
    }

    #[test]
    fn test_house_keeps_the_rounding_remainder() {
        let finance = split_pool(&[333, 333, 334], CommissionRate::TwentyFivePercent).unwrap();

        let distributed = finance.payouts.first + finance.payouts.second + finance.payouts.third;
        assert!(finance.organizer_fee + distributed <= finance.total_pool);
        assert!(distributed <= finance.prize_pool);
    }

    #[test]
    fn test_split_pool_rejects_small_grid() {
        assert_eq!(
            split_pool(&[1000, 1000], CommissionRate::TwentyFivePercent),
            Err(DomainError::InsufficientParticipants)
        );
    }

    #[test]
    fn test_split_pool_rejects_bad_stake() {
        assert_eq!(
            split_pool(&[1000, 0, 1000], CommissionRate::TwentyFivePercent),
            Err(DomainError::InvalidStake)
        );
        assert_eq!(
            split_pool(&[1000, -5, 1000], CommissionRate::TwentyFivePercent),
            Err(DomainError::InvalidStake)
        );
    }

    #[test]
    fn test_stake_weighted_chain() {
        let config = RankingConfig::default();
        let grid = entries(&[1000, 1000, 1000, 1000]);

        let outcome = StakeWeightedSettlement
            .settle(&grid, CommissionRate::TwentyFivePercent, &config)
            .unwrap();

        // 1v2 even: 1015 / 985. 2v3 (985 vs 1000) even: 1000 / 985.
        // 3v4 (985 vs 1000) even: 1000 / 985.
        let after: Vec<i32> = outcome.placements.iter().map(|p| p.rating_after).collect();
        assert_eq!(after, vec![1015, 1000, 1000, 985]);

        // Only the podium is paid
        let payouts: Vec<i64> = outcome.placements.iter().map(|p| p.payout).collect();
        assert_eq!(payouts, vec![1800, 750, 450, 0]);
    }

    #[test]
    fn test_podium_only_flat_points() {
        let config = RankingConfig::default();
        let grid = entries(&[1400, 1000, 900, 850, 820]);

        let outcome = PodiumSettlement
            .settle(&grid, CommissionRate::TwentyFivePercent, &config)
            .unwrap();

        let after: Vec<i32> = outcome.placements.iter().map(|p| p.rating_after).collect();
        assert_eq!(after, vec![1425, 1015, 910, 855, 825]);

        assert_eq!(outcome.placements[3].payout, 0);
        assert_eq!(outcome.placements[4].payout, 0);
    }

    #[test]
    fn test_policies_agree_on_money() {
        let config = RankingConfig::default();
        let grid = entries(&[1200, 1100, 1000, 900]);

        let weighted = StakeWeightedSettlement
            .settle(&grid, CommissionRate::ThirtyPercent, &config)
            .unwrap();
        let podium = PodiumSettlement
            .settle(&grid, CommissionRate::ThirtyPercent, &config)
            .unwrap();

        assert_eq!(weighted.finance, podium.finance);
        for (a, b) in weighted.placements.iter().zip(podium.placements.iter()) {
            assert_eq!(a.payout, b.payout);
        }
    }

    #[test]
    fn test_positions_are_one_based_finish_order() {
        let config = RankingConfig::default();
        let grid = entries(&[1000, 1000, 1000]);

        let outcome = StakeWeightedSettlement
            .settle(&grid, CommissionRate::TwentyFivePercent, &config)
            .unwrap();

        let positions: Vec<i32> = outcome.placements.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }
}
