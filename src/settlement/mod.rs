//! Settlement orchestrator. Reads entity snapshots through the store
//! traits, runs the pure calculators in [`crate::model`], and hands the
//! resulting plans back to the store to persist atomically. Data flows one
//! way; the calculators never see storage.

use thiserror::Error;
use tracing::info;

use crate::{
    database::db_structs::{
        Challenge, ChallengeResolutionPlan, Driver, DriverMutation, NewChallenge, NewDriver, NewRace, PlacedResult,
        Race, RaceEntrant, RaceSettlementPlan, SeasonStats
    },
    model::{
        challenge,
        error::DomainError,
        race::{PodiumSettlement, RaceEntry, RaceSettlementPolicy, StakeWeightedSettlement},
        rating, season,
        season::SeasonReward,
        structures::{challenge_status::ChallengeStatus, commission_rate::CommissionRate, race_policy::RacePolicy}
    },
    store::{ChallengeStore, ConfigStore, DriverStore, RaceStore, SeasonStore, StoreError}
};

/// Failure of an orchestrated operation. Domain and storage categories stay
/// distinct all the way up to the caller.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError)
}

#[derive(Debug, Clone)]
pub struct CreateRaceInput {
    pub name: String,
    pub policy: RacePolicy,
    pub commission_rate: CommissionRate,
    pub entrants: Vec<RaceEntrant>
}

#[derive(Debug, Clone, Copy)]
pub struct CreateChallengeInput {
    pub challenger_id: i32,
    pub opponent_id: i32,
    pub stake: i64
}

pub struct SettlementService<S> {
    store: S
}

impl<S> SettlementService<S>
where
    S: DriverStore + RaceStore + ChallengeStore + SeasonStore + ConfigStore
{
    pub fn new(store: S) -> Self {
        SettlementService { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn register_driver(&self, new: NewDriver) -> Result<Driver, SettlementError> {
        let driver = self.store.create_driver(new).await?;
        info!(driver_id = driver.id, tag = %driver.tag, "driver registered");
        Ok(driver)
    }

    /// Creates a pending race for the current season. Money stays untouched
    /// until the race is settled.
    pub async fn create_race(&self, input: CreateRaceInput) -> Result<Race, SettlementError> {
        if input.entrants.len() < crate::model::constants::MIN_RACE_DRIVERS {
            return Err(DomainError::InsufficientParticipants.into());
        }
        if input.entrants.iter().any(|e| e.stake <= 0) {
            return Err(DomainError::InvalidStake.into());
        }
        for entrant in &input.entrants {
            self.require_driver(entrant.driver_id).await?;
        }

        let season = self.store.current_season().await?;
        let race = self
            .store
            .create_race(NewRace {
                name: input.name,
                season,
                policy: input.policy,
                commission_rate: input.commission_rate,
                entrants: input.entrants
            })
            .await?;

        info!(race_id = race.id, season, policy = ?race.policy, "race created");
        Ok(race)
    }

    /// Settles a pending race given its finish order (winner first).
    /// Payouts, rating movements, fee fields and the terminal transition
    /// persist together or not at all.
    pub async fn settle_race(&self, race_id: i32, finish_order: &[i32]) -> Result<Race, SettlementError> {
        let race = self
            .store
            .find_race(race_id)
            .await?
            .ok_or(DomainError::RaceNotFound)?;

        if race.resolved_at.is_some() {
            return Err(DomainError::RaceAlreadyResolved.into());
        }
        if finish_order.len() != race.results.len() {
            return Err(DomainError::StakesMismatch.into());
        }
        if race.results.iter().any(|r| !finish_order.contains(&r.driver_id)) {
            return Err(DomainError::StakesMismatch.into());
        }

        let config = self.store.ranking_config().await?;

        // Snapshot the drivers in finish order, pairing each with their
        // registered stake
        let mut entries = Vec::with_capacity(finish_order.len());
        let mut snapshots = Vec::with_capacity(finish_order.len());
        for driver_id in finish_order {
            let result = race
                .results
                .iter()
                .find(|r| r.driver_id == *driver_id)
                .ok_or(DomainError::StakesMismatch)?;
            let driver = self.require_driver(*driver_id).await?;

            entries.push(RaceEntry {
                driver_id: driver.id,
                stake: result.stake,
                rating: driver.rating
            });
            snapshots.push(driver);
        }

        let policy: &dyn RaceSettlementPolicy = match race.policy {
            RacePolicy::StakeWeighted => &StakeWeightedSettlement,
            RacePolicy::PodiumOnly => &PodiumSettlement
        };
        let outcome = policy.settle(&entries, race.commission_rate, &config)?;

        let mutations = outcome
            .placements
            .iter()
            .zip(snapshots.iter())
            .map(|(placement, driver)| DriverMutation {
                driver_id: driver.id,
                expected_rating: driver.rating,
                expected_balance: driver.balance,
                new_rating: placement.rating_after,
                balance_credit: placement.payout
            })
            .collect();

        let plan = RaceSettlementPlan {
            race_id: race.id,
            season: race.season,
            organizer_fee: outcome.finance.organizer_fee,
            final_pot_cut: outcome.finance.final_pot_cut,
            results: outcome
                .placements
                .iter()
                .map(|p| PlacedResult {
                    driver_id: p.driver_id,
                    position: p.position,
                    payout: p.payout
                })
                .collect(),
            mutations
        };

        let settled = self.store.apply_race_settlement(&plan).await?;
        info!(
            race_id = settled.id,
            total_pool = outcome.finance.total_pool,
            organizer_fee = outcome.finance.organizer_fee,
            "race settled"
        );
        Ok(settled)
    }

    pub async fn create_challenge(&self, input: CreateChallengeInput) -> Result<Challenge, SettlementError> {
        if input.challenger_id == input.opponent_id {
            return Err(DomainError::SameParticipant.into());
        }

        self.require_driver(input.challenger_id).await?;
        self.require_driver(input.opponent_id).await?;

        let finance = challenge::split_pool(input.stake)?;
        let season = self.store.current_season().await?;

        let created = self
            .store
            .create_challenge(NewChallenge {
                season,
                challenger_id: input.challenger_id,
                opponent_id: input.opponent_id,
                stake: input.stake,
                total_pool: finance.total_pool,
                organizer_fee: finance.organizer_fee,
                winner_prize: finance.winner_prize
            })
            .await?;

        info!(challenge_id = created.id, season, "challenge created");
        Ok(created)
    }

    pub async fn activate_challenge(&self, challenge_id: i32) -> Result<Challenge, SettlementError> {
        let current = self.require_challenge(challenge_id).await?;
        let next = challenge::activate(current.status)?;
        Ok(self.store.transition_challenge(challenge_id, next).await?)
    }

    pub async fn cancel_challenge(&self, challenge_id: i32) -> Result<Challenge, SettlementError> {
        let current = self.require_challenge(challenge_id).await?;
        let next = challenge::cancel(current.status)?;
        Ok(self.store.transition_challenge(challenge_id, next).await?)
    }

    /// Resolves an active challenge: rating swing between the two drivers,
    /// prize credit to the winner, terminal transition. One transaction.
    pub async fn resolve_challenge(&self, challenge_id: i32, winner_id: i32) -> Result<Challenge, SettlementError> {
        let current = self.require_challenge(challenge_id).await?;
        challenge::resolve(current.status)?;

        if winner_id != current.challenger_id && winner_id != current.opponent_id {
            return Err(DomainError::WinnerNotParticipant.into());
        }
        let loser_id = if winner_id == current.challenger_id {
            current.opponent_id
        } else {
            current.challenger_id
        };

        let winner = self.require_driver(winner_id).await?;
        let loser = self.require_driver(loser_id).await?;

        let config = self.store.ranking_config().await?;
        let adjustment = rating::adjust(winner.rating, loser.rating, &config)?;

        let plan = ChallengeResolutionPlan {
            challenge_id,
            season: current.season,
            winner_id,
            mutations: vec![
                DriverMutation {
                    driver_id: winner.id,
                    expected_rating: winner.rating,
                    expected_balance: winner.balance,
                    new_rating: adjustment.new_winner_rating,
                    balance_credit: current.winner_prize
                },
                DriverMutation {
                    driver_id: loser.id,
                    expected_rating: loser.rating,
                    expected_balance: loser.balance,
                    new_rating: adjustment.new_loser_rating,
                    balance_credit: 0
                },
            ]
        };

        let resolved = self.store.apply_challenge_resolution(&plan).await?;
        info!(
            challenge_id,
            winner_id,
            prize = current.winner_prize,
            "challenge resolved"
        );
        Ok(resolved)
    }

    /// Deleting is an admin escape hatch; resolved challenges are history
    /// and stay.
    pub async fn delete_challenge(&self, challenge_id: i32) -> Result<(), SettlementError> {
        let current = self.require_challenge(challenge_id).await?;
        if current.status == ChallengeStatus::Resolved {
            return Err(DomainError::ChallengeAlreadyResolved.into());
        }

        Ok(self.store.delete_challenge(challenge_id).await?)
    }

    /// Closes the current season: rewards are computed from the ranking
    /// snapshot taken before the counter advances, so bonuses land going
    /// into the next season.
    pub async fn close_season(&self) -> Result<Vec<SeasonReward>, SettlementError> {
        let current = self.store.current_season().await?;
        let ranking = self.store.ranking().await?;

        let standings: Vec<season::SeasonStanding> = ranking
            .iter()
            .take(3)
            .enumerate()
            .map(|(idx, driver)| season::SeasonStanding {
                driver_id: driver.id,
                position: idx as i32 + 1,
                rating: driver.rating
            })
            .collect();

        let rewards = season::compute_rewards(&standings)?;

        // Rewards come back in position order, which is the ranking order
        // the standings were built from
        let mutations: Vec<DriverMutation> = rewards
            .iter()
            .zip(ranking.iter())
            .filter(|(reward, _)| reward.rating_bonus > 0)
            .map(|(reward, driver)| DriverMutation {
                driver_id: driver.id,
                expected_rating: driver.rating,
                expected_balance: driver.balance,
                new_rating: driver.rating + reward.rating_bonus,
                balance_credit: 0
            })
            .collect();

        self.store.close_season(current, &mutations).await?;
        info!(season = current, rewarded = rewards.len(), "season closed");
        Ok(rewards)
    }

    pub async fn season_stats(&self) -> Result<SeasonStats, SettlementError> {
        let current = self.store.current_season().await?;
        Ok(self.store.stats(current).await?)
    }

    async fn require_driver(&self, id: i32) -> Result<Driver, SettlementError> {
        self.store
            .find_driver(id)
            .await?
            .ok_or_else(|| DomainError::DriverNotFound.into())
    }

    async fn require_challenge(&self, id: i32) -> Result<Challenge, SettlementError> {
        self.store
            .find_challenge(id)
            .await?
            .ok_or_else(|| DomainError::ChallengeNotFound.into())
    }
}
