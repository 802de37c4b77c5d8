//! Fixtures and in-memory store implementations used by the unit and
//! integration tests. The in-memory stores honor the same atomicity and
//! conflict rules as the Postgres client, which is what makes the
//! orchestrator tests meaningful.

use std::{
    collections::HashSet,
    sync::Mutex
};

use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    database::db_structs::{
        Challenge, ChallengeResolutionPlan, Driver, DriverMutation, DriverPatch, NewChallenge, NewDriver, NewRace,
        Race, RaceResult, RaceSettlementPlan, SeasonStats
    },
    model::{
        config::RankingConfig,
        constants::RATING_START,
        structures::challenge_status::ChallengeStatus
    },
    store::{ChallengeStore, ConfigStore, DriverStore, RaceStore, SeasonStore, StoreError}
};

pub fn generate_driver(id: i32, tag: &str, rating: i32, balance: i64) -> Driver {
    Driver {
        id,
        tag: tag.to_string(),
        name: tag.to_string(),
        rating,
        balance,
        archived: false,
        created_at: now()
    }
}

/// Generates a grid of drivers with ratings spread around `base_rating`,
/// reproducible across runs.
pub fn generate_grid(count: usize, base_rating: i32) -> Vec<Driver> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    (0..count)
        .map(|i| {
            let id = i as i32 + 1;
            let rating = base_rating + rng.random_range(0..200);
            let balance = rng.random_range(1_000..100_000);
            generate_driver(id, &format!("DRV{}", id), rating, balance)
        })
        .collect()
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

#[derive(Default)]
struct MemoryState {
    drivers: IndexMap<i32, Driver>,
    races: IndexMap<i32, Race>,
    challenges: IndexMap<i32, Challenge>,
    seasons: IndexMap<i32, SeasonStats>,
    closed_seasons: HashSet<i32>,
    config: Option<RankingConfig>,
    next_driver_id: i32,
    next_race_id: i32,
    next_challenge_id: i32
}

/// In-memory implementation of every store trait, guarded by a single lock.
pub struct MemoryStore {
    state: Mutex<MemoryState>
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            state: Mutex::new(MemoryState::default())
        }
    }

    /// Preloads drivers, keeping their ids.
    pub fn with_drivers(drivers: Vec<Driver>) -> MemoryStore {
        let store = MemoryStore::new();
        {
            let mut state = store.state.lock().unwrap();
            for driver in drivers {
                state.next_driver_id = state.next_driver_id.max(driver.id);
                state.drivers.insert(driver.id, driver);
            }
        }
        store
    }

    fn apply_mutations(state: &mut MemoryState, mutations: &[DriverMutation]) -> Result<(), StoreError> {
        // Validate every snapshot before touching anything, so a conflict
        // leaves no partial writes behind
        for m in mutations {
            let driver = state.drivers.get(&m.driver_id).ok_or(StoreError::NotFound {
                entity: "driver",
                id: m.driver_id
            })?;
            if driver.rating != m.expected_rating || driver.balance != m.expected_balance {
                return Err(StoreError::Conflict(m.driver_id));
            }
        }

        for m in mutations {
            let driver = state.drivers.get_mut(&m.driver_id).unwrap();
            driver.rating = m.new_rating;
            driver.balance += m.balance_credit;
        }

        Ok(())
    }

    fn open_season(state: &mut MemoryState) -> i32 {
        let current = state
            .seasons
            .keys()
            .filter(|s| !state.closed_seasons.contains(*s))
            .max()
            .copied();

        match current {
            Some(season) => season,
            None => {
                let next = state.seasons.keys().max().copied().unwrap_or(0) + 1;
                state.seasons.insert(
                    next,
                    SeasonStats {
                        season: next,
                        race_count: 0,
                        challenge_count: 0,
                        final_pot: 0
                    }
                );
                next
            }
        }
    }
}

impl DriverStore for MemoryStore {
    async fn find_driver(&self, id: i32) -> Result<Option<Driver>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.drivers.get(&id).cloned())
    }

    async fn create_driver(&self, new: NewDriver) -> Result<Driver, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.next_driver_id += 1;
        let driver = Driver {
            id: state.next_driver_id,
            tag: new.tag,
            name: new.name,
            rating: RATING_START,
            balance: 0,
            archived: false,
            created_at: now()
        };
        state.drivers.insert(driver.id, driver.clone());
        Ok(driver)
    }

    async fn update_driver(&self, id: i32, patch: DriverPatch) -> Result<Driver, StoreError> {
        let mut state = self.state.lock().unwrap();
        let driver = state
            .drivers
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "driver", id })?;

        if let Some(rating) = patch.rating {
            driver.rating = rating;
        }
        if let Some(balance) = patch.balance {
            driver.balance = balance;
        }
        if let Some(archived) = patch.archived {
            driver.archived = archived;
        }

        Ok(driver.clone())
    }

    async fn ranking(&self) -> Result<Vec<Driver>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .drivers
            .values()
            .filter(|d| !d.archived)
            .cloned()
            .sorted_by_key(|d| (std::cmp::Reverse(d.rating), d.id))
            .collect())
    }
}

impl RaceStore for MemoryStore {
    async fn find_race(&self, id: i32) -> Result<Option<Race>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.races.get(&id).cloned())
    }

    async fn create_race(&self, new: NewRace) -> Result<Race, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.next_race_id += 1;
        let race = Race {
            id: state.next_race_id,
            name: new.name,
            season: new.season,
            policy: new.policy,
            commission_rate: new.commission_rate,
            organizer_fee: 0,
            final_pot_cut: 0,
            resolved_at: None,
            created_at: now(),
            results: new
                .entrants
                .iter()
                .map(|e| RaceResult {
                    driver_id: e.driver_id,
                    stake: e.stake,
                    position: None,
                    payout: 0
                })
                .collect()
        };
        state.races.insert(race.id, race.clone());
        Ok(race)
    }

    async fn apply_race_settlement(&self, plan: &RaceSettlementPlan) -> Result<Race, StoreError> {
        let mut state = self.state.lock().unwrap();

        Self::apply_mutations(&mut state, &plan.mutations)?;

        let race = state.races.get_mut(&plan.race_id).ok_or(StoreError::NotFound {
            entity: "race",
            id: plan.race_id
        })?;
        for placed in &plan.results {
            if let Some(result) = race.results.iter_mut().find(|r| r.driver_id == placed.driver_id) {
                result.position = Some(placed.position);
                result.payout = placed.payout;
            }
        }
        race.organizer_fee = plan.organizer_fee;
        race.final_pot_cut = plan.final_pot_cut;
        race.resolved_at = Some(now());
        let settled = race.clone();

        if let Some(stats) = state.seasons.get_mut(&plan.season) {
            stats.race_count += 1;
            stats.final_pot += plan.final_pot_cut;
        }

        Ok(settled)
    }
}

impl ChallengeStore for MemoryStore {
    async fn find_challenge(&self, id: i32) -> Result<Option<Challenge>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.challenges.get(&id).cloned())
    }

    async fn create_challenge(&self, new: NewChallenge) -> Result<Challenge, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.next_challenge_id += 1;
        let challenge = Challenge {
            id: state.next_challenge_id,
            season: new.season,
            challenger_id: new.challenger_id,
            opponent_id: new.opponent_id,
            stake: new.stake,
            total_pool: new.total_pool,
            organizer_fee: new.organizer_fee,
            winner_prize: new.winner_prize,
            status: ChallengeStatus::Pending,
            winner_id: None,
            created_at: now(),
            updated_at: now()
        };
        state.challenges.insert(challenge.id, challenge.clone());
        Ok(challenge)
    }

    async fn transition_challenge(&self, id: i32, status: ChallengeStatus) -> Result<Challenge, StoreError> {
        let mut state = self.state.lock().unwrap();
        let challenge = state
            .challenges
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "challenge", id })?;
        challenge.status = status;
        challenge.updated_at = now();
        Ok(challenge.clone())
    }

    async fn apply_challenge_resolution(&self, plan: &ChallengeResolutionPlan) -> Result<Challenge, StoreError> {
        let mut state = self.state.lock().unwrap();

        Self::apply_mutations(&mut state, &plan.mutations)?;

        let challenge = state.challenges.get_mut(&plan.challenge_id).ok_or(StoreError::NotFound {
            entity: "challenge",
            id: plan.challenge_id
        })?;
        challenge.status = ChallengeStatus::Resolved;
        challenge.winner_id = Some(plan.winner_id);
        challenge.updated_at = now();
        let resolved = challenge.clone();

        if let Some(stats) = state.seasons.get_mut(&plan.season) {
            stats.challenge_count += 1;
        }

        Ok(resolved)
    }

    async fn delete_challenge(&self, id: i32) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .challenges
            .shift_remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { entity: "challenge", id })
    }
}

impl SeasonStore for MemoryStore {
    async fn current_season(&self) -> Result<i32, StoreError> {
        let mut state = self.state.lock().unwrap();
        Ok(Self::open_season(&mut state))
    }

    async fn stats(&self, season: i32) -> Result<SeasonStats, StoreError> {
        let state = self.state.lock().unwrap();
        state.seasons.get(&season).copied().ok_or(StoreError::NotFound {
            entity: "season",
            id: season
        })
    }

    async fn close_season(&self, season: i32, mutations: &[DriverMutation]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();

        if !state.seasons.contains_key(&season) || state.closed_seasons.contains(&season) {
            return Err(StoreError::NotFound {
                entity: "season",
                id: season
            });
        }

        Self::apply_mutations(&mut state, mutations)?;

        state.closed_seasons.insert(season);
        state.seasons.insert(
            season + 1,
            SeasonStats {
                season: season + 1,
                race_count: 0,
                challenge_count: 0,
                final_pot: 0
            }
        );

        Ok(())
    }
}

impl ConfigStore for MemoryStore {
    async fn ranking_config(&self) -> Result<RankingConfig, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.config.clone().unwrap_or_default())
    }

    async fn update_ranking_config(&self, config: RankingConfig) -> Result<RankingConfig, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.config = Some(config.clone());
        Ok(config)
    }
}
