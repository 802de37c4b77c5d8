//! Narrow interfaces to the persistence layer. The engine is invoked as a
//! library by whatever transport exists; these traits are the only thing it
//! asks of its surroundings. [`crate::database::db::DbClient`] implements
//! them over Postgres, the in-memory stores in
//! [`crate::utils::test_utils`] implement them for tests.

use thiserror::Error;

use crate::{
    database::db_structs::{
        Challenge, ChallengeResolutionPlan, Driver, DriverMutation, DriverPatch, NewChallenge, NewDriver, NewRace,
        Race, RaceSettlementPlan, SeasonStats
    },
    model::{config::RankingConfig, structures::challenge_status::ChallengeStatus}
};

/// Storage failures. Kept strictly apart from
/// [`crate::model::DomainError`]: a conflict or a lost connection is an
/// operational problem, not a rule violation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("driver {0} was modified concurrently, settlement rolled back")]
    Conflict(i32)
}

pub trait DriverStore {
    async fn find_driver(&self, id: i32) -> Result<Option<Driver>, StoreError>;

    async fn create_driver(&self, new: NewDriver) -> Result<Driver, StoreError>;

    async fn update_driver(&self, id: i32, patch: DriverPatch) -> Result<Driver, StoreError>;

    /// Active (non-archived) drivers, best rating first.
    async fn ranking(&self) -> Result<Vec<Driver>, StoreError>;
}

pub trait RaceStore {
    async fn find_race(&self, id: i32) -> Result<Option<Race>, StoreError>;

    /// Persists a pending race: entrants and stakes, no positions yet.
    async fn create_race(&self, new: NewRace) -> Result<Race, StoreError>;

    /// Applies a settlement plan in one transaction. Returns the finished
    /// race. Fails with [`StoreError::Conflict`] without persisting
    /// anything if any driver row moved since the plan was computed.
    async fn apply_race_settlement(&self, plan: &RaceSettlementPlan) -> Result<Race, StoreError>;
}

pub trait ChallengeStore {
    async fn find_challenge(&self, id: i32) -> Result<Option<Challenge>, StoreError>;

    async fn create_challenge(&self, new: NewChallenge) -> Result<Challenge, StoreError>;

    /// Status-only transition (activation, cancellation). Resolution goes
    /// through [`ChallengeStore::apply_challenge_resolution`].
    async fn transition_challenge(&self, id: i32, status: ChallengeStatus) -> Result<Challenge, StoreError>;

    /// Applies a resolution plan in one transaction, same conflict
    /// semantics as race settlement.
    async fn apply_challenge_resolution(&self, plan: &ChallengeResolutionPlan) -> Result<Challenge, StoreError>;

    async fn delete_challenge(&self, id: i32) -> Result<(), StoreError>;
}

pub trait SeasonStore {
    async fn current_season(&self) -> Result<i32, StoreError>;

    async fn stats(&self, season: i32) -> Result<SeasonStats, StoreError>;

    /// Applies the end-of-season reward mutations and advances the season
    /// counter, in that order, atomically.
    async fn close_season(&self, season: i32, mutations: &[DriverMutation]) -> Result<(), StoreError>;
}

pub trait ConfigStore {
    /// Read at computation time on purpose: an admin edit applies to the
    /// next settlement, never retroactively.
    async fn ranking_config(&self) -> Result<RankingConfig, StoreError>;

    async fn update_ranking_config(&self, config: RankingConfig) -> Result<RankingConfig, StoreError>;
}
