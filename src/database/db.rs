use super::db_structs::{
    Challenge, ChallengeResolutionPlan, Driver, DriverMutation, DriverPatch, NewChallenge, NewDriver, NewRace, Race,
    RaceResult, RaceSettlementPlan, SeasonStats
};
use crate::{
    model::{
        config::RankingConfig,
        constants::RATING_START,
        structures::{challenge_status::ChallengeStatus, commission_rate::CommissionRate, race_policy::RacePolicy}
    },
    store::{ChallengeStore, ConfigStore, DriverStore, RaceStore, SeasonStore, StoreError}
};
use postgres_types::ToSql;
use std::sync::Arc;
use tokio_postgres::{Client, Error, NoTls, Row};
use tracing::{error, info};

const DRIVER_COLUMNS: &str = "id, tag, name, rating, balance, archived, created_at";
const CHALLENGE_COLUMNS: &str = "id, season, challenger_id, opponent_id, stake, total_pool, organizer_fee, \
     winner_prize, status, winner_id, created_at, updated_at";

#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, Error> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client)
        })
    }

    pub fn client(&self) -> Arc<Client> {
        self.client.clone()
    }

    async fn begin(&self) -> Result<(), StoreError> {
        self.client.batch_execute("BEGIN").await?;
        Ok(())
    }

    async fn commit(&self) -> Result<(), StoreError> {
        self.client.batch_execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&self) {
        if let Err(e) = self.client.batch_execute("ROLLBACK").await {
            error!("rollback failed: {}", e);
        }
    }

    /// Applies one guarded driver mutation. The row must still match the
    /// snapshot the plan was computed from; zero affected rows means a
    /// concurrent settlement got there first.
    async fn apply_driver_mutations(&self, mutations: &[DriverMutation]) -> Result<(), StoreError> {
        for m in mutations {
            let updated = self
                .client
                .execute(
                    "UPDATE drivers SET rating = $1, balance = balance + $2 \
                     WHERE id = $3 AND rating = $4 AND balance = $5",
                    &[&m.new_rating, &m.balance_credit, &m.driver_id, &m.expected_rating, &m.expected_balance]
                )
                .await?;

            if updated != 1 {
                return Err(StoreError::Conflict(m.driver_id));
            }
        }

        Ok(())
    }

    async fn race_results(&self, race_id: i32) -> Result<Vec<RaceResult>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT driver_id, stake, finish_position, payout FROM race_results \
                 WHERE race_id = $1 ORDER BY id",
                &[&race_id]
            )
            .await?;

        Ok(rows.iter().map(Self::race_result_from_row).collect())
    }

    async fn apply_race_settlement_tx(&self, plan: &RaceSettlementPlan) -> Result<(), StoreError> {
        self.apply_driver_mutations(&plan.mutations).await?;

        for result in &plan.results {
            self.client
                .execute(
                    "UPDATE race_results SET finish_position = $1, payout = $2 \
                     WHERE race_id = $3 AND driver_id = $4",
                    &[&result.position, &result.payout, &plan.race_id, &result.driver_id]
                )
                .await?;
        }

        self.client
            .execute(
                "UPDATE races SET organizer_fee = $1, final_pot_cut = $2, resolved_at = now() WHERE id = $3",
                &[&plan.organizer_fee, &plan.final_pot_cut, &plan.race_id]
            )
            .await?;

        self.client
            .execute(
                "UPDATE seasons SET race_count = race_count + 1, final_pot = final_pot + $1 WHERE number = $2",
                &[&plan.final_pot_cut, &plan.season]
            )
            .await?;

        Ok(())
    }

    async fn apply_challenge_resolution_tx(&self, plan: &ChallengeResolutionPlan) -> Result<(), StoreError> {
        self.apply_driver_mutations(&plan.mutations).await?;

        let updated = self
            .client
            .execute(
                "UPDATE challenges SET status = $1, winner_id = $2, updated_at = now() WHERE id = $3",
                &[&(ChallengeStatus::Resolved as i32), &plan.winner_id, &plan.challenge_id]
            )
            .await?;
        if updated != 1 {
            return Err(StoreError::NotFound {
                entity: "challenge",
                id: plan.challenge_id
            });
        }

        self.client
            .execute(
                "UPDATE seasons SET challenge_count = challenge_count + 1 WHERE number = $1",
                &[&plan.season]
            )
            .await?;

        Ok(())
    }

    async fn close_season_tx(&self, season: i32, mutations: &[DriverMutation]) -> Result<(), StoreError> {
        self.apply_driver_mutations(mutations).await?;

        let closed = self
            .client
            .execute(
                "UPDATE seasons SET closed_at = now() WHERE number = $1 AND closed_at IS NULL",
                &[&season]
            )
            .await?;
        if closed != 1 {
            return Err(StoreError::NotFound {
                entity: "season",
                id: season
            });
        }

        self.client
            .execute(
                "INSERT INTO seasons (number, race_count, challenge_count, final_pot) VALUES ($1, 0, 0, 0)",
                &[&(season + 1)]
            )
            .await?;

        Ok(())
    }

    fn driver_from_row(row: &Row) -> Driver {
        Driver {
            id: row.get("id"),
            tag: row.get("tag"),
            name: row.get("name"),
            rating: row.get("rating"),
            balance: row.get("balance"),
            archived: row.get("archived"),
            created_at: row.get("created_at")
        }
    }

    fn race_from_row(row: &Row) -> Race {
        Race {
            id: row.get("id"),
            name: row.get("name"),
            season: row.get("season"),
            policy: RacePolicy::try_from(row.get::<_, i32>("policy")).unwrap(),
            commission_rate: CommissionRate::try_from(row.get::<_, i32>("commission_rate")).unwrap(),
            organizer_fee: row.get("organizer_fee"),
            final_pot_cut: row.get("final_pot_cut"),
            resolved_at: row.get("resolved_at"),
            created_at: row.get("created_at"),
            results: Vec::new()
        }
    }

    fn race_result_from_row(row: &Row) -> RaceResult {
        RaceResult {
            driver_id: row.get("driver_id"),
            stake: row.get("stake"),
            position: row.get("finish_position"),
            payout: row.get("payout")
        }
    }

    fn challenge_from_row(row: &Row) -> Challenge {
        Challenge {
            id: row.get("id"),
            season: row.get("season"),
            challenger_id: row.get("challenger_id"),
            opponent_id: row.get("opponent_id"),
            stake: row.get("stake"),
            total_pool: row.get("total_pool"),
            organizer_fee: row.get("organizer_fee"),
            winner_prize: row.get("winner_prize"),
            status: ChallengeStatus::try_from(row.get::<_, i32>("status")).unwrap(),
            winner_id: row.get("winner_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at")
        }
    }

    fn config_from_row(row: &Row) -> RankingConfig {
        RankingConfig {
            rating_floor: row.get("rating_floor"),
            gap_threshold: row.get("gap_threshold"),
            strong_win_delta: row.get("strong_win_delta"),
            strong_loss_delta: row.get("strong_loss_delta"),
            even_win_delta: row.get("even_win_delta"),
            even_loss_delta: row.get("even_loss_delta"),
            weak_win_delta: row.get("weak_win_delta"),
            weak_loss_delta: row.get("weak_loss_delta"),
            race_points_first: row.get("race_points_first"),
            race_points_second: row.get("race_points_second"),
            race_points_third: row.get("race_points_third"),
            race_points_other: row.get("race_points_other")
        }
    }
}

impl DriverStore for DbClient {
    async fn find_driver(&self, id: i32) -> Result<Option<Driver>, StoreError> {
        let query = format!("SELECT {} FROM drivers WHERE id = $1", DRIVER_COLUMNS);
        let row = self.client.query_opt(query.as_str(), &[&id]).await?;

        Ok(row.as_ref().map(Self::driver_from_row))
    }

    async fn create_driver(&self, new: NewDriver) -> Result<Driver, StoreError> {
        let query = format!(
            "INSERT INTO drivers (tag, name, rating, balance, archived, created_at) \
             VALUES ($1, $2, $3, 0, false, now()) RETURNING {}",
            DRIVER_COLUMNS
        );
        let row = self
            .client
            .query_one(query.as_str(), &[&new.tag, &new.name, &RATING_START])
            .await?;

        Ok(Self::driver_from_row(&row))
    }

    async fn update_driver(&self, id: i32, patch: DriverPatch) -> Result<Driver, StoreError> {
        let query = format!(
            "UPDATE drivers SET rating = COALESCE($2, rating), balance = COALESCE($3, balance), \
             archived = COALESCE($4, archived) WHERE id = $1 RETURNING {}",
            DRIVER_COLUMNS
        );
        let row = self
            .client
            .query_opt(query.as_str(), &[&id, &patch.rating, &patch.balance, &patch.archived])
            .await?;

        row.as_ref()
            .map(Self::driver_from_row)
            .ok_or(StoreError::NotFound { entity: "driver", id })
    }

    async fn ranking(&self) -> Result<Vec<Driver>, StoreError> {
        let query = format!(
            "SELECT {} FROM drivers WHERE archived = false ORDER BY rating DESC, id",
            DRIVER_COLUMNS
        );
        let rows = self.client.query(query.as_str(), &[]).await?;

        Ok(rows.iter().map(Self::driver_from_row).collect())
    }
}

impl RaceStore for DbClient {
    async fn find_race(&self, id: i32) -> Result<Option<Race>, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT id, name, season, policy, commission_rate, organizer_fee, final_pot_cut, \
                 resolved_at, created_at FROM races WHERE id = $1",
                &[&id]
            )
            .await?;

        match row {
            Some(row) => {
                let mut race = Self::race_from_row(&row);
                race.results = self.race_results(race.id).await?;
                Ok(Some(race))
            }
            None => Ok(None)
        }
    }

    async fn create_race(&self, new: NewRace) -> Result<Race, StoreError> {
        self.begin().await?;

        let created = async {
            let row = self
                .client
                .query_one(
                    "INSERT INTO races (name, season, policy, commission_rate, organizer_fee, final_pot_cut, \
                     created_at) VALUES ($1, $2, $3, $4, 0, 0, now()) \
                     RETURNING id, name, season, policy, commission_rate, organizer_fee, final_pot_cut, \
                     resolved_at, created_at",
                    &[&new.name, &new.season, &(new.policy as i32), &(new.commission_rate as i32)]
                )
                .await?;
            let mut race = Self::race_from_row(&row);

            for entrant in &new.entrants {
                self.client
                    .execute(
                        "INSERT INTO race_results (race_id, driver_id, stake, finish_position, payout) \
                         VALUES ($1, $2, $3, NULL, 0)",
                        &[&race.id, &entrant.driver_id, &entrant.stake]
                    )
                    .await?;
            }

            race.results = self.race_results(race.id).await?;
            Ok::<Race, StoreError>(race)
        }
        .await;

        match created {
            Ok(race) => {
                self.commit().await?;
                info!(race_id = race.id, entrants = race.results.len(), "race row created");
                Ok(race)
            }
            Err(e) => {
                self.rollback().await;
                Err(e)
            }
        }
    }

    async fn apply_race_settlement(&self, plan: &RaceSettlementPlan) -> Result<Race, StoreError> {
        self.begin().await?;

        match self.apply_race_settlement_tx(plan).await {
            Ok(()) => {
                self.commit().await?;
            }
            Err(e) => {
                self.rollback().await;
                return Err(e);
            }
        }

        self.find_race(plan.race_id).await?.ok_or(StoreError::NotFound {
            entity: "race",
            id: plan.race_id
        })
    }
}

impl ChallengeStore for DbClient {
    async fn find_challenge(&self, id: i32) -> Result<Option<Challenge>, StoreError> {
        let query = format!("SELECT {} FROM challenges WHERE id = $1", CHALLENGE_COLUMNS);
        let row = self.client.query_opt(query.as_str(), &[&id]).await?;

        Ok(row.as_ref().map(Self::challenge_from_row))
    }

    async fn create_challenge(&self, new: NewChallenge) -> Result<Challenge, StoreError> {
        let query = format!(
            "INSERT INTO challenges (season, challenger_id, opponent_id, stake, total_pool, \
             organizer_fee, winner_prize, status, winner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, now(), now()) RETURNING {}",
            CHALLENGE_COLUMNS
        );
        let row = self
            .client
            .query_one(
                query.as_str(),
                &[
                    &new.season,
                    &new.challenger_id,
                    &new.opponent_id,
                    &new.stake,
                    &new.total_pool,
                    &new.organizer_fee,
                    &new.winner_prize,
                    &(ChallengeStatus::Pending as i32)
                ]
            )
            .await?;

        Ok(Self::challenge_from_row(&row))
    }

    async fn transition_challenge(&self, id: i32, status: ChallengeStatus) -> Result<Challenge, StoreError> {
        let query = format!(
            "UPDATE challenges SET status = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            CHALLENGE_COLUMNS
        );
        let row = self.client.query_opt(query.as_str(), &[&id, &(status as i32)]).await?;

        row.as_ref()
            .map(Self::challenge_from_row)
            .ok_or(StoreError::NotFound { entity: "challenge", id })
    }

    async fn apply_challenge_resolution(&self, plan: &ChallengeResolutionPlan) -> Result<Challenge, StoreError> {
        self.begin().await?;

        match self.apply_challenge_resolution_tx(plan).await {
            Ok(()) => {
                self.commit().await?;
            }
            Err(e) => {
                self.rollback().await;
                return Err(e);
            }
        }

        self.find_challenge(plan.challenge_id).await?.ok_or(StoreError::NotFound {
            entity: "challenge",
            id: plan.challenge_id
        })
    }

    async fn delete_challenge(&self, id: i32) -> Result<(), StoreError> {
        let deleted = self.client.execute("DELETE FROM challenges WHERE id = $1", &[&id]).await?;

        if deleted != 1 {
            return Err(StoreError::NotFound { entity: "challenge", id });
        }
        Ok(())
    }
}

impl SeasonStore for DbClient {
    async fn current_season(&self) -> Result<i32, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT number FROM seasons WHERE closed_at IS NULL ORDER BY number DESC LIMIT 1",
                &[]
            )
            .await?;

        match row {
            Some(row) => Ok(row.get("number")),
            None => {
                // Fresh database: open season 1
                let row = self
                    .client
                    .query_one(
                        "INSERT INTO seasons (number, race_count, challenge_count, final_pot) \
                         VALUES (1, 0, 0, 0) RETURNING number",
                        &[]
                    )
                    .await?;
                Ok(row.get("number"))
            }
        }
    }

    async fn stats(&self, season: i32) -> Result<SeasonStats, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT number, race_count, challenge_count, final_pot FROM seasons WHERE number = $1",
                &[&season]
            )
            .await?;

        row.map(|row| SeasonStats {
            season: row.get("number"),
            race_count: row.get("race_count"),
            challenge_count: row.get("challenge_count"),
            final_pot: row.get("final_pot")
        })
        .ok_or(StoreError::NotFound {
            entity: "season",
            id: season
        })
    }

    async fn close_season(&self, season: i32, mutations: &[DriverMutation]) -> Result<(), StoreError> {
        self.begin().await?;

        match self.close_season_tx(season, mutations).await {
            Ok(()) => {
                self.commit().await?;
                info!(season, "season closed");
                Ok(())
            }
            Err(e) => {
                self.rollback().await;
                Err(e)
            }
        }
    }
}

impl ConfigStore for DbClient {
    async fn ranking_config(&self) -> Result<RankingConfig, StoreError> {
        let row = self
            .client
            .query_opt("SELECT * FROM ranking_config WHERE id = 1", &[])
            .await?;

        // A database that has never been configured runs on the defaults
        Ok(row.as_ref().map(Self::config_from_row).unwrap_or_default())
    }

    async fn update_ranking_config(&self, config: RankingConfig) -> Result<RankingConfig, StoreError> {
        let params: Vec<&(dyn ToSql + Sync)> = vec![
            &config.rating_floor,
            &config.gap_threshold,
            &config.strong_win_delta,
            &config.strong_loss_delta,
            &config.even_win_delta,
            &config.even_loss_delta,
            &config.weak_win_delta,
            &config.weak_loss_delta,
            &config.race_points_first,
            &config.race_points_second,
            &config.race_points_third,
            &config.race_points_other,
        ];

        let row = self
            .client
            .query_one(
                "INSERT INTO ranking_config (id, rating_floor, gap_threshold, strong_win_delta, \
                 strong_loss_delta, even_win_delta, even_loss_delta, weak_win_delta, weak_loss_delta, \
                 race_points_first, race_points_second, race_points_third, race_points_other) \
                 VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                 ON CONFLICT (id) DO UPDATE SET rating_floor = $1, gap_threshold = $2, \
                 strong_win_delta = $3, strong_loss_delta = $4, even_win_delta = $5, even_loss_delta = $6, \
                 weak_win_delta = $7, weak_loss_delta = $8, race_points_first = $9, race_points_second = $10, \
                 race_points_third = $11, race_points_other = $12 RETURNING *",
                &params
            )
            .await?;

        Ok(Self::config_from_row(&row))
    }
}
