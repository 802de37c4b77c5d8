use crate::model::structures::{
    challenge_status::ChallengeStatus, commission_rate::CommissionRate, race_policy::RacePolicy
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Driver {
    pub id: i32,
    /// Short unique scene tag, e.g. "GHST"
    pub tag: String,
    pub name: String,
    pub rating: i32,
    pub balance: i64,
    /// Archived drivers keep their record but drop out of the ranking
    pub archived: bool,
    pub created_at: DateTime<FixedOffset>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDriver {
    pub tag: String,
    pub name: String
}

/// Partial driver update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct DriverPatch {
    pub rating: Option<i32>,
    pub balance: Option<i64>,
    pub archived: Option<bool>
}

#[derive(Debug, Clone, Serialize)]
pub struct Race {
    pub id: i32,
    pub name: String,
    pub season: i32,
    pub policy: RacePolicy,
    pub commission_rate: CommissionRate,
    /// Zero until the race is settled
    pub organizer_fee: i64,
    /// Zero until the race is settled
    pub final_pot_cut: i64,
    pub resolved_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub results: Vec<RaceResult>
}

#[derive(Debug, Clone, Serialize)]
pub struct RaceResult {
    pub driver_id: i32,
    pub stake: i64,
    /// Assigned when the race is settled, 1-based finish order
    pub position: Option<i32>,
    pub payout: i64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceEntrant {
    pub driver_id: i32,
    pub stake: i64
}

#[derive(Debug, Clone)]
pub struct NewRace {
    pub name: String,
    pub season: i32,
    pub policy: RacePolicy,
    pub commission_rate: CommissionRate,
    pub entrants: Vec<RaceEntrant>
}

#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub id: i32,
    pub season: i32,
    pub challenger_id: i32,
    pub opponent_id: i32,
    /// Per-driver stake; the pool is twice this
    pub stake: i64,
    pub total_pool: i64,
    pub organizer_fee: i64,
    pub winner_prize: i64,
    pub status: ChallengeStatus,
    pub winner_id: Option<i32>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>
}

#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub season: i32,
    pub challenger_id: i32,
    pub opponent_id: i32,
    pub stake: i64,
    pub total_pool: i64,
    pub organizer_fee: i64,
    pub winner_prize: i64
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeasonStats {
    pub season: i32,
    pub race_count: i32,
    pub challenge_count: i32,
    /// House pot accumulated from settlement skims this season
    pub final_pot: i64
}

/// One driver's guarded mutation inside a settlement plan. The store applies
/// the new values only while the row still matches the snapshot the plan was
/// computed from, and fails the whole plan otherwise.
#[derive(Debug, Clone, Copy)]
pub struct DriverMutation {
    pub driver_id: i32,
    pub expected_rating: i32,
    pub expected_balance: i64,
    pub new_rating: i32,
    pub balance_credit: i64
}

#[derive(Debug, Clone, Copy)]
pub struct PlacedResult {
    pub driver_id: i32,
    pub position: i32,
    pub payout: i64
}

/// Everything a finished race settlement persists, applied as one
/// transaction: positions and payouts, driver mutations, the fee fields on
/// the race row and the season accounting.
#[derive(Debug, Clone)]
pub struct RaceSettlementPlan {
    pub race_id: i32,
    pub season: i32,
    pub organizer_fee: i64,
    pub final_pot_cut: i64,
    pub results: Vec<PlacedResult>,
    pub mutations: Vec<DriverMutation>
}

/// Atomic unit for resolving a challenge: winner credit, two rating
/// mutations and the terminal transition.
#[derive(Debug, Clone)]
pub struct ChallengeResolutionPlan {
    pub challenge_id: i32,
    pub season: i32,
    pub winner_id: i32,
    pub mutations: Vec<DriverMutation>
}
