use thiserror::Error;

/// Validation failures raised by the calculators and the settlement
/// orchestrator. Every variant maps to the stable code the web layer
/// surfaces to clients; storage failures are a separate category
/// ([`crate::store::StoreError`]) and are never folded into this enum.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DomainError {
    #[error("stake must be a positive integer")]
    InvalidStake,

    #[error("commission rate is not one of the allowed values")]
    InvalidCommissionRate,

    #[error("a race requires at least three drivers")]
    InsufficientParticipants,

    #[error("rating is below the floor")]
    RatingBelowFloor,

    #[error("a driver cannot challenge themselves")]
    SameParticipant,

    #[error("challenge is not active")]
    ChallengeNotActive,

    #[error("challenge is not pending")]
    ChallengeNotPending,

    #[error("challenge has already been resolved")]
    ChallengeAlreadyResolved,

    #[error("winner is not a participant of this challenge")]
    WinnerNotParticipant,

    #[error("no drivers in the ranking")]
    NoDrivers,

    #[error("driver not found")]
    DriverNotFound,

    #[error("challenge not found")]
    ChallengeNotFound,

    #[error("race not found")]
    RaceNotFound,

    #[error("race has already been resolved")]
    RaceAlreadyResolved,

    #[error("finish order does not match the registered stakes")]
    StakesMismatch
}

impl DomainError {
    /// Stable identifier surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidStake => "INVALID_STAKE",
            DomainError::InvalidCommissionRate => "INVALID_COMMISSION_RATE",
            DomainError::InsufficientParticipants => "INSUFFICIENT_DRIVERS",
            DomainError::RatingBelowFloor => "RATING_BELOW_FLOOR",
            DomainError::SameParticipant => "SAME_DRIVER",
            DomainError::ChallengeNotActive => "CHALLENGE_NOT_ACTIVE",
            DomainError::ChallengeNotPending => "CHALLENGE_NOT_PENDING",
            DomainError::ChallengeAlreadyResolved => "CHALLENGE_ALREADY_RESOLVED",
            DomainError::WinnerNotParticipant => "WINNER_NOT_PARTICIPANT",
            DomainError::NoDrivers => "NO_DRIVERS",
            DomainError::DriverNotFound => "DRIVER_NOT_FOUND",
            DomainError::ChallengeNotFound => "CHALLENGE_NOT_FOUND",
            DomainError::RaceNotFound => "RACE_NOT_FOUND",
            DomainError::RaceAlreadyResolved => "RACE_ALREADY_RESOLVED",
            DomainError::StakesMismatch => "STAKES_MISMATCH"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DomainError;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DomainError::InvalidStake.code(), "INVALID_STAKE");
        assert_eq!(DomainError::InsufficientParticipants.code(), "INSUFFICIENT_DRIVERS");
        assert_eq!(DomainError::SameParticipant.code(), "SAME_DRIVER");
        assert_eq!(DomainError::ChallengeAlreadyResolved.code(), "CHALLENGE_ALREADY_RESOLVED");
    }

    #[test]
    fn test_display_is_human_readable() {
        assert_eq!(DomainError::NoDrivers.to_string(), "no drivers in the ranking");
    }
}
