use crate::model::{
    constants::CHALLENGE_COMMISSION_RATE, error::DomainError, structures::challenge_status::ChallengeStatus
};

/// Monetary breakdown of a head-to-head wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeFinance {
    pub total_pool: i64,
    pub organizer_fee: i64,
    pub winner_prize: i64
}

/// Splits a challenge pool. Both drivers stake the same amount; the house
/// takes its fixed commission off the top and the rest goes to the winner.
pub fn split_pool(stake: i64) -> Result<ChallengeFinance, DomainError> {
    if stake <= 0 {
        return Err(DomainError::InvalidStake);
    }

    let total_pool = stake * 2;
    let organizer_fee = (total_pool as f64 * CHALLENGE_COMMISSION_RATE).floor() as i64;

    Ok(ChallengeFinance {
        total_pool,
        organizer_fee,
        winner_prize: total_pool - organizer_fee
    })
}

/// Pending -> Active. Anything else is a failed activation.
pub fn activate(status: ChallengeStatus) -> Result<ChallengeStatus, DomainError> {
    match status {
        ChallengeStatus::Pending => Ok(ChallengeStatus::Active),
        _ => Err(DomainError::ChallengeNotPending)
    }
}

/// Active -> Resolved. Resolving twice is reported distinctly from
/// resolving a challenge that never became active.
pub fn resolve(status: ChallengeStatus) -> Result<ChallengeStatus, DomainError> {
    match status {
        ChallengeStatus::Active => Ok(ChallengeStatus::Resolved),
        ChallengeStatus::Resolved => Err(DomainError::ChallengeAlreadyResolved),
        ChallengeStatus::Pending | ChallengeStatus::Cancelled => Err(DomainError::ChallengeNotActive)
    }
}

/// Pending | Active -> Cancelled. Terminal states stay terminal.
pub fn cancel(status: ChallengeStatus) -> Result<ChallengeStatus, DomainError> {
    match status {
        ChallengeStatus::Pending | ChallengeStatus::Active => Ok(ChallengeStatus::Cancelled),
        ChallengeStatus::Resolved => Err(DomainError::ChallengeAlreadyResolved),
        ChallengeStatus::Cancelled => Err(DomainError::ChallengeNotActive)
    }
}

#[cfg(test)]
mod tests {
    use super::{activate, cancel, resolve, split_pool};
    use crate::model::{error::DomainError, structures::challenge_status::ChallengeStatus};

    #[test]
    fn test_split_pool() {
        let finance = split_pool(1000).unwrap();

        assert_eq!(finance.total_pool, 2000);
        assert_eq!(finance.organizer_fee, 300);
        assert_eq!(finance.winner_prize, 1700);
    }

    #[test]
    fn test_split_pool_floors_the_fee() {
        // 2 * 333 = 666; 15% of 666 is 99.9, floored to 99
        let finance = split_pool(333).unwrap();

        assert_eq!(finance.organizer_fee, 99);
        assert_eq!(finance.winner_prize, 567);
    }

    #[test]
    fn test_split_pool_rejects_bad_stake() {
        assert_eq!(split_pool(0), Err(DomainError::InvalidStake));
        assert_eq!(split_pool(-100), Err(DomainError::InvalidStake));
    }

    #[test]
    fn test_activate() {
        assert_eq!(activate(ChallengeStatus::Pending), Ok(ChallengeStatus::Active));
        assert_eq!(activate(ChallengeStatus::Active), Err(DomainError::ChallengeNotPending));
        assert_eq!(activate(ChallengeStatus::Resolved), Err(DomainError::ChallengeNotPending));
        assert_eq!(activate(ChallengeStatus::Cancelled), Err(DomainError::ChallengeNotPending));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve(ChallengeStatus::Active), Ok(ChallengeStatus::Resolved));
        assert_eq!(resolve(ChallengeStatus::Pending), Err(DomainError::ChallengeNotActive));
        assert_eq!(resolve(ChallengeStatus::Cancelled), Err(DomainError::ChallengeNotActive));
    }

    #[test]
    fn test_resolve_twice() {
        let resolved = resolve(ChallengeStatus::Active).unwrap();
        assert_eq!(resolve(resolved), Err(DomainError::ChallengeAlreadyResolved));
    }

    #[test]
    fn test_cancel() {
        assert_eq!(cancel(ChallengeStatus::Pending), Ok(ChallengeStatus::Cancelled));
        assert_eq!(cancel(ChallengeStatus::Active), Ok(ChallengeStatus::Cancelled));
    }

    #[test]
    fn test_cancel_after_resolution() {
        assert_eq!(cancel(ChallengeStatus::Resolved), Err(DomainError::ChallengeAlreadyResolved));
    }

    #[test]
    fn test_cancel_twice() {
        let cancelled = cancel(ChallengeStatus::Pending).unwrap();
        assert_eq!(cancel(cancelled), Err(DomainError::ChallengeNotActive));
    }
}
