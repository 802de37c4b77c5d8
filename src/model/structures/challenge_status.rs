use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::EnumIter;

/// Lifecycle of a head-to-head wager. Transitions are monotonic:
/// Pending -> Active -> Resolved, with Cancelled reachable from Pending or
/// Active. Resolved and Cancelled are terminal. The transition rules live
/// in [`crate::model::challenge`].
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[repr(u8)]
pub enum ChallengeStatus {
    Pending = 0,
    Active = 1,
    Resolved = 2,
    Cancelled = 3
}

impl ChallengeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChallengeStatus::Resolved | ChallengeStatus::Cancelled)
    }
}

impl TryFrom<i32> for ChallengeStatus {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ChallengeStatus::Pending),
            1 => Ok(ChallengeStatus::Active),
            2 => Ok(ChallengeStatus::Resolved),
            3 => Ok(ChallengeStatus::Cancelled),
            _ => Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ChallengeStatus;
    use strum::IntoEnumIterator;

    #[test]
    fn test_convert_pending() {
        assert_eq!(ChallengeStatus::try_from(0), Ok(ChallengeStatus::Pending));
    }

    #[test]
    fn test_convert_active() {
        assert_eq!(ChallengeStatus::try_from(1), Ok(ChallengeStatus::Active));
    }

    #[test]
    fn test_convert_resolved() {
        assert_eq!(ChallengeStatus::try_from(2), Ok(ChallengeStatus::Resolved));
    }

    #[test]
    fn test_convert_cancelled() {
        assert_eq!(ChallengeStatus::try_from(3), Ok(ChallengeStatus::Cancelled));
    }

    #[test]
    fn test_convert_invalid() {
        assert_eq!(ChallengeStatus::try_from(4), Err(()));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ChallengeStatus::Pending.is_terminal());
        assert!(!ChallengeStatus::Active.is_terminal());
        assert!(ChallengeStatus::Resolved.is_terminal());
        assert!(ChallengeStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_enumerate() {
        let statuses = ChallengeStatus::iter().collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![
                ChallengeStatus::Pending,
                ChallengeStatus::Active,
                ChallengeStatus::Resolved,
                ChallengeStatus::Cancelled
            ]
        );
    }
}
