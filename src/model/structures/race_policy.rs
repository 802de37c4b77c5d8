use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::EnumIter;

/// Which settlement flow a race uses. Chosen when the race is created and
/// persisted on the race row; the two flows are never mixed.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[repr(u8)]
pub enum RacePolicy {
    /// Podium payouts plus a chain of pairwise rating updates over the
    /// whole finish order
    StakeWeighted = 0,
    /// Podium payouts plus flat config-driven rating points, no chain
    PodiumOnly = 1
}

impl TryFrom<i32> for RacePolicy {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(RacePolicy::StakeWeighted),
            1 => Ok(RacePolicy::PodiumOnly),
            _ => Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RacePolicy;

    #[test]
    fn test_convert_stake_weighted() {
        assert_eq!(RacePolicy::try_from(0), Ok(RacePolicy::StakeWeighted));
    }

    #[test]
    fn test_convert_podium_only() {
        assert_eq!(RacePolicy::try_from(1), Ok(RacePolicy::PodiumOnly));
    }

    #[test]
    fn test_convert_invalid() {
        assert_eq!(RacePolicy::try_from(2), Err(()));
    }
}
