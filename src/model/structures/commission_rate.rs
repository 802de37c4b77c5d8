use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::EnumIter;

use crate::model::error::DomainError;

/// Organizer commission for a race, as a whole percentage of the pool.
/// Only the enumerated values are legal; challenges use their own fixed
/// rate and never go through this type.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[repr(u8)]
pub enum CommissionRate {
    TwentyFivePercent = 25,
    ThirtyPercent = 30
}

impl CommissionRate {
    /// The rate as the fraction applied to the pool.
    pub fn as_fraction(&self) -> f64 {
        *self as u8 as f64 / 100.0
    }
}

impl TryFrom<i32> for CommissionRate {
    type Error = DomainError;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            25 => Ok(CommissionRate::TwentyFivePercent),
            30 => Ok(CommissionRate::ThirtyPercent),
            _ => Err(DomainError::InvalidCommissionRate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CommissionRate;
    use crate::model::error::DomainError;
    use strum::IntoEnumIterator;

    #[test]
    fn test_convert_twenty_five() {
        assert_eq!(CommissionRate::try_from(25), Ok(CommissionRate::TwentyFivePercent));
    }

    #[test]
    fn test_convert_thirty() {
        assert_eq!(CommissionRate::try_from(30), Ok(CommissionRate::ThirtyPercent));
    }

    #[test]
    fn test_convert_invalid() {
        assert_eq!(CommissionRate::try_from(20), Err(DomainError::InvalidCommissionRate));
        assert_eq!(CommissionRate::try_from(0), Err(DomainError::InvalidCommissionRate));
    }

    #[test]
    fn test_fraction() {
        assert_eq!(CommissionRate::TwentyFivePercent.as_fraction(), 0.25);
        assert_eq!(CommissionRate::ThirtyPercent.as_fraction(), 0.30);
    }

    #[test]
    fn test_enumerate() {
        let rates = CommissionRate::iter().collect::<Vec<_>>();
        assert_eq!(rates, vec![CommissionRate::TwentyFivePercent, CommissionRate::ThirtyPercent]);
    }
}
