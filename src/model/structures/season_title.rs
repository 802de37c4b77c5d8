use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumIter;

/// Titles handed out when a season closes. Only the podium earns one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum SeasonTitle {
    KingOfTheStreets,
    EliteRunner,
    NightPredator
}

impl SeasonTitle {
    pub fn for_position(position: i32) -> Option<SeasonTitle> {
        match position {
            1 => Some(SeasonTitle::KingOfTheStreets),
            2 => Some(SeasonTitle::EliteRunner),
            3 => Some(SeasonTitle::NightPredator),
            _ => None
        }
    }
}

impl fmt::Display for SeasonTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeasonTitle::KingOfTheStreets => "King of the Streets",
            SeasonTitle::EliteRunner => "Elite Runner",
            SeasonTitle::NightPredator => "Night Predator"
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::SeasonTitle;

    #[test]
    fn test_podium_titles() {
        assert_eq!(SeasonTitle::for_position(1), Some(SeasonTitle::KingOfTheStreets));
        assert_eq!(SeasonTitle::for_position(2), Some(SeasonTitle::EliteRunner));
        assert_eq!(SeasonTitle::for_position(3), Some(SeasonTitle::NightPredator));
    }

    #[test]
    fn test_no_title_past_podium() {
        assert_eq!(SeasonTitle::for_position(4), None);
        assert_eq!(SeasonTitle::for_position(0), None);
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(SeasonTitle::KingOfTheStreets.to_string(), "King of the Streets");
        assert_eq!(SeasonTitle::EliteRunner.to_string(), "Elite Runner");
        assert_eq!(SeasonTitle::NightPredator.to_string(), "Night Predator");
    }
}
