use crate::model::{
    constants::{KING_RATING_BONUS, NIGHT_PREDATOR_RATING_BONUS},
    error::DomainError,
    structures::season_title::SeasonTitle
};

/// A driver's standing in the ranking snapshot taken at season close.
#[derive(Debug, Clone, Copy)]
pub struct SeasonStanding {
    pub driver_id: i32,
    pub position: i32,
    pub rating: i32
}

/// Reward handed to one driver when a season closes. The pot share is a
/// hint for the accounting page, not a payout the engine performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonReward {
    pub driver_id: i32,
    pub title: Option<SeasonTitle>,
    pub rating_bonus: i32,
    pub pot_share_min: u8,
    pub pot_share_max: u8,
    pub privilege: Option<&'static str>
}

/// Computes the end-of-season rewards for the supplied standings. Standings
/// are returned in position order; anything past the podium gets the no-op
/// reward.
pub fn compute_rewards(standings: &[SeasonStanding]) -> Result<Vec<SeasonReward>, DomainError> {
    if standings.is_empty() {
        return Err(DomainError::NoDrivers);
    }

    let mut sorted = standings.to_vec();
    sorted.sort_by_key(|s| s.position);

    Ok(sorted.iter().map(reward_for).collect())
}

fn reward_for(standing: &SeasonStanding) -> SeasonReward {
    match standing.position {
        1 => SeasonReward {
            driver_id: standing.driver_id,
            title: Some(SeasonTitle::KingOfTheStreets),
            rating_bonus: KING_RATING_BONUS,
            pot_share_min: 60,
            pot_share_max: 70,
            privilege: Some("Can run VIP races")
        },
        2 => SeasonReward {
            driver_id: standing.driver_id,
            title: Some(SeasonTitle::EliteRunner),
            rating_bonus: 0,
            pot_share_min: 20,
            pot_share_max: 25,
            privilege: Some("-50% buy-in next season")
        },
        3 => SeasonReward {
            driver_id: standing.driver_id,
            title: Some(SeasonTitle::NightPredator),
            rating_bonus: NIGHT_PREDATOR_RATING_BONUS,
            pot_share_min: 10,
            pot_share_max: 15,
            privilege: None
        },
        _ => SeasonReward {
            driver_id: standing.driver_id,
            title: None,
            rating_bonus: 0,
            pot_share_min: 0,
            pot_share_max: 0,
            privilege: None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_rewards, SeasonStanding};
    use crate::model::{error::DomainError, structures::season_title::SeasonTitle};

    fn standing(driver_id: i32, position: i32) -> SeasonStanding {
        SeasonStanding {
            driver_id,
            position,
            rating: 1000
        }
    }

    #[test]
    fn test_podium_rewards() {
        let rewards = compute_rewards(&[standing(10, 1), standing(20, 2), standing(30, 3)]).unwrap();

        assert_eq!(rewards[0].title, Some(SeasonTitle::KingOfTheStreets));
        assert_eq!(rewards[0].rating_bonus, 50);
        assert_eq!((rewards[0].pot_share_min, rewards[0].pot_share_max), (60, 70));

        assert_eq!(rewards[1].title, Some(SeasonTitle::EliteRunner));
        assert_eq!(rewards[1].rating_bonus, 0);

        assert_eq!(rewards[2].title, Some(SeasonTitle::NightPredator));
        assert_eq!(rewards[2].rating_bonus, 25);
    }

    #[test]
    fn test_rewards_follow_position_not_input_order() {
        let rewards = compute_rewards(&[standing(30, 3), standing(10, 1), standing(20, 2)]).unwrap();

        assert_eq!(rewards[0].driver_id, 10);
        assert_eq!(rewards[1].driver_id, 20);
        assert_eq!(rewards[2].driver_id, 30);
    }

    #[test]
    fn test_past_podium_is_a_no_op() {
        let rewards = compute_rewards(&[standing(1, 1), standing(4, 4)]).unwrap();

        assert_eq!(rewards[1].title, None);
        assert_eq!(rewards[1].rating_bonus, 0);
        assert_eq!(rewards[1].privilege, None);
    }

    #[test]
    fn test_empty_ranking() {
        assert_eq!(compute_rewards(&[]), Err(DomainError::NoDrivers));
    }

    #[test]
    fn test_privileges() {
        let rewards = compute_rewards(&[standing(1, 1), standing(2, 2), standing(3, 3)]).unwrap();

        assert_eq!(rewards[0].privilege, Some("Can run VIP races"));
        assert_eq!(rewards[1].privilege, Some("-50% buy-in next season"));
        assert_eq!(rewards[2].privilege, None);
    }
}
