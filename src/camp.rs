//! Jockey/trainer track-record points.

use std::collections::HashSet;

/// Riders with a standing plus against the market.
static PLUS_JOCKEYS: &[&str] = &[
    "01126", "05339", "01014", "01075", "01088", "01102", "01093", "05386", "00666",
];

/// Stables with a standing plus against the market.
static PLUS_TRAINERS: &[&str] = &[
    "01148", "01092", "01075", "00438", "01105", "01086", "01002", "01126",
];

pub fn jockey_points(jockey_id: &str, winning_jockeys: &HashSet<String>) -> i32 {
    let mut points = 0;
    if PLUS_JOCKEYS.iter().any(|id| *id == jockey_id) {
        points += 2;
    }
    if winning_jockeys.contains(jockey_id) {
        points += 2;
    }
    points
}

pub fn trainer_points(trainer_id: &str) -> i32 {
    if PLUS_TRAINERS.iter().any(|id| *id == trainer_id) {
        2
    } else {
        0
    }
}

/// Combined camp points: rider plus stable.
pub fn camp_points(jockey_id: &str, trainer_id: &str, winning_jockeys: &HashSet<String>) -> i32 {
    jockey_points(jockey_id, winning_jockeys) + trainer_points(trainer_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_jockey_and_reunion_stack() {
        let mut winning = HashSet::new();
        winning.insert("01088".to_string());
        assert_eq!(jockey_points("01088", &winning), 4);
        assert_eq!(jockey_points("01088", &HashSet::new()), 2);
        assert_eq!(jockey_points("09999", &winning), 0);
    }

    #[test]
    fn camp_combines_rider_and_stable() {
        let winning = HashSet::new();
        assert_eq!(camp_points("05339", "01148", &winning), 4);
        assert_eq!(camp_points("09999", "09999", &winning), 0);
    }
}
