//! Draw and trip advantage points.
//!
//! Everything here reads the runner's draw, the course's gate-bias tables
//! and the shape of the last couple of runs. The deltas are small on purpose;
//! unlike the blood points they are fed into the composite unstandardized.

use crate::course::{
    GATE_INNER_MINUS, GATE_INNER_PLUS, GATE_MID_PLUS, GATE_OUTER_MINUS, GATE_OUTER_PLUS,
    GATE_WIDE_MINUS, GATE_WIDE_PLUS, Surface, dirt_course_in,
};
use crate::recency::RecencyFeatures;
use crate::results::RaceRow;

pub fn advantage_points(race: &RaceRow, recency: &RecencyFeatures) -> i32 {
    let mut points = 0;

    let last_finish = recency.last.as_ref().and_then(|l| l.finish);
    let last_post = recency.last.as_ref().and_then(|l| l.post);
    let second_finish = recency.second.as_ref().and_then(|s| s.finish);

    // A horse that ran well when stepping up in trip last time tends to be
    // overbet today.
    if matches!(recency.dist_step_prev(), Some(step) if step > 0)
        && matches!(last_finish, Some(pos) if pos <= 3)
    {
        points -= 2;
    }
    // Ran well two back on a step-up, flopped last time: rebound candidate.
    if matches!(recency.dist_step_prev2(), Some(step) if step > 0)
        && matches!(second_finish, Some(pos) if pos <= 3)
        && matches!(last_finish, Some(pos) if pos >= 5)
    {
        points += 1;
    }

    let course = race.course;
    let post = race.post;
    if post <= 4 && dirt_course_in(course, GATE_INNER_PLUS) {
        points += 1;
    }
    if (5..=9).contains(&post) && dirt_course_in(course, GATE_MID_PLUS) {
        points += 1;
    }
    if (10..=14).contains(&post) && dirt_course_in(course, GATE_OUTER_PLUS) {
        points += 1;
    }
    if post >= 15 && dirt_course_in(course, GATE_WIDE_PLUS) {
        points += 1;
    }
    if post <= 4 && dirt_course_in(course, GATE_INNER_MINUS) {
        points -= 1;
    }
    if (10..=14).contains(&post) && dirt_course_in(course, GATE_OUTER_MINUS) {
        points -= 1;
    }
    if post >= 15 && dirt_course_in(course, GATE_WIDE_MINUS) {
        points -= 1;
    }

    // Draw switch penalties: an inside-draw success does not carry to a wide
    // draw on turf, nor a wide-draw success to an inside draw on dirt.
    if course.surface == Surface::Turf
        && matches!(last_post, Some(p) if p <= 5)
        && matches!(last_finish, Some(pos) if pos <= 4)
        && post >= 14
    {
        points -= 1;
    }
    if course.surface == Surface::Dirt
        && post <= 5
        && matches!(last_finish, Some(pos) if pos <= 3)
        && matches!(last_post, Some(p) if p >= 14)
    {
        points -= 1;
    }

    // A wire-to-wire win rarely repeats.
    if recency
        .last
        .as_ref()
        .is_some_and(|l| l.first_corner == Some(1) && l.finish == Some(1))
    {
        points -= 1;
    }

    if recency.winning_seasons.contains(&race.season) {
        points += 1;
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{Course, Venue};
    use crate::recency::LastRun;
    use crate::results::{Season, Sex};
    use chrono::NaiveDate;

    fn race(course: Course, post: u32, season: Season) -> RaceRow {
        RaceRow {
            race_id: 1,
            horse_id: "h1".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 5, 31).unwrap(),
            season,
            course,
            post,
            sex: Sex::Male,
            age: 4,
            finish: None,
            win_odds: None,
            popularity: None,
            jockey_id: "j".to_string(),
            trainer_id: "t".to_string(),
            field_size: 16,
        }
    }

    fn last(post: u32, finish: u32, first_corner: u32, distance: u32) -> LastRun {
        LastRun {
            post: Some(post),
            popularity: Some(3),
            body_weight: Some(480.0),
            finish: Some(finish),
            margin: Some(0.2),
            date: NaiveDate::from_ymd_opt(2020, 4, 19).unwrap(),
            distance,
            first_corner: Some(first_corner),
            final_furlong: Some(34.5),
        }
    }

    #[test]
    fn inner_gate_bonus_on_biased_dirt_course() {
        let course = Course::new(Venue::Tokyo, Surface::Dirt, 1300);
        let r = race(course, 2, Season::Winter);
        assert_eq!(advantage_points(&r, &RecencyFeatures::default()), 1);
        // Same course, mid gate: the mid table also lists it.
        let r = race(course, 7, Season::Winter);
        assert_eq!(advantage_points(&r, &RecencyFeatures::default()), 1);
        // Wide gate: no table lists it.
        let r = race(course, 15, Season::Winter);
        assert_eq!(advantage_points(&r, &RecencyFeatures::default()), 0);
    }

    #[test]
    fn wire_to_wire_win_is_penalized() {
        let course = Course::new(Venue::Tokyo, Surface::Turf, 1600);
        let r = race(course, 6, Season::Winter);
        let mut recency = RecencyFeatures::default();
        recency.last = Some(last(6, 1, 1, 1600));
        assert_eq!(advantage_points(&r, &recency), -1);
    }

    #[test]
    fn season_match_earns_a_point() {
        let course = Course::new(Venue::Tokyo, Surface::Turf, 1600);
        let r = race(course, 6, Season::Spring);
        let mut recency = RecencyFeatures::default();
        recency.winning_seasons.insert(Season::Spring);
        assert_eq!(advantage_points(&r, &recency), 1);
    }

    #[test]
    fn wide_draw_after_inside_success_on_turf() {
        let course = Course::new(Venue::Tokyo, Surface::Turf, 1600);
        let r = race(course, 15, Season::Winter);
        let mut recency = RecencyFeatures::default();
        recency.last = Some(last(3, 2, 4, 1600));
        assert_eq!(advantage_points(&r, &recency), -1);
    }

    #[test]
    fn step_up_success_last_time_is_discounted() {
        let course = Course::new(Venue::Tokyo, Surface::Turf, 2000);
        let r = race(course, 6, Season::Winter);
        let mut recency = RecencyFeatures::default();
        recency.last = Some(last(6, 2, 3, 1800));
        recency.second = Some(crate::recency::PriorRun {
            norm_finish: Some(0.7),
            finish: Some(4),
            margin: Some(0.3),
            date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            distance: 2000,
            final_furlong: Some(34.8),
        });
        // Second run was 2000m, last 1800m: step_prev = +200 with a top-3
        // finish last time.
        assert_eq!(advantage_points(&r, &recency), -2);
    }
}
