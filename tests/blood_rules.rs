use chrono::NaiveDate;

use keiba_quinella::blood_score::blood_points;
use keiba_quinella::course::{Course, Surface, Venue};
use keiba_quinella::pedigree::PedigreeProfile;
use keiba_quinella::recency::RecencyFeatures;
use keiba_quinella::results::{RaceRow, Season, Sex};

/// A profile with the given sire head and no other active blood group.
/// Sunday Silence sits in the dam-dam line so the non-Sunday type rules
/// stay out of the way.
fn profile_with_sire(sire: &str) -> PedigreeProfile {
    let sire_line = [
        sire.to_string(),
        "q1".to_string(),
        "q2".to_string(),
        "q3".to_string(),
        "q4".to_string(),
    ];
    let quiet = ["q5", "q6", "q7", "q8", "q9"].map(|n| n.to_string());
    let dam_dam = [
        "q5".to_string(),
        "q6".to_string(),
        "サンデーサイレンス1986".to_string(),
        "q8".to_string(),
        "q9".to_string(),
    ];
    PedigreeProfile::from_lines("horse", &[sire_line, quiet.clone(), quiet, dam_dam])
}

fn race_at(venue: Venue, surface: Surface, distance: u32, sex: Sex) -> RaceRow {
    RaceRow {
        race_id: 1,
        horse_id: "horse".to_string(),
        date: NaiveDate::from_ymd_opt(2020, 10, 11).unwrap(),
        season: Season::Autumn,
        course: Course::new(venue, surface, distance),
        post: 5,
        sex,
        age: 4,
        finish: None,
        win_odds: None,
        popularity: None,
        jockey_id: "j".to_string(),
        trainer_id: "t".to_string(),
        field_size: 16,
    }
}

fn points(sire: &str, venue: Venue, surface: Surface, distance: u32, sex: Sex) -> i32 {
    blood_points(
        &race_at(venue, surface, distance, sex),
        Some(&profile_with_sire(sire)),
        &RecencyFeatures::default(),
    )
}

#[test]
fn harbinger_wants_staying_turf_not_speed_turf() {
    let sire = "ハービンジャー Harbinger(英)";
    assert_eq!(points(sire, Venue::Hanshin, Surface::Turf, 2400, Sex::Male), 2);
    // The Chukyo turf mile sits only in the speed-bias class.
    assert_eq!(points(sire, Venue::Chukyo, Surface::Turf, 1600, Sex::Male), -1);
}

#[test]
fn lord_kanaloa_carries_to_speed_dirt() {
    let sire = "ロードカナロア";
    assert_eq!(points(sire, Venue::Nakayama, Surface::Dirt, 1200, Sex::Male), 1);
}

#[test]
fn danon_legend_is_a_dirt_sprint_specialist() {
    let sire = "ダノンレジェンド";
    assert_eq!(points(sire, Venue::Niigata, Surface::Dirt, 1200, Sex::Male), 2);
    assert_eq!(points(sire, Venue::Niigata, Surface::Dirt, 1200, Sex::Female), 2);
}

#[test]
fn maurice_splits_by_sex_on_local_turf() {
    let sire = "モーリス";
    assert_eq!(points(sire, Venue::Kokura, Surface::Turf, 1800, Sex::Male), 2);
    // The same course gives the filly nothing: her branch wants TurfA.
    assert_eq!(points(sire, Venue::Kokura, Surface::Turf, 1800, Sex::Female), 0);
}

#[test]
fn stay_gold_colt_and_filly_diverge_on_sustained_run_courses() {
    let sire = "ステイゴールド";
    assert_eq!(points(sire, Venue::Chukyo, Surface::Turf, 1400, Sex::Male), 2);
    assert_eq!(points(sire, Venue::Chukyo, Surface::Turf, 1400, Sex::Female), 1);
}

#[test]
fn geldings_match_neither_sexed_branch() {
    let sire = "ゴールドアリュール";
    assert_eq!(points(sire, Venue::Tokyo, Surface::Dirt, 1400, Sex::Male), 2);
    assert_eq!(points(sire, Venue::Tokyo, Surface::Dirt, 1400, Sex::Gelding), 0);
}

#[test]
fn unknown_sire_still_gets_type_rules() {
    // A US-blooded dam side at a speed-bias turf course earns the type
    // bonus even though the sire has no rule of his own.
    let sire_line = ["q1", "q2", "q3", "q4", "q5"].map(|n| n.to_string());
    let quiet = ["q6", "q7", "q8", "q9", "qq"].map(|n| n.to_string());
    let dam_line = [
        "qd".to_string(),
        "Storm Cat1983".to_string(),
        "Storm Bird1978".to_string(),
        "qe".to_string(),
        "qf".to_string(),
    ];
    let dam_dam = [
        "q5".to_string(),
        "q6".to_string(),
        "サンデーサイレンス1986".to_string(),
        "q8".to_string(),
        "q9".to_string(),
    ];
    let profile = PedigreeProfile::from_lines("horse", &[sire_line, quiet, dam_line, dam_dam]);
    let race = race_at(Venue::Nakayama, Surface::Turf, 1600, Sex::Male);
    assert_eq!(blood_points(&race, Some(&profile), &RecencyFeatures::default()), 1);
}
