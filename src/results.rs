use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::archive::StoredResult;
use crate::course::{Course, Surface, Venue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Gelding,
}

impl Sex {
    pub fn from_marker(marker: char) -> Option<Sex> {
        Some(match marker {
            '牡' => Sex::Male,
            '牝' => Sex::Female,
            'セ' => Sex::Gelding,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn from_month(month: u32) -> Season {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

/// One runner's entry in one race, fully parsed.
#[derive(Debug, Clone)]
pub struct RaceRow {
    pub race_id: i64,
    pub horse_id: String,
    pub date: NaiveDate,
    pub season: Season,
    pub course: Course,
    pub post: u32,
    pub sex: Sex,
    pub age: u32,
    /// None for DNF / disqualification markers in the archive.
    pub finish: Option<u32>,
    pub win_odds: Option<f64>,
    pub popularity: Option<u32>,
    pub jockey_id: String,
    pub trainer_id: String,
    pub field_size: u32,
}

pub fn parse_surface(raw: &str) -> Option<Surface> {
    let raw = raw.trim();
    if raw.starts_with('障') {
        return Some(Surface::Jump);
    }
    if raw.starts_with('ダ') {
        return Some(Surface::Dirt);
    }
    if raw.starts_with('芝') {
        return Some(Surface::Turf);
    }
    None
}

pub fn parse_race_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y年%m月%d日").ok()
}

/// Repairs the known archive glitch where a two-lap race is stored with its
/// partial-lap distance.
fn repair_distance(distance: u32) -> u32 {
    if distance < 1000 { 3600 } else { distance }
}

fn parse_sex_age(raw: &str) -> Option<(Sex, u32)> {
    let mut chars = raw.trim().chars();
    let sex = Sex::from_marker(chars.next()?)?;
    let age = chars.as_str().parse::<u32>().ok()?;
    Some((sex, age))
}

pub fn parse_finish(raw: Option<&str>) -> Option<u32> {
    raw?.trim().parse::<u32>().ok()
}

/// Prepares raw archive rows for scoring. Rows whose date or sex/age field
/// cannot be parsed are dropped with a warning; an unparseable finish is a
/// legitimate DNF marker and the row is kept.
pub fn prepare_races(rows: &[StoredResult]) -> Vec<RaceRow> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(date) = parse_race_date(&row.race_date) else {
            warn!(race_id = row.race_id, raw = %row.race_date, "unparseable race date, dropping row");
            continue;
        };
        let Some(venue) = Venue::from_code(row.venue) else {
            warn!(race_id = row.race_id, venue = row.venue, "unknown venue code, dropping row");
            continue;
        };
        let Some(surface) = parse_surface(&row.surface) else {
            warn!(race_id = row.race_id, raw = %row.surface, "unknown surface, dropping row");
            continue;
        };
        let Some((sex, age)) = parse_sex_age(&row.sex_age) else {
            warn!(race_id = row.race_id, raw = %row.sex_age, "unparseable sex/age, dropping row");
            continue;
        };
        out.push(RaceRow {
            race_id: row.race_id,
            horse_id: row.horse_id.clone(),
            date,
            season: Season::from_month(date.month()),
            course: Course::new(venue, surface, repair_distance(row.distance)),
            post: row.post,
            sex,
            age,
            finish: parse_finish(row.finish.as_deref()),
            win_odds: row.win_odds,
            popularity: row.popularity,
            jockey_id: row.jockey_id.clone(),
            trainer_id: row.trainer_id.clone(),
            field_size: row.field_size,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(sex_age: &str, finish: Option<&str>, distance: u32) -> StoredResult {
        StoredResult {
            race_id: 202_005_010_811,
            horse_id: "2017101234".to_string(),
            race_date: "2020年5月31日".to_string(),
            venue: 5,
            surface: "芝".to_string(),
            distance,
            post: 7,
            finish: finish.map(|s| s.to_string()),
            sex_age: sex_age.to_string(),
            win_odds: Some(4.1),
            popularity: Some(2),
            jockey_id: "01088".to_string(),
            trainer_id: "01075".to_string(),
            field_size: 18,
        }
    }

    #[test]
    fn sex_and_age_split_from_combined_field() {
        let rows = prepare_races(&[stored("牝4", Some("1"), 1600)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sex, Sex::Female);
        assert_eq!(rows[0].age, 4);
        assert_eq!(rows[0].finish, Some(1));
        assert_eq!(rows[0].season, Season::Spring);
    }

    #[test]
    fn dnf_marker_keeps_row_without_finish() {
        let rows = prepare_races(&[stored("牡5", Some("中止"), 1600)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].finish, None);
    }

    #[test]
    fn short_distance_is_repaired_to_two_laps() {
        let rows = prepare_races(&[stored("セ6", Some("3"), 800)]);
        assert_eq!(rows[0].course.distance, 3600);
        let rows = prepare_races(&[stored("セ6", Some("3"), 1000)]);
        assert_eq!(rows[0].course.distance, 1000);
    }

    #[test]
    fn unparseable_sex_age_drops_row() {
        let rows = prepare_races(&[stored("??", Some("1"), 1600)]);
        assert!(rows.is_empty());
    }

    #[test]
    fn season_buckets_follow_months() {
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(11), Season::Autumn);
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
    }
}
