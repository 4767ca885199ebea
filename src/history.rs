use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::archive::StoredRun;
use crate::course::{Surface, Venue};
use crate::results::{Season, parse_surface};

/// One past run of one horse, parsed from the running-history archive.
#[derive(Debug, Clone)]
pub struct HorseRun {
    pub horse_id: String,
    pub date: NaiveDate,
    pub season: Season,
    /// None for runs at regional (non-JRA) venues.
    pub venue: Option<Venue>,
    pub surface: Surface,
    pub distance: u32,
    pub finish: Option<u32>,
    pub field_size: u32,
    /// `1 - finish / field_size`; higher is better.
    pub norm_finish: Option<f64>,
    pub post: Option<u32>,
    pub popularity: Option<u32>,
    /// Margin to the winner (or to the runner-up when winning), in seconds.
    pub margin: Option<f64>,
    pub first_corner: Option<u32>,
    pub final_furlong: Option<f64>,
    pub body_weight: Option<f64>,
    pub jockey_id: String,
    /// Archive rowid, used as a deterministic tie-break when two runs share
    /// a date.
    pub rowid: i64,
}

/// Extracts the venue out of a raw meeting string such as `3中山4` (third
/// Nakayama meeting, day four). The leading meet number may be absent.
pub fn parse_meeting_venue(raw: &str) -> Option<Venue> {
    let trimmed = raw.trim().trim_start_matches(|c: char| c.is_ascii_digit());
    let name: String = trimmed.chars().take(2).collect();
    Venue::from_name(&name)
}

/// Splits a raw surface+distance field such as `芝1600` or `ダ1150`.
pub fn parse_surface_distance(raw: &str) -> Option<(Surface, u32)> {
    let surface = parse_surface(raw)?;
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let distance = digits.parse::<u32>().ok()?;
    Some((surface, distance))
}

/// Body weight fields read `478(+2)`; the value before the parenthesis is
/// the weight, the rest is the change since the previous run.
pub fn parse_body_weight(raw: &str) -> Option<f64> {
    let head = raw.split('(').next()?.trim();
    head.parse::<f64>().ok()
}

/// First-corner position is the leading integer of the passage string
/// (`3-3-2-2` -> 3).
pub fn parse_first_corner(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().ok()
}

pub fn prepare_runs(rows: &[StoredRun]) -> Vec<HorseRun> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(date) = NaiveDate::parse_from_str(row.run_date.trim(), "%Y/%m/%d").ok() else {
            warn!(horse_id = %row.horse_id, raw = %row.run_date, "unparseable run date, dropping row");
            continue;
        };
        let Some((surface, distance)) = parse_surface_distance(&row.surface_distance) else {
            warn!(horse_id = %row.horse_id, raw = %row.surface_distance, "unparseable surface/distance, dropping row");
            continue;
        };
        let finish = row
            .finish
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok());
        let norm_finish = match (finish, row.field_size) {
            (Some(pos), field) if field > 0 => Some(1.0 - f64::from(pos) / f64::from(field)),
            _ => None,
        };
        out.push(HorseRun {
            horse_id: row.horse_id.clone(),
            date,
            season: Season::from_month(date.month()),
            venue: parse_meeting_venue(&row.meeting),
            surface,
            distance,
            finish,
            field_size: row.field_size,
            norm_finish,
            post: row.post,
            popularity: row.popularity,
            margin: row.margin,
            first_corner: row.passage.as_deref().and_then(parse_first_corner),
            final_furlong: row.final_furlong,
            body_weight: row.body_weight.as_deref().and_then(parse_body_weight),
            jockey_id: row.jockey_id.clone(),
            rowid: row.rowid,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeting_venue_parses_jra_and_skips_regional() {
        assert_eq!(parse_meeting_venue("3中山4"), Some(Venue::Nakayama));
        assert_eq!(parse_meeting_venue("1函館2"), Some(Venue::Hakodate));
        assert_eq!(parse_meeting_venue("大井"), None);
        assert_eq!(parse_meeting_venue("12東京8"), Some(Venue::Tokyo));
    }

    #[test]
    fn surface_distance_splits() {
        assert_eq!(parse_surface_distance("芝1600"), Some((Surface::Turf, 1600)));
        assert_eq!(parse_surface_distance("ダ1150"), Some((Surface::Dirt, 1150)));
        assert_eq!(parse_surface_distance("障3350"), Some((Surface::Jump, 3350)));
        assert_eq!(parse_surface_distance("1600"), None);
    }

    #[test]
    fn body_weight_strips_change() {
        assert_eq!(parse_body_weight("478(+2)"), Some(478.0));
        assert_eq!(parse_body_weight("502(-10)"), Some(502.0));
        assert_eq!(parse_body_weight("計不"), None);
    }

    #[test]
    fn first_corner_is_leading_integer() {
        assert_eq!(parse_first_corner("3-3-2-2"), Some(3));
        assert_eq!(parse_first_corner("12-12-11"), Some(12));
        assert_eq!(parse_first_corner(""), None);
    }

    #[test]
    fn norm_finish_scales_by_field_size() {
        let run = StoredRun {
            horse_id: "h".to_string(),
            run_date: "2020/05/31".to_string(),
            meeting: "2東京12".to_string(),
            surface_distance: "芝1600".to_string(),
            finish: Some("2".to_string()),
            field_size: 16,
            post: Some(4),
            popularity: Some(1),
            margin: Some(0.2),
            passage: Some("4-4-3".to_string()),
            final_furlong: Some(33.8),
            body_weight: Some("478(+2)".to_string()),
            jockey_id: "01088".to_string(),
            rowid: 1,
        };
        let runs = prepare_runs(&[run]);
        assert_eq!(runs.len(), 1);
        let norm = runs[0].norm_finish.unwrap();
        assert!((norm - (1.0 - 2.0 / 16.0)).abs() < 1e-12);
        assert_eq!(runs[0].season, Season::Spring);
    }
}
