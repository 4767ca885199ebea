//! Leak-safe recency features.
//!
//! Every feature here is derived only from runs dated strictly before the
//! race being scored; the race's own row never feeds its own features.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::history::HorseRun;
use crate::results::{RaceRow, Season};

/// The most recent prior run, with the full detail the scoring rules need.
#[derive(Debug, Clone)]
pub struct LastRun {
    pub post: Option<u32>,
    pub popularity: Option<u32>,
    pub body_weight: Option<f64>,
    pub finish: Option<u32>,
    pub margin: Option<f64>,
    pub date: NaiveDate,
    pub distance: u32,
    pub first_corner: Option<u32>,
    pub final_furlong: Option<f64>,
}

/// The 2nd/3rd most recent prior runs, reduced to what scoring reads.
#[derive(Debug, Clone)]
pub struct PriorRun {
    pub norm_finish: Option<f64>,
    pub finish: Option<u32>,
    pub margin: Option<f64>,
    pub date: NaiveDate,
    pub distance: u32,
    pub final_furlong: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct RecencyFeatures {
    /// Prior starts at any venue, regional tracks included.
    pub career_starts: u32,
    /// Seasons in which the horse has finished top-two at a JRA venue.
    pub winning_seasons: HashSet<Season>,
    /// Jockeys who have ridden the horse to a top-two JRA finish.
    pub winning_jockeys: HashSet<String>,
    pub last: Option<LastRun>,
    pub second: Option<PriorRun>,
    pub third: Option<PriorRun>,
}

impl RecencyFeatures {
    /// Last-run distance minus today's distance; negative when stepping up.
    pub fn dist_step_today(&self, today_distance: u32) -> Option<i64> {
        self.last
            .as_ref()
            .map(|l| i64::from(l.distance) - i64::from(today_distance))
    }

    /// 2nd-run distance minus last-run distance.
    pub fn dist_step_prev(&self) -> Option<i64> {
        let last = self.last.as_ref()?;
        let second = self.second.as_ref()?;
        Some(i64::from(second.distance) - i64::from(last.distance))
    }

    /// 3rd-run distance minus 2nd-run distance.
    pub fn dist_step_prev2(&self) -> Option<i64> {
        let second = self.second.as_ref()?;
        let third = self.third.as_ref()?;
        Some(i64::from(third.distance) - i64::from(second.distance))
    }

    /// Days between today and the last run.
    pub fn gap_today(&self, race_date: NaiveDate) -> Option<i64> {
        self.last
            .as_ref()
            .map(|l| (race_date - l.date).num_days())
    }

    /// Days between the last run and the one before it.
    pub fn gap_prev(&self) -> Option<i64> {
        let last = self.last.as_ref()?;
        let second = self.second.as_ref()?;
        Some((last.date - second.date).num_days())
    }

    /// Days between the 2nd and 3rd most recent runs.
    pub fn gap_prev2(&self) -> Option<i64> {
        let second = self.second.as_ref()?;
        let third = self.third.as_ref()?;
        Some((second.date - third.date).num_days())
    }
}

fn last_run(run: &HorseRun) -> LastRun {
    LastRun {
        post: run.post,
        popularity: run.popularity,
        body_weight: run.body_weight,
        finish: run.finish,
        margin: run.margin,
        date: run.date,
        distance: run.distance,
        first_corner: run.first_corner,
        final_furlong: run.final_furlong,
    }
}

fn prior_run(run: &HorseRun) -> PriorRun {
    PriorRun {
        norm_finish: run.norm_finish,
        finish: run.finish,
        margin: run.margin,
        date: run.date,
        distance: run.distance,
        final_furlong: run.final_furlong,
    }
}

fn features_for(race: &RaceRow, runs: &[&HorseRun]) -> RecencyFeatures {
    // Strictly-before cut, the leak guard for the whole module.
    let before: Vec<&HorseRun> = runs.iter().copied().filter(|r| r.date < race.date).collect();

    let career_starts = before.len() as u32;
    let jra: Vec<&HorseRun> = before.iter().copied().filter(|r| r.venue.is_some()).collect();

    let mut winning_seasons = HashSet::new();
    let mut winning_jockeys = HashSet::new();
    for run in &jra {
        if matches!(run.finish, Some(1) | Some(2)) {
            winning_seasons.insert(run.season);
            winning_jockeys.insert(run.jockey_id.clone());
        }
    }

    RecencyFeatures {
        career_starts,
        winning_seasons,
        winning_jockeys,
        last: jra.first().map(|r| last_run(r)),
        second: jra.get(1).map(|r| prior_run(r)),
        third: jra.get(2).map(|r| prior_run(r)),
    }
}

/// Builds per-runner recency features for every race row. History is
/// consumed most-recent-first; ties on date fall back to archive order.
pub fn build_recency(
    races: &[RaceRow],
    runs: &[HorseRun],
) -> HashMap<(i64, String), RecencyFeatures> {
    let mut per_horse: HashMap<&str, Vec<&HorseRun>> = HashMap::new();
    for run in runs {
        per_horse.entry(run.horse_id.as_str()).or_default().push(run);
    }
    for list in per_horse.values_mut() {
        list.sort_by(|a, b| b.date.cmp(&a.date).then(b.rowid.cmp(&a.rowid)));
    }

    races
        .par_iter()
        .map(|race| {
            let runs = per_horse
                .get(race.horse_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            (
                (race.race_id, race.horse_id.clone()),
                features_for(race, runs),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{Course, Surface, Venue};
    use crate::results::Sex;

    fn run(date: &str, venue: Option<Venue>, finish: u32, distance: u32, rowid: i64) -> HorseRun {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        HorseRun {
            horse_id: "h1".to_string(),
            date,
            season: Season::from_month(chrono::Datelike::month(&date)),
            venue,
            surface: Surface::Turf,
            distance,
            finish: Some(finish),
            field_size: 16,
            norm_finish: Some(1.0 - f64::from(finish) / 16.0),
            post: Some(3),
            popularity: Some(2),
            margin: Some(0.1),
            first_corner: Some(4),
            final_furlong: Some(34.0),
            body_weight: Some(478.0),
            jockey_id: "j1".to_string(),
            rowid,
        }
    }

    fn race(date: &str) -> RaceRow {
        RaceRow {
            race_id: 1,
            horse_id: "h1".to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            season: Season::Spring,
            course: Course::new(Venue::Tokyo, Surface::Turf, 1600),
            post: 5,
            sex: Sex::Male,
            age: 4,
            finish: Some(1),
            win_odds: None,
            popularity: None,
            jockey_id: "j1".to_string(),
            trainer_id: "t1".to_string(),
            field_size: 16,
        }
    }

    #[test]
    fn same_day_run_never_feeds_its_own_features() {
        let runs = vec![run("2020-05-31", Some(Venue::Tokyo), 1, 1600, 1)];
        let features = build_recency(&[race("2020-05-31")], &runs);
        let f = &features[&(1, "h1".to_string())];
        assert_eq!(f.career_starts, 0);
        assert!(f.last.is_none());
        assert!(f.winning_seasons.is_empty());
    }

    #[test]
    fn slots_fill_most_recent_first() {
        let runs = vec![
            run("2020-01-05", Some(Venue::Nakayama), 5, 2000, 1),
            run("2020-03-08", Some(Venue::Nakayama), 2, 1800, 2),
            run("2020-04-12", Some(Venue::Tokyo), 1, 1600, 3),
        ];
        let features = build_recency(&[race("2020-05-31")], &runs);
        let f = &features[&(1, "h1".to_string())];
        assert_eq!(f.career_starts, 3);
        assert_eq!(f.last.as_ref().unwrap().distance, 1600);
        assert_eq!(f.second.as_ref().unwrap().distance, 1800);
        assert_eq!(f.third.as_ref().unwrap().distance, 2000);
        assert_eq!(f.dist_step_prev(), Some(200));
        assert_eq!(f.dist_step_prev2(), Some(200));
        assert_eq!(f.dist_step_today(1600), Some(0));
        assert_eq!(f.gap_today(race("2020-05-31").date), Some(49));
    }

    #[test]
    fn regional_runs_count_starts_but_not_slots() {
        let runs = vec![
            run("2020-04-12", None, 1, 1400, 1),
            run("2020-03-08", Some(Venue::Tokyo), 2, 1600, 2),
        ];
        let features = build_recency(&[race("2020-05-31")], &runs);
        let f = &features[&(1, "h1".to_string())];
        assert_eq!(f.career_starts, 2);
        // The regional win neither fills the last-run slot nor the sets.
        assert_eq!(f.last.as_ref().unwrap().distance, 1600);
        assert!(f.winning_seasons.contains(&Season::Spring));
        assert_eq!(f.winning_jockeys.len(), 1);
    }

    #[test]
    fn only_top_two_finishes_enter_the_sets() {
        let mut third = run("2020-02-02", Some(Venue::Kyoto), 3, 1600, 1);
        third.jockey_id = "j9".to_string();
        let runs = vec![third, run("2020-03-08", Some(Venue::Tokyo), 2, 1600, 2)];
        let features = build_recency(&[race("2020-05-31")], &runs);
        let f = &features[&(1, "h1".to_string())];
        assert!(f.winning_jockeys.contains("j1"));
        assert!(!f.winning_jockeys.contains("j9"));
    }
}
