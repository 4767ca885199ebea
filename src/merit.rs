//! Per-race standardization and the composite merit score.
//!
//! Raw points only mean something relative to the rest of the field, so each
//! point family is z-scored within its race before summing. The advantage
//! points stay raw: they are already field-relative by construction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::advantage::advantage_points;
use crate::blood_score::blood_points;
use crate::camp::camp_points;
use crate::course::Surface;
use crate::form_points::{closing_average, margin_points, rank_points};
use crate::pedigree::PedigreeProfile;
use crate::recency::RecencyFeatures;
use crate::results::RaceRow;

pub const FEATURE_COUNT: usize = 8;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "blood_z",
    "margin_z",
    "rank_z",
    "closing_z",
    "camp_z",
    "advantage",
    "merit_total",
    "surface",
];

/// Raw per-runner points before standardization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCard {
    pub blood: i32,
    pub margin: i32,
    pub rank: i32,
    pub camp: i32,
    pub closing: f64,
    pub advantage: i32,
}

/// One fully scored runner, ready for the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRunner {
    pub race_id: i64,
    pub horse_id: String,
    pub post: u32,
    pub surface: Surface,
    pub finish: Option<u32>,
    pub blood_z: f64,
    pub margin_z: f64,
    pub rank_z: f64,
    pub closing_z: f64,
    pub camp_z: f64,
    pub advantage: f64,
    pub total: f64,
}

impl ScoredRunner {
    /// Top-two finish label; a runner that never finished did not place.
    pub fn quinella(&self) -> bool {
        matches!(self.finish, Some(pos) if pos <= 2)
    }

    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.blood_z,
            self.margin_z,
            self.rank_z,
            self.closing_z,
            self.camp_z,
            self.advantage,
            self.total,
            self.surface.encoded(),
        ]
    }
}

/// Composes the point modules for one runner.
pub fn score_card(
    race: &RaceRow,
    recency: &RecencyFeatures,
    profile: Option<&PedigreeProfile>,
) -> PointCard {
    PointCard {
        blood: blood_points(race, profile, recency),
        margin: margin_points(recency.last.as_ref().and_then(|l| l.margin)),
        rank: rank_points(recency),
        camp: camp_points(&race.jockey_id, &race.trainer_id, &recency.winning_jockeys),
        closing: closing_average(recency),
        advantage: advantage_points(race, recency),
    }
}

/// Sample mean and standard deviation; z collapses to 0 when the field has
/// no spread (or a single runner).
fn z_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    let std = var.sqrt();
    if std <= f64::EPSILON {
        return vec![0.0; n];
    }
    values.iter().map(|v| (v - mean) / std).collect()
}

/// Standardizes every point family within its race and assembles the
/// composite merit total.
pub fn score_races(runners: &[(RaceRow, PointCard)]) -> Vec<ScoredRunner> {
    let mut by_race: HashMap<i64, Vec<usize>> = HashMap::new();
    for (idx, (race, _)) in runners.iter().enumerate() {
        by_race.entry(race.race_id).or_default().push(idx);
    }

    let mut out: Vec<Option<ScoredRunner>> = vec![None; runners.len()];
    for indices in by_race.values() {
        let blood: Vec<f64> = indices.iter().map(|&i| f64::from(runners[i].1.blood)).collect();
        let margin: Vec<f64> = indices.iter().map(|&i| f64::from(runners[i].1.margin)).collect();
        let rank: Vec<f64> = indices.iter().map(|&i| f64::from(runners[i].1.rank)).collect();
        let camp: Vec<f64> = indices.iter().map(|&i| f64::from(runners[i].1.camp)).collect();
        let closing: Vec<f64> = indices.iter().map(|&i| runners[i].1.closing).collect();

        let blood_z = z_scores(&blood);
        let margin_z = z_scores(&margin);
        let rank_z = z_scores(&rank);
        let camp_z = z_scores(&camp);
        let closing_z = z_scores(&closing);

        for (slot, &idx) in indices.iter().enumerate() {
            let (race, card) = &runners[idx];
            let advantage = f64::from(card.advantage);
            let total = blood_z[slot]
                + margin_z[slot]
                + rank_z[slot]
                + closing_z[slot]
                + camp_z[slot]
                + advantage;
            out[idx] = Some(ScoredRunner {
                race_id: race.race_id,
                horse_id: race.horse_id.clone(),
                post: race.post,
                surface: race.course.surface,
                finish: race.finish,
                blood_z: blood_z[slot],
                margin_z: margin_z[slot],
                rank_z: rank_z[slot],
                closing_z: closing_z[slot],
                camp_z: camp_z[slot],
                advantage,
                total,
            });
        }
    }

    out.into_iter().flatten().collect()
}
