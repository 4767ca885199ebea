use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;

use keiba_quinella::archive::{StoredPedigreeLine, StoredResult, StoredRun};
use keiba_quinella::history::prepare_runs;
use keiba_quinella::merit::{PointCard, score_card, score_races};
use keiba_quinella::pedigree::classify_pedigrees;
use keiba_quinella::recency::build_recency;
use keiba_quinella::results::{RaceRow, prepare_races};

#[derive(Debug, serde::Deserialize)]
struct ScoreCase {
    results: Vec<StoredResult>,
    #[serde(default)]
    history: Vec<StoredRun>,
    #[serde(default)]
    pedigree: Vec<StoredPedigreeLine>,
}

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/score_case.json"));

    let raw = fs::read_to_string(&path)?;
    let case: ScoreCase = serde_json::from_str(&raw)?;

    // This binary is intentionally simple: it scores one snapshot from disk
    // and prints the merit table, with no archive and no model involved.
    let races = prepare_races(&case.results);
    let runs = prepare_runs(&case.history);
    let profiles = classify_pedigrees(&case.pedigree);
    let recency = build_recency(&races, &runs);

    let runners: Vec<(RaceRow, PointCard)> = races
        .par_iter()
        .map(|race| {
            let features = recency
                .get(&(race.race_id, race.horse_id.clone()))
                .cloned()
                .unwrap_or_default();
            let profile = profiles.get(&race.horse_id);
            (race.clone(), score_card(race, &features, profile))
        })
        .collect();

    let mut scored = score_races(&runners);
    scored.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!(
        "{:<14} {:>4}  {:>7} {:>7} {:>7} {:>7} {:>7} {:>5}  {:>7}",
        "horse", "post", "blood", "margin", "rank", "close", "camp", "adv", "total"
    );
    for runner in &scored {
        println!(
            "{:<14} {:>4}  {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>5.0}  {:>7.2}",
            runner.horse_id,
            runner.post,
            runner.blood_z,
            runner.margin_z,
            runner.rank_z,
            runner.closing_z,
            runner.camp_z,
            runner.advantage,
            runner.total
        );
    }

    Ok(())
}
