//! End-to-end orchestration: archive rows in, scored runners and a fitted
//! model out.

use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use rusqlite::Connection;
use tracing::info;

use crate::archive;
use crate::dataset_export::QuinellaDataset;
use crate::forest::{
    ARTIFACT_VERSION, ForestConfig, QuinellaModelArtifact, RandomForest,
};
use crate::history::prepare_runs;
use crate::merit::{FEATURE_NAMES, PointCard, ScoredRunner, score_card, score_races};
use crate::metrics::{evaluate_binary, train_test_split};
use crate::pedigree::classify_pedigrees;
use crate::recency::build_recency;
use crate::results::{RaceRow, prepare_races};

/// Runs the full feature pipeline over everything in the archive.
pub fn build_scored_runners(conn: &Connection) -> Result<Vec<ScoredRunner>> {
    let races = prepare_races(&archive::load_results(conn).context("load race results")?);
    info!(rows = races.len(), "prepared race rows");

    let runs = prepare_runs(&archive::load_history(conn).context("load running history")?);
    info!(rows = runs.len(), "prepared history rows");

    let profiles = classify_pedigrees(&archive::load_pedigree(conn).context("load pedigrees")?);
    info!(horses = profiles.len(), "classified pedigrees");

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

    let scored = score_races(&runners);
    info!(rows = scored.len(), "scored runners");
    Ok(scored)
}

/// Splits, fits and evaluates the forest, returning the persisted-model
/// artifact.
pub fn fit_quinella_model(
    dataset: &QuinellaDataset,
    config: ForestConfig,
    test_fraction: f64,
) -> Result<QuinellaModelArtifact> {
    let (train_idx, test_idx) = train_test_split(dataset.len(), test_fraction, config.seed);
    info!(
        train = train_idx.len(),
        test = test_idx.len(),
        trees = config.trees,
        "fitting quinella forest"
    );

    let gather = |indices: &[usize]| -> (Vec<Vec<f64>>, Vec<bool>) {
        let x = indices.iter().map(|&i| dataset.features[i].clone()).collect();
        let y = indices.iter().map(|&i| dataset.labels[i]).collect();
        (x, y)
    };
    let (train_x, train_y) = gather(&train_idx);
    let (test_x, test_y) = gather(&test_idx);

    let forest = RandomForest::fit(&train_x, &train_y, config).context("fit forest")?;
    let train_metrics = evaluate_binary(&forest.predict_many(&train_x), &train_y);
    let test_metrics = evaluate_binary(&forest.predict_many(&test_x), &test_y);
    info!(
        test_accuracy = test_metrics.accuracy,
        test_auc = test_metrics.roc_auc,
        "evaluated held-out set"
    );

    Ok(QuinellaModelArtifact {
        version: ARTIFACT_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        config: forest.config,
        importances: forest.importances.clone(),
        train_metrics,
        test_metrics,
        trees: forest.trees,
    })
}
