use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

use keiba_quinella::forest::ForestConfig;
use keiba_quinella::{archive, dataset_export, forest, pipeline};

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|val| !val.trim().is_empty())
        .map(PathBuf::from)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|val| val.parse::<f64>().ok())
        .unwrap_or(default)
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_path = env_path("KEIBA_DB")
        .or_else(archive::default_db_path)
        .context("unable to resolve archive path; set KEIBA_DB")?;
    let conn = archive::open_db(&db_path)?;
    info!(db = %db_path.display(), "opened archive");

    let scored = pipeline::build_scored_runners(&conn)?;
    if scored.is_empty() {
        return Err(anyhow!(
            "archive produced no scored runners; run the ingest binary first"
        ));
    }

    let dataset = dataset_export::dataset_from_runners(&scored);
    let config = ForestConfig {
        trees: env_usize("KEIBA_TREES", 100),
        max_depth: env_usize("KEIBA_MAX_DEPTH", 16),
        min_split: 2,
        seed: env_u64("KEIBA_SEED", 1234),
    };
    let test_fraction = env_f64("KEIBA_TEST_FRACTION", 0.3);
    let artifact = pipeline::fit_quinella_model(&dataset, config, test_fraction)?;

    println!("Quinella pipeline complete");
    println!("DB: {}", db_path.display());
    println!("Runners scored: {}", scored.len());
    println!("Labeled samples: {}", dataset.len());
    let metrics = &artifact.test_metrics;
    println!(
        "Held-out: accuracy {:.4}  roc-auc {:.4}  brier {:.4}  log-loss {:.4}  ({} samples)",
        metrics.accuracy, metrics.roc_auc, metrics.brier, metrics.log_loss, metrics.samples
    );

    println!("Feature importance:");
    let mut ranked: Vec<(&String, f64)> = artifact
        .feature_names
        .iter()
        .zip(artifact.importances.iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (name, weight) in ranked {
        println!("  {name:<12} {weight:.4}");
    }

    if let Some(path) = env_path("KEIBA_MODEL_OUT") {
        forest::save_artifact(&path, &artifact)?;
        println!("Model: {}", path.display());
    }
    if let Some(path) = env_path("KEIBA_REPORT_OUT") {
        dataset_export::write_report_xlsx(&path, &scored, &artifact)?;
        println!("Report: {}", path.display());
    }
    if let Some(path) = env_path("KEIBA_DATASET_OUT") {
        let rows = dataset_export::write_dataset_parquet(&path, &scored)?;
        println!("Dataset: {} ({rows} rows)", path.display());
    }

    Ok(())
}
