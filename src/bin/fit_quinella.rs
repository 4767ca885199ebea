use std::path::PathBuf;

use anyhow::{Result, anyhow};

use keiba_quinella::dataset_export::read_dataset_parquet;
use keiba_quinella::forest::{ForestConfig, save_artifact};
use keiba_quinella::pipeline::fit_quinella_model;

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(default)
}

fn main() -> Result<()> {
    let dataset_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("quinella_dataset.parquet"));
    let model_path = std::env::args()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("quinella_model.json"));

    let dataset = read_dataset_parquet(&dataset_path)?;
    if dataset.is_empty() {
        return Err(anyhow!("dataset {} holds no rows", dataset_path.display()));
    }

    let config = ForestConfig {
        trees: env_usize("KEIBA_TREES", 100),
        max_depth: env_usize("KEIBA_MAX_DEPTH", 16),
        min_split: 2,
        seed: env_u64("KEIBA_SEED", 1234),
    };
    let test_fraction = std::env::var("KEIBA_TEST_FRACTION")
        .ok()
        .and_then(|val| val.parse::<f64>().ok())
        .unwrap_or(0.3);

    let artifact = fit_quinella_model(&dataset, config, test_fraction)?;
    save_artifact(&model_path, &artifact)?;

    println!("Quinella fit complete");
    println!("Dataset: {} ({} rows)", dataset_path.display(), dataset.len());
    let metrics = &artifact.test_metrics;
    println!(
        "Held-out: accuracy {:.4}  roc-auc {:.4}  brier {:.4}  log-loss {:.4}",
        metrics.accuracy, metrics.roc_auc, metrics.brier, metrics.log_loss
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
    println!("Model: {}", model_path.display());
    Ok(())
}
