use std::path::PathBuf;

use anyhow::{Context, Result};

use keiba_quinella::{archive, dataset_export, pipeline};

fn main() -> Result<()> {
    let out_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("quinella_dataset.parquet"));
    let db_path = std::env::var("KEIBA_DB")
        .ok()
        .filter(|val| !val.trim().is_empty())
        .map(PathBuf::from)
        .or_else(archive::default_db_path)
        .context("unable to resolve archive path; set KEIBA_DB")?;

    let conn = archive::open_db(&db_path)?;
    let scored = pipeline::build_scored_runners(&conn)?;
    let rows = dataset_export::write_dataset_parquet(&out_path, &scored)?;

    println!("Dataset export complete");
    println!("DB: {}", db_path.display());
    println!("Rows: {rows}");
    println!("File: {}", out_path.display());
    Ok(())
}
