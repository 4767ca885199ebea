use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use keiba_quinella::archive::{self, IngestSummary};

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if arg == name {
            return args.get(idx + 1).map(PathBuf::from);
        }
        if let Some(rest) = arg.strip_prefix(&format!("{name}=")) {
            return Some(PathBuf::from(rest));
        }
    }
    None
}

fn report(kind: &str, summary: &IngestSummary) {
    println!(
        "{kind}: {}/{} rows upserted from {}",
        summary.rows_upserted,
        summary.rows_total,
        summary.source.display()
    );
    for err in &summary.errors {
        println!("  {err}");
    }
}

fn main() -> Result<()> {
    let db_path = parse_path_arg("--db")
        .or_else(archive::default_db_path)
        .context("unable to resolve archive path; pass --db <path>")?;
    let mut conn = archive::open_db(&db_path)?;
    println!("Archive: {}", db_path.display());

    let mut ingested = false;
    if let Some(path) = parse_path_arg("--results") {
        let summary = archive::ingest_results_csv(&mut conn, &path)?;
        report("results", &summary);
        ingested = true;
    }
    if let Some(path) = parse_path_arg("--history") {
        let summary = archive::ingest_history_csv(&mut conn, &path)?;
        report("history", &summary);
        ingested = true;
    }
    if let Some(path) = parse_path_arg("--pedigree") {
        let summary = archive::ingest_pedigree_csv(&mut conn, &path)?;
        report("pedigree", &summary);
        ingested = true;
    }

    if !ingested {
        return Err(anyhow!(
            "nothing to ingest; pass --results, --history and/or --pedigree <csv>"
        ));
    }
    Ok(())
}
