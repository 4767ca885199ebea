//! Dataset and report exports.
//!
//! The scored-runner table round-trips through Parquet so fitting can run
//! against a frozen snapshot, and a human-readable XLSX report carries the
//! scores, importances and held-out metrics.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use parquet::basic::Compression;
use parquet::data_type::{ByteArray, ByteArrayType, DoubleType, Int32Type, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::{SerializedFileWriter, SerializedRowGroupWriter};
use parquet::record::RowAccessor;
use parquet::schema::parser::parse_message_type;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::forest::QuinellaModelArtifact;
use crate::merit::{FEATURE_COUNT, ScoredRunner};

const DATASET_SCHEMA: &str = r#"
    message scored_runner {
        REQUIRED INT64 race_id;
        REQUIRED BYTE_ARRAY horse_id (UTF8);
        REQUIRED INT32 post;
        REQUIRED DOUBLE blood_z;
        REQUIRED DOUBLE margin_z;
        REQUIRED DOUBLE rank_z;
        REQUIRED DOUBLE closing_z;
        REQUIRED DOUBLE camp_z;
        REQUIRED DOUBLE advantage;
        REQUIRED DOUBLE merit_total;
        REQUIRED DOUBLE surface;
        REQUIRED INT32 quinella;
    }
"#;

/// The classifier-ready dataset: one row per labeled runner.
#[derive(Debug, Clone, Default)]
pub struct QuinellaDataset {
    pub race_ids: Vec<i64>,
    pub horse_ids: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<bool>,
}

impl QuinellaDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Builds the dataset from scored runners. A runner that never finished
/// counts as not placing, the same reading the archive's labels take.
pub fn dataset_from_runners(runners: &[ScoredRunner]) -> QuinellaDataset {
    let mut out = QuinellaDataset::default();
    for runner in runners {
        out.race_ids.push(runner.race_id);
        out.horse_ids.push(runner.horse_id.clone());
        out.features.push(runner.features().to_vec());
        out.labels.push(runner.quinella());
    }
    out
}

fn write_i64(rg: &mut SerializedRowGroupWriter<'_, fs::File>, values: &[i64]) -> Result<()> {
    let mut col = rg
        .next_column()
        .context("next parquet column")?
        .ok_or_else(|| anyhow!("parquet schema exhausted early"))?;
    col.typed::<Int64Type>()
        .write_batch(values, None, None)
        .context("write int64 column")?;
    col.close().context("close int64 column")?;
    Ok(())
}

fn write_i32(rg: &mut SerializedRowGroupWriter<'_, fs::File>, values: &[i32]) -> Result<()> {
    let mut col = rg
        .next_column()
        .context("next parquet column")?
        .ok_or_else(|| anyhow!("parquet schema exhausted early"))?;
    col.typed::<Int32Type>()
        .write_batch(values, None, None)
        .context("write int32 column")?;
    col.close().context("close int32 column")?;
    Ok(())
}

fn write_f64(rg: &mut SerializedRowGroupWriter<'_, fs::File>, values: &[f64]) -> Result<()> {
    let mut col = rg
        .next_column()
        .context("next parquet column")?
        .ok_or_else(|| anyhow!("parquet schema exhausted early"))?;
    col.typed::<DoubleType>()
        .write_batch(values, None, None)
        .context("write double column")?;
    col.close().context("close double column")?;
    Ok(())
}

fn write_utf8(rg: &mut SerializedRowGroupWriter<'_, fs::File>, values: &[ByteArray]) -> Result<()> {
    let mut col = rg
        .next_column()
        .context("next parquet column")?
        .ok_or_else(|| anyhow!("parquet schema exhausted early"))?;
    col.typed::<ByteArrayType>()
        .write_batch(values, None, None)
        .context("write utf8 column")?;
    col.close().context("close utf8 column")?;
    Ok(())
}

/// Writes the labeled dataset as one Parquet row group. Returns the number
/// of rows written.
pub fn write_dataset_parquet(path: &Path, runners: &[ScoredRunner]) -> Result<usize> {
    let dataset = dataset_from_runners(runners);
    if dataset.is_empty() {
        return Err(anyhow!("no scored runners to export"));
    }

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let schema = Arc::new(parse_message_type(DATASET_SCHEMA).context("parse dataset schema")?);
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build(),
    );
    let file =
        fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer =
        SerializedFileWriter::new(file, schema, props).context("open parquet writer")?;

    let mut rg = writer.next_row_group().context("open row group")?;
    write_i64(&mut rg, &dataset.race_ids)?;
    let horse_ids: Vec<ByteArray> = dataset
        .horse_ids
        .iter()
        .map(|id| ByteArray::from(id.as_str()))
        .collect();
    write_utf8(&mut rg, &horse_ids)?;
    // Post is carried for traceability, not as a model input.
    let posts: Vec<i32> = runners.iter().map(|r| r.post as i32).collect();
    write_i32(&mut rg, &posts)?;
    for feature_idx in 0..FEATURE_COUNT {
        let column: Vec<f64> = dataset.features.iter().map(|row| row[feature_idx]).collect();
        write_f64(&mut rg, &column)?;
    }
    let labels: Vec<i32> = dataset
        .labels
        .iter()
        .map(|y| if *y { 1 } else { 0 })
        .collect();
    write_i32(&mut rg, &labels)?;
    rg.close().context("close row group")?;
    writer.close().context("close parquet writer")?;

    Ok(dataset.len())
}

/// Reads a dataset written by [`write_dataset_parquet`].
pub fn read_dataset_parquet(path: &Path) -> Result<QuinellaDataset> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file).context("open parquet reader")?;
    let iter = reader.get_row_iter(None).context("iterate dataset rows")?;

    let mut out = QuinellaDataset::default();
    for row in iter {
        let row = row.context("decode dataset row")?;
        let race_id = row.get_long(0).context("race_id column")?;
        let horse_id = row.get_string(1).context("horse_id column")?.clone();
        let mut features = Vec::with_capacity(FEATURE_COUNT);
        for feature_idx in 0..FEATURE_COUNT {
            features.push(
                row.get_double(3 + feature_idx)
                    .with_context(|| format!("feature column {feature_idx}"))?,
            );
        }
        let label = row.get_int(3 + FEATURE_COUNT).context("label column")?;

        out.race_ids.push(race_id);
        out.horse_ids.push(horse_id);
        out.features.push(features);
        out.labels.push(label != 0);
    }
    Ok(out)
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

fn fmt_f64(value: f64) -> String {
    format!("{value:.4}")
}

/// Writes the human-readable scoring report: scored runners, feature
/// importances and the held-out metrics of the fitted model.
pub fn write_report_xlsx(
    path: &Path,
    runners: &[ScoredRunner],
    artifact: &QuinellaModelArtifact,
) -> Result<()> {
    let mut runner_rows = vec![vec![
        "Race ID".to_string(),
        "Horse ID".to_string(),
        "Post".to_string(),
        "Surface".to_string(),
        "Finish".to_string(),
        "Blood Z".to_string(),
        "Margin Z".to_string(),
        "Rank Z".to_string(),
        "Closing Z".to_string(),
        "Camp Z".to_string(),
        "Advantage".to_string(),
        "Merit Total".to_string(),
        "Quinella".to_string(),
    ]];
    for runner in runners {
        runner_rows.push(vec![
            runner.race_id.to_string(),
            runner.horse_id.clone(),
            runner.post.to_string(),
            format!("{:?}", runner.surface),
            runner
                .finish
                .map(|pos| pos.to_string())
                .unwrap_or_default(),
            fmt_f64(runner.blood_z),
            fmt_f64(runner.margin_z),
            fmt_f64(runner.rank_z),
            fmt_f64(runner.closing_z),
            fmt_f64(runner.camp_z),
            fmt_f64(runner.advantage),
            fmt_f64(runner.total),
            if runner.quinella() { "1" } else { "0" }.to_string(),
        ]);
    }

    let mut importance_rows = vec![vec!["Feature".to_string(), "Importance".to_string()]];
    let mut ranked: Vec<(String, f64)> = artifact
        .feature_names
        .iter()
        .cloned()
        .zip(artifact.importances.iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (name, weight) in ranked {
        importance_rows.push(vec![name, fmt_f64(weight)]);
    }

    let metrics = &artifact.test_metrics;
    let metrics_rows = vec![
        vec!["Metric".to_string(), "Value".to_string()],
        vec!["Samples".to_string(), metrics.samples.to_string()],
        vec!["Accuracy".to_string(), fmt_f64(metrics.accuracy)],
        vec!["Brier".to_string(), fmt_f64(metrics.brier)],
        vec!["Log loss".to_string(), fmt_f64(metrics.log_loss)],
        vec!["ROC AUC".to_string(), fmt_f64(metrics.roc_auc)],
    ];

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Runners")?;
        write_rows(sheet, &runner_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Importance")?;
        write_rows(sheet, &importance_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Metrics")?;
        write_rows(sheet, &metrics_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save report {}", path.display()))?;
    Ok(())
}
