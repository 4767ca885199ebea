//! SQLite archive of race results, running histories and pedigree lines.
//!
//! Ingest reads the flat CSV exports of the (out-of-scope) acquisition step
//! and upserts them into a local SQLite file; every ingest leaves an audit
//! row behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

const ARCHIVE_DIR: &str = "keiba_quinella";
const ARCHIVE_FILE: &str = "archive.sqlite";

/// One runner's raw result row, as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResult {
    pub race_id: i64,
    pub horse_id: String,
    pub race_date: String,
    pub venue: u8,
    pub surface: String,
    pub distance: u32,
    pub post: u32,
    pub finish: Option<String>,
    pub sex_age: String,
    pub win_odds: Option<f64>,
    pub popularity: Option<u32>,
    pub jockey_id: String,
    pub trainer_id: String,
    pub field_size: u32,
}

/// One raw running-history row, as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRun {
    pub horse_id: String,
    pub run_date: String,
    pub meeting: String,
    pub surface_distance: String,
    pub finish: Option<String>,
    pub field_size: u32,
    pub post: Option<u32>,
    pub popularity: Option<u32>,
    pub margin: Option<f64>,
    pub passage: Option<String>,
    pub final_furlong: Option<f64>,
    pub body_weight: Option<String>,
    pub jockey_id: String,
    #[serde(default)]
    pub rowid: i64,
}

/// One ancestor line of one horse: a five-generation chain of names.
/// Line 0 is the sire line, 1 the sire-dam line, 2 the dam line and 3 the
/// dam-dam line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPedigreeLine {
    pub horse_id: String,
    pub line: u8,
    pub generations: [String; 5],
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub source: PathBuf,
    pub rows_total: usize,
    pub rows_upserted: usize,
    pub errors: Vec<String>,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(ARCHIVE_FILE))
}

fn app_data_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_DATA_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(ARCHIVE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(ARCHIVE_DIR),
    )
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS race_results (
            race_id INTEGER NOT NULL,
            horse_id TEXT NOT NULL,
            race_date TEXT NOT NULL,
            venue INTEGER NOT NULL,
            surface TEXT NOT NULL,
            distance INTEGER NOT NULL,
            post INTEGER NOT NULL,
            finish TEXT NULL,
            sex_age TEXT NOT NULL,
            win_odds REAL NULL,
            popularity INTEGER NULL,
            jockey_id TEXT NOT NULL,
            trainer_id TEXT NOT NULL,
            field_size INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (race_id, horse_id)
        );
        CREATE INDEX IF NOT EXISTS idx_results_date ON race_results(race_date);
        CREATE INDEX IF NOT EXISTS idx_results_horse ON race_results(horse_id);

        CREATE TABLE IF NOT EXISTS horse_history (
            horse_id TEXT NOT NULL,
            run_date TEXT NOT NULL,
            meeting TEXT NOT NULL,
            surface_distance TEXT NOT NULL,
            finish TEXT NULL,
            field_size INTEGER NOT NULL,
            post INTEGER NULL,
            popularity INTEGER NULL,
            margin REAL NULL,
            passage TEXT NULL,
            final_furlong REAL NULL,
            body_weight TEXT NULL,
            jockey_id TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (horse_id, run_date, meeting)
        );
        CREATE INDEX IF NOT EXISTS idx_history_horse ON horse_history(horse_id);

        CREATE TABLE IF NOT EXISTS pedigree (
            horse_id TEXT NOT NULL,
            line INTEGER NOT NULL,
            gen1 TEXT NOT NULL,
            gen2 TEXT NOT NULL,
            gen3 TEXT NOT NULL,
            gen4 TEXT NOT NULL,
            gen5 TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (horse_id, line)
        );

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            source TEXT NOT NULL,
            rows_total INTEGER NOT NULL,
            rows_upserted INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Splits one CSV line. Fields in the archive exports never contain commas,
/// so a plain split is enough; quotes are stripped if present.
fn split_csv(line: &str) -> Vec<String> {
    line.split(',')
        .map(|field| field.trim().trim_matches('"').to_string())
        .collect()
}

fn opt_text(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

fn opt_f64(field: &str) -> Option<f64> {
    field.parse::<f64>().ok()
}

fn opt_u32(field: &str) -> Option<u32> {
    field.parse::<u32>().ok()
}

fn begin_ingest_run(conn: &Connection, source: &Path, rows_total: usize) -> Result<i64> {
    conn.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, source, rows_total, rows_upserted, errors_json)
         VALUES (?1, NULL, ?2, ?3, 0, '[]')",
        params![
            Utc::now().to_rfc3339(),
            source.display().to_string(),
            rows_total as i64
        ],
    )
    .context("insert ingest run")?;
    Ok(conn.last_insert_rowid())
}

fn finish_ingest_run(
    conn: &Connection,
    run_id: i64,
    rows_upserted: usize,
    errors: &[String],
) -> Result<()> {
    let errors_json = serde_json::to_string(errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE ingest_runs SET finished_at = ?1, rows_upserted = ?2, errors_json = ?3
         WHERE run_id = ?4",
        params![
            Utc::now().to_rfc3339(),
            rows_upserted as i64,
            errors_json,
            run_id
        ],
    )
    .context("update ingest run")?;
    Ok(())
}

/// Ingests a race-result CSV export. Expected columns:
/// `race_id,horse_id,date,venue,surface,distance,post,finish,sex_age,
///  win_odds,popularity,jockey_id,trainer_id,field_size`.
pub fn ingest_results_csv(conn: &mut Connection, path: &Path) -> Result<IngestSummary> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut lines = raw.lines();
    let header = lines.next().ok_or_else(|| anyhow!("empty results csv"))?;
    if !header.starts_with("race_id") {
        return Err(anyhow!("unexpected results csv header: {header}"));
    }

    let rows: Vec<&str> = lines.filter(|l| !l.trim().is_empty()).collect();
    let run_id = begin_ingest_run(conn, path, rows.len())?;

    let mut upserted = 0usize;
    let mut errors = Vec::new();
    let tx = conn.transaction().context("begin results ingest")?;
    for (idx, line) in rows.iter().enumerate() {
        let fields = split_csv(line);
        if fields.len() != 14 {
            errors.push(format!("line {}: expected 14 fields, got {}", idx + 2, fields.len()));
            continue;
        }
        let parsed = (
            fields[0].parse::<i64>(),
            fields[3].parse::<u8>(),
            fields[5].parse::<u32>(),
            fields[6].parse::<u32>(),
            fields[13].parse::<u32>(),
        );
        let (Ok(race_id), Ok(venue), Ok(distance), Ok(post), Ok(field_size)) = parsed else {
            errors.push(format!("line {}: unparseable numeric field", idx + 2));
            continue;
        };
        tx.execute(
            r#"
            INSERT INTO race_results (
                race_id, horse_id, race_date, venue, surface, distance, post,
                finish, sex_age, win_odds, popularity, jockey_id, trainer_id,
                field_size, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(race_id, horse_id) DO UPDATE SET
                race_date = excluded.race_date,
                venue = excluded.venue,
                surface = excluded.surface,
                distance = excluded.distance,
                post = excluded.post,
                finish = excluded.finish,
                sex_age = excluded.sex_age,
                win_odds = excluded.win_odds,
                popularity = excluded.popularity,
                jockey_id = excluded.jockey_id,
                trainer_id = excluded.trainer_id,
                field_size = excluded.field_size,
                updated_at = excluded.updated_at
            "#,
            params![
                race_id,
                fields[1],
                fields[2],
                i64::from(venue),
                fields[4],
                distance,
                post,
                opt_text(&fields[7]),
                fields[8],
                opt_f64(&fields[9]),
                opt_u32(&fields[10]),
                fields[11],
                fields[12],
                field_size,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("upsert result row")?;
        upserted += 1;
    }
    tx.commit().context("commit results ingest")?;
    finish_ingest_run(conn, run_id, upserted, &errors)?;

    Ok(IngestSummary {
        source: path.to_path_buf(),
        rows_total: rows.len(),
        rows_upserted: upserted,
        errors,
    })
}

/// Ingests a running-history CSV export. Expected columns:
/// `horse_id,date,meeting,surface_distance,finish,field_size,post,
///  popularity,margin,passage,final_furlong,body_weight,jockey_id`.
pub fn ingest_history_csv(conn: &mut Connection, path: &Path) -> Result<IngestSummary> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut lines = raw.lines();
    let header = lines.next().ok_or_else(|| anyhow!("empty history csv"))?;
    if !header.starts_with("horse_id") {
        return Err(anyhow!("unexpected history csv header: {header}"));
    }

    let rows: Vec<&str> = lines.filter(|l| !l.trim().is_empty()).collect();
    let run_id = begin_ingest_run(conn, path, rows.len())?;

    let mut upserted = 0usize;
    let mut errors = Vec::new();
    let tx = conn.transaction().context("begin history ingest")?;
    for (idx, line) in rows.iter().enumerate() {
        let fields = split_csv(line);
        if fields.len() != 13 {
            errors.push(format!("line {}: expected 13 fields, got {}", idx + 2, fields.len()));
            continue;
        }
        let Ok(field_size) = fields[5].parse::<u32>() else {
            errors.push(format!("line {}: unparseable field size", idx + 2));
            continue;
        };
        tx.execute(
            r#"
            INSERT INTO horse_history (
                horse_id, run_date, meeting, surface_distance, finish,
                field_size, post, popularity, margin, passage, final_furlong,
                body_weight, jockey_id, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(horse_id, run_date, meeting) DO UPDATE SET
                surface_distance = excluded.surface_distance,
                finish = excluded.finish,
                field_size = excluded.field_size,
                post = excluded.post,
                popularity = excluded.popularity,
                margin = excluded.margin,
                passage = excluded.passage,
                final_furlong = excluded.final_furlong,
                body_weight = excluded.body_weight,
                jockey_id = excluded.jockey_id,
                updated_at = excluded.updated_at
            "#,
            params![
                fields[0],
                fields[1],
                fields[2],
                fields[3],
                opt_text(&fields[4]),
                field_size,
                opt_u32(&fields[6]),
                opt_u32(&fields[7]),
                opt_f64(&fields[8]),
                opt_text(&fields[9]),
                opt_f64(&fields[10]),
                opt_text(&fields[11]),
                fields[12],
                Utc::now().to_rfc3339(),
            ],
        )
        .context("upsert history row")?;
        upserted += 1;
    }
    tx.commit().context("commit history ingest")?;
    finish_ingest_run(conn, run_id, upserted, &errors)?;

    Ok(IngestSummary {
        source: path.to_path_buf(),
        rows_total: rows.len(),
        rows_upserted: upserted,
        errors,
    })
}

/// Ingests a pedigree CSV export. Expected columns:
/// `horse_id,line,gen1,gen2,gen3,gen4,gen5` with line in 0..=3.
pub fn ingest_pedigree_csv(conn: &mut Connection, path: &Path) -> Result<IngestSummary> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut lines = raw.lines();
    let header = lines.next().ok_or_else(|| anyhow!("empty pedigree csv"))?;
    if !header.starts_with("horse_id") {
        return Err(anyhow!("unexpected pedigree csv header: {header}"));
    }

    let rows: Vec<&str> = lines.filter(|l| !l.trim().is_empty()).collect();
    let run_id = begin_ingest_run(conn, path, rows.len())?;

    let mut upserted = 0usize;
    let mut errors = Vec::new();
    let tx = conn.transaction().context("begin pedigree ingest")?;
    for (idx, line) in rows.iter().enumerate() {
        let fields = split_csv(line);
        if fields.len() != 7 {
            errors.push(format!("line {}: expected 7 fields, got {}", idx + 2, fields.len()));
            continue;
        }
        let Ok(line_no) = fields[1].parse::<u8>() else {
            errors.push(format!("line {}: unparseable line number", idx + 2));
            continue;
        };
        if line_no > 3 {
            errors.push(format!("line {}: ancestor line {} out of range", idx + 2, line_no));
            continue;
        }
        tx.execute(
            r#"
            INSERT INTO pedigree (horse_id, line, gen1, gen2, gen3, gen4, gen5, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(horse_id, line) DO UPDATE SET
                gen1 = excluded.gen1,
                gen2 = excluded.gen2,
                gen3 = excluded.gen3,
                gen4 = excluded.gen4,
                gen5 = excluded.gen5,
                updated_at = excluded.updated_at
            "#,
            params![
                fields[0],
                i64::from(line_no),
                fields[2],
                fields[3],
                fields[4],
                fields[5],
                fields[6],
                Utc::now().to_rfc3339(),
            ],
        )
        .context("upsert pedigree row")?;
        upserted += 1;
    }
    tx.commit().context("commit pedigree ingest")?;
    finish_ingest_run(conn, run_id, upserted, &errors)?;

    Ok(IngestSummary {
        source: path.to_path_buf(),
        rows_total: rows.len(),
        rows_upserted: upserted,
        errors,
    })
}

pub fn load_results(conn: &Connection) -> Result<Vec<StoredResult>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT race_id, horse_id, race_date, venue, surface, distance, post,
                   finish, sex_age, win_odds, popularity, jockey_id, trainer_id,
                   field_size
            FROM race_results
            ORDER BY race_date ASC, race_id ASC, post ASC
            "#,
        )
        .context("prepare load results query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredResult {
                race_id: row.get(0)?,
                horse_id: row.get(1)?,
                race_date: row.get(2)?,
                venue: row.get::<_, i64>(3)? as u8,
                surface: row.get(4)?,
                distance: row.get::<_, i64>(5)? as u32,
                post: row.get::<_, i64>(6)? as u32,
                finish: row.get(7)?,
                sex_age: row.get(8)?,
                win_odds: row.get(9)?,
                popularity: row.get::<_, Option<i64>>(10)?.map(|v| v as u32),
                jockey_id: row.get(11)?,
                trainer_id: row.get(12)?,
                field_size: row.get::<_, i64>(13)? as u32,
            })
        })
        .context("query load results")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode result row")?);
    }
    Ok(out)
}

pub fn load_history(conn: &Connection) -> Result<Vec<StoredRun>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT horse_id, run_date, meeting, surface_distance, finish,
                   field_size, post, popularity, margin, passage, final_furlong,
                   body_weight, jockey_id, rowid
            FROM horse_history
            ORDER BY horse_id ASC, run_date DESC, rowid DESC
            "#,
        )
        .context("prepare load history query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredRun {
                horse_id: row.get(0)?,
                run_date: row.get(1)?,
                meeting: row.get(2)?,
                surface_distance: row.get(3)?,
                finish: row.get(4)?,
                field_size: row.get::<_, i64>(5)? as u32,
                post: row.get::<_, Option<i64>>(6)?.map(|v| v as u32),
                popularity: row.get::<_, Option<i64>>(7)?.map(|v| v as u32),
                margin: row.get(8)?,
                passage: row.get(9)?,
                final_furlong: row.get(10)?,
                body_weight: row.get(11)?,
                jockey_id: row.get(12)?,
                rowid: row.get(13)?,
            })
        })
        .context("query load history")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode history row")?);
    }
    Ok(out)
}

pub fn load_pedigree(conn: &Connection) -> Result<Vec<StoredPedigreeLine>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT horse_id, line, gen1, gen2, gen3, gen4, gen5
            FROM pedigree
            ORDER BY horse_id ASC, line ASC
            "#,
        )
        .context("prepare load pedigree query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredPedigreeLine {
                horse_id: row.get(0)?,
                line: row.get::<_, i64>(1)? as u8,
                generations: [
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ],
            })
        })
        .context("query load pedigree")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode pedigree row")?);
    }
    Ok(out)
}
