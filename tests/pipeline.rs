use std::fs;
use std::path::PathBuf;

use keiba_quinella::{archive, pipeline};

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("keiba_quinella_it_{tag}"));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Seeds one three-runner race through the CSV ingest path:
/// - h1 won last month over 1400m by half a length, ridden then and now by a
///   listed jockey, and is by Deep Impact;
/// - h2 is a first-time starter with no pedigree record;
/// - h3 has only a run dated the race day itself, which must be invisible.
fn seeded_archive(tag: &str) -> rusqlite::Connection {
    let dir = temp_dir(tag);
    let db_path = dir.join("archive.sqlite");
    let _ = fs::remove_file(&db_path);
    let _ = fs::remove_file(dir.join("archive.sqlite-wal"));
    let _ = fs::remove_file(dir.join("archive.sqlite-shm"));
    let mut conn = archive::open_db(&db_path).expect("open archive");

    let results = dir.join("results.csv");
    fs::write(
        &results,
        "race_id,horse_id,date,venue,surface,distance,post,finish,sex_age,win_odds,popularity,jockey_id,trainer_id,field_size\n\
         202006010811,h1,2020年6月7日,5,芝,1600,1,1,牡4,2.4,1,01088,09990,3\n\
         202006010811,h2,2020年6月7日,5,芝,1600,2,2,牝4,5.9,2,09991,09992,3\n\
         202006010811,h3,2020年6月7日,5,芝,1600,3,3,セ5,11.2,3,09993,09994,3\n",
    )
    .expect("write results csv");

    let history = dir.join("history.csv");
    fs::write(
        &history,
        "horse_id,date,meeting,surface_distance,finish,field_size,post,popularity,margin,passage,final_furlong,body_weight,jockey_id\n\
         h1,2020/05/10,2東京8,芝1400,1,10,2,1,-0.5,1-1,33.5,478(0),01088\n\
         h3,2020/06/07,3東京2,芝1600,1,12,1,1,-0.3,1-1,33.0,500(+4),09993\n",
    )
    .expect("write history csv");

    let pedigree = dir.join("pedigree.csv");
    fs::write(
        &pedigree,
        "horse_id,line,gen1,gen2,gen3,gen4,gen5\n\
         h1,0,ディープインパクト2002,サンデーサイレンス1986,Halo1969,Hail to Reason1958,Turn-to1951\n\
         h1,1,qa1,qa2,qa3,qa4,qa5\n\
         h1,2,qb1,qb2,qb3,qb4,qb5\n\
         h1,3,qc1,qc2,qc3,qc4,qc5\n",
    )
    .expect("write pedigree csv");

    archive::ingest_results_csv(&mut conn, &results).expect("ingest results");
    archive::ingest_history_csv(&mut conn, &history).expect("ingest history");
    archive::ingest_pedigree_csv(&mut conn, &pedigree).expect("ingest pedigree");
    conn
}

#[test]
fn end_to_end_scores_match_hand_computed_values() {
    let conn = seeded_archive("end_to_end");
    let mut scored = pipeline::build_scored_runners(&conn).expect("pipeline");
    assert_eq!(scored.len(), 3);
    scored.sort_by(|a, b| a.horse_id.cmp(&b.horse_id));

    let h1 = &scored[0];
    let h2 = &scored[1];
    let h3 = &scored[2];

    // Raw families are [h1, h2, h3] = blood [4,0,0], margin [3,0,0],
    // camp [4,0,0], closing [33.5/3,0,0], rank all zero. Sample-std
    // z-scores of a [v,0,0] family are 2/sqrt(3) and -1/sqrt(3).
    let hi = 2.0 / 3.0_f64.sqrt();
    let lo = -1.0 / 3.0_f64.sqrt();

    assert!((h1.blood_z - hi).abs() < 1e-9, "blood_z {}", h1.blood_z);
    assert!((h2.blood_z - lo).abs() < 1e-9);
    assert!((h1.margin_z - hi).abs() < 1e-9);
    assert!((h1.camp_z - hi).abs() < 1e-9);
    assert!((h1.closing_z - hi).abs() < 1e-9);
    assert_eq!(h1.rank_z, 0.0);

    // h1's only advantage entry is the wire-to-wire penalty.
    assert_eq!(h1.advantage, -1.0);
    assert_eq!(h2.advantage, 0.0);

    let expected_total = hi * 4.0 - 1.0;
    assert!((h1.total - expected_total).abs() < 1e-9, "total {}", h1.total);

    assert!(h1.quinella());
    assert!(h2.quinella());
    assert!(!h3.quinella());
}

#[test]
fn same_day_history_never_leaks_into_features() {
    let conn = seeded_archive("leak_guard");
    let scored = pipeline::build_scored_runners(&conn).expect("pipeline");
    let h3 = scored.iter().find(|r| r.horse_id == "h3").expect("h3 scored");

    // h3's lone history row shares the race date, so every raw family must
    // sit at the field's zero baseline.
    let lo = -1.0 / 3.0_f64.sqrt();
    assert!((h3.blood_z - lo).abs() < 1e-9);
    assert!((h3.margin_z - lo).abs() < 1e-9);
    assert!((h3.camp_z - lo).abs() < 1e-9);
    assert!((h3.closing_z - lo).abs() < 1e-9);
    assert_eq!(h3.advantage, 0.0);
}

#[test]
fn z_families_sum_to_zero_within_a_race() {
    let conn = seeded_archive("z_sums");
    let scored = pipeline::build_scored_runners(&conn).expect("pipeline");
    let sum_blood: f64 = scored.iter().map(|r| r.blood_z).sum();
    let sum_margin: f64 = scored.iter().map(|r| r.margin_z).sum();
    let sum_camp: f64 = scored.iter().map(|r| r.camp_z).sum();
    assert!(sum_blood.abs() < 1e-9);
    assert!(sum_margin.abs() < 1e-9);
    assert!(sum_camp.abs() < 1e-9);
}
