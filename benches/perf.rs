use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use keiba_quinella::blood_score::blood_points;
use keiba_quinella::course::{Course, Surface, Venue};
use keiba_quinella::forest::{ForestConfig, RandomForest};
use keiba_quinella::merit::{PointCard, score_races};
use keiba_quinella::pedigree::{PedigreeProfile, classify_line};
use keiba_quinella::recency::RecencyFeatures;
use keiba_quinella::results::{RaceRow, Season, Sex};

fn sample_chain() -> [String; 5] {
    [
        "ディープインパクト2002".to_string(),
        "サンデーサイレンス1986".to_string(),
        "Halo1969".to_string(),
        "Hail to Reason1958".to_string(),
        "Turn-to1951".to_string(),
    ]
}

fn sample_profile() -> PedigreeProfile {
    let quiet = ["q1", "q2", "q3", "q4", "q5"].map(|n| n.to_string());
    PedigreeProfile::from_lines("bench", &[sample_chain(), quiet.clone(), quiet.clone(), quiet])
}

fn sample_race(race_id: i64, post: u32) -> RaceRow {
    RaceRow {
        race_id,
        horse_id: format!("horse{post}"),
        date: NaiveDate::from_ymd_opt(2020, 5, 31).unwrap(),
        season: Season::Spring,
        course: Course::new(Venue::Tokyo, Surface::Turf, 1600),
        post,
        sex: if post % 2 == 0 { Sex::Female } else { Sex::Male },
        age: 4,
        finish: Some(post),
        win_odds: None,
        popularity: None,
        jockey_id: "01088".to_string(),
        trainer_id: "01075".to_string(),
        field_size: 18,
    }
}

fn bench_classify_line(c: &mut Criterion) {
    let chain = sample_chain();
    c.bench_function("pedigree_classify_line", |b| {
        b.iter(|| {
            let profile = classify_line(black_box(&chain), 0);
            black_box(profile.sunday);
        })
    });
}

fn bench_blood_points(c: &mut Criterion) {
    let profile = sample_profile();
    let race = sample_race(1, 7);
    let recency = RecencyFeatures::default();
    c.bench_function("blood_points", |b| {
        b.iter(|| {
            let points = blood_points(black_box(&race), Some(black_box(&profile)), &recency);
            black_box(points);
        })
    });
}

fn bench_score_races(c: &mut Criterion) {
    let mut runners = Vec::new();
    for race_id in 0..100i64 {
        for post in 1..=18u32 {
            let card = PointCard {
                blood: (post as i32 % 5) - 2,
                margin: (post as i32 % 7) - 3,
                rank: post as i32 % 4,
                camp: (post as i32 % 3) * 2,
                closing: 33.0 + f64::from(post) / 10.0,
                advantage: (post as i32 % 3) - 1,
            };
            runners.push((sample_race(race_id, post), card));
        }
    }
    c.bench_function("score_races_100x18", |b| {
        b.iter(|| {
            let scored = score_races(black_box(&runners));
            black_box(scored.len());
        })
    });
}

fn bench_forest_predict(c: &mut Criterion) {
    let n = 500usize;
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let signal = (i % 10) as f64;
        x.push(vec![signal, ((i * 3) % 7) as f64, (i % 2) as f64]);
        y.push(signal >= 5.0);
    }
    let config = ForestConfig {
        trees: 50,
        max_depth: 8,
        min_split: 2,
        seed: 1234,
    };
    let forest = RandomForest::fit(&x, &y, config).expect("fit bench forest");

    c.bench_function("forest_predict_500", |b| {
        b.iter(|| {
            let probs = forest.predict_many(black_box(&x));
            black_box(probs.len());
        })
    });
}

criterion_group!(
    perf,
    bench_classify_line,
    bench_blood_points,
    bench_score_races,
    bench_forest_predict
);
criterion_main!(perf);
