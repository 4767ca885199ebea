//! Margin, rank and closing-speed form points.

use crate::recency::RecencyFeatures;

/// Margin buckets over the last-run margin in seconds. Values that fall in
/// the seams between buckets score zero.
static MARGIN_BUCKETS: &[(f64, f64, i32)] = &[
    (f64::NEG_INFINITY, -0.3, 3),
    (-0.2, 0.0, 2),
    (0.1, 0.2, 1),
    (0.3, 0.6, 0),
    (0.7, 0.9, -1),
    (1.0, f64::INFINITY, -2),
];

/// Normalized-finish buckets shared by the 2nd- and 3rd-run contributions.
static NORM_FINISH_BUCKETS: &[(f64, f64, i32)] = &[
    (0.8, f64::INFINITY, 3),
    (0.7, 0.8, 2),
    (0.6, 0.7, 1),
    (0.3, 0.4, -1),
    (f64::NEG_INFINITY, 0.3, -2),
];

pub fn margin_points(margin: Option<f64>) -> i32 {
    let Some(margin) = margin else {
        return 0;
    };
    for (lo, hi, delta) in MARGIN_BUCKETS {
        if margin >= *lo && margin <= *hi {
            return *delta;
        }
    }
    0
}

fn norm_finish_points(norm: Option<f64>) -> i32 {
    let Some(norm) = norm else {
        return 0;
    };
    for (lo, hi, delta) in NORM_FINISH_BUCKETS {
        if norm >= *lo && norm < *hi {
            return *delta;
        }
    }
    0
}

/// Rank points: a mid-field last run keeps a horse honestly priced, and the
/// 2nd/3rd runs grade on the field-size-normalized finish.
pub fn rank_points(recency: &RecencyFeatures) -> i32 {
    let mut points = 0;
    if let Some(finish) = recency.last.as_ref().and_then(|l| l.finish)
        && (4..=8).contains(&finish)
    {
        points += 1;
    }
    points += norm_finish_points(recency.second.as_ref().and_then(|r| r.norm_finish));
    points += norm_finish_points(recency.third.as_ref().and_then(|r| r.norm_finish));
    points
}

/// Mean of the last three final-furlong times. Missing slots contribute
/// zero, matching the archive convention for short histories.
pub fn closing_average(recency: &RecencyFeatures) -> f64 {
    let first = recency
        .last
        .as_ref()
        .and_then(|l| l.final_furlong)
        .unwrap_or(0.0);
    let second = recency
        .second
        .as_ref()
        .and_then(|r| r.final_furlong)
        .unwrap_or(0.0);
    let third = recency
        .third
        .as_ref()
        .and_then(|r| r.final_furlong)
        .unwrap_or(0.0);
    (first + second + third) / 3.0
}
