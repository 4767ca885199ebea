//! Pedigree-driven course interaction points.
//!
//! Three layers accumulate into one signed `blood` point per runner: per-sire
//! course rules, pedigree-type rules, and pace-profile rules keyed on
//! distance changes and layoffs. Each rule applies its delta at most once,
//! however many of its branches match.

use crate::course::{Course, CourseClass, Surface, Venue};
use crate::pedigree::{BloodGroup, PedigreeProfile};
use crate::recency::RecencyFeatures;
use crate::results::{RaceRow, Sex};

enum CourseTarget {
    Classes(&'static [CourseClass]),
    Exact(&'static [(Venue, Surface, u16)]),
    Surface(Surface),
}

struct Branch {
    sex: Option<Sex>,
    target: CourseTarget,
}

struct SireRule {
    sire: &'static str,
    delta: i8,
    branches: &'static [Branch],
}

const fn any(target: CourseTarget) -> Branch {
    Branch { sex: None, target }
}

const fn colts(target: CourseTarget) -> Branch {
    Branch {
        sex: Some(Sex::Male),
        target,
    }
}

const fn fillies(target: CourseTarget) -> Branch {
    Branch {
        sex: Some(Sex::Female),
        target,
    }
}

use CourseClass::{DirtA, DirtB, DirtC, DirtD, TurfA, TurfB, TurfC, TurfD};
use CourseTarget::{Classes, Exact, Surface as WholeSurface};

static SIRE_RULES: &[SireRule] = &[
    SireRule {
        sire: "ディープインパクト",
        delta: 1,
        branches: &[
            any(Exact(&[
                (Venue::Tokyo, Surface::Turf, 1600),
                (Venue::Tokyo, Surface::Turf, 1800),
            ])),
            fillies(Classes(&[TurfA])),
        ],
    },
    SireRule {
        sire: "ディープインパクト",
        delta: 1,
        branches: &[any(Classes(&[TurfA, TurfC, TurfD]))],
    },
    SireRule {
        sire: "ディープインパクト",
        delta: -1,
        branches: &[any(Classes(&[TurfB])), fillies(Classes(&[TurfC]))],
    },
    SireRule {
        sire: "ハーツクライ",
        delta: 1,
        branches: &[colts(Classes(&[TurfC])), fillies(Classes(&[TurfD]))],
    },
    SireRule {
        sire: "ハーツクライ",
        delta: 1,
        branches: &[any(Classes(&[TurfA, TurfC, TurfD]))],
    },
    SireRule {
        sire: "ハーツクライ",
        delta: -1,
        branches: &[fillies(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "ハーツクライ",
        delta: 1,
        branches: &[colts(Classes(&[DirtB, DirtC, DirtD]))],
    },
    SireRule {
        sire: "ダイワメジャー",
        delta: 2,
        branches: &[any(Classes(&[TurfA]))],
    },
    SireRule {
        sire: "ダイワメジャー",
        delta: 1,
        branches: &[colts(Classes(&[TurfD]))],
    },
    SireRule {
        sire: "ダイワメジャー",
        delta: -1,
        branches: &[any(Classes(&[TurfB, TurfC]))],
    },
    SireRule {
        sire: "ダイワメジャー",
        delta: 1,
        branches: &[colts(Classes(&[DirtA]))],
    },
    SireRule {
        sire: "ハービンジャー Harbinger(英)",
        delta: 2,
        branches: &[any(Classes(&[TurfC, TurfD]))],
    },
    SireRule {
        sire: "ハービンジャー Harbinger(英)",
        delta: 1,
        branches: &[colts(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "ハービンジャー Harbinger(英)",
        delta: -1,
        branches: &[any(Classes(&[TurfA]))],
    },
    SireRule {
        sire: "ルーラーシップ",
        delta: 2,
        branches: &[colts(Classes(&[TurfC])), fillies(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "ルーラーシップ",
        delta: 1,
        branches: &[colts(Classes(&[TurfB])), fillies(Classes(&[TurfC]))],
    },
    SireRule {
        sire: "ルーラーシップ",
        delta: -1,
        branches: &[any(Classes(&[TurfA, TurfD]))],
    },
    SireRule {
        sire: "ルーラーシップ",
        delta: 1,
        branches: &[colts(Classes(&[DirtC]))],
    },
    SireRule {
        sire: "ロードカナロア",
        delta: 2,
        branches: &[any(Classes(&[TurfA]))],
    },
    SireRule {
        sire: "ロードカナロア",
        delta: 1,
        branches: &[colts(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "ロードカナロア",
        delta: -1,
        branches: &[any(Classes(&[TurfC, TurfD]))],
    },
    SireRule {
        sire: "ロードカナロア",
        delta: 1,
        branches: &[any(Classes(&[DirtA, DirtB]))],
    },
    SireRule {
        sire: "ステイゴールド",
        delta: 2,
        branches: &[colts(Classes(&[TurfA, TurfD]))],
    },
    SireRule {
        sire: "ステイゴールド",
        delta: 1,
        branches: &[fillies(Classes(&[TurfD])), any(Classes(&[TurfC]))],
    },
    SireRule {
        sire: "ステイゴールド",
        delta: -1,
        branches: &[any(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "キングカメハメハ",
        delta: 2,
        branches: &[colts(Classes(&[TurfA])), fillies(Classes(&[TurfD]))],
    },
    SireRule {
        sire: "キングカメハメハ",
        delta: 1,
        branches: &[colts(Classes(&[TurfD])), fillies(Classes(&[TurfA]))],
    },
    SireRule {
        sire: "キングカメハメハ",
        delta: -1,
        branches: &[any(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "キングカメハメハ",
        delta: 1,
        branches: &[colts(WholeSurface(Surface::Dirt))],
    },
    SireRule {
        sire: "オルフェーヴル",
        delta: 2,
        branches: &[colts(Classes(&[TurfC]))],
    },
    SireRule {
        sire: "オルフェーヴル",
        delta: 1,
        branches: &[fillies(Classes(&[TurfC]))],
    },
    SireRule {
        sire: "オルフェーヴル",
        delta: -1,
        branches: &[any(Classes(&[TurfA]))],
    },
    SireRule {
        sire: "オルフェーヴル",
        delta: 1,
        branches: &[any(Classes(&[DirtC]))],
    },
    SireRule {
        sire: "ヴィクトワールピサ",
        delta: 1,
        branches: &[fillies(Classes(&[TurfC, TurfD]))],
    },
    SireRule {
        sire: "キンシャサノキセキ",
        delta: 2,
        branches: &[colts(Classes(&[TurfA]))],
    },
    SireRule {
        sire: "キンシャサノキセキ",
        delta: 1,
        branches: &[colts(Classes(&[TurfB])), fillies(Classes(&[TurfA, TurfD]))],
    },
    SireRule {
        sire: "キンシャサノキセキ",
        delta: 1,
        branches: &[colts(Classes(&[DirtA, DirtD]))],
    },
    SireRule {
        sire: "マンハッタンカフェ",
        delta: 1,
        branches: &[any(Classes(&[TurfA, TurfD]))],
    },
    SireRule {
        sire: "ディープブリランテ",
        delta: 1,
        branches: &[colts(Classes(&[TurfD])), fillies(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "スクリーンヒーロー",
        delta: 1,
        branches: &[colts(Classes(&[TurfB, TurfC])), fillies(Classes(&[TurfA]))],
    },
    SireRule {
        sire: "ブラックタイド",
        delta: 1,
        branches: &[colts(Classes(&[TurfB])), fillies(Classes(&[TurfD]))],
    },
    SireRule {
        sire: "ノヴェリスト Novellist(愛)",
        delta: 1,
        branches: &[colts(Classes(&[TurfA, TurfC])), fillies(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "エイシンフラッシュ",
        delta: 1,
        branches: &[colts(Classes(&[TurfB, TurfC]))],
    },
    SireRule {
        sire: "キズナ",
        delta: 2,
        branches: &[fillies(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "キズナ",
        delta: 1,
        branches: &[colts(Classes(&[TurfB])), colts(WholeSurface(Surface::Dirt))],
    },
    SireRule {
        sire: "アドマイヤムーン",
        delta: 1,
        branches: &[colts(Classes(&[TurfA, TurfD]))],
    },
    SireRule {
        sire: "ジャスタウェイ",
        delta: 1,
        branches: &[colts(Classes(&[TurfC]))],
    },
    SireRule {
        sire: "エピファネイア",
        delta: 2,
        branches: &[fillies(Classes(&[TurfB, TurfC]))],
    },
    SireRule {
        sire: "エピファネイア",
        delta: 1,
        branches: &[colts(Classes(&[TurfB, TurfC]))],
    },
    SireRule {
        sire: "ドリームジャーニー",
        delta: 1,
        branches: &[colts(Classes(&[TurfC, TurfD]))],
    },
    SireRule {
        sire: "ジャングルポケット",
        delta: 1,
        branches: &[colts(Classes(&[TurfA, TurfD]))],
    },
    SireRule {
        sire: "メイショウサムソン",
        delta: 1,
        branches: &[any(Classes(&[TurfD]))],
    },
    SireRule {
        sire: "ワークフォース Workforce(英)",
        delta: 1,
        branches: &[any(Classes(&[TurfC]))],
    },
    SireRule {
        sire: "マツリダゴッホ",
        delta: 2,
        branches: &[fillies(Classes(&[TurfA]))],
    },
    SireRule {
        sire: "マツリダゴッホ",
        delta: 1,
        branches: &[colts(Classes(&[TurfB, TurfD])), fillies(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "ゴールドアリュール",
        delta: 2,
        branches: &[colts(WholeSurface(Surface::Dirt))],
    },
    SireRule {
        sire: "ゴールドアリュール",
        delta: 1,
        branches: &[fillies(WholeSurface(Surface::Dirt))],
    },
    SireRule {
        sire: "クロフネ",
        delta: 2,
        branches: &[fillies(WholeSurface(Surface::Dirt))],
    },
    SireRule {
        sire: "クロフネ",
        delta: 1,
        branches: &[colts(WholeSurface(Surface::Dirt))],
    },
    SireRule {
        sire: "サウスヴィグラス",
        delta: 2,
        branches: &[any(Classes(&[DirtA]))],
    },
    SireRule {
        sire: "ヘニーヒューズ Henny Hughes(米)",
        delta: 2,
        branches: &[any(Classes(&[DirtA, DirtD]))],
    },
    SireRule {
        sire: "エンパイアメーカー Empire Maker(米)",
        delta: 1,
        branches: &[any(WholeSurface(Surface::Dirt))],
    },
    SireRule {
        sire: "アイルハヴアナザー I'll Have Another(米)",
        delta: 1,
        branches: &[any(Classes(&[DirtC]))],
    },
    SireRule {
        sire: "シニスターミニスター Sinister Minister(米)",
        delta: 1,
        branches: &[colts(WholeSurface(Surface::Dirt))],
    },
    SireRule {
        sire: "ネオユニヴァース",
        delta: 1,
        branches: &[colts(Classes(&[DirtC, DirtD]))],
    },
    SireRule {
        sire: "シンボリクリスエス",
        delta: 1,
        branches: &[colts(Classes(&[DirtC, DirtD]))],
    },
    SireRule {
        sire: "メイショウボーラー",
        delta: 1,
        branches: &[colts(Classes(&[DirtA]))],
    },
    SireRule {
        sire: "カネヒキリ",
        delta: 1,
        branches: &[any(Classes(&[DirtA, DirtD]))],
    },
    SireRule {
        sire: "パイロ Pyro(米)",
        delta: 1,
        branches: &[any(Classes(&[DirtA, DirtD]))],
    },
    SireRule {
        sire: "スマートファルコン",
        delta: 1,
        branches: &[any(Classes(&[DirtC]))],
    },
    SireRule {
        sire: "ドゥラメンテ",
        delta: 2,
        branches: &[any(Classes(&[TurfA, TurfD]))],
    },
    SireRule {
        sire: "ドゥラメンテ",
        delta: -1,
        branches: &[any(Classes(&[TurfB]))],
    },
    SireRule {
        sire: "ドゥラメンテ",
        delta: 1,
        branches: &[colts(WholeSurface(Surface::Dirt))],
    },
    SireRule {
        sire: "モーリス",
        delta: 2,
        branches: &[colts(Classes(&[TurfB, TurfC])), fillies(Classes(&[TurfA]))],
    },
    SireRule {
        sire: "モーリス",
        delta: -1,
        branches: &[any(Classes(&[TurfD]))],
    },
    SireRule {
        sire: "ダノンレジェンド",
        delta: 2,
        branches: &[any(Classes(&[DirtA, DirtB]))],
    },
];

/// Sires whose stock improves when the pace softens (stepping up in trip,
/// or fresh off a break).
static PACE_DOWN_SIRES: &[&str] = &[
    "ディープインパクト",
    "エピファネイア",
    "ルーラーシップ",
    "パイロ Pyro(米)",
    "トゥザグローリー",
    "ノヴェリスト Novellist(愛)",
    "ヨハネスブルグ Johannesburg(米)",
    "ハービンジャー Harbinger(英)",
    "ネオユニヴァース",
    "ワールドエース",
    "ジャスタウェイ",
];

/// Sires whose stock improves when the pace lifts (dropping in trip, racing
/// on a quick turnaround).
static PACE_UP_SIRES: &[&str] = &[
    "キングカメハメハ",
    "ロードカナロア",
    "ドゥラメンテ",
    "サウスヴィグラス",
    "カジノドライヴ",
    "アイルハヴアナザー I'll Have Another(米)",
    "エンパイアメーカー Empire Maker(米)",
    "ベルシャザール",
    "エスケンデレヤ",
    "タートルボウル Turtle Bowl(愛)",
    "スクリーンヒーロー",
    "モーリス",
];

struct TypeRule {
    applies: fn(&PedigreeProfile) -> bool,
    classes: &'static [CourseClass],
    delta: i8,
}

static TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        applies: |p| p.dam_line.american() || p.dam_dam_line.american() || p.non_sunday(),
        classes: &[TurfA],
        delta: 1,
    },
    TypeRule {
        applies: |p| {
            p.sire_line.american()
                || p.sire_line.european()
                || p.non_sunday()
                || p.dam_line.japanese()
        },
        classes: &[TurfB],
        delta: 1,
    },
    TypeRule {
        applies: |p| p.eu_a() || p.eu_b(),
        classes: &[TurfC],
        delta: 1,
    },
    TypeRule {
        applies: |p| {
            (p.dam_line.european() || p.dam_dam_line.european()) && p.sire_line.japanese()
        },
        classes: &[TurfD],
        delta: 1,
    },
    TypeRule {
        applies: |p| p.us_a() || p.us_b() || p.non_sunday(),
        classes: &[DirtA],
        delta: 1,
    },
    TypeRule {
        applies: |p| p.eu_a() || p.deep_close(),
        classes: &[DirtA],
        delta: -1,
    },
    TypeRule {
        applies: |p| p.deep_close() || p.kingmambo_close() || p.dam_line.nasrullah(),
        classes: &[DirtB],
        delta: 1,
    },
    TypeRule {
        applies: |p| {
            p.sire_line.japanese()
                || p.sire_line.european()
                || p.dam_line.has(BloodGroup::Nijinsky)
        },
        classes: &[DirtC],
        delta: 1,
    },
    TypeRule {
        applies: |p| p.eu_b() || p.sire_line.nasrullah() || p.sire_line.has(BloodGroup::Sadler),
        classes: &[DirtD],
        delta: 1,
    },
];

/// Layoff threshold in days past which a horse is treated as fresh off a
/// break.
const LONG_BREAK_DAYS: i64 = 65;
/// Quick-turnaround threshold in days.
const QUICK_RETURN_DAYS: i64 = 40;

fn branch_matches(branch: &Branch, sex: Sex, course: Course) -> bool {
    if let Some(required) = branch.sex
        && required != sex
    {
        return false;
    }
    match branch.target {
        Classes(classes) => classes.iter().any(|class| course.in_class(*class)),
        Exact(list) => list
            .iter()
            .any(|(v, s, d)| *v == course.venue && *s == course.surface && u32::from(*d) == course.distance),
        WholeSurface(surface) => course.surface == surface,
    }
}

fn sire_course_points(sire: &str, sex: Sex, course: Course) -> i32 {
    SIRE_RULES
        .iter()
        .filter(|rule| rule.sire == sire)
        .filter(|rule| rule.branches.iter().any(|b| branch_matches(b, sex, course)))
        .map(|rule| i32::from(rule.delta))
        .sum()
}

fn type_points(profile: &PedigreeProfile, course: Course) -> i32 {
    TYPE_RULES
        .iter()
        .filter(|rule| rule.classes.iter().any(|class| course.in_class(*class)))
        .filter(|rule| (rule.applies)(profile))
        .map(|rule| i32::from(rule.delta))
        .sum()
}

fn filly_course_points(sex: Sex, course: Course) -> i32 {
    if sex != Sex::Female {
        return 0;
    }
    let mut points = 0;
    if course.in_class(TurfC) {
        points -= 1;
    }
    if course.in_class(DirtD) {
        points -= 1;
    }
    points
}

fn pace_points(sire: &str, race: &RaceRow, recency: &RecencyFeatures) -> i32 {
    let down = PACE_DOWN_SIRES.iter().any(|s| *s == sire);
    let up = PACE_UP_SIRES.iter().any(|s| *s == sire);
    if !down && !up {
        return 0;
    }

    let mut points = 0;
    let step_today = recency.dist_step_today(race.course.distance);
    if let Some(step) = step_today {
        if step < 0 {
            points += if down { 2 } else { -2 };
        } else if step > 0 {
            points += if up { 2 } else { -2 };
        } else if down && matches!(recency.dist_step_prev(), Some(s) if s > 0) {
            points += 1;
        }
    }

    let gap_today = recency.gap_today(race.date);
    if matches!(gap_today, Some(g) if g > LONG_BREAK_DAYS) {
        points += if down { 1 } else { -1 };
    }

    let last_finish = recency.last.as_ref().and_then(|l| l.finish);
    if let (Some(gap_prev), Some(gap), Some(finish)) = (recency.gap_prev(), gap_today, last_finish)
        && gap_prev > LONG_BREAK_DAYS
        && gap < QUICK_RETURN_DAYS
    {
        if down && finish <= 5 {
            points -= 1;
        }
        if up && finish <= 9 {
            points += 1;
        }
    }
    points
}

/// Total blood points for one runner. The filly course penalty applies even
/// without a pedigree record; everything else needs one.
pub fn blood_points(
    race: &RaceRow,
    profile: Option<&PedigreeProfile>,
    recency: &RecencyFeatures,
) -> i32 {
    let mut points = filly_course_points(race.sex, race.course);
    if let Some(profile) = profile {
        points += sire_course_points(&profile.sire, race.sex, race.course);
        points += type_points(profile, race.course);
        points += pace_points(&profile.sire, race, recency);
    }
    points
}
