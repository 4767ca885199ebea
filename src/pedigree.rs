//! Bloodline classification over five-generation pedigree lines.
//!
//! Each horse carries four ancestor lines (sire, sire-dam, dam, dam-dam),
//! each a chain of five ancestor names. A line belongs to a bloodline group
//! when any of the group's marker names appears anywhere in the chain; the
//! marker lists are hand-curated breeding knowledge and are carried here as
//! data.

use std::collections::HashMap;

use tracing::warn;

use crate::archive::StoredPedigreeLine;

/// The named bloodline groups. `TurfSunday` / `PowerSunday` / `DirtSunday`
/// split the Sunday Silence branch by aptitude; the rest follow the usual
/// sire-line taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BloodGroup {
    MyBabu = 0,
    Warning,
    Relaunch,
    Sterling,
    UsMinor,
    Ribot,
    Hampton,
    Nijinsky,
    EuNorthernDancer,
    Sadler,
    EuDanzig,
    UsDanzig,
    ViceRegent,
    StormBird,
    NorthernTaste,
    Halo,
    Roberto,
    SirGaylord,
    UsNative,
    EuNative,
    Kingmambo,
    FortyNiner,
    Darley,
    Fappiano,
    OtherMrProspector,
    GreySovereign,
    PrincelyGift,
    BoldRuler,
    RedGod,
    NeverBend,
    Deep,
    TurfSunday,
    PowerSunday,
    DirtSunday,
}

struct GroupSpec {
    group: BloodGroup,
    /// Marker names matched in every generation.
    names: &'static [&'static str],
    /// Marker names matched only in the first generation.
    first_gen_only: &'static [&'static str],
    /// Marker names matched in generations 1-4 but not 5.
    not_in_last_gen: &'static [&'static str],
}

const NO_NAMES: &[&str] = &[];

static GROUP_SPECS: &[GroupSpec] = &[
    GroupSpec {
        group: BloodGroup::MyBabu,
        names: &["メジロマックイーン", "トウカイテイオー"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Warning,
        names: &["Warning"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Relaunch,
        names: &["Relaunch"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Sterling,
        names: &["Monsun"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::UsMinor,
        names: &["Damascus", "Icecapade", "Wild Again", "Holy Bull", "Broad Brush"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Ribot,
        names: &["Graustark", "His Majesty", "Tom Rolfe", "Ribot"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Hampton,
        names: &["Dictus", "Surumu", "Forli", "Star Kingdom"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Nijinsky,
        names: &["Nijinsky"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::EuNorthernDancer,
        names: &[
            "Lyphard",
            "Dancing Brave",
            "ホワイトマズル",
            "キングヘイロー",
            "Nureyev",
            "Pivotal",
            "Last Tycoon",
            "Fairy King",
            "Assatis",
        ],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Sadler,
        names: &["Sadler's Wells"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::EuDanzig,
        names: &["Green Desert", "Danehill"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::UsDanzig,
        names: &["Chief's Crown", "Chief Bearhart", "Hard Spun"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::ViceRegent,
        names: &["Vice Regent", "Deputy Minister"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::StormBird,
        names: &["Storm Bird", "Storm Cat"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::NorthernTaste,
        names: &["ノーザンテースト"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Halo,
        names: &["Devil", "Glorious Song", "サザンヘイロー"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Roberto,
        names: &["Roberto"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::SirGaylord,
        names: &["Habitat", "Sir Tristram"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::UsNative,
        names: &["Kauai King", "Majestic Prince", "Affirmed", "Alydar"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::EuNative,
        names: &["Atan", "Sharpen Up", "Sea-Bird"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    // Miswaki only counts when he is the line head himself.
    GroupSpec {
        group: BloodGroup::Kingmambo,
        names: &["Kingmambo"],
        first_gen_only: &["Miswaki"],
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::FortyNiner,
        names: &[
            "サウスヴィグラス",
            "プリサイスエンド",
            "スウェプトオーヴァーボード",
            "スイープトウショウ",
            "ラインクラフト",
            "アイルハヴアナザー",
            "Coronado's Quest",
        ],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Darley,
        names: &["アドマイヤムーン"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Fappiano,
        names: &["Fappiano"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::OtherMrProspector,
        names: &[
            "Woodman",
            "Gone West",
            "Seeking the Gold",
            "Machiavellian",
            "Smart Strike",
            "King Glorious",
            "アグネスデジタル",
            "Afreet",
            "Gulch",
            "Jade Robbery",
            "Scan",
            "War Emblem",
            "Aldebaran",
        ],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::GreySovereign,
        names: &["シービークロス", "Cozzene", "Tony Bin", "Caro"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::PrincelyGift,
        names: &["サクラユタカオー"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::BoldRuler,
        names: &["ロイヤルスキー", "Seattle Slew"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::RedGod,
        names: &["Blushing Groom"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::NeverBend,
        names: &[
            "Shirley Heights",
            "Mill Reef",
            "ミルジョージ",
            "Magnitude",
            "Riverman",
            "Bravest Roman",
        ],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::Deep,
        names: &["ディープインパクト"],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    GroupSpec {
        group: BloodGroup::TurfSunday,
        names: &[
            "ブラックタイド",
            "ステイゴールド",
            "ゼンノロブロイ",
            "ハーツクライ",
            "ヴィクトワールピサ",
            "マンハッタンカフェ",
            "オルフェーヴル",
            "ダンスインザダーク",
            "スペシャルウィーク",
            "アドマイヤグルーヴ",
        ],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
    // Agnes Tachyon stops counting at the fifth generation.
    GroupSpec {
        group: BloodGroup::PowerSunday,
        names: &[
            "フジキセキ",
            "ダイワメジャー",
            "キンシャサノキセキ",
            "デュランダル",
            "マツリダゴッホ",
            "ジョーカプチーノ",
        ],
        first_gen_only: NO_NAMES,
        not_in_last_gen: &["アグネスタキオン"],
    },
    GroupSpec {
        group: BloodGroup::DirtSunday,
        names: &[
            "ゴールドアリュール",
            "カネヒキリ",
            "ネオユニヴァース",
            "ディープスカイ",
            "スズカマンボ",
        ],
        first_gen_only: NO_NAMES,
        not_in_last_gen: NO_NAMES,
    },
];

const SUNDAY_SILENCE: &str = "サンデーサイレンス";

fn contains_any(name: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| name.contains(needle))
}

/// Ancestor names in the archive carry trailing registry digits (birth year
/// and studbook number); the head name is everything before the first digit.
pub fn strip_registry_digits(name: &str) -> String {
    let head: String = name.chars().take_while(|c| !c.is_ascii_digit()).collect();
    head.trim().to_string()
}

/// One classified ancestor line.
#[derive(Debug, Clone, Default)]
pub struct LineProfile {
    /// The line's head ancestor name, digits stripped.
    pub head: String,
    groups: u64,
    /// Sunday Silence appears anywhere in the five generations.
    pub sunday: bool,
}

impl LineProfile {
    pub fn has(&self, group: BloodGroup) -> bool {
        self.groups & (1u64 << (group as u8)) != 0
    }

    pub fn nasrullah(&self) -> bool {
        self.has(BloodGroup::GreySovereign)
            || self.has(BloodGroup::PrincelyGift)
            || self.has(BloodGroup::BoldRuler)
            || self.has(BloodGroup::RedGod)
            || self.has(BloodGroup::NeverBend)
    }

    pub fn mr_prospector(&self) -> bool {
        self.has(BloodGroup::Kingmambo)
            || self.has(BloodGroup::FortyNiner)
            || self.has(BloodGroup::Darley)
            || self.has(BloodGroup::Fappiano)
            || self.has(BloodGroup::OtherMrProspector)
    }

    pub fn turn_to(&self) -> bool {
        self.has(BloodGroup::Halo) || self.has(BloodGroup::Roberto) || self.has(BloodGroup::SirGaylord)
    }

    pub fn us_northern_dancer(&self) -> bool {
        self.has(BloodGroup::UsDanzig)
            || self.has(BloodGroup::ViceRegent)
            || self.has(BloodGroup::StormBird)
    }

    pub fn eu_northern_dancer(&self) -> bool {
        self.has(BloodGroup::Nijinsky)
            || self.has(BloodGroup::EuNorthernDancer)
            || self.has(BloodGroup::Sadler)
            || self.has(BloodGroup::EuDanzig)
    }

    pub fn japanese(&self) -> bool {
        self.has(BloodGroup::PrincelyGift)
            || self.has(BloodGroup::Darley)
            || self.sunday
            || self.has(BloodGroup::NorthernTaste)
    }

    pub fn american(&self) -> bool {
        self.has(BloodGroup::Relaunch)
            || self.has(BloodGroup::UsMinor)
            || self.us_northern_dancer()
            || self.has(BloodGroup::Halo)
            || self.has(BloodGroup::UsNative)
            || self.has(BloodGroup::FortyNiner)
            || self.has(BloodGroup::Fappiano)
            || self.has(BloodGroup::OtherMrProspector)
            || self.has(BloodGroup::BoldRuler)
    }

    pub fn european(&self) -> bool {
        self.has(BloodGroup::MyBabu)
            || self.has(BloodGroup::Warning)
            || self.has(BloodGroup::Sterling)
            || self.has(BloodGroup::Ribot)
            || self.has(BloodGroup::Hampton)
            || self.eu_northern_dancer()
            || self.has(BloodGroup::Roberto)
            || self.has(BloodGroup::SirGaylord)
            || self.has(BloodGroup::EuNative)
            || self.has(BloodGroup::Kingmambo)
            || self.has(BloodGroup::GreySovereign)
            || self.has(BloodGroup::RedGod)
            || self.has(BloodGroup::NeverBend)
    }
}

/// Classifies one five-generation chain. `head_gen` names which generation
/// holds the ancestor this line is read for (0 for the sire line, 1 for the
/// dam line's dam-sire, 2 for the dam-dam line's dam-dam-sire).
pub fn classify_line(generations: &[String; 5], head_gen: usize) -> LineProfile {
    let mut groups = 0u64;
    for spec in GROUP_SPECS {
        let mut hit = false;
        for (gen_idx, name) in generations.iter().enumerate() {
            if contains_any(name, spec.names) {
                hit = true;
                break;
            }
            if gen_idx == 0 && contains_any(name, spec.first_gen_only) {
                hit = true;
                break;
            }
            if gen_idx < 4 && contains_any(name, spec.not_in_last_gen) {
                hit = true;
                break;
            }
        }
        if hit {
            groups |= 1u64 << (spec.group as u8);
        }
    }
    LineProfile {
        head: strip_registry_digits(&generations[head_gen]),
        groups,
        sunday: generations.iter().any(|g| g.contains(SUNDAY_SILENCE)),
    }
}

/// A horse's full classified pedigree: four lines plus the cross-line flags
/// the scoring rules consume.
#[derive(Debug, Clone)]
pub struct PedigreeProfile {
    pub horse_id: String,
    pub sire: String,
    pub dam_sire: String,
    pub dam_dam_sire: String,
    pub sire_line: LineProfile,
    pub sire_dam_line: LineProfile,
    pub dam_line: LineProfile,
    pub dam_dam_line: LineProfile,
}

impl PedigreeProfile {
    pub fn from_lines(horse_id: &str, lines: &[[String; 5]; 4]) -> PedigreeProfile {
        let sire_line = classify_line(&lines[0], 0);
        let sire_dam_line = classify_line(&lines[1], 0);
        let dam_line = classify_line(&lines[2], 1);
        let dam_dam_line = classify_line(&lines[3], 2);
        PedigreeProfile {
            horse_id: horse_id.to_string(),
            sire: sire_line.head.clone(),
            dam_sire: dam_line.head.clone(),
            dam_dam_sire: dam_dam_line.head.clone(),
            sire_line,
            sire_dam_line,
            dam_line,
            dam_dam_line,
        }
    }

    /// No classified line carries Sunday Silence.
    pub fn non_sunday(&self) -> bool {
        !(self.sire_line.sunday
            || self.sire_dam_line.sunday
            || self.dam_line.sunday
            || self.dam_dam_line.sunday)
    }

    /// Sunday blood on one side crossed with US blood on the other.
    pub fn sunday_us_cross(&self) -> bool {
        (self.sire_line.sunday && self.dam_line.american())
            || (self.dam_line.sunday && self.sire_line.american())
    }

    pub fn us_a(&self) -> bool {
        self.sire_line.american() && self.dam_line.american() && self.dam_dam_line.american()
    }

    pub fn us_b(&self) -> bool {
        (self.sire_line.american() && self.dam_line.american())
            || (self.sire_line.american() && self.dam_dam_line.american())
    }

    pub fn eu_a(&self) -> bool {
        self.sire_line.european() && self.dam_line.european() && self.dam_dam_line.european()
    }

    pub fn eu_b(&self) -> bool {
        (self.dam_line.european() && self.dam_dam_line.european())
            || (self.sire_line.european() && self.dam_dam_line.european())
            || (self.sire_line.european() && self.dam_line.european())
    }

    /// Deep Impact within the sire or dam-sire line.
    pub fn deep_close(&self) -> bool {
        self.sire_line.has(BloodGroup::Deep) || self.dam_line.has(BloodGroup::Deep)
    }

    /// Kingmambo blood within the sire or dam-sire line.
    pub fn kingmambo_close(&self) -> bool {
        self.sire_line.has(BloodGroup::Kingmambo) || self.dam_line.has(BloodGroup::Kingmambo)
    }
}

/// Groups the archive's pedigree rows per horse and classifies each horse
/// with all four lines present; incomplete pedigrees are skipped.
pub fn classify_pedigrees(rows: &[StoredPedigreeLine]) -> HashMap<String, PedigreeProfile> {
    let mut per_horse: HashMap<String, [Option<[String; 5]>; 4]> = HashMap::new();
    for row in rows {
        let slot = usize::from(row.line.min(3));
        per_horse.entry(row.horse_id.clone()).or_default()[slot] = Some(row.generations.clone());
    }

    let mut out = HashMap::with_capacity(per_horse.len());
    for (horse_id, lines) in per_horse {
        let [Some(l0), Some(l1), Some(l2), Some(l3)] = lines else {
            warn!(horse_id = %horse_id, "incomplete pedigree, skipping horse");
            continue;
        };
        let profile = PedigreeProfile::from_lines(&horse_id, &[l0, l1, l2, l3]);
        out.insert(horse_id, profile);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(names: [&str; 5]) -> [String; 5] {
        names.map(|n| n.to_string())
    }

    #[test]
    fn deep_impact_line_is_deep_and_sunday() {
        let line = classify_line(
            &chain([
                "ディープインパクト2002",
                "サンデーサイレンス1986",
                "Halo1969",
                "Hail to Reason1958",
                "Turn-to1951",
            ]),
            0,
        );
        assert_eq!(line.head, "ディープインパクト");
        assert!(line.has(BloodGroup::Deep));
        assert!(line.sunday);
        assert!(line.japanese());
        assert!(!line.american());
    }

    #[test]
    fn miswaki_counts_only_as_line_head() {
        let as_head = classify_line(
            &chain(["Miswaki1978", "Mr. Prospector1970", "x", "x", "x"]),
            0,
        );
        assert!(as_head.has(BloodGroup::Kingmambo));

        let deeper = classify_line(
            &chain(["x", "Miswaki1978", "Mr. Prospector1970", "x", "x"]),
            0,
        );
        assert!(!deeper.has(BloodGroup::Kingmambo));
    }

    #[test]
    fn agnes_tachyon_is_ignored_in_the_fifth_generation() {
        let close = classify_line(&chain(["x", "x", "アグネスタキオン1998", "x", "x"]), 0);
        assert!(close.has(BloodGroup::PowerSunday));

        let far = classify_line(&chain(["x", "x", "x", "x", "アグネスタキオン1998"]), 0);
        assert!(!far.has(BloodGroup::PowerSunday));
    }

    #[test]
    fn nasrullah_aggregate_covers_member_groups() {
        let line = classify_line(&chain(["x", "Tony Bin1983", "x", "x", "x"]), 0);
        assert!(line.has(BloodGroup::GreySovereign));
        assert!(line.nasrullah());
        assert!(line.european());
        assert!(!line.japanese());
    }

    #[test]
    fn cross_line_flags() {
        let sunday = chain([
            "ハーツクライ2001",
            "サンデーサイレンス1986",
            "Halo1969",
            "x",
            "x",
        ]);
        let us = chain(["x", "Storm Cat1983", "Storm Bird1978", "x", "x"]);
        let neutral = chain(["x", "x", "x", "x", "x"]);
        let profile = PedigreeProfile::from_lines(
            "h1",
            &[sunday, neutral.clone(), us, neutral],
        );
        assert!(profile.sunday_us_cross());
        assert!(!profile.non_sunday());
        assert!(!profile.us_a());
        assert_eq!(profile.sire, "ハーツクライ");
    }

    #[test]
    fn dam_sire_head_is_read_from_the_second_generation() {
        let dam_line = chain(["ウインドインハーヘア1991", "Alzao1980", "Lyphard1969", "x", "x"]);
        let neutral = chain(["x", "x", "x", "x", "x"]);
        let profile = PedigreeProfile::from_lines(
            "h2",
            &[neutral.clone(), neutral.clone(), dam_line, neutral],
        );
        assert_eq!(profile.dam_sire, "Alzao");
        assert!(profile.dam_line.has(BloodGroup::EuNorthernDancer));
    }

    #[test]
    fn incomplete_pedigrees_are_skipped() {
        let rows = vec![StoredPedigreeLine {
            horse_id: "h1".to_string(),
            line: 0,
            generations: chain(["a", "b", "c", "d", "e"]),
        }];
        let profiles = classify_pedigrees(&rows);
        assert!(profiles.is_empty());
    }
}
