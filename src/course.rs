use std::fmt;

use serde::{Deserialize, Serialize};

/// JRA venues, numbered the way the result archive encodes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    Hakodate,
    Sapporo,
    Fukushima,
    Niigata,
    Tokyo,
    Nakayama,
    Chukyo,
    Kyoto,
    Hanshin,
    Kokura,
}

impl Venue {
    pub fn code(self) -> u8 {
        match self {
            Venue::Hakodate => 1,
            Venue::Sapporo => 2,
            Venue::Fukushima => 3,
            Venue::Niigata => 4,
            Venue::Tokyo => 5,
            Venue::Nakayama => 6,
            Venue::Chukyo => 7,
            Venue::Kyoto => 8,
            Venue::Hanshin => 9,
            Venue::Kokura => 10,
        }
    }

    pub fn from_code(code: u8) -> Option<Venue> {
        Some(match code {
            1 => Venue::Hakodate,
            2 => Venue::Sapporo,
            3 => Venue::Fukushima,
            4 => Venue::Niigata,
            5 => Venue::Tokyo,
            6 => Venue::Nakayama,
            7 => Venue::Chukyo,
            8 => Venue::Kyoto,
            9 => Venue::Hanshin,
            10 => Venue::Kokura,
            _ => return None,
        })
    }

    /// Resolves a two-character venue name as it appears inside the raw
    /// meeting string (e.g. the `中山` in `3中山4`). Regional (non-JRA)
    /// venues resolve to `None`.
    pub fn from_name(name: &str) -> Option<Venue> {
        Some(match name {
            "函館" => Venue::Hakodate,
            "札幌" => Venue::Sapporo,
            "福島" => Venue::Fukushima,
            "新潟" => Venue::Niigata,
            "東京" => Venue::Tokyo,
            "中山" => Venue::Nakayama,
            "中京" => Venue::Chukyo,
            "京都" => Venue::Kyoto,
            "阪神" => Venue::Hanshin,
            "小倉" => Venue::Kokura,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Surface {
    Turf,
    Dirt,
    Jump,
}

impl Surface {
    /// Numeric encoding used in the exported feature vector.
    pub fn encoded(self) -> f64 {
        match self {
            Surface::Turf => 0.0,
            Surface::Dirt => 1.0,
            Surface::Jump => 2.0,
        }
    }
}

/// One concrete racecourse configuration: venue x surface x distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Course {
    pub venue: Venue,
    pub surface: Surface,
    pub distance: u32,
}

impl Course {
    pub fn new(venue: Venue, surface: Surface, distance: u32) -> Course {
        Course {
            venue,
            surface,
            distance,
        }
    }

    pub fn in_class(self, class: CourseClass) -> bool {
        let (surface, members) = class.members();
        self.surface == surface
            && members
                .iter()
                .any(|(v, d)| *v == self.venue && u32::from(*d) == self.distance)
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self.surface {
            Surface::Turf => "T",
            Surface::Dirt => "D",
            Surface::Jump => "J",
        };
        write!(f, "{:02}{}{}", self.venue.code(), s, self.distance)
    }
}

/// Hand-curated course classes. The turf classes group courses by running
/// style bias (A: speed-favouring mile courses, B: local sprints, C: staying
/// courses, D: sustained-run championship courses); dirt classes follow the
/// same scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseClass {
    TurfA,
    TurfB,
    TurfC,
    TurfD,
    DirtA,
    DirtB,
    DirtC,
    DirtD,
}

impl CourseClass {
    fn members(self) -> (Surface, &'static [(Venue, u16)]) {
        match self {
            CourseClass::TurfA => (Surface::Turf, TURF_A),
            CourseClass::TurfB => (Surface::Turf, TURF_B),
            CourseClass::TurfC => (Surface::Turf, TURF_C),
            CourseClass::TurfD => (Surface::Turf, TURF_D),
            CourseClass::DirtA => (Surface::Dirt, DIRT_A),
            CourseClass::DirtB => (Surface::Dirt, DIRT_B),
            CourseClass::DirtC => (Surface::Dirt, DIRT_C),
            CourseClass::DirtD => (Surface::Dirt, DIRT_D),
        }
    }
}

use Venue::{
    Chukyo, Fukushima, Hakodate, Hanshin, Kokura, Kyoto, Nakayama, Niigata, Sapporo, Tokyo,
};

static TURF_A: &[(Venue, u16)] = &[
    (Nakayama, 1600),
    (Tokyo, 1600),
    (Kyoto, 1600),
    (Tokyo, 1400),
    (Hanshin, 1600),
    (Hanshin, 1800),
    (Tokyo, 1800),
    (Nakayama, 1200),
    (Kyoto, 1800),
    (Fukushima, 1200),
    (Hanshin, 2000),
    (Nakayama, 2000),
    (Nakayama, 1800),
    (Hanshin, 1400),
    (Kyoto, 1400),
    (Tokyo, 2000),
    (Niigata, 1000),
    (Chukyo, 1600),
    (Hanshin, 1200),
    (Kokura, 1200),
    (Kyoto, 1200),
    (Chukyo, 1200),
];

static TURF_B: &[(Venue, u16)] = &[
    (Kokura, 1200),
    (Fukushima, 1200),
    (Sapporo, 1200),
    (Kokura, 1800),
    (Kokura, 2000),
    (Kyoto, 2000),
    (Chukyo, 2000),
    (Hakodate, 1200),
    (Nakayama, 2000),
    (Kyoto, 1600),
    (Fukushima, 2000),
    (Fukushima, 1800),
    (Niigata, 1000),
    (Hanshin, 2000),
    (Nakayama, 1600),
    (Hanshin, 1400),
    (Nakayama, 1800),
    (Hanshin, 1600),
    (Hanshin, 1800),
    (Nakayama, 1200),
];

static TURF_C: &[(Venue, u16)] = &[
    (Kokura, 2000),
    (Kyoto, 2000),
    (Fukushima, 2000),
    (Tokyo, 2400),
    (Hakodate, 2000),
    (Kokura, 1800),
    (Fukushima, 2600),
    (Kokura, 2600),
    (Nakayama, 2000),
    (Hanshin, 2000),
    (Hanshin, 2400),
    (Sapporo, 2000),
    (Chukyo, 2200),
    (Niigata, 1800),
    (Niigata, 2000),
    (Sapporo, 1800),
    (Kyoto, 1800),
    (Fukushima, 1800),
    (Nakayama, 2200),
    (Tokyo, 2000),
    (Chukyo, 2000),
    (Niigata, 2400),
    (Kyoto, 2400),
    (Niigata, 2200),
    (Sapporo, 2600),
    (Hakodate, 2600),
    (Kyoto, 2200),
    (Hanshin, 2200),
];

static TURF_D: &[(Venue, u16)] = &[
    (Tokyo, 1600),
    (Tokyo, 1800),
    (Nakayama, 1600),
    (Tokyo, 1400),
    (Kokura, 1200),
    (Tokyo, 2000),
    (Hanshin, 1600),
    (Nakayama, 2000),
    (Tokyo, 2400),
    (Fukushima, 1200),
    (Chukyo, 2000),
    (Niigata, 1800),
    (Hanshin, 1800),
    (Kyoto, 1600),
    (Niigata, 2000),
    (Kyoto, 1800),
    (Chukyo, 1400),
    (Niigata, 1600),
    (Kyoto, 1400),
    (Sapporo, 1200),
];

static DIRT_A: &[(Venue, u16)] = &[
    (Nakayama, 1200),
    (Kyoto, 1200),
    (Hanshin, 1400),
    (Hanshin, 1200),
    (Niigata, 1200),
    (Tokyo, 1600),
    (Kyoto, 1800),
    (Tokyo, 1400),
    (Kyoto, 1400),
    (Hanshin, 1800),
    (Nakayama, 1800),
    (Chukyo, 1400),
    (Chukyo, 1200),
    (Fukushima, 1150),
    (Kokura, 1000),
    (Kokura, 1700),
    (Tokyo, 1300),
    (Hakodate, 1000),
];

static DIRT_B: &[(Venue, u16)] = &[
    (Nakayama, 1800),
    (Hanshin, 1800),
    (Kyoto, 1800),
    (Niigata, 1800),
    (Fukushima, 1700),
    (Tokyo, 1600),
    (Nakayama, 1200),
    (Chukyo, 1800),
    (Kokura, 1700),
    (Sapporo, 1700),
    (Hakodate, 1700),
    (Hanshin, 1400),
    (Niigata, 1200),
    (Tokyo, 1400),
    (Kyoto, 1400),
    (Fukushima, 1150),
];

static DIRT_C: &[(Venue, u16)] = &[
    (Nakayama, 1800),
    (Hanshin, 1800),
    (Niigata, 1800),
    (Tokyo, 1600),
    (Kyoto, 1800),
    (Tokyo, 2100),
    (Fukushima, 1700),
    (Chukyo, 1800),
    (Kokura, 1700),
    (Sapporo, 1700),
    (Hakodate, 1700),
    (Tokyo, 1400),
    (Nakayama, 1200),
    (Hanshin, 1400),
    (Nakayama, 2400),
    (Chukyo, 1900),
    (Hanshin, 2000),
];

static DIRT_D: &[(Venue, u16)] = &[
    (Tokyo, 1400),
    (Tokyo, 1600),
    (Hanshin, 1800),
    (Nakayama, 1200),
    (Nakayama, 1800),
    (Kyoto, 1800),
    (Hanshin, 1400),
    (Kyoto, 1400),
    (Tokyo, 2100),
    (Chukyo, 1800),
    (Chukyo, 1400),
    (Niigata, 1800),
    (Kyoto, 1200),
    (Kokura, 1700),
    (Kyoto, 1900),
];

/// Dirt courses where an inside gate (post 1-4) runs above par.
pub static GATE_INNER_PLUS: &[(Venue, u16)] = &[
    (Hakodate, 1700),
    (Sapporo, 1700),
    (Tokyo, 1300),
    (Tokyo, 1600),
    (Chukyo, 1200),
    (Chukyo, 1800),
];

/// Dirt courses where a mid-inside gate (post 5-9) runs above par.
pub static GATE_MID_PLUS: &[(Venue, u16)] = &[(Sapporo, 1700), (Tokyo, 1300), (Chukyo, 1800)];

/// Dirt courses where a mid-outside gate (post 10-14) runs above par.
pub static GATE_OUTER_PLUS: &[(Venue, u16)] = &[(Tokyo, 1400), (Tokyo, 2100), (Chukyo, 1200)];

/// Dirt courses where a wide gate (post 15+) runs above par.
pub static GATE_WIDE_PLUS: &[(Venue, u16)] = &[(Tokyo, 2100), (Hanshin, 1200), (Hanshin, 1400)];

/// Dirt courses where an inside gate runs below par.
pub static GATE_INNER_MINUS: &[(Venue, u16)] = &[
    (Fukushima, 1150),
    (Fukushima, 1700),
    (Niigata, 1200),
    (Tokyo, 2100),
    (Chukyo, 1400),
    (Kyoto, 1200),
    (Kyoto, 1400),
    (Kyoto, 1800),
    (Hanshin, 1200),
    (Hanshin, 1400),
    (Kokura, 1000),
    (Kokura, 1700),
];

/// Dirt courses where a mid-outside gate runs below par.
pub static GATE_OUTER_MINUS: &[(Venue, u16)] = &[(Niigata, 1800), (Chukyo, 1800), (Kokura, 1000)];

/// Dirt courses where a wide gate runs below par.
pub static GATE_WIDE_MINUS: &[(Venue, u16)] = &[
    (Tokyo, 1600),
    (Nakayama, 1800),
    (Chukyo, 1200),
    (Chukyo, 1800),
    (Kokura, 1700),
];

pub fn dirt_course_in(course: Course, table: &[(Venue, u16)]) -> bool {
    course.surface == Surface::Dirt
        && table
            .iter()
            .any(|(v, d)| *v == course.venue && u32::from(*d) == course.distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_class_membership_checks_surface() {
        let turf_mile = Course::new(Venue::Nakayama, Surface::Turf, 1600);
        let dirt_mile = Course::new(Venue::Nakayama, Surface::Dirt, 1600);
        assert!(turf_mile.in_class(CourseClass::TurfA));
        assert!(!dirt_mile.in_class(CourseClass::TurfA));
    }

    #[test]
    fn course_display_is_compact() {
        let c = Course::new(Venue::Tokyo, Surface::Turf, 1600);
        assert_eq!(c.to_string(), "05T1600");
        let d = Course::new(Venue::Kokura, Surface::Dirt, 1000);
        assert_eq!(d.to_string(), "10D1000");
    }

    #[test]
    fn venue_round_trips_through_code() {
        for code in 1..=10u8 {
            let venue = Venue::from_code(code).unwrap();
            assert_eq!(venue.code(), code);
        }
        assert!(Venue::from_code(11).is_none());
    }

    #[test]
    fn regional_venue_names_do_not_resolve() {
        assert_eq!(Venue::from_name("中山"), Some(Venue::Nakayama));
        assert_eq!(Venue::from_name("大井"), None);
    }

    #[test]
    fn gate_tables_are_dirt_only() {
        let tokyo_dirt = Course::new(Venue::Tokyo, Surface::Dirt, 1300);
        let tokyo_turf = Course::new(Venue::Tokyo, Surface::Turf, 1300);
        assert!(dirt_course_in(tokyo_dirt, GATE_INNER_PLUS));
        assert!(!dirt_course_in(tokyo_turf, GATE_INNER_PLUS));
    }
}
