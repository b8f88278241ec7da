//! Travel classes, coaches and seat layouts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Travel class offered on a train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassType {
    #[serde(rename = "1A")]
    FirstAc,
    #[serde(rename = "2A")]
    SecondAc,
    #[serde(rename = "3A")]
    ThirdAc,
    #[serde(rename = "SL")]
    Sleeper,
    #[serde(rename = "CC")]
    ChairCar,
    #[serde(rename = "2S")]
    SecondSitting,
}

impl ClassType {
    pub const ALL: [ClassType; 6] = [
        ClassType::FirstAc,
        ClassType::SecondAc,
        ClassType::ThirdAc,
        ClassType::Sleeper,
        ClassType::ChairCar,
        ClassType::SecondSitting,
    ];

    /// Short class code as printed on tickets
    pub fn code(&self) -> &'static str {
        match self {
            ClassType::FirstAc => "1A",
            ClassType::SecondAc => "2A",
            ClassType::ThirdAc => "3A",
            ClassType::Sleeper => "SL",
            ClassType::ChairCar => "CC",
            ClassType::SecondSitting => "2S",
        }
    }

    /// Parse a class code, case-insensitive
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_uppercase();
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Air-conditioned classes attract GST
    pub fn is_air_conditioned(&self) -> bool {
        matches!(
            self,
            ClassType::FirstAc | ClassType::SecondAc | ClassType::ThirdAc | ClassType::ChairCar
        )
    }

    /// Seats per coach when a coach is built from the standard layout
    pub fn default_seat_count(&self) -> i32 {
        match self {
            ClassType::FirstAc => 24,
            ClassType::SecondAc => 48,
            ClassType::ThirdAc => 64,
            ClassType::Sleeper => 72,
            ClassType::ChairCar => 70,
            ClassType::SecondSitting => 72,
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Physical berth or seat position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BerthType {
    Lower,
    Middle,
    Upper,
    #[serde(rename = "Side Lower")]
    SideLower,
    #[serde(rename = "Side Upper")]
    SideUpper,
    Window,
    #[serde(rename = "Middle Seat")]
    MiddleSeat,
    Aisle,
}

const BAY_OF_EIGHT: [BerthType; 8] = [
    BerthType::Lower,
    BerthType::Middle,
    BerthType::Upper,
    BerthType::Lower,
    BerthType::Middle,
    BerthType::Upper,
    BerthType::SideLower,
    BerthType::SideUpper,
];

const BAY_OF_SIX: [BerthType; 6] = [
    BerthType::Lower,
    BerthType::Upper,
    BerthType::Lower,
    BerthType::Upper,
    BerthType::SideLower,
    BerthType::SideUpper,
];

const CHAIR_ROW: [BerthType; 5] = [
    BerthType::Window,
    BerthType::MiddleSeat,
    BerthType::Aisle,
    BerthType::Aisle,
    BerthType::Window,
];

const SITTING_ROW: [BerthType; 6] = [
    BerthType::Window,
    BerthType::MiddleSeat,
    BerthType::Aisle,
    BerthType::Aisle,
    BerthType::MiddleSeat,
    BerthType::Window,
];

impl BerthType {
    /// Berth label of a 1-based seat number in the standard layout of `class`
    pub fn for_seat(class: ClassType, seat_number: i32) -> Self {
        let idx = (seat_number.max(1) - 1) as usize;
        match class {
            ClassType::Sleeper | ClassType::ThirdAc => BAY_OF_EIGHT[idx % 8],
            ClassType::SecondAc => BAY_OF_SIX[idx % 6],
            ClassType::FirstAc => {
                if idx % 2 == 0 {
                    BerthType::Lower
                } else {
                    BerthType::Upper
                }
            }
            ClassType::ChairCar => CHAIR_ROW[idx % 5],
            ClassType::SecondSitting => SITTING_ROW[idx % 6],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BerthType::Lower => "Lower",
            BerthType::Middle => "Middle",
            BerthType::Upper => "Upper",
            BerthType::SideLower => "Side Lower",
            BerthType::SideUpper => "Side Upper",
            BerthType::Window => "Window",
            BerthType::MiddleSeat => "Middle Seat",
            BerthType::Aisle => "Aisle",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Lower" => Some(BerthType::Lower),
            "Middle" => Some(BerthType::Middle),
            "Upper" => Some(BerthType::Upper),
            "Side Lower" => Some(BerthType::SideLower),
            "Side Upper" => Some(BerthType::SideUpper),
            "Window" => Some(BerthType::Window),
            "Middle Seat" => Some(BerthType::MiddleSeat),
            "Aisle" => Some(BerthType::Aisle),
            _ => None,
        }
    }
}

impl fmt::Display for BerthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Passenger berth preference. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BerthPreference {
    Lower,
    Middle,
    Upper,
    #[serde(rename = "Side Lower")]
    SideLower,
    #[serde(rename = "Side Upper")]
    SideUpper,
    Window,
    Aisle,
    Cabin,
    Coupe,
    #[default]
    #[serde(rename = "No Preference")]
    NoPreference,
}

impl BerthPreference {
    /// Whether a seat with this berth satisfies the preference.
    ///
    /// Cabin and coupe are compartment-level choices that seat numbers do not
    /// encode, so they never match a specific berth.
    pub fn matches(&self, berth: BerthType) -> bool {
        match self {
            BerthPreference::Lower => berth == BerthType::Lower,
            BerthPreference::Middle => {
                matches!(berth, BerthType::Middle | BerthType::MiddleSeat)
            }
            BerthPreference::Upper => berth == BerthType::Upper,
            BerthPreference::SideLower => berth == BerthType::SideLower,
            BerthPreference::SideUpper => berth == BerthType::SideUpper,
            BerthPreference::Window => berth == BerthType::Window,
            BerthPreference::Aisle => berth == BerthType::Aisle,
            BerthPreference::Cabin | BerthPreference::Coupe | BerthPreference::NoPreference => {
                false
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BerthPreference::Lower => "Lower",
            BerthPreference::Middle => "Middle",
            BerthPreference::Upper => "Upper",
            BerthPreference::SideLower => "Side Lower",
            BerthPreference::SideUpper => "Side Upper",
            BerthPreference::Window => "Window",
            BerthPreference::Aisle => "Aisle",
            BerthPreference::Cabin => "Cabin",
            BerthPreference::Coupe => "Coupe",
            BerthPreference::NoPreference => "No Preference",
        }
    }

    /// Parse a stored label, anything unrecognised means no preference
    pub fn from_label(label: &str) -> Self {
        match label {
            "Lower" => BerthPreference::Lower,
            "Middle" => BerthPreference::Middle,
            "Upper" => BerthPreference::Upper,
            "Side Lower" => BerthPreference::SideLower,
            "Side Upper" => BerthPreference::SideUpper,
            "Window" => BerthPreference::Window,
            "Aisle" => BerthPreference::Aisle,
            "Cabin" => BerthPreference::Cabin,
            "Coupe" => BerthPreference::Coupe,
            _ => BerthPreference::NoPreference,
        }
    }

    pub fn is_specific(&self) -> bool {
        !matches!(
            self,
            BerthPreference::Cabin | BerthPreference::Coupe | BerthPreference::NoPreference
        )
    }
}

/// A seat inside a coach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// 1-based seat number, unique within the coach
    pub number: i32,
    pub berth: BerthType,
}

/// A coach of one class on one train
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coach {
    pub train_number: String,

    /// Coach code, unique within the train (e.g. "S1", "B2")
    pub code: String,

    pub class_type: ClassType,

    /// Seats ordered by number
    pub seats: Vec<Seat>,
}

impl Coach {
    /// Build a coach with `seat_count` seats in the standard berth layout
    pub fn with_layout(
        train_number: impl Into<String>,
        code: impl Into<String>,
        class_type: ClassType,
        seat_count: i32,
    ) -> Self {
        let seats = (1..=seat_count)
            .map(|number| Seat {
                number,
                berth: BerthType::for_seat(class_type, number),
            })
            .collect();

        Self {
            train_number: train_number.into(),
            code: code.into(),
            class_type,
            seats,
        }
    }

    /// Standard consist: `count` coaches of the class named `{class}-{n}`
    pub fn standard_set(train_number: &str, class_type: ClassType, count: usize) -> Vec<Self> {
        (1..=count)
            .map(|n| {
                Self::with_layout(
                    train_number,
                    format!("{}-{}", class_type.code(), n),
                    class_type,
                    class_type.default_seat_count(),
                )
            })
            .collect()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.seats.len()
    }

    pub fn seat(&self, number: i32) -> Option<&Seat> {
        self.seats.iter().find(|s| s.number == number)
    }
}

/// Identity of a physical seat on a given train/class/date inventory
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatKey {
    pub coach_code: String,
    pub seat_number: i32,
}

impl SeatKey {
    pub fn new(coach_code: impl Into<String>, seat_number: i32) -> Self {
        Self {
            coach_code: coach_code.into(),
            seat_number,
        }
    }
}

impl fmt::Display for SeatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.coach_code, self.seat_number)
    }
}
