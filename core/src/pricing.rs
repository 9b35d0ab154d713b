use crate::Visibility;
use std::fmt;

/// One of the four durations a user may request. Closed sum type instead of
/// a raw `u32` so invalid values are rejected at the parse boundary rather
/// than threaded through as "just another integer" (§9: dynamic schemas →
/// closed sum types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DurationSeconds {
    Sixty,
    OneTwenty,
    OneEighty,
    ThreeHundred,
}

impl DurationSeconds {
    pub const ALL: [DurationSeconds; 4] = [
        DurationSeconds::Sixty,
        DurationSeconds::OneTwenty,
        DurationSeconds::OneEighty,
        DurationSeconds::ThreeHundred,
    ];

    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Sixty => 60,
            Self::OneTwenty => 120,
            Self::OneEighty => 180,
            Self::ThreeHundred => 300,
        }
    }

    const fn base_cost(self) -> u32 {
        match self {
            Self::Sixty => 5,
            Self::OneTwenty => 8,
            Self::OneEighty => 12,
            Self::ThreeHundred => 15,
        }
    }
}

impl TryFrom<u32> for DurationSeconds {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            60 => Ok(Self::Sixty),
            120 => Ok(Self::OneTwenty),
            180 => Ok(Self::OneEighty),
            300 => Ok(Self::ThreeHundred),
            other => Err(format!(
                "durationSeconds must be one of 60, 120, 180, 300 (got {other})"
            )),
        }
    }
}

impl From<DurationSeconds> for u32 {
    fn from(value: DurationSeconds) -> Self {
        value.as_u32()
    }
}

impl fmt::Display for DurationSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// +3 credits on top of the base cost when `visibility = private` (§4.4).
pub const PRIVATE_SURCHARGE: u32 = 3;

/// Pricing table from spec §4.4.
pub fn price_for(duration: DurationSeconds, visibility: Visibility) -> u32 {
    duration.base_cost()
        + match visibility {
            Visibility::Private => PRIVATE_SURCHARGE,
            Visibility::Public => 0,
        }
}
