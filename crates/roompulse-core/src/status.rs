//! Participant status values.
//!
//! The set is closed: every snapshot carries a count for each of the four
//! members, in declaration order.

use serde::{Deserialize, Serialize};

/// The status a participant reports about how well they are following.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StatusValue {
    /// Joined but has not picked a status yet.
    #[default]
    Unknown,
    Green,
    Yellow,
    Red,
}

impl StatusValue {
    /// All members, in the order counts are stored.
    pub const ALL: [Self; 4] = [Self::Unknown, Self::Green, Self::Yellow, Self::Red];

    /// Number of members.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this value in [`Self::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Green => 1,
            Self::Yellow => 2,
            Self::Red => 3,
        }
    }

    /// Display label shown next to chart series and buttons.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Green => "🟢 Green",
            Self::Yellow => "🟡 Yellow",
            Self::Red => "🔴 Red",
        }
    }

    /// Human-readable caption explaining the status.
    #[must_use]
    pub const fn caption(self) -> &'static str {
        match self {
            Self::Unknown => "Not decided yet",
            Self::Green => "Following easily",
            Self::Yellow => "Need more explanation",
            Self::Red => "Cannot follow",
        }
    }

    /// Stable snake_case name (matches the serde representation).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl std::fmt::Display for StatusValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatusValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "red" => Ok(Self::Red),
            _ => Err(format!(
                "unknown status: {s}. Expected one of: unknown, green, yellow, red"
            )),
        }
    }
}
