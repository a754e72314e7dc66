//! Tooth positions in FDI two-digit notation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when an integer is not one of the 32 permanent FDI positions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid tooth id: {0} (expected FDI 11-18, 21-28, 31-38, 41-48)")]
pub struct InvalidToothId(pub i64);

/// A permanent tooth position (FDI 11-18, 21-28, 31-38, 41-48).
///
/// The set is fixed: positions are only ever referenced, never created at
/// runtime, so the only way to obtain one is through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct ToothPosition(u8);

/// Anatomical kind of a tooth, derived from its index within the quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToothKind {
    CentralIncisor,
    LateralIncisor,
    Canine,
    FirstPremolar,
    SecondPremolar,
    FirstMolar,
    SecondMolar,
    ThirdMolar,
}

/// Upper chart row, patient's right to left: 18..11 then 21..28.
const UPPER_ROW: [u8; 16] = [18, 17, 16, 15, 14, 13, 12, 11, 21, 22, 23, 24, 25, 26, 27, 28];

/// Lower chart row, patient's right to left: 48..41 then 31..38.
const LOWER_ROW: [u8; 16] = [48, 47, 46, 45, 44, 43, 42, 41, 31, 32, 33, 34, 35, 36, 37, 38];

impl ToothPosition {
    /// Validate a raw FDI number. Any integer is accepted as input so that
    /// out-of-range values are rejected here rather than truncated by a caller.
    pub fn new(id: i64) -> Result<Self, InvalidToothId> {
        let quadrant = id / 10;
        let index = id % 10;
        if (1..=4).contains(&quadrant) && (1..=8).contains(&index) {
            // 11..=48 always fits in a byte.
            Ok(Self(id as u8))
        } else {
            Err(InvalidToothId(id))
        }
    }

    /// The FDI number.
    pub fn id(self) -> u8 {
        self.0
    }

    /// Quadrant digit: 1 upper right, 2 upper left, 3 lower left, 4 lower right.
    pub fn quadrant(self) -> u8 {
        self.0 / 10
    }

    /// Position within the quadrant, 1 (central incisor) to 8 (third molar).
    pub fn index_in_quadrant(self) -> u8 {
        self.0 % 10
    }

    pub fn is_upper(self) -> bool {
        self.quadrant() <= 2
    }

    pub fn kind(self) -> ToothKind {
        match self.index_in_quadrant() {
            1 => ToothKind::CentralIncisor,
            2 => ToothKind::LateralIncisor,
            3 => ToothKind::Canine,
            4 => ToothKind::FirstPremolar,
            5 => ToothKind::SecondPremolar,
            6 => ToothKind::FirstMolar,
            7 => ToothKind::SecondMolar,
            _ => ToothKind::ThirdMolar,
        }
    }

    /// All 32 positions in chart layout order (upper row, then lower row).
    pub fn all() -> impl Iterator<Item = ToothPosition> {
        UPPER_ROW.into_iter().chain(LOWER_ROW).map(ToothPosition)
    }

    /// The two chart rows as rendered: `[upper, lower]`.
    pub fn layout() -> [[ToothPosition; 16]; 2] {
        [UPPER_ROW.map(ToothPosition), LOWER_ROW.map(ToothPosition)]
    }
}

impl TryFrom<i64> for ToothPosition {
    type Error = InvalidToothId;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<ToothPosition> for u8 {
    fn from(tooth: ToothPosition) -> Self {
        tooth.0
    }
}

impl fmt::Display for ToothPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
