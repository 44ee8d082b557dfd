//! Signed lane-change desire per direction.

use std::ops::Add;

use lmrs_core::LateralDirection;

/// Lane-change desire toward the left and right adjacent lanes.
///
/// Each component is clamped to at most 1 on construction.  Negative values
/// are meaningful ("actively undesired") and are not clamped.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Desire {
    left:  f64,
    right: f64,
}

impl Desire {
    pub const ZERO: Desire = Desire { left: 0.0, right: 0.0 };

    #[inline]
    pub fn new(left: f64, right: f64) -> Self {
        Self { left: left.min(1.0), right: right.min(1.0) }
    }

    /// Desire toward one side only.
    pub fn toward(lat: LateralDirection, value: f64) -> Self {
        match lat {
            LateralDirection::None  => Desire::ZERO,
            LateralDirection::Left  => Desire::new(value, 0.0),
            LateralDirection::Right => Desire::new(0.0, value),
        }
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.left
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.right
    }

    /// Component toward `lat`; zero for `LateralDirection::None`.
    #[inline]
    pub fn get(&self, lat: LateralDirection) -> f64 {
        match lat {
            LateralDirection::None  => 0.0,
            LateralDirection::Left  => self.left,
            LateralDirection::Right => self.right,
        }
    }

    /// Ties go left.
    #[inline]
    pub fn left_is_larger_or_equal(&self) -> bool {
        self.left >= self.right
    }

    /// The preferred side and its desire, left winning ties.
    pub fn dominant(&self) -> (LateralDirection, f64) {
        if self.left_is_larger_or_equal() {
            (LateralDirection::Left, self.left)
        } else {
            (LateralDirection::Right, self.right)
        }
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.left.max(self.right)
    }
}

impl Add for Desire {
    type Output = Desire;

    /// Component-wise sum, re-clamped.
    fn add(self, rhs: Desire) -> Desire {
        Desire::new(self.left + rhs.left, self.right + rhs.right)
    }
}
