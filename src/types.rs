//! Common types for 3D geometry and the orientation encoding.
//!
//! This module defines the small value types shared by the model builder,
//! the result extractor and the geometric verification.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default tolerance when reading solver-returned binaries.
///
/// Solver output is floating-point; a selector counts as "zero" when its
/// absolute value is below this bound.
pub const EPSILON_SELECTOR: f64 = 1e-6;

/// Exclusive upper bound for the selector tolerance.
///
/// Selectors are binary, so a tolerance of 0.5 or more can no longer tell a
/// zero from a one.
pub const MAX_SELECTOR_TOLERANCE: f64 = 0.5;

/// Tolerance for geometric comparisons on solved coordinates.
pub const EPSILON_GEOMETRY: f64 = 1e-6;

/// Represents a 3D vector or point in space.
///
/// Used for positions, extents and container dimensions.
///
/// # Examples
/// ```
/// use stack_planner::types::Vec3;
///
/// let position = Vec3::new(1.0, 2.0, 3.0);
/// let extent = Vec3::new(10.0, 20.0, 30.0);
/// let center = position + extent * 0.5;
/// assert_eq!(center, Vec3::new(6.0, 12.0, 18.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Creates from array format, as used by the request payloads.
    #[inline]
    pub const fn from_array(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    /// Converts to array format.
    #[inline]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Returns the component along the given axis.
    #[inline]
    pub const fn component(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Largest component.
    #[inline]
    pub fn max_component(&self) -> f64 {
        self.x.max(self.y).max(self.z)
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// Container axis.
///
/// In the model the effective extents are called `a`, `b` and `c`; they
/// correspond to `X`, `Y` and `Z` respectively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in model order (a, b, c).
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Position in [`Axis::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Output label (`'x'`, `'y'` or `'z'`).
    #[inline]
    pub const fn label(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }

    /// Extent letter used in variable and constraint names.
    #[inline]
    pub const fn extent_letter(self) -> char {
        match self {
            Axis::X => 'a',
            Axis::Y => 'b',
            Axis::Z => 'c',
        }
    }
}

/// One of the three raw (unordered) edge lengths of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RawDim {
    M,
    N,
    L,
}

impl RawDim {
    /// All raw dimensions in decode order (m, n, l).
    pub const ALL: [RawDim; 3] = [RawDim::M, RawDim::N, RawDim::L];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            RawDim::M => 0,
            RawDim::N => 1,
            RawDim::L => 2,
        }
    }

    #[inline]
    pub const fn letter(self) -> char {
        match self {
            RawDim::M => 'm',
            RawDim::N => 'n',
            RawDim::L => 'l',
        }
    }
}

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// Used to verify solved placements.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (position)
    pub min: Vec3,
    /// Maximum corner (position + extent)
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from position and extent.
    #[inline]
    pub fn from_position_and_extent(position: Vec3, extent: Vec3) -> Self {
        Self {
            min: position,
            max: position + extent,
        }
    }

    /// Checks if the interiors of two bounding boxes intersect.
    ///
    /// Boxes that merely touch, or overlap by less than `tolerance` along
    /// some axis, count as separated (Separating Axis Theorem for AABBs).
    #[inline]
    pub fn intersects(&self, other: &Self, tolerance: f64) -> bool {
        !(self.max.x <= other.min.x + tolerance
            || other.max.x <= self.min.x + tolerance
            || self.max.y <= other.min.y + tolerance
            || other.max.y <= self.min.y + tolerance
            || self.max.z <= other.min.z + tolerance
            || other.max.z <= self.min.z + tolerance)
    }

    /// Checks that this box lies inside `[0, dims]` on every axis.
    #[inline]
    pub fn is_within(&self, dims: &Vec3, tolerance: f64) -> bool {
        self.min.x >= -tolerance
            && self.min.y >= -tolerance
            && self.min.z >= -tolerance
            && self.max.x <= dims.x + tolerance
            && self.max.y <= dims.y + tolerance
            && self.max.z <= dims.z + tolerance
    }
}

/// Validation functions shared by container and item checks.
pub mod validation {
    use crate::error::ConfigError;

    /// Validates a single dimension.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    /// * `name` - Name of the dimension for error messages
    pub fn validate_dimension(value: f64, name: impl Into<String>) -> Result<(), ConfigError> {
        if value <= 0.0 || !value.is_finite() {
            return Err(ConfigError::InvalidDimension {
                name: name.into(),
                value,
            });
        }
        Ok(())
    }

    /// Validates a clearance margin (zero allowed).
    pub fn validate_margin(value: f64) -> Result<(), ConfigError> {
        if value < 0.0 || !value.is_finite() {
            return Err(ConfigError::InvalidMargin(value));
        }
        Ok(())
    }

    /// Validates the selector tolerance, which must lie in `(0, 0.5)`.
    pub fn validate_selector_tolerance(value: f64) -> Result<(), ConfigError> {
        if !(value > 0.0 && value < super::MAX_SELECTOR_TOLERANCE) {
            return Err(ConfigError::InvalidTolerance(value));
        }
        Ok(())
    }
}
