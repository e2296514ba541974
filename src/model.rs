//! Data models for the stack planner.
//!
//! This module defines the fundamental data structures of a packing request
//! and its solved plan:
//! - `Container`: The fixed bounding box the items are stacked into
//! - `ItemSizes`: Validated raw edge lengths of every item, one column per raw dimension
//! - `Orientation`: Which container axis each raw edge length is laid along
//! - `Placement`: A solved item with centroid, bottom face and extent

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::error::ConfigError;
use crate::types::{Axis, BoundingBox, RawDim, Vec3, validation::validate_dimension};

/// Represents the packing container.
///
/// # Fields
/// * `dims` - Dimensions (A, B, C) along x, y and z
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Container {
    pub dims: Vec3,
}

impl Container {
    /// Creates a new container with validation.
    ///
    /// # Returns
    /// `Ok(Container)` for positive, finite dimensions, otherwise `Err(ConfigError)`
    ///
    /// # Examples
    /// ```
    /// use stack_planner::model::Container;
    ///
    /// assert!(Container::new([10.0, 10.0, 100.0]).is_ok());
    /// assert!(Container::new([10.0, 0.0, 100.0]).is_err());
    /// ```
    pub fn new(dims: [f64; 3]) -> Result<Self, ConfigError> {
        validate_dimension(dims[0], "Container width")?;
        validate_dimension(dims[1], "Container depth")?;
        validate_dimension(dims[2], "Container height")?;
        Ok(Self {
            dims: Vec3::from_array(dims),
        })
    }

    /// Size along the given axis.
    #[inline]
    pub fn size(&self, axis: Axis) -> f64 {
        self.dims.component(axis)
    }
}

/// Validated raw edge lengths of all items.
///
/// Stored column-wise like the request payload: `m[i]`, `n[i]` and `l[i]` are
/// the three (unordered) edge lengths of item `i`. Instances are only built
/// through [`ItemSizes::new`] or [`crate::normalizer::normalize`], so the
/// columns always have equal length and hold positive, finite values.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSizes {
    pub(crate) m: Vec<f64>,
    pub(crate) n: Vec<f64>,
    pub(crate) l: Vec<f64>,
}

impl ItemSizes {
    /// Validates the three columns without applying a margin.
    pub fn new(m: Vec<f64>, n: Vec<f64>, l: Vec<f64>) -> Result<Self, ConfigError> {
        crate::normalizer::normalize(&[m, n, l], None)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.m.is_empty()
    }

    /// Raw edge lengths of item `index`, in (m, n, l) order.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn item(&self, index: usize) -> [f64; 3] {
        [self.m[index], self.n[index], self.l[index]]
    }

    /// Raw length of one dimension of item `index`.
    pub fn raw(&self, index: usize, dim: RawDim) -> f64 {
        self.item(index)[dim.index()]
    }

    /// Largest edge length over all items, 0.0 when empty.
    pub fn max_dimension(&self) -> f64 {
        self.m
            .iter()
            .chain(self.n.iter())
            .chain(self.l.iter())
            .fold(0.0, |acc: f64, value| acc.max(*value))
    }

    /// Columns in request order `[m, n, l]`.
    pub fn columns(&self) -> [&[f64]; 3] {
        [&self.m, &self.n, &self.l]
    }
}

/// Orientation of a placed item.
///
/// Slot `k` holds the container axis along which raw dimension `k` (m, n, l)
/// is laid. A valid orientation is always a permutation of x, y, z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(value_type = Vec<Axis>, example = json!(["z", "x", "y"]))]
pub struct Orientation(pub [Axis; 3]);

impl Orientation {
    /// Axis that raw dimension `dim` is laid along.
    #[inline]
    pub fn axis_of(&self, dim: RawDim) -> Axis {
        self.0[dim.index()]
    }

    /// Labels in slot order, e.g. `['y', 'z', 'x']`.
    pub fn labels(&self) -> [char; 3] {
        self.0.map(Axis::label)
    }

    /// Checks that every axis occurs exactly once.
    pub fn is_permutation(&self) -> bool {
        Axis::ALL.iter().all(|axis| self.0.contains(axis))
    }

    /// Effective extent (a, b, c) for the given raw edge lengths.
    pub fn extent(&self, raw: [f64; 3]) -> Vec3 {
        let mut extent = [0.0; 3];
        for dim in RawDim::ALL {
            extent[self.axis_of(dim).index()] = raw[dim.index()];
        }
        Vec3::from_array(extent)
    }
}

/// A solved item.
///
/// # Fields
/// * `index` - Position of the item in the request
/// * `centroid_x` - x + a/2
/// * `centroid_y` - y + b/2
/// * `bottom_z` - z of the bottom face (not a centroid)
/// * `orientation` - Axis per raw dimension
/// * `extent` - Effective size (a, b, c) along x, y, z
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub index: usize,
    pub centroid_x: f64,
    pub centroid_y: f64,
    pub bottom_z: f64,
    pub orientation: Orientation,
    pub extent: Vec3,
}

impl Placement {
    /// Minimum corner of the item.
    pub fn position(&self) -> Vec3 {
        Vec3::new(
            self.centroid_x - self.extent.x / 2.0,
            self.centroid_y - self.extent.y / 2.0,
            self.bottom_z,
        )
    }

    /// Returns the top Z coordinate (z + c).
    #[inline]
    pub fn top_z(&self) -> f64 {
        self.bottom_z + self.extent.z
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_extent(self.position(), self.extent)
    }
}
