//! Deterministic placement order.
//!
//! Placements are ordered top-down: highest bottom face first, then by
//! centroid x and finally centroid y, all descending. One cascading
//! comparator drives a stable sort, so fully tied items keep their
//! original relative order.

use std::cmp::Ordering;

use crate::model::Placement;

/// Comparator: z descending, then x descending, then y descending.
pub fn placement_order(a: &Placement, b: &Placement) -> Ordering {
    b.bottom_z
        .total_cmp(&a.bottom_z)
        .then_with(|| b.centroid_x.total_cmp(&a.centroid_x))
        .then_with(|| b.centroid_y.total_cmp(&a.centroid_y))
}

/// Sorts placements in place with [`placement_order`] (stable).
pub fn sort_placements(placements: &mut [Placement]) {
    placements.sort_by(placement_order);
}
