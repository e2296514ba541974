//! Geometric checks on solved placements.
//!
//! The MILP guarantees containment and non-overlap only up to the solver's
//! numerical tolerance. These helpers re-check a plan with plain AABB logic.

use std::fmt;

use crate::model::{Container, Placement};

/// Geometric defect found in a plan.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanViolation {
    /// Item leaves the container on at least one axis.
    OutsideContainer { index: usize },
    /// Interiors of two items overlap.
    Overlap { first: usize, second: usize },
}

impl fmt::Display for PlanViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanViolation::OutsideContainer { index } => {
                write!(f, "item {} extends beyond the container", index)
            }
            PlanViolation::Overlap { first, second } => {
                write!(f, "items {} and {} overlap", first, second)
            }
        }
    }
}

/// Checks whether two placed items overlap in their interiors.
///
/// Two boxes do NOT overlap when they are separated along at least one axis;
/// touching faces are allowed.
pub fn intersects(a: &Placement, b: &Placement, tolerance: f64) -> bool {
    a.bounding_box().intersects(&b.bounding_box(), tolerance)
}

/// Lists every containment and overlap defect of `placements`.
///
/// # Parameters
/// * `container` - The container the plan was solved for
/// * `placements` - Placements in any order
/// * `tolerance` - Slack for solver rounding
pub fn verify_plan(container: &Container, placements: &[Placement], tolerance: f64) -> Vec<PlanViolation> {
    let mut violations: Vec<PlanViolation> = placements
        .iter()
        .filter(|p| !p.bounding_box().is_within(&container.dims, tolerance))
        .map(|p| PlanViolation::OutsideContainer { index: p.index })
        .collect();

    for (offset, a) in placements.iter().enumerate() {
        for b in &placements[offset + 1..] {
            if intersects(a, b, tolerance) {
                violations.push(PlanViolation::Overlap {
                    first: a.index.min(b.index),
                    second: a.index.max(b.index),
                });
            }
        }
    }
    violations
}
