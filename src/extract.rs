//! Decoding of solved variable values into placements.

use crate::builder::{ItemVars, PackingModel};
use crate::error::DecodeError;
use crate::milp::Assignment;
use crate::model::{ItemSizes, Orientation, Placement};
use crate::types::{Axis, RawDim, Vec3};

/// Decodes the orientation of one item.
///
/// For each raw dimension (m, n, l) the axes are scanned in order
/// (a→x, b→y, c→z); the first selector whose value lies within `tolerance`
/// of zero names the axis. Solver output is floating-point, so an exact
/// comparison with 0.0 is never used.
///
/// # Errors
/// `DecodeError::UnresolvedSlot` when no selector of a slot is near zero,
/// `DecodeError::NotAPermutation` when two slots resolve to the same axis.
pub fn decode_orientation(
    item: usize,
    vars: &ItemVars,
    assignment: &Assignment,
    tolerance: f64,
) -> Result<Orientation, DecodeError> {
    let mut axes = [Axis::X; 3];
    for dim in RawDim::ALL {
        axes[dim.index()] = Axis::ALL
            .into_iter()
            .find(|axis| assignment.value(vars.selector(*axis, dim)).abs() < tolerance)
            .ok_or(DecodeError::UnresolvedSlot {
                item,
                dimension: dim.letter(),
                tolerance,
            })?;
    }

    let orientation = Orientation(axes);
    if !orientation.is_permutation() {
        return Err(DecodeError::NotAPermutation {
            item,
            labels: orientation.labels(),
        });
    }
    Ok(orientation)
}

/// Turns an optimal assignment into one placement per item, in item order.
///
/// The extent is derived from the decoded orientation and the raw lengths,
/// so it is exact even when the solved `a/b/c` carry rounding noise. The x
/// and y coordinates are reported as footprint centroids while z stays the
/// bottom face.
pub fn extract_placements(
    packing: &PackingModel,
    items: &ItemSizes,
    assignment: &Assignment,
    tolerance: f64,
) -> Result<Vec<Placement>, DecodeError> {
    packing
        .items
        .iter()
        .enumerate()
        .map(|(index, vars)| {
            let orientation = decode_orientation(index, vars, assignment, tolerance)?;
            let extent = orientation.extent(items.item(index));
            let position = Vec3::from_array(vars.position.map(|var| assignment.value(var)));
            Ok(Placement {
                index,
                centroid_x: position.x + extent.x / 2.0,
                centroid_y: position.y + extent.y / 2.0,
                bottom_z: position.z,
                orientation,
                extent,
            })
        })
        .collect()
}

/// Height of the stack, `max(z + c)`; 0.0 without placements.
pub fn stack_height(placements: &[Placement]) -> f64 {
    placements
        .iter()
        .map(Placement::top_z)
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_model;
    use crate::model::Container;

    fn single_item() -> (PackingModel, ItemSizes) {
        let container = Container::new([10.0, 10.0, 10.0]).unwrap();
        let items = ItemSizes::new(vec![4.0], vec![3.0], vec![2.0]).unwrap();
        (build_model(&container, &items), items)
    }

    /// Assignment with every selector at 1.0 except the listed (axis, dim) zeros.
    fn assignment_with_zeros(
        packing: &PackingModel,
        zeros: &[(Axis, RawDim, f64)],
        position: [f64; 3],
    ) -> Assignment {
        let mut values = vec![1.0; packing.model.variables().len()];
        let vars = &packing.items[0];
        for (axis, dim, value) in zeros {
            values[vars.selector(*axis, *dim).index()] = *value;
        }
        for axis in Axis::ALL {
            values[vars.position[axis.index()].index()] = position[axis.index()];
        }
        Assignment {
            values,
            objective: 0.0,
        }
    }

    #[test]
    fn decodes_rotated_item_with_float_noise() {
        let (packing, items) = single_item();
        // m along z, n along x, l along y, selectors slightly off zero
        let assignment = assignment_with_zeros(
            &packing,
            &[
                (Axis::Z, RawDim::M, 3e-9),
                (Axis::X, RawDim::N, -2e-10),
                (Axis::Y, RawDim::L, 0.0),
            ],
            [1.0, 2.0, 0.5],
        );

        let placements = extract_placements(&packing, &items, &assignment, 1e-6).unwrap();
        let placement = &placements[0];
        assert_eq!(placement.orientation.labels(), ['z', 'x', 'y']);
        assert_eq!(placement.extent, Vec3::new(3.0, 2.0, 4.0));
        assert_eq!(placement.centroid_x, 2.5);
        assert_eq!(placement.centroid_y, 3.0);
        assert_eq!(placement.bottom_z, 0.5);
        assert_eq!(stack_height(&placements), 4.5);
    }

    #[test]
    fn first_zero_in_axis_order_wins() {
        let (packing, _) = single_item();
        let assignment = assignment_with_zeros(
            &packing,
            &[
                (Axis::Y, RawDim::M, 0.0),
                (Axis::Z, RawDim::M, 0.0),
                (Axis::X, RawDim::N, 0.0),
                (Axis::Z, RawDim::L, 0.0),
            ],
            [0.0; 3],
        );
        let orientation = decode_orientation(0, &packing.items[0], &assignment, 1e-6).unwrap();
        assert_eq!(orientation.labels(), ['y', 'x', 'z']);
    }

    #[test]
    fn unresolved_slot_is_an_error() {
        let (packing, _) = single_item();
        let assignment = assignment_with_zeros(
            &packing,
            &[(Axis::X, RawDim::M, 0.0), (Axis::Y, RawDim::N, 1e-3)],
            [0.0; 3],
        );
        let err = decode_orientation(0, &packing.items[0], &assignment, 1e-6).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnresolvedSlot {
                item: 0,
                dimension: 'n',
                tolerance: 1e-6
            }
        );
    }

    #[test]
    fn duplicated_axis_is_an_error() {
        let (packing, _) = single_item();
        let assignment = assignment_with_zeros(
            &packing,
            &[
                (Axis::X, RawDim::M, 0.0),
                (Axis::X, RawDim::N, 0.0),
                (Axis::Z, RawDim::L, 0.0),
            ],
            [0.0; 3],
        );
        let err = decode_orientation(0, &packing.items[0], &assignment, 1e-6).unwrap_err();
        assert!(matches!(err, DecodeError::NotAPermutation { item: 0, labels } if labels == ['x', 'x', 'z']));
    }

    #[test]
    fn empty_plan_has_zero_height() {
        assert_eq!(stack_height(&[]), 0.0);
    }
}
