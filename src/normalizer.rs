//! Item size normalization.
//!
//! Validates the column-wise item dimensions and adds a uniform clearance
//! margin to every edge length. The caller's vectors are never modified; the
//! result is a fresh [`ItemSizes`].

use crate::error::ConfigError;
use crate::model::ItemSizes;
use crate::types::RawDim;
use crate::types::validation::{validate_dimension, validate_margin};

/// Validates `item_size = [m, n, l]` and returns enlarged copies.
///
/// # Parameters
/// * `item_size` - Three equal-length columns of positive edge lengths
/// * `margin` - Optional non-negative clearance added to every edge length
///
/// # Returns
/// New `ItemSizes`, or `ConfigError` for unequal lengths, non-positive
/// dimensions or an invalid margin.
///
/// # Examples
/// ```
/// use stack_planner::normalizer::normalize;
///
/// let raw = [vec![2.0, 2.0], vec![2.0, 1.0], vec![1.0, 1.0]];
/// let sizes = normalize(&raw, Some(5.0)).unwrap();
/// assert_eq!(sizes.item(0), [7.0, 7.0, 6.0]);
/// assert_eq!(raw[0], vec![2.0, 2.0]);
/// ```
pub fn normalize(item_size: &[Vec<f64>; 3], margin: Option<f64>) -> Result<ItemSizes, ConfigError> {
    let [m, n, l] = item_size;
    if m.len() != n.len() || n.len() != l.len() {
        return Err(ConfigError::MismatchedLengths {
            m: m.len(),
            n: n.len(),
            l: l.len(),
        });
    }

    let margin = margin.unwrap_or(0.0);
    validate_margin(margin)?;

    for (dim, column) in RawDim::ALL.iter().zip(item_size.iter()) {
        for (index, value) in column.iter().enumerate() {
            validate_dimension(*value, format!("Item {} dimension '{}'", index, dim.letter()))?;
        }
    }

    let enlarge = |column: &[f64]| -> Vec<f64> { column.iter().map(|value| value + margin).collect() };
    Ok(ItemSizes {
        m: enlarge(m.as_slice()),
        n: enlarge(n.as_slice()),
        l: enlarge(l.as_slice()),
    })
}
