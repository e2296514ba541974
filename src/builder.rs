//! Model builder for the stacking MILP.
//!
//! For every item the model holds a position `(x, y, z)`, an effective
//! extent `(a, b, c)` and a 3×3 matrix of orientation selectors `e_pq`
//! (`e_pq = 0` ⇔ extent `p` takes raw length `q`). Every unordered pair of
//! items gets six separation indicators, one per axis direction, of which at
//! least one must be inactive (0). The objective is the stack height.
//!
//! All disjunctions use a single big-M constant,
//! `M = max(A, B, C) + max(item dimension)`, which exceeds any distance or
//! length difference the model can produce.

use tracing::debug;

use crate::milp::{Comparison, LinearExpr, MilpModel, Sense, VarId};
use crate::model::{Container, ItemSizes};
use crate::types::{Axis, RawDim};

/// One of the six separation directions of an item pair `(i, j)`, `i < j`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Direction {
    pub axis: Axis,
    /// `true`: j lies beyond i (`v_j >= v_i + ext_i`);
    /// `false`: i lies beyond j (`v_i >= v_j + ext_j`).
    pub positive: bool,
}

impl Direction {
    /// x+, x−, y+, y−, z+, z−
    pub const ALL: [Direction; 6] = [
        Direction::new(Axis::X, true),
        Direction::new(Axis::X, false),
        Direction::new(Axis::Y, true),
        Direction::new(Axis::Y, false),
        Direction::new(Axis::Z, true),
        Direction::new(Axis::Z, false),
    ];

    const fn new(axis: Axis, positive: bool) -> Self {
        Self { axis, positive }
    }

    fn suffix(&self) -> String {
        format!(
            "{}_{}",
            self.axis.label(),
            if self.positive { "pos" } else { "neg" }
        )
    }
}

/// Variables of one item.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemVars {
    /// Minimum corner, indexed by [`Axis::index`].
    pub position: [VarId; 3],
    /// Effective extent (a, b, c), indexed by [`Axis::index`].
    pub extent: [VarId; 3],
    /// `selectors[p][q]`, p = axis index, q = raw dimension index.
    pub selectors: [[VarId; 3]; 3],
}

impl ItemVars {
    #[inline]
    pub fn selector(&self, axis: Axis, dim: RawDim) -> VarId {
        self.selectors[axis.index()][dim.index()]
    }
}

/// Separation indicators of one item pair, in [`Direction::ALL`] order.
#[derive(Clone, Debug, PartialEq)]
pub struct PairVars {
    pub first: usize,
    pub second: usize,
    pub separation: [VarId; 6],
}

/// The built MILP together with handles to every decision variable.
#[derive(Clone, Debug)]
pub struct PackingModel {
    pub model: MilpModel,
    pub items: Vec<ItemVars>,
    pub pairs: Vec<PairVars>,
    pub max_height: VarId,
    pub big_m: f64,
}

/// Big-M constant: `max(A, B, C) + max(all item dimensions)`.
pub fn big_m(container: &Container, items: &ItemSizes) -> f64 {
    container.dims.max_component() + items.max_dimension()
}

/// Builds the complete stacking model.
///
/// # Parameters
/// * `container` - Validated container dimensions
/// * `items` - Validated, margin-adjusted item dimensions
///
/// # Returns
/// `PackingModel` with a named constraint for every row. With zero items the
/// model only holds `max_height`.
pub fn build_model(container: &Container, items: &ItemSizes) -> PackingModel {
    let m = big_m(container, items);
    let mut model = MilpModel::new("packing");

    let items_vars: Vec<ItemVars> = (0..items.len())
        .map(|i| add_item_vars(&mut model, i))
        .collect();
    let max_height = model.add_continuous("max_height", 0.0);
    model.set_objective(LinearExpr::var(max_height), Sense::Minimize);

    for (i, vars) in items_vars.iter().enumerate() {
        add_containment(&mut model, container, i, vars);
        add_orientation_selection(&mut model, items, m, i, vars);
        add_permutation(&mut model, i, vars);
        add_extent_bounds(&mut model, items, i, vars);
    }

    let mut pairs = Vec::with_capacity(items.len() * items.len().saturating_sub(1) / 2);
    for i in 0..items_vars.len() {
        for j in (i + 1)..items_vars.len() {
            pairs.push(add_non_overlap(&mut model, m, i, j, &items_vars[i], &items_vars[j]));
        }
    }

    for (i, vars) in items_vars.iter().enumerate() {
        model.add_constraint(
            format!("height[{}]", i),
            LinearExpr::var(max_height)
                .plus(-1.0, vars.position[Axis::Z.index()])
                .plus(-1.0, vars.extent[Axis::Z.index()]),
            Comparison::GreaterEq,
            0.0,
        );
    }

    debug!(
        items = items.len(),
        pairs = pairs.len(),
        variables = model.variables().len(),
        binaries = model.binary_count(),
        constraints = model.constraints().len(),
        big_m = m,
        "built packing model"
    );

    PackingModel {
        model,
        items: items_vars,
        pairs,
        max_height,
        big_m: m,
    }
}

fn add_item_vars(model: &mut MilpModel, i: usize) -> ItemVars {
    let position = Axis::ALL.map(|axis| model.add_continuous(format!("{}[{}]", axis.label(), i), 0.0));
    let extent =
        Axis::ALL.map(|axis| model.add_continuous(format!("{}[{}]", axis.extent_letter(), i), 0.0));
    let selectors = Axis::ALL.map(|axis| {
        RawDim::ALL.map(|dim| {
            model.add_binary(format!("e_{}{}[{}]", axis.extent_letter(), dim.letter(), i))
        })
    });
    ItemVars {
        position,
        extent,
        selectors,
    }
}

/// `x_i + a_i <= A` and likewise for y/B and z/C.
fn add_containment(model: &mut MilpModel, container: &Container, i: usize, vars: &ItemVars) {
    for axis in Axis::ALL {
        model.add_constraint(
            format!("contain_{}[{}]", axis.label(), i),
            LinearExpr::var(vars.position[axis.index()]).plus(1.0, vars.extent[axis.index()]),
            Comparison::LessEq,
            container.size(axis),
        );
    }
}

/// `|p_i - q_i| <= M·e_pq` as two inequalities per (p, q).
fn add_orientation_selection(
    model: &mut MilpModel,
    items: &ItemSizes,
    m: f64,
    i: usize,
    vars: &ItemVars,
) {
    for axis in Axis::ALL {
        let extent = vars.extent[axis.index()];
        for dim in RawDim::ALL {
            let selector = vars.selector(axis, dim);
            let raw = items.raw(i, dim);
            let tag = format!("{}_{}[{}]", axis.extent_letter(), dim.letter(), i);
            // p - q <= M·e
            model.add_constraint(
                format!("select_hi_{}", tag),
                LinearExpr::var(extent).plus(-m, selector),
                Comparison::LessEq,
                raw,
            );
            // q - p <= M·e
            model.add_constraint(
                format!("select_lo_{}", tag),
                LinearExpr::var(extent).plus(m, selector),
                Comparison::GreaterEq,
                raw,
            );
        }
    }
}

/// Each row and each column of the selector matrix holds exactly one zero.
fn add_permutation(model: &mut MilpModel, i: usize, vars: &ItemVars) {
    for axis in Axis::ALL {
        let row = RawDim::ALL
            .iter()
            .fold(LinearExpr::new(), |expr, dim| expr.plus(1.0, vars.selector(axis, *dim)));
        model.add_constraint(
            format!("perm_row_{}[{}]", axis.extent_letter(), i),
            row,
            Comparison::Equal,
            2.0,
        );
    }
    for dim in RawDim::ALL {
        let column = Axis::ALL
            .iter()
            .fold(LinearExpr::new(), |expr, axis| expr.plus(1.0, vars.selector(*axis, dim)));
        model.add_constraint(
            format!("perm_col_{}[{}]", dim.letter(), i),
            column,
            Comparison::Equal,
            2.0,
        );
    }
}

/// Valid for every permutation of the raw lengths; tightens the relaxation.
fn add_extent_bounds(model: &mut MilpModel, items: &ItemSizes, i: usize, vars: &ItemVars) {
    let raw = items.item(i);
    let shortest = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let longest = raw.iter().copied().fold(0.0, f64::max);

    for axis in Axis::ALL {
        let letter = axis.extent_letter();
        let extent = vars.extent[axis.index()];
        model.add_constraint(
            format!("extent_lo_{}[{}]", letter, i),
            LinearExpr::var(extent),
            Comparison::GreaterEq,
            shortest,
        );
        model.add_constraint(
            format!("extent_hi_{}[{}]", letter, i),
            LinearExpr::var(extent),
            Comparison::LessEq,
            longest,
        );
    }

    let sum = vars
        .extent
        .iter()
        .fold(LinearExpr::new(), |expr, extent| expr.plus(1.0, *extent));
    model.add_constraint(
        format!("extent_sum[{}]", i),
        sum,
        Comparison::Equal,
        raw.iter().sum(),
    );
}

/// Six big-M separations for the pair (i, j) plus the counting row
/// `Σ o <= 5`: at least one direction must actually separate the boxes.
fn add_non_overlap(
    model: &mut MilpModel,
    m: f64,
    i: usize,
    j: usize,
    first: &ItemVars,
    second: &ItemVars,
) -> PairVars {
    let separation = Direction::ALL.map(|direction| {
        model.add_binary(format!("o_{}[{},{}]", direction.suffix(), i, j))
    });

    for (direction, indicator) in Direction::ALL.iter().zip(separation.iter()) {
        let k = direction.axis.index();
        let (ahead, behind) = if direction.positive {
            (second, first)
        } else {
            (first, second)
        };
        // ahead.v - behind.v - behind.ext >= -M·o
        model.add_constraint(
            format!("sep_{}[{},{}]", direction.suffix(), i, j),
            LinearExpr::var(ahead.position[k])
                .plus(-1.0, behind.position[k])
                .plus(-1.0, behind.extent[k])
                .plus(m, *indicator),
            Comparison::GreaterEq,
            0.0,
        );
    }

    let count = separation
        .iter()
        .fold(LinearExpr::new(), |expr, indicator| expr.plus(1.0, *indicator));
    model.add_constraint(
        format!("sep_count[{},{}]", i, j),
        count,
        Comparison::LessEq,
        5.0,
    );

    PairVars {
        first: i,
        second: j,
        separation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milp::VarKind;
    use crate::normalizer::normalize;

    fn scenario() -> (Container, ItemSizes) {
        let container = Container::new([10.0, 10.0, 100.0]).unwrap();
        let items = normalize(
            &[
                vec![2.0, 2.0, 2.0],
                vec![2.0, 1.0, 1.0],
                vec![1.0, 1.0, 2.0],
            ],
            Some(5.0),
        )
        .unwrap();
        (container, items)
    }

    fn constraint<'a>(model: &'a PackingModel, name: &str) -> &'a crate::milp::LinearConstraint {
        model
            .model
            .constraints()
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("constraint {name} missing"))
    }

    #[test]
    fn big_m_adds_largest_container_and_item_dimension() {
        let (container, items) = scenario();
        assert_eq!(big_m(&container, &items), 107.0);
    }

    #[test]
    fn model_size_matches_item_and_pair_count() {
        let (container, items) = scenario();
        let built = build_model(&container, &items);

        // 3 items × (3 position + 3 extent + 9 selectors) + 3 pairs × 6 + max_height
        assert_eq!(built.model.variables().len(), 3 * 15 + 3 * 6 + 1);
        assert_eq!(built.model.binary_count(), 3 * 9 + 3 * 6);
        // per item: 3 containment + 18 selection + 6 permutation + 7 extent bounds + 1 height
        // per pair: 6 separations + 1 count
        assert_eq!(built.model.constraints().len(), 3 * 35 + 3 * 7);
        assert_eq!(built.pairs.len(), 3);
        assert_eq!((built.pairs[2].first, built.pairs[2].second), (1, 2));
    }

    #[test]
    fn constraint_names_are_unique() {
        let (container, items) = scenario();
        let built = build_model(&container, &items);
        let mut names: Vec<&str> = built
            .model
            .constraints()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn permutation_rows_and_columns_sum_to_two() {
        let (container, items) = scenario();
        let built = build_model(&container, &items);
        for name in ["perm_row_a[0]", "perm_row_c[2]", "perm_col_m[1]", "perm_col_l[0]"] {
            let row = constraint(&built, name);
            assert_eq!(row.cmp, Comparison::Equal);
            assert_eq!(row.rhs, 2.0);
            assert_eq!(row.expr.terms().len(), 3);
            assert!(
                row.expr
                    .terms()
                    .iter()
                    .all(|(var, _)| built.model.variable(*var).kind == VarKind::Binary)
            );
        }
    }

    #[test]
    fn selection_rows_use_big_m_and_raw_length() {
        let (container, items) = scenario();
        let built = build_model(&container, &items);
        let hi = constraint(&built, "select_hi_b_n[1]");
        assert_eq!(hi.cmp, Comparison::LessEq);
        assert_eq!(hi.rhs, 6.0);
        assert_eq!(
            hi.expr.terms(),
            &[
                (built.items[1].extent[1], 1.0),
                (built.items[1].selector(Axis::Y, RawDim::N), -107.0)
            ]
        );
        let lo = constraint(&built, "select_lo_b_n[1]");
        assert_eq!(lo.cmp, Comparison::GreaterEq);
        assert_eq!(lo.expr.terms()[1].1, 107.0);
    }

    #[test]
    fn separation_rows_point_in_both_directions() {
        let (container, items) = scenario();
        let built = build_model(&container, &items);
        let (first, second) = (&built.items[0], &built.items[2]);

        let pos = constraint(&built, "sep_z_pos[0,2]");
        assert_eq!(
            &pos.expr.terms()[..3],
            &[
                (second.position[2], 1.0),
                (first.position[2], -1.0),
                (first.extent[2], -1.0)
            ]
        );
        let neg = constraint(&built, "sep_x_neg[0,2]");
        assert_eq!(
            &neg.expr.terms()[..3],
            &[
                (first.position[0], 1.0),
                (second.position[0], -1.0),
                (second.extent[0], -1.0)
            ]
        );
        assert_eq!(constraint(&built, "sep_count[0,2]").rhs, 5.0);
    }

    /// Known feasible stack: every item upright on top of the previous one.
    #[test]
    fn hand_made_stack_satisfies_every_constraint() {
        let (container, items) = scenario();
        let built = build_model(&container, &items);
        let mut values = vec![0.0; built.model.variables().len()];

        let mut z = 0.0;
        for (i, vars) in built.items.iter().enumerate() {
            let raw = items.item(i);
            // m along x, n along y, l along z
            for axis in Axis::ALL {
                values[vars.extent[axis.index()].index()] = raw[axis.index()];
                for dim in RawDim::ALL {
                    let selected = axis.index() == dim.index();
                    values[vars.selector(axis, dim).index()] = if selected { 0.0 } else { 1.0 };
                }
            }
            values[vars.position[2].index()] = z;
            z += raw[2];
        }
        for pair in &built.pairs {
            // only z+ separates: all other indicators active
            for (direction, indicator) in Direction::ALL.iter().zip(pair.separation.iter()) {
                let inactive = direction.axis == Axis::Z && direction.positive;
                values[indicator.index()] = if inactive { 0.0 } else { 1.0 };
            }
        }
        values[built.max_height.index()] = z;

        assert_eq!(built.model.violated_constraints(&values, 1e-9), Vec::<&str>::new());
    }

    #[test]
    fn overlapping_assignment_is_rejected() {
        let (container, items) = scenario();
        let built = build_model(&container, &items);
        let mut values = vec![1.0; built.model.variables().len()];
        for (i, vars) in built.items.iter().enumerate() {
            let raw = items.item(i);
            for axis in Axis::ALL {
                values[vars.position[axis.index()].index()] = 0.0;
                values[vars.extent[axis.index()].index()] = raw[axis.index()];
                values[vars.selector(axis, RawDim::ALL[axis.index()]).index()] = 0.0;
            }
        }
        values[built.max_height.index()] = 7.0;

        let violated = built.model.violated_constraints(&values, 1e-9);
        assert!(violated.contains(&"sep_count[0,1]"));
    }

    #[test]
    fn empty_item_list_builds_height_only_model() {
        let container = Container::new([1.0, 1.0, 1.0]).unwrap();
        let items = ItemSizes::new(vec![], vec![], vec![]).unwrap();
        let built = build_model(&container, &items);
        assert_eq!(built.model.variables().len(), 1);
        assert!(built.model.constraints().is_empty());
        assert!(built.items.is_empty());
    }
}
