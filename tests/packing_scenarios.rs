use stack_planner::geometry::verify_plan;
use stack_planner::milp::SolveStatus;
use stack_planner::model::Container;
use stack_planner::normalizer::normalize;
use stack_planner::sorter::placement_order;
use stack_planner::types::{Axis, EPSILON_GEOMETRY};
use stack_planner::{PackingConfig, PackingOutcome, PackingPlan, plan_packing};

const TOLERANCE: f64 = 1e-6;

fn sample_items() -> [Vec<f64>; 3] {
    [
        vec![2.0, 2.0, 2.0],
        vec![2.0, 1.0, 1.0],
        vec![1.0, 1.0, 2.0],
    ]
}

fn solve(container: [f64; 3], items: &[Vec<f64>; 3], margin: f64) -> PackingPlan {
    let config = PackingConfig::builder().margin(margin).build();
    match plan_packing(container, items, &config).expect("planning should not fail") {
        PackingOutcome::Solved(plan) => plan,
        other => panic!("expected a solved plan, got {other:?}"),
    }
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

/// Checks every geometric property a solved plan must satisfy.
fn assert_plan_is_valid(container: [f64; 3], items: &[Vec<f64>; 3], margin: f64, plan: &PackingPlan) {
    let sizes = normalize(items, Some(margin)).unwrap();
    let container = Container::new(container).unwrap();
    assert_eq!(plan.placements.len(), sizes.len());

    for placement in &plan.placements {
        assert!(placement.orientation.is_permutation());
        let extent = placement.extent.to_array();
        assert_eq!(
            sorted(extent.to_vec()),
            sorted(sizes.item(placement.index).to_vec()),
            "extent of item {} is not a permutation of its raw dimensions",
            placement.index
        );
        for axis in Axis::ALL {
            let low = placement.position().component(axis);
            let high = low + placement.extent.component(axis);
            assert!(low >= -TOLERANCE, "item {} below 0 on {:?}", placement.index, axis);
            assert!(
                high <= container.size(axis) + TOLERANCE,
                "item {} beyond container on {:?}",
                placement.index,
                axis
            );
        }
    }

    assert_eq!(verify_plan(&container, &plan.placements, EPSILON_GEOMETRY), vec![]);

    let top = plan
        .placements
        .iter()
        .map(|p| p.top_z())
        .fold(0.0, f64::max);
    assert_eq!(plan.max_height, top);

    for pair in plan.placements.windows(2) {
        assert_ne!(
            placement_order(&pair[0], &pair[1]),
            std::cmp::Ordering::Greater,
            "placements are not sorted"
        );
    }
}

#[test]
fn margin_scenario_stacks_three_items() {
    let container = [10.0, 10.0, 100.0];
    let items = sample_items();
    let plan = solve(container, &items, 5.0);

    assert_eq!(plan.placements.len(), 3);
    assert!(plan.max_height <= 21.0 + TOLERANCE);
    // No two enlarged items fit side by side in a 10×10 footprint, so each
    // lies on a 6-edge: 3 × 6.
    assert!((plan.max_height - 18.0).abs() < TOLERANCE, "height {}", plan.max_height);
    assert!((plan.objective - plan.max_height).abs() < TOLERANCE);
    assert_plan_is_valid(container, &items, 5.0, &plan);

    let mut indices: Vec<usize> = plan.placements.iter().map(|p| p.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn cubes_share_the_floor_when_the_footprint_allows() {
    let container = [10.0, 5.0, 5.0];
    let items = [vec![5.0, 5.0], vec![5.0, 5.0], vec![5.0, 5.0]];
    let plan = solve(container, &items, 0.0);

    assert!((plan.max_height - 5.0).abs() < TOLERANCE);
    assert_plan_is_valid(container, &items, 0.0, &plan);
    // equal z: larger centroid x comes first
    assert!(plan.placements[0].centroid_x > plan.placements[1].centroid_x);
}

#[test]
fn long_item_is_turned_to_fit() {
    // 8 only fits along z; 3 only fits along x or y
    let container = [3.0, 4.0, 9.0];
    let items = [vec![4.0], vec![8.0], vec![3.0]];
    let plan = solve(container, &items, 0.0);

    assert!((plan.max_height - 8.0).abs() < TOLERANCE);
    let placement = &plan.placements[0];
    assert_eq!(placement.orientation.0, [Axis::Y, Axis::Z, Axis::X]);
    assert_plan_is_valid(container, &items, 0.0, &plan);
}

#[test]
fn zero_items_give_an_empty_plan() {
    let plan = solve([1.0, 2.0, 3.0], &[vec![], vec![], vec![]], 0.0);
    assert_eq!(plan.max_height, 0.0);
    assert!(plan.placements.is_empty());
}

#[test]
fn oversized_items_yield_no_solution() {
    let outcome = plan_packing(
        [2.0, 2.0, 2.0],
        &[vec![3.0, 4.0], vec![5.0, 3.0], vec![6.0, 9.0]],
        &PackingConfig::default(),
    )
    .expect("infeasibility is not an error");

    assert_eq!(
        outcome,
        PackingOutcome::NoSolution {
            status: SolveStatus::Infeasible
        }
    );
    assert_eq!(outcome.max_height(), None);
}

#[test]
fn container_too_low_for_the_stack_yields_no_solution() {
    // each cube fits alone, but 2 cubes of 6 cannot share a 10×10×10 box
    let outcome = plan_packing(
        [10.0, 10.0, 10.0],
        &[vec![6.0, 6.0], vec![6.0, 6.0], vec![6.0, 6.0]],
        &PackingConfig::default(),
    )
    .unwrap();
    assert_eq!(outcome.status(), SolveStatus::Infeasible);
}

#[test]
fn repeated_calls_report_the_same_height() {
    let container = [10.0, 10.0, 100.0];
    let items = sample_items();
    let first = solve(container, &items, 5.0);
    let second = solve(container, &items, 5.0);
    assert!((first.max_height - second.max_height).abs() < TOLERANCE);
}

#[test]
fn caller_input_is_not_modified() {
    let items = sample_items();
    let _ = solve([10.0, 10.0, 100.0], &items, 5.0);
    assert_eq!(items, sample_items());
}
