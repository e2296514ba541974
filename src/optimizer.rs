//! Orchestration of the exact stacking pipeline.
//!
//! Normalizer → model builder → solver → result extractor → result sorter.
//! Each call builds its own model and shares no state with other calls, so
//! independent requests may run in parallel.
//!
//! Gravity and support constraints are not part of the model; a placement
//! may float above the container floor as long as it does not overlap
//! another item.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::builder::build_model;
use crate::error::PackingError;
use crate::extract::{extract_placements, stack_height};
use crate::geometry::verify_plan;
use crate::milp::{SolveOutcome, SolveStatus};
use crate::model::{Container, Placement};
use crate::normalizer::normalize;
use crate::solver::{GoodLpSolver, Solver};
use crate::sorter::sort_placements;
use crate::types::validation::validate_selector_tolerance;
use crate::types::{EPSILON_GEOMETRY, EPSILON_SELECTOR};

/// Configuration of one planning call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Clearance added to every item edge length.
    pub margin: f64,
    /// A solved selector counts as zero below this absolute value.
    pub selector_tolerance: f64,
    /// Wall-clock limit for the solver; `None` waits for the optimum.
    pub time_limit: Option<Duration>,
    /// Re-check containment and non-overlap of solved plans.
    pub verify_plans: bool,
}

impl PackingConfig {
    pub const DEFAULT_MARGIN: f64 = 0.0;
    pub const DEFAULT_SELECTOR_TOLERANCE: f64 = EPSILON_SELECTOR;
    pub const DEFAULT_TIME_LIMIT: Option<Duration> = None;
    pub const DEFAULT_VERIFY_PLANS: bool = true;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            margin: Self::DEFAULT_MARGIN,
            selector_tolerance: Self::DEFAULT_SELECTOR_TOLERANCE,
            time_limit: Self::DEFAULT_TIME_LIMIT,
            verify_plans: Self::DEFAULT_VERIFY_PLANS,
        }
    }
}

/// Builder for PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn margin(mut self, margin: f64) -> Self {
        self.config.margin = margin;
        self
    }

    pub fn selector_tolerance(mut self, tolerance: f64) -> Self {
        self.config.selector_tolerance = tolerance;
        self
    }

    pub fn time_limit(mut self, limit: Option<Duration>) -> Self {
        self.config.time_limit = limit;
        self
    }

    pub fn verify_plans(mut self, verify: bool) -> Self {
        self.config.verify_plans = verify;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// A solved stacking plan.
#[derive(Clone, Debug, PartialEq)]
pub struct PackingPlan {
    /// Placements in placement order (z, then x, then y, all descending).
    pub placements: Vec<Placement>,
    /// `max(z + c)` over the placements.
    pub max_height: f64,
    /// Objective value reported by the solver.
    pub objective: f64,
    pub solve_duration: Duration,
}

impl PackingPlan {
    fn empty() -> Self {
        Self {
            placements: Vec::new(),
            max_height: 0.0,
            objective: 0.0,
            solve_duration: Duration::ZERO,
        }
    }
}

/// Result of a planning call that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum PackingOutcome {
    Solved(PackingPlan),
    /// Infeasible, unbounded or stopped without a proven optimum.
    NoSolution { status: SolveStatus },
}

impl PackingOutcome {
    pub fn status(&self) -> SolveStatus {
        match self {
            PackingOutcome::Solved(_) => SolveStatus::Optimal,
            PackingOutcome::NoSolution { status } => *status,
        }
    }

    pub fn plan(&self) -> Option<&PackingPlan> {
        match self {
            PackingOutcome::Solved(plan) => Some(plan),
            PackingOutcome::NoSolution { .. } => None,
        }
    }

    pub fn into_plan(self) -> Option<PackingPlan> {
        match self {
            PackingOutcome::Solved(plan) => Some(plan),
            PackingOutcome::NoSolution { .. } => None,
        }
    }

    pub fn max_height(&self) -> Option<f64> {
        self.plan().map(|plan| plan.max_height)
    }
}

/// Plans the stack with the default `good_lp` backend.
///
/// # Parameters
/// * `container_size` - Container dimensions `[A, B, C]`
/// * `item_size` - Item edge lengths `[[m..], [n..], [l..]]`
/// * `config` - Margin, tolerances and solver time limit
///
/// # Returns
/// `PackingOutcome::Solved` with a sorted plan, `PackingOutcome::NoSolution`
/// when no optimum exists, or `PackingError` for malformed input, solver
/// failures and undecodable solutions.
pub fn plan_packing(
    container_size: [f64; 3],
    item_size: &[Vec<f64>; 3],
    config: &PackingConfig,
) -> Result<PackingOutcome, PackingError> {
    let solver = GoodLpSolver::new().with_time_limit(config.time_limit);
    plan_packing_with(&solver, container_size, item_size, config)
}

/// Like [`plan_packing`], but with an explicit solver.
pub fn plan_packing_with<S: Solver + ?Sized>(
    solver: &S,
    container_size: [f64; 3],
    item_size: &[Vec<f64>; 3],
    config: &PackingConfig,
) -> Result<PackingOutcome, PackingError> {
    validate_selector_tolerance(config.selector_tolerance)?;
    let container = Container::new(container_size)?;
    let items = normalize(item_size, Some(config.margin))?;

    if items.is_empty() {
        info!("no items to place, returning empty plan");
        return Ok(PackingOutcome::Solved(PackingPlan::empty()));
    }

    let packing = build_model(&container, &items);
    info!(
        items = items.len(),
        variables = packing.model.variables().len(),
        constraints = packing.model.constraints().len(),
        "solving packing model"
    );

    let started = Instant::now();
    let outcome = solver.solve(&packing.model)?;
    let solve_duration = started.elapsed();

    let assignment = match outcome {
        SolveOutcome::Optimal(assignment) => assignment,
        other => {
            info!(status = other.status().code(), "no optimal packing found");
            debug!(model = %packing.model.to_lp_string(), "packing model without optimum");
            return Ok(PackingOutcome::NoSolution {
                status: other.status(),
            });
        }
    };

    let mut placements =
        extract_placements(&packing, &items, &assignment, config.selector_tolerance)?;

    if config.verify_plans {
        for violation in verify_plan(&container, &placements, EPSILON_GEOMETRY) {
            warn!(%violation, "solved plan violates geometry");
        }
    }

    sort_placements(&mut placements);
    let max_height = stack_height(&placements);
    info!(
        max_height,
        objective = assignment.objective,
        solve_ms = solve_duration.as_millis() as u64,
        "packing solved"
    );

    Ok(PackingOutcome::Solved(PackingPlan {
        placements,
        max_height,
        objective: assignment.objective,
        solve_duration,
    }))
}
