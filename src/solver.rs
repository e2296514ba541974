//! External MILP solver seam.
//!
//! The planner only needs one blocking call: hand over a [`MilpModel`],
//! get back a [`SolveOutcome`]. [`GoodLpSolver`] implements it on top of
//! `good_lp` with the pure-Rust `microlp` engine.

use std::time::{Duration, Instant};

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus, SolverModel,
    Variable, WithTimeLimit, constraint, microlp, variable,
};
use tracing::{debug, info};

use crate::error::SolverError;
use crate::milp::{Assignment, Comparison, LinearExpr, MilpModel, Sense, SolveOutcome, VarKind};

/// A MILP engine.
///
/// Infeasible and unbounded models are regular outcomes; `Err` is reserved
/// for failures of the engine itself (timeouts, backend errors).
pub trait Solver {
    fn solve(&self, model: &MilpModel) -> Result<SolveOutcome, SolverError>;
}

/// Scoped solver session.
///
/// Opened when a solve starts and closed on drop, so the release is logged
/// on success, infeasibility and error alike.
pub struct SolveSession<'a> {
    model: &'a str,
    started: Instant,
}

impl<'a> SolveSession<'a> {
    pub fn open(model: &'a MilpModel) -> Self {
        debug!(
            model = model.name(),
            variables = model.variables().len(),
            constraints = model.constraints().len(),
            "acquired solver session"
        );
        Self {
            model: model.name(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for SolveSession<'_> {
    fn drop(&mut self) {
        debug!(
            model = self.model,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "released solver session"
        );
    }
}

/// `good_lp` + `microlp` backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoodLpSolver {
    time_limit: Option<Duration>,
}

impl GoodLpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the engine once `limit` has passed.
    ///
    /// Without a feasible incumbent this is [`SolverError::TimedOut`]; with
    /// one the outcome is [`SolveOutcome::Other`], since optimality was not
    /// proven.
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }
}

impl Solver for GoodLpSolver {
    fn solve(&self, model: &MilpModel) -> Result<SolveOutcome, SolverError> {
        let session = SolveSession::open(model);
        let result = solve_with_good_lp(model, self.time_limit);
        info!(
            status = result.as_ref().map(|o| o.status().code()).unwrap_or("error"),
            elapsed_ms = session.elapsed().as_millis() as u64,
            "solver finished"
        );
        result
    }
}

fn solve_with_good_lp(
    model: &MilpModel,
    time_limit: Option<Duration>,
) -> Result<SolveOutcome, SolverError> {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables()
        .iter()
        .map(|def| {
            let definition = match def.kind {
                VarKind::Continuous { lower } => variable().min(lower),
                VarKind::Binary => variable().binary(),
            };
            vars.add(definition.name(def.name.clone()))
        })
        .collect();

    let (objective, sense) = model.objective();
    let objective_expr = to_expression(objective, &handles);
    let unsolved = match sense {
        Sense::Minimize => vars.minimise(objective_expr),
        Sense::Maximize => vars.maximise(objective_expr),
    };

    let mut problem = unsolved.using(microlp);
    if let Some(limit) = time_limit {
        problem = problem.with_time_limit(limit.as_secs_f64());
    }
    for row in model.constraints() {
        let lhs = to_expression(&row.expr, &handles);
        problem.add_constraint(match row.cmp {
            Comparison::LessEq => constraint::leq(lhs, row.rhs),
            Comparison::GreaterEq => constraint::geq(lhs, row.rhs),
            Comparison::Equal => constraint::eq(lhs, row.rhs),
        });
    }

    match problem.solve() {
        Ok(solution) => match solution.status() {
            SolutionStatus::Optimal => {
                let values: Vec<f64> = handles.iter().map(|var| solution.value(*var)).collect();
                let objective = objective.evaluate(&values);
                Ok(SolveOutcome::Optimal(Assignment { values, objective }))
            }
            SolutionStatus::TimeLimit => {
                debug!("time limit reached with a feasible incumbent");
                Ok(SolveOutcome::Other("time_limit".to_string()))
            }
            SolutionStatus::GapLimit => Ok(SolveOutcome::Other("gap_limit".to_string())),
        },
        Err(ResolutionError::Infeasible) => Ok(SolveOutcome::Infeasible),
        Err(ResolutionError::Unbounded) => Ok(SolveOutcome::Unbounded),
        // Raised by microlp when the limit expires before any feasible solution.
        Err(ResolutionError::Other(reason)) => match time_limit {
            Some(limit) => Err(SolverError::TimedOut(limit)),
            None => Err(SolverError::Backend(reason.to_string())),
        },
        Err(err) => Err(SolverError::Backend(err.to_string())),
    }
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    expr.terms()
        .iter()
        .fold(Expression::from_other_affine(expr.constant()), |acc, (var, coef)| {
            acc + *coef * handles[var.index()]
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_model;
    use crate::milp::SolveStatus;
    use crate::model::{Container, ItemSizes};

    /// max x + y  s.t.  x + 2y <= 4, y binary, x <= 3
    fn knapsack_like() -> MilpModel {
        let mut model = MilpModel::new("small");
        let x = model.add_continuous("x", 0.0);
        let y = model.add_binary("y");
        model.add_constraint(
            "cap",
            LinearExpr::var(x).plus(2.0, y),
            Comparison::LessEq,
            4.0,
        );
        model.add_constraint("x_max", LinearExpr::var(x), Comparison::LessEq, 3.0);
        model.set_objective(LinearExpr::var(x).plus(1.0, y), Sense::Maximize);
        model
    }

    #[test]
    fn solves_small_mixed_integer_model() {
        let model = knapsack_like();
        let outcome = GoodLpSolver::new().solve(&model).unwrap();
        let SolveOutcome::Optimal(assignment) = outcome else {
            panic!("expected optimal outcome, got {outcome:?}");
        };
        assert!((assignment.objective - 3.0).abs() < 1e-6);
        assert!(model.violated_constraints(&assignment.values, 1e-6).is_empty());
    }

    #[test]
    fn reports_infeasibility_as_outcome() {
        let mut model = MilpModel::new("infeasible");
        let x = model.add_continuous("x", 0.0);
        model.add_constraint("upper", LinearExpr::var(x), Comparison::LessEq, 1.0);
        model.add_constraint("lower", LinearExpr::var(x), Comparison::GreaterEq, 2.0);
        model.set_objective(LinearExpr::var(x), Sense::Minimize);

        let outcome = GoodLpSolver::new().solve(&model).unwrap();
        assert_eq!(outcome.status(), SolveStatus::Infeasible);
    }

    #[test]
    fn generous_time_limit_still_proves_optimality() {
        let model = knapsack_like();
        let solver = GoodLpSolver::new().with_time_limit(Some(Duration::from_secs(30)));
        assert_eq!(solver.time_limit(), Some(Duration::from_secs(30)));
        let outcome = solver.solve(&model).unwrap();
        assert_eq!(outcome.status(), SolveStatus::Optimal);
    }

    #[test]
    fn tiny_time_limit_never_claims_a_proven_result() {
        let container = Container::new([10.0, 10.0, 100.0]).unwrap();
        let items = ItemSizes::new(
            vec![2.0, 3.0, 4.0, 2.0, 5.0, 1.0, 3.0, 2.0, 4.0],
            vec![3.0, 3.0, 1.0, 4.0, 2.0, 2.0, 5.0, 2.0, 3.0],
            vec![1.0, 2.0, 2.0, 3.0, 1.0, 4.0, 2.0, 6.0, 2.0],
        )
        .unwrap();
        let packing = build_model(&container, &items);
        let limit = Duration::from_micros(1);

        match GoodLpSolver::new().with_time_limit(Some(limit)).solve(&packing.model) {
            Err(err) => assert_eq!(err, SolverError::TimedOut(limit)),
            Ok(outcome) => assert_eq!(outcome.status(), SolveStatus::Other),
        }
    }

    #[test]
    fn objective_constant_is_carried_into_backend() {
        let mut model = MilpModel::new("offset");
        let x = model.add_continuous("x", 1.5);
        model.set_objective(LinearExpr::var(x).offset(10.0), Sense::Minimize);
        let outcome = GoodLpSolver::new().solve(&model).unwrap();
        let SolveOutcome::Optimal(assignment) = outcome else {
            panic!("expected optimal outcome");
        };
        assert!((assignment.objective - 11.5).abs() < 1e-6);
    }
}
