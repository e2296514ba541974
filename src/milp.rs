//! Solver-independent mixed-integer linear program.
//!
//! [`MilpModel`] mirrors the capability set every MILP engine offers:
//! continuous variables with a lower bound, binary variables, named linear
//! constraints and a linear objective. Backends in [`crate::solver`]
//! translate it into their own representation.

use std::fmt::{self, Write as _};

/// Handle of a variable inside one [`MilpModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VarKind {
    Continuous { lower: f64 },
    Binary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
}

/// Affine expression `Σ coef·var + constant`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expression consisting of a single variable with coefficient 1.
    pub fn var(var: VarId) -> Self {
        Self::new().plus(1.0, var)
    }

    /// Adds `coef·var` (builder style).
    pub fn plus(mut self, coef: f64, var: VarId) -> Self {
        self.terms.push((var, coef));
        self
    }

    /// Adds a constant offset (builder style).
    pub fn offset(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Evaluates the expression for a full variable assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values[var.index()])
            .sum::<f64>()
            + self.constant
    }
}

/// Comparison operator of a linear constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    LessEq,
    GreaterEq,
    Equal,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::LessEq => "<=",
            Comparison::GreaterEq => ">=",
            Comparison::Equal => "=",
        })
    }
}

/// Named constraint `expr (<=|>=|=) rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Checks the constraint for an assignment, allowing `tolerance` slack.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.cmp {
            Comparison::LessEq => lhs <= self.rhs + tolerance,
            Comparison::GreaterEq => lhs >= self.rhs - tolerance,
            Comparison::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// Termination status reported by a solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Other,
}

impl SolveStatus {
    pub fn code(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Other => "not_optimal",
        }
    }
}

/// Values of an optimal solution.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub values: Vec<f64>,
    pub objective: f64,
}

impl Assignment {
    /// Solved value of `var`.
    ///
    /// # Panics
    /// Panics if `var` belongs to a different model.
    #[inline]
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }
}

/// Result of one optimize call. Only `Optimal` carries values.
#[derive(Clone, Debug, PartialEq)]
pub enum SolveOutcome {
    Optimal(Assignment),
    Infeasible,
    Unbounded,
    Other(String),
}

impl SolveOutcome {
    pub fn status(&self) -> SolveStatus {
        match self {
            SolveOutcome::Optimal(_) => SolveStatus::Optimal,
            SolveOutcome::Infeasible => SolveStatus::Infeasible,
            SolveOutcome::Unbounded => SolveStatus::Unbounded,
            SolveOutcome::Other(_) => SolveStatus::Other,
        }
    }
}

/// A complete MILP: variables, constraints and objective.
#[derive(Clone, Debug, PartialEq)]
pub struct MilpModel {
    name: String,
    variables: Vec<VarDef>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
    sense: Sense,
}

impl MilpModel {
    /// Creates an empty model that minimizes 0.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: LinearExpr::new(),
            sense: Sense::Minimize,
        }
    }

    /// Adds a continuous variable `lower <= v` (no upper bound).
    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64) -> VarId {
        self.push_var(name.into(), VarKind::Continuous { lower })
    }

    /// Adds a variable restricted to {0, 1}.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.push_var(name.into(), VarKind::Binary)
    }

    fn push_var(&mut self, name: String, kind: VarKind) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VarDef { name, kind });
        id
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            expr,
            cmp,
            rhs,
        });
    }

    pub fn set_objective(&mut self, expr: LinearExpr, sense: Sense) {
        self.objective = expr;
        self.sense = sense;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[VarDef] {
        &self.variables
    }

    pub fn variable(&self, var: VarId) -> &VarDef {
        &self.variables[var.index()]
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> (&LinearExpr, Sense) {
        (&self.objective, self.sense)
    }

    pub fn binary_count(&self) -> usize {
        self.variables
            .iter()
            .filter(|var| var.kind == VarKind::Binary)
            .count()
    }

    /// Names of all constraints violated by `values`.
    pub fn violated_constraints(&self, values: &[f64], tolerance: f64) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|constraint| !constraint.is_satisfied(values, tolerance))
            .map(|constraint| constraint.name.as_str())
            .collect()
    }

    /// Renders the model in CPLEX LP format for offline diagnostics.
    pub fn to_lp_string(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_lp(&mut out);
        out
    }

    fn write_lp(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "\\ Model {}", self.name)?;
        writeln!(
            out,
            "{}",
            match self.sense {
                Sense::Minimize => "Minimize",
                Sense::Maximize => "Maximize",
            }
        )?;
        write!(out, " obj:")?;
        self.write_terms(out, &self.objective)?;
        if self.objective.constant() != 0.0 {
            write!(out, " {:+}", self.objective.constant())?;
        }
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for constraint in &self.constraints {
            write!(out, " {}:", constraint.name)?;
            self.write_terms(out, &constraint.expr)?;
            writeln!(
                out,
                " {} {}",
                constraint.cmp,
                constraint.rhs - constraint.expr.constant()
            )?;
        }

        writeln!(out, "Bounds")?;
        for var in &self.variables {
            if let VarKind::Continuous { lower } = var.kind {
                writeln!(out, " {} >= {}", var.name, lower)?;
            }
        }

        writeln!(out, "Binaries")?;
        for var in self.variables.iter().filter(|var| var.kind == VarKind::Binary) {
            writeln!(out, " {}", var.name)?;
        }
        writeln!(out, "End")
    }

    fn write_terms(&self, out: &mut String, expr: &LinearExpr) -> fmt::Result {
        if expr.terms().is_empty() {
            return write!(out, " 0");
        }
        for (var, coef) in expr.terms() {
            let sign = if *coef < 0.0 { '-' } else { '+' };
            write!(out, " {} {} {}", sign, coef.abs(), self.variable(*var).name)?;
        }
        Ok(())
    }
}
