//! Solver engine seam. [MicroLpBackend] hands a [BinaryProgram] to `good_lp`'s pure-Rust
//! `microlp` solver; anything else that can solve a 0/1 program can implement [SolverBackend].

use std::fmt;

use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};

use crate::optimizer::model::{Assignment, BinaryProgram, LinearExpr, Relation};

/// Final status reported by a backend. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    NotSolved,
    Undefined,
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Infeasible => "infeasible",
            Self::Unbounded => "unbounded",
            Self::NotSolved => "not solved",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub status: SolveStatus,
    /// Present iff `status` is [SolveStatus::Optimal].
    pub assignment: Option<Assignment>,
    pub detail: Option<String>,
}

impl SolverOutcome {
    pub fn optimal(assignment: Assignment) -> Self {
        Self {
            status: SolveStatus::Optimal,
            assignment: Some(assignment),
            detail: None,
        }
    }

    pub fn failed(status: SolveStatus, detail: Option<String>) -> Self {
        Self {
            status,
            assignment: None,
            detail,
        }
    }
}

/// Solves one program per call. Implementations must not keep state between calls,
/// so a backend can be shared across threads running independent solves.
pub trait SolverBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, program: &BinaryProgram) -> SolverOutcome;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

impl MicroLpBackend {
    pub fn new() -> Self {
        Self
    }
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    expr.terms
        .iter()
        .map(|&(var, coefficient)| coefficient * handles[var.index()])
        .sum::<Expression>()
        + expr.constant
}

impl SolverBackend for MicroLpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, program: &BinaryProgram) -> SolverOutcome {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = program
            .variables()
            .iter()
            .map(|name| vars.add(variable().binary().name(name.clone())))
            .collect();

        let objective = to_expression(program.objective(), &handles);
        let mut model = vars.maximise(objective).using(microlp);
        for linear in program.constraints() {
            let lhs = to_expression(&linear.lhs, &handles);
            let rhs = linear.rhs;
            let built = match linear.relation {
                Relation::LessOrEqual => constraint!(lhs <= rhs),
                Relation::GreaterOrEqual => constraint!(lhs >= rhs),
                Relation::Equal => constraint!(lhs == rhs),
            };
            model = model.with(built);
        }

        match model.solve() {
            Ok(solution) => {
                let values = handles.iter().map(|&handle| solution.value(handle)).collect();
                SolverOutcome::optimal(Assignment::new(values))
            }
            Err(ResolutionError::Infeasible) => {
                SolverOutcome::failed(SolveStatus::Infeasible, None)
            }
            Err(ResolutionError::Unbounded) => {
                SolverOutcome::failed(SolveStatus::Unbounded, None)
            }
            Err(ResolutionError::Other(message)) => {
                SolverOutcome::failed(SolveStatus::NotSolved, Some(message.to_string()))
            }
            Err(other) => SolverOutcome::failed(SolveStatus::Undefined, Some(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_knapsack() {
        let mut program = BinaryProgram::new("knapsack");
        let a = program.add_binary("a");
        let b = program.add_binary("b");
        let c = program.add_binary("c");
        program.maximize(LinearExpr::new().term(a, 5.0).term(b, 4.0).term(c, 3.0));
        program.add_constraint(
            LinearExpr::new().term(a, 4.0).term(b, 3.0).term(c, 2.0),
            Relation::LessOrEqual,
            5.0,
            "capacity",
        );

        let outcome = MicroLpBackend::new().solve(&program);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        let assignment = outcome.assignment.unwrap();
        assert!(!assignment.is_set(a));
        assert!(assignment.is_set(b));
        assert!(assignment.is_set(c));
    }

    #[test]
    fn reports_infeasible_program() {
        let mut program = BinaryProgram::new("contradiction");
        let x = program.add_binary("x");
        program.maximize(LinearExpr::new().term(x, 1.0));
        program.add_constraint(LinearExpr::sum([x]), Relation::GreaterOrEqual, 2.0, "impossible");

        let outcome = MicroLpBackend::new().solve(&program);
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.assignment.is_none());
    }
}
