pub mod backend;
pub mod formulation;
pub mod model;
pub mod problem;
pub mod report;
pub mod sweep;

use std::collections::BTreeSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::data::DamageType;
use crate::optimizer::backend::{MicroLpBackend, SolveStatus, SolverBackend};
use crate::optimizer::formulation::{formulate, lowest_ids_pass, TeamFormulation};

pub use crate::optimizer::problem::{
    Candidate, Failure, InvalidRequest, ProblemSpec, Solution, Team, MAX_MULTIPLIER,
    RESISTANCE_THRESHOLD,
};
pub use crate::optimizer::report::{report, CategoryResistance, ResistanceReport};

/// How to choose among several teams with the same total strength.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Whatever optimum the backend lands on.
    #[default]
    Solver,
    /// Prefer candidates listed earlier in the catalog.
    LowestIds,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerOptions {
    #[serde(default)]
    pub tie_break: TieBreak,
}

/// Builds and solves one team program per call. Holds no per-solve state.
#[derive(Debug, Clone, Default)]
pub struct TeamOptimizer<B = MicroLpBackend> {
    backend: B,
    options: OptimizerOptions,
}

impl TeamOptimizer<MicroLpBackend> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: SolverBackend> TeamOptimizer<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            options: OptimizerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OptimizerOptions) -> Self {
        self.options = options;
        self
    }

    /// Validates the request, then solves it exactly.
    ///
    /// `Err` means the request itself is wrong and nothing was solved. A request that is
    /// fine but admits no team comes back as `Ok(Solution::Failure(Failure::Infeasible))`.
    /// With [TieBreak::LowestIds] a second solve picks, among the teams of maximal
    /// strength, the one whose members sit earliest in the catalog.
    pub fn solve(&self, problem: &ProblemSpec) -> Result<Solution, InvalidRequest> {
        problem.validate()?;

        let started = Instant::now();
        tracing::info!(
            candidates = problem.candidates.len(),
            categories = problem.categories.len(),
            team_size = problem.team_size,
            forced_in = problem.force_include.len(),
            forced_out = problem.force_exclude.len(),
            backend = self.backend.name(),
            "solving team program"
        );

        let formulation = formulate(problem);
        let mut solution = self.run(problem, &formulation);

        let best_strength = match (self.options.tie_break, &solution) {
            (TieBreak::LowestIds, Solution::Team(team)) => Some(team.total_strength),
            _ => None,
        };
        if let Some(best_strength) = best_strength {
            let pass = lowest_ids_pass(&formulation, problem, best_strength);
            match self.run(problem, &pass) {
                Solution::Team(preferred) => solution = Solution::Team(preferred),
                Solution::Failure(failure) => tracing::warn!(
                    failure = failure.as_str(),
                    "tie-break pass failed; keeping the first optimal team"
                ),
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &solution {
            Solution::Team(team) => tracing::info!(
                total_strength = team.total_strength,
                members = ?team.names(),
                elapsed_ms,
                "optimal team found"
            ),
            Solution::Failure(failure) => tracing::info!(
                failure = failure.as_str(),
                elapsed_ms,
                "team program has no solution"
            ),
        }
        Ok(solution)
    }

    /// One backend call, mapped back to candidates.
    fn run(&self, problem: &ProblemSpec, formulation: &TeamFormulation) -> Solution {
        let outcome = self.backend.solve(&formulation.program);
        match (outcome.status, outcome.assignment) {
            (SolveStatus::Optimal, Some(assignment)) => {
                let members: Vec<Candidate> = problem
                    .candidates
                    .iter()
                    .zip(&formulation.select)
                    .filter(|(_, var)| assignment.is_set(**var))
                    .map(|(candidate, _)| candidate.clone())
                    .collect();
                if members.len() != problem.team_size {
                    tracing::error!(
                        selected = members.len(),
                        team_size = problem.team_size,
                        "solver assignment does not match the team size"
                    );
                    Solution::Failure(Failure::SolverError)
                } else {
                    Solution::Team(Team::new(members))
                }
            }
            (SolveStatus::Optimal, None) => {
                tracing::error!("solver reported optimal without an assignment");
                Solution::Failure(Failure::SolverError)
            }
            (SolveStatus::Infeasible, _) => {
                tracing::warn!(program = formulation.program.name(), "no team satisfies the constraints");
                Solution::Failure(Failure::Infeasible)
            }
            (SolveStatus::Unbounded, _) => {
                tracing::error!("solver reported an unbounded team program; the formulation is broken");
                Solution::Failure(Failure::Unbounded)
            }
            (status @ (SolveStatus::NotSolved | SolveStatus::Undefined), _) => {
                tracing::error!(
                    status = %status,
                    detail = outcome.detail.as_deref().unwrap_or(""),
                    "solver did not produce a result"
                );
                Solution::Failure(Failure::SolverError)
            }
        }
    }
}

/// Solves with the default backend and options.
pub fn solve(
    candidates: Vec<Candidate>,
    categories: Vec<DamageType>,
    team_size: usize,
    force_include: BTreeSet<usize>,
    force_exclude: BTreeSet<usize>,
) -> Result<Solution, InvalidRequest> {
    let problem = ProblemSpec {
        candidates,
        categories,
        team_size,
        force_include,
        force_exclude,
    };
    TeamOptimizer::new().solve(&problem)
}
