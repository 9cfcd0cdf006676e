//! Team-size sweep: the same request solved for several team sizes.
//! Every size gets its own program, so the solves run in parallel without sharing state.

use std::ops::RangeInclusive;

use rayon::prelude::*;
use rayon::ThreadPoolBuildError;
use serde::Serialize;

use crate::optimizer::backend::SolverBackend;
use crate::optimizer::problem::{InvalidRequest, ProblemSpec, Solution};
use crate::optimizer::TeamOptimizer;
use crate::parallel::WorkerPool;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub team_size: usize,
    pub outcome: Result<Solution, InvalidRequest>,
}

impl SweepPoint {
    /// Total strength when a team was found.
    pub fn total_strength(&self) -> Option<f64> {
        match &self.outcome {
            Ok(Solution::Team(team)) => Some(team.total_strength),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match &self.outcome {
            Ok(Solution::Team(_)) => "optimal",
            Ok(Solution::Failure(failure)) => failure.as_str(),
            Err(_) => "invalid_request",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepRow {
    pub team_size: usize,
    pub status: &'static str,
    pub total_strength: Option<f64>,
    pub members: Vec<String>,
}

impl From<&SweepPoint> for SweepRow {
    fn from(point: &SweepPoint) -> Self {
        let members = match &point.outcome {
            Ok(Solution::Team(team)) => team.members.iter().map(|m| m.name.clone()).collect(),
            _ => Vec::new(),
        };
        Self {
            team_size: point.team_size,
            status: point.status(),
            total_strength: point.total_strength(),
            members,
        }
    }
}

/// Solves `base` once per size in `sizes`. Points come back in ascending size order.
pub fn sweep<B: SolverBackend>(
    optimizer: &TeamOptimizer<B>,
    base: &ProblemSpec,
    sizes: RangeInclusive<usize>,
    pool: &WorkerPool,
) -> Result<Vec<SweepPoint>, ThreadPoolBuildError> {
    let sizes: Vec<usize> = sizes.collect();
    tracing::info!(
        sizes = sizes.len(),
        workers = pool.workers,
        "sweeping team sizes"
    );
    pool.install(|| {
        sizes
            .par_iter()
            .map(|&team_size| {
                let problem = ProblemSpec {
                    team_size,
                    ..base.clone()
                };
                SweepPoint {
                    team_size,
                    outcome: optimizer.solve(&problem),
                }
            })
            .collect()
    })
}
