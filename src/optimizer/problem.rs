//! Request and result types of the team optimizer.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::data::{DamageType, Multipliers};

/// Multipliers at or below this value count as resistant.
pub const RESISTANCE_THRESHOLD: f64 = 0.5;
/// Known upper bound of any damage multiplier (double weakness).
pub const MAX_MULTIPLIER: f64 = 4.0;

/// One selectable creature as the optimizer sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: usize,
    pub name: String,
    pub strength: f64,
    pub damage_multipliers: Multipliers,
    pub is_starter: bool,
    pub is_fossil: bool,
}

impl Candidate {
    pub fn multiplier(&self, category: DamageType) -> f64 {
        self.damage_multipliers.get(category)
    }

    pub fn resists(&self, category: DamageType) -> bool {
        self.multiplier(category) <= RESISTANCE_THRESHOLD
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRequest {
    #[error("team size must be at least 1")]
    EmptyTeam,
    #[error("team size {team_size} exceeds the {available} available candidates")]
    TeamLargerThanCatalog { team_size: usize, available: usize },
    #[error("{forced} forced members do not fit in a team of {team_size}")]
    TooManyForced { forced: usize, team_size: usize },
    #[error("candidate {0} is both forced into and out of the team")]
    ForcedOverlap(usize),
    #[error("forced candidate {0} is not in the filtered catalog")]
    UnknownCandidate(usize),
    #[error("'{0}' is not in the filtered catalog")]
    UnknownName(String),
    #[error("candidate id {0} appears more than once")]
    DuplicateCandidate(usize),
    #[error("candidate {id} has invalid strength {strength}")]
    InvalidStrength { id: usize, strength: f64 },
    #[error("candidate {id} has {category} multiplier {value}, expected a value in [0, 4]")]
    MultiplierOutOfRange {
        id: usize,
        category: DamageType,
        value: f64,
    },
}

/// A complete optimization request.
#[derive(Debug, Clone, Default)]
pub struct ProblemSpec {
    pub candidates: Vec<Candidate>,
    pub categories: Vec<DamageType>,
    pub team_size: usize,
    pub force_include: BTreeSet<usize>,
    pub force_exclude: BTreeSet<usize>,
}

impl ProblemSpec {
    pub fn new(candidates: Vec<Candidate>, categories: Vec<DamageType>, team_size: usize) -> Self {
        Self {
            candidates,
            categories,
            team_size,
            force_include: BTreeSet::new(),
            force_exclude: BTreeSet::new(),
        }
    }

    pub fn with_include(mut self, ids: impl IntoIterator<Item = usize>) -> Self {
        self.force_include.extend(ids);
        self
    }

    pub fn with_exclude(mut self, ids: impl IntoIterator<Item = usize>) -> Self {
        self.force_exclude.extend(ids);
        self
    }

    /// Checks everything that can be rejected without running the solver.
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        if self.team_size == 0 {
            return Err(InvalidRequest::EmptyTeam);
        }
        if self.team_size > self.candidates.len() {
            return Err(InvalidRequest::TeamLargerThanCatalog {
                team_size: self.team_size,
                available: self.candidates.len(),
            });
        }
        if self.force_include.len() > self.team_size {
            return Err(InvalidRequest::TooManyForced {
                forced: self.force_include.len(),
                team_size: self.team_size,
            });
        }
        if let Some(&id) = self.force_include.intersection(&self.force_exclude).next() {
            return Err(InvalidRequest::ForcedOverlap(id));
        }

        let mut seen = HashSet::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            if !seen.insert(candidate.id) {
                return Err(InvalidRequest::DuplicateCandidate(candidate.id));
            }
            if !candidate.strength.is_finite() || candidate.strength < 0.0 {
                return Err(InvalidRequest::InvalidStrength {
                    id: candidate.id,
                    strength: candidate.strength,
                });
            }
            for &category in &self.categories {
                let value = candidate.multiplier(category);
                if !(0.0..=MAX_MULTIPLIER).contains(&value) {
                    return Err(InvalidRequest::MultiplierOutOfRange {
                        id: candidate.id,
                        category,
                        value,
                    });
                }
            }
        }

        if let Some(&id) = self
            .force_include
            .iter()
            .chain(&self.force_exclude)
            .find(|id| !seen.contains(id))
        {
            return Err(InvalidRequest::UnknownCandidate(id));
        }
        Ok(())
    }
}

/// The selected roster, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub members: Vec<Candidate>,
    pub total_strength: f64,
}

impl Team {
    pub fn new(members: Vec<Candidate>) -> Self {
        let total_strength = members.iter().map(|member| member.strength).sum();
        Self {
            members,
            total_strength,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn ids(&self) -> BTreeSet<usize> {
        self.members.iter().map(|member| member.id).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|member| member.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    /// No team satisfies the constraints. Expected for many valid requests.
    Infeasible,
    /// The solver reported an unbounded objective; a modeling defect.
    Unbounded,
    /// The solver did not finish or returned an undefined status.
    SolverError,
}

impl Failure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Infeasible => "infeasible",
            Self::Unbounded => "unbounded",
            Self::SolverError => "solver_error",
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    Team(Team),
    Failure(Failure),
}

impl Solution {
    pub fn team(&self) -> Option<&Team> {
        match self {
            Self::Team(team) => Some(team),
            Self::Failure(_) => None,
        }
    }
}
