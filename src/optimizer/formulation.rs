//! Binary program for the team problem.
//!
//! Variables, per candidate `i` and category `a`:
//! - `select_i`: candidate is on the team;
//! - `resistant_a_i`: candidate's multiplier for `a` is at most [RESISTANCE_THRESHOLD];
//! - `covers_a_i`: `select_i AND resistant_a_i`.
//!
//! "Some member resists `a`" is a disjunction over the team. It becomes linear through
//! the `covers` conjunction (three inequalities) and a big-M bound that only lets
//! `resistant_a_i` be 1 when the candidate really resists:
//!
//! `multiplier · select_i <= 0.5 + M · (1 - resistant_a_i)`
//!
//! Pairs that can never resist also get `resistant_a_i = 0`.
//!
//! [lowest_ids_pass] derives the second program of a lexicographic solve: strength pinned
//! at its optimum, earliest catalog positions preferred.

use crate::optimizer::model::{BinaryProgram, LinearExpr, Relation, VarId};
use crate::optimizer::problem::{ProblemSpec, MAX_MULTIPLIER, RESISTANCE_THRESHOLD};

/// Deactivation constant of the resistance bound. Must stay strictly above
/// [MAX_MULTIPLIER], the largest value `multiplier · select_i` can take.
pub const BIG_M: f64 = 100.0;

pub const PROGRAM_NAME: &str = "pokemon_team_optimization";

/// Relative slack on the strength floor of [lowest_ids_pass], absorbing solver round-off.
pub const STRENGTH_TOLERANCE: f64 = 1e-9;

/// A built program plus the handles needed to read a solution back.
#[derive(Debug, Clone)]
pub struct TeamFormulation {
    pub program: BinaryProgram,
    /// One per candidate, in input order.
    pub select: Vec<VarId>,
    /// `resistant[a][i]`, category-major.
    pub resistant: Vec<Vec<VarId>>,
    /// `covers[a][i]`, category-major.
    pub covers: Vec<Vec<VarId>>,
}

/// Builds the program for an already validated request.
pub fn formulate(problem: &ProblemSpec) -> TeamFormulation {
    let candidates = &problem.candidates;
    let mut program = BinaryProgram::new(PROGRAM_NAME);

    let select: Vec<VarId> = candidates
        .iter()
        .map(|candidate| program.add_binary(format!("select_{}", candidate.id)))
        .collect();
    let resistant: Vec<Vec<VarId>> = problem
        .categories
        .iter()
        .map(|category| {
            candidates
                .iter()
                .map(|candidate| program.add_binary(format!("resistant_{category}_{}", candidate.id)))
                .collect()
        })
        .collect();
    let covers: Vec<Vec<VarId>> = problem
        .categories
        .iter()
        .map(|category| {
            candidates
                .iter()
                .map(|candidate| program.add_binary(format!("covers_{category}_{}", candidate.id)))
                .collect()
        })
        .collect();

    let mut objective = LinearExpr::new();
    for (candidate, &var) in candidates.iter().zip(&select) {
        objective.push(var, candidate.strength);
    }
    program.maximize(objective);

    program.add_constraint(
        LinearExpr::sum(select.iter().copied()),
        Relation::Equal,
        problem.team_size as f64,
        "team_size",
    );

    let mut starters = LinearExpr::new();
    let mut fossils = LinearExpr::new();
    for (candidate, &var) in candidates.iter().zip(&select) {
        if candidate.is_starter {
            starters.push(var, 1.0);
        }
        if candidate.is_fossil {
            fossils.push(var, 1.0);
        }
    }
    // A cap over no flagged candidates is `0 <= 1`; leave it out.
    if !starters.terms.is_empty() {
        program.add_constraint(starters, Relation::LessOrEqual, 1.0, "starter_cap");
    }
    if !fossils.terms.is_empty() {
        program.add_constraint(fossils, Relation::LessOrEqual, 1.0, "fossil_cap");
    }

    for (candidate, &var) in candidates.iter().zip(&select) {
        if problem.force_include.contains(&candidate.id) {
            program.add_constraint(
                LinearExpr::new().term(var, 1.0),
                Relation::Equal,
                1.0,
                format!("include_{}", candidate.id),
            );
        }
        if problem.force_exclude.contains(&candidate.id) {
            program.add_constraint(
                LinearExpr::new().term(var, 1.0),
                Relation::Equal,
                0.0,
                format!("exclude_{}", candidate.id),
            );
        }
    }

    for (a, &category) in problem.categories.iter().enumerate() {
        program.add_constraint(
            LinearExpr::sum(covers[a].iter().copied()),
            Relation::GreaterOrEqual,
            1.0,
            format!("coverage_{category}"),
        );

        for (i, candidate) in candidates.iter().enumerate() {
            let (x, y, z) = (select[i], resistant[a][i], covers[a][i]);

            // z <= x
            program.add_constraint(
                LinearExpr::new().term(z, 1.0).term(x, -1.0),
                Relation::LessOrEqual,
                0.0,
                format!("covers_selected_{category}_{}", candidate.id),
            );
            // z <= y
            program.add_constraint(
                LinearExpr::new().term(z, 1.0).term(y, -1.0),
                Relation::LessOrEqual,
                0.0,
                format!("covers_resistant_{category}_{}", candidate.id),
            );
            // z >= x + y - 1
            program.add_constraint(
                LinearExpr::new().term(z, 1.0).term(x, -1.0).term(y, -1.0),
                Relation::GreaterOrEqual,
                -1.0,
                format!("covers_both_{category}_{}", candidate.id),
            );
            // multiplier * x + M * y <= 0.5 + M
            program.add_constraint(
                LinearExpr::new()
                    .term(x, candidate.multiplier(category))
                    .term(y, BIG_M),
                Relation::LessOrEqual,
                RESISTANCE_THRESHOLD + BIG_M,
                format!("resistance_{category}_{}", candidate.id),
            );
            // Same feasible teams as the bound above, but keeps the LP relaxation tight.
            if !candidate.resists(category) {
                program.add_constraint(
                    LinearExpr::new().term(y, 1.0),
                    Relation::Equal,
                    0.0,
                    format!("cannot_resist_{category}_{}", candidate.id),
                );
            }
        }
    }

    tracing::debug!(
        variables = program.variables().len(),
        constraints = program.constraints().len(),
        "team program built"
    );

    TeamFormulation {
        program,
        select,
        resistant,
        covers,
    }
}

/// Second program of the lowest-ids tie-break. Keeps every constraint of `base`, adds
/// `sum(strength_i * select_i) >= best_strength` and minimizes the summed catalog
/// positions of the team, so only teams as strong as the optimum compete.
pub fn lowest_ids_pass(
    base: &TeamFormulation,
    problem: &ProblemSpec,
    best_strength: f64,
) -> TeamFormulation {
    let mut formulation = base.clone();
    let mut strength = LinearExpr::new();
    let mut positions = LinearExpr::new();
    for (position, (candidate, &var)) in problem.candidates.iter().zip(&base.select).enumerate() {
        strength.push(var, candidate.strength);
        positions.push(var, -(position as f64));
    }
    let floor = best_strength - STRENGTH_TOLERANCE * best_strength.abs().max(1.0);
    formulation
        .program
        .add_constraint(strength, Relation::GreaterOrEqual, floor, "strength_floor");
    formulation.program.maximize(positions);
    formulation
}

const _: () = assert!(BIG_M > MAX_MULTIPLIER);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DamageType, Multipliers};
    use crate::optimizer::model::Assignment;
    use crate::optimizer::problem::Candidate;

    fn candidate(id: usize, strength: f64, fire: f64) -> Candidate {
        Candidate {
            id,
            name: format!("mon{id}"),
            strength,
            damage_multipliers: Multipliers::from_pairs(&[(DamageType::Fire, fire)]),
            is_starter: id == 0,
            is_fossil: false,
        }
    }

    fn problem() -> ProblemSpec {
        ProblemSpec::new(
            vec![candidate(0, 500.0, 0.5), candidate(1, 400.0, 2.0)],
            vec![DamageType::Fire, DamageType::Water],
            1,
        )
        .with_include([0])
    }

    #[test]
    fn variable_and_constraint_counts() {
        let formulation = formulate(&problem());
        // 2 select + 2*2 resistant + 2*2 covers
        assert_eq!(formulation.program.variables().len(), 10);
        // size, starter cap, 1 include, per category (1 coverage + 4 per candidate),
        // plus one pin for each of the 3 non-resisting (category, candidate) pairs
        assert_eq!(formulation.program.constraints().len(), 3 + 2 * (1 + 4 * 2) + 3);
        let labels: Vec<_> = formulation
            .program
            .constraints()
            .iter()
            .filter_map(|c| c.label.as_deref())
            .collect();
        assert!(labels.contains(&"starter_cap"));
        assert!(!labels.contains(&"fossil_cap"));
        assert_eq!(formulation.program.variable_name(formulation.covers[1][0]), "covers_water_0");
        assert!(labels.contains(&"cannot_resist_fire_1"));
        assert!(!labels.contains(&"cannot_resist_fire_0"));
    }

    #[test]
    fn big_m_exceeds_largest_multiplier() {
        assert!(BIG_M > MAX_MULTIPLIER);
    }

    #[test]
    fn resistance_bound_blocks_false_claims() {
        let problem = problem();
        let formulation = formulate(&problem);
        let fire = 0;
        let mut values = vec![0.0; formulation.program.variables().len()];
        // Select the weak candidate and claim it resists fire.
        values[formulation.select[1].index()] = 1.0;
        values[formulation.resistant[fire][1].index()] = 1.0;
        values[formulation.covers[fire][1].index()] = 1.0;
        let violated = formulation
            .program
            .violated_constraints(&Assignment::new(values), 1e-9);
        assert!(violated.contains(&"resistance_fire_1"));
    }

    #[test]
    fn resistance_bound_is_slack_when_indicator_is_zero() {
        let problem = problem();
        let formulation = formulate(&problem);
        let mut values = vec![0.0; formulation.program.variables().len()];
        values[formulation.select[1].index()] = 1.0;
        let violated = formulation
            .program
            .violated_constraints(&Assignment::new(values), 1e-9);
        assert!(!violated.iter().any(|label| label.starts_with("resistance_")));
    }

    #[test]
    fn lowest_ids_pass_pins_strength_and_prefers_early_positions() {
        let problem = problem();
        let base = formulate(&problem);
        let pass = lowest_ids_pass(&base, &problem, 500.0);

        assert_eq!(pass.program.constraints().len(), base.program.constraints().len() + 1);
        let floor = pass
            .program
            .constraints()
            .iter()
            .find(|c| c.label.as_deref() == Some("strength_floor"))
            .expect("strength floor");
        assert!(floor.rhs < 500.0 && floor.rhs > 499.999);

        let terms = &pass.program.objective().terms;
        assert_eq!(terms, &vec![(pass.select[1], -1.0)], "position 0 carries no penalty");

        // Selecting only the weaker candidate now violates the floor.
        let mut values = vec![0.0; pass.program.variables().len()];
        values[pass.select[1].index()] = 1.0;
        let violated = pass.program.violated_constraints(&Assignment::new(values), 1e-9);
        assert!(violated.contains(&"strength_floor"));
    }
}
