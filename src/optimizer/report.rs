//! Per-category best defender of a solved team. Presentation only; never used by the solve.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::DamageType;
use crate::optimizer::problem::Team;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResistance {
    pub min_multiplier: f64,
    pub defender_id: usize,
    pub defender_name: String,
}

pub type ResistanceReport = BTreeMap<DamageType, CategoryResistance>;

/// Lowest multiplier per category and the member that has it. Ties go to the member
/// listed first (catalog order). An empty team yields an empty report.
pub fn report(team: &Team, categories: &[DamageType]) -> ResistanceReport {
    let mut resistances = ResistanceReport::new();
    for &category in categories {
        let mut best: Option<(f64, usize, &str)> = None;
        for member in &team.members {
            let value = member.multiplier(category);
            if best.map_or(true, |(lowest, _, _)| value < lowest) {
                best = Some((value, member.id, member.name.as_str()));
            }
        }
        if let Some((min_multiplier, defender_id, defender_name)) = best {
            resistances.insert(
                category,
                CategoryResistance {
                    min_multiplier,
                    defender_id,
                    defender_name: defender_name.to_string(),
                },
            );
        }
    }
    resistances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Multipliers;
    use crate::optimizer::problem::Candidate;

    fn member(id: usize, pairs: &[(DamageType, f64)]) -> Candidate {
        Candidate {
            id,
            name: format!("mon{id}"),
            strength: 100.0,
            damage_multipliers: Multipliers::from_pairs(pairs),
            is_starter: false,
            is_fossil: false,
        }
    }

    #[test]
    fn picks_lowest_multiplier_per_category() {
        let team = Team::new(vec![
            member(3, &[(DamageType::Fire, 0.5), (DamageType::Water, 2.0)]),
            member(7, &[(DamageType::Fire, 0.25), (DamageType::Water, 0.0)]),
        ]);
        let report = report(&team, &[DamageType::Fire, DamageType::Water]);

        assert_eq!(report[&DamageType::Fire].min_multiplier, 0.25);
        assert_eq!(report[&DamageType::Fire].defender_id, 7);
        assert_eq!(report[&DamageType::Water].min_multiplier, 0.0);
        assert_eq!(report[&DamageType::Water].defender_name, "mon7");
    }

    #[test]
    fn ties_go_to_first_member() {
        let team = Team::new(vec![
            member(9, &[(DamageType::Ice, 0.5)]),
            member(2, &[(DamageType::Ice, 0.5)]),
        ]);
        let report = report(&team, &[DamageType::Ice]);
        assert_eq!(report[&DamageType::Ice].defender_id, 9);
    }

    #[test]
    fn only_requested_categories_are_reported() {
        let team = Team::new(vec![member(1, &[])]);
        let report = report(&team, &[DamageType::Rock]);
        assert_eq!(report.len(), 1);
        assert_eq!(report[&DamageType::Rock].min_multiplier, 1.0);
        assert!(super::report(&Team::new(Vec::new()), &[DamageType::Rock]).is_empty());
    }
}
