//! Special classes of creatures that the filter caps or removes.
//! The lists are plain data handed to [crate::data::filter::CatalogFilter]; nothing reads them globally.

use std::collections::HashSet;

const FINAL_STAGE_STARTERS: &[&str] = &[
    "venusaur",
    "charizard",
    "blastoise",
    "typhlosion",
    "meganium",
    "feraligatr",
    "swampert",
    "blaziken",
    "sceptile",
    "torterra",
    "infernape",
    "empoleon",
    "serperior",
    "emboar",
    "samurott",
    "chesnaught",
    "delphox",
    "greninja",
    "decidueye",
    "incineroar",
    "primarina",
    "rillaboom",
    "cinderace",
    "inteleon",
    "meowscarada",
    "skeledirge",
    "quaquaval",
];

const PSEUDO_LEGENDARIES: &[&str] = &[
    "dragonite",
    "tyranitar",
    "salamence",
    "metagross",
    "garchomp",
    "hydreigon",
    "goodra",
    "kommo-o",
    "dragapult",
    "hisuian goodra",
    "baxcalibur",
];

const FOSSILS: &[&str] = &[
    "kabuto",
    "kabutops",
    "omanyte",
    "omastar",
    "aerodactyl",
    "anorith",
    "armaldo",
    "lileep",
    "cradily",
    "shieldon",
    "bastiodon",
    "cranidos",
    "rampardos",
    "tirtouga",
    "carracosta",
    "archen",
    "archeops",
    "tyrunt",
    "tyrantrum",
    "amaura",
    "aurorus",
];

/// Name sets (lower-case) for the special classes.
#[derive(Debug, Clone, Default)]
pub struct SpecialClasses {
    pub starters: HashSet<String>,
    pub pseudo_legendaries: HashSet<String>,
    pub fossils: HashSet<String>,
}

impl SpecialClasses {
    /// The built-in lists: final-stage starters, pseudo-legendaries and fossils through generation 9.
    pub fn standard() -> Self {
        Self {
            starters: to_set(FINAL_STAGE_STARTERS),
            pseudo_legendaries: to_set(PSEUDO_LEGENDARIES),
            fossils: to_set(FOSSILS),
        }
    }

    pub fn is_starter(&self, name: &str) -> bool {
        self.starters.contains(&name.to_lowercase())
    }

    pub fn is_pseudo_legendary(&self, name: &str) -> bool {
        self.pseudo_legendaries.contains(&name.to_lowercase())
    }

    pub fn is_fossil(&self, name: &str) -> bool {
        self.fossils.contains(&name.to_lowercase())
    }
}

fn to_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|name| name.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::SpecialClasses;

    #[test]
    fn standard_lists_match_case_insensitively() {
        let classes = SpecialClasses::standard();
        assert!(classes.is_starter("Charizard"));
        assert!(classes.is_pseudo_legendary("Hisuian Goodra"));
        assert!(classes.is_fossil("aerodactyl"));
        assert!(!classes.is_fossil("charizard"));
        assert_eq!(classes.starters.len(), 27);
    }
}
