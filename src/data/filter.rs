//! Catalog filtering: turns the raw dataset plus user options into optimizer candidates.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::catalog::{Catalog, CatalogEntry};
use crate::data::damage_type::DamageType;
use crate::data::special::SpecialClasses;
use crate::optimizer::problem::{Candidate, InvalidRequest, ProblemSpec};

/// What to do with fossil creatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FossilPolicy {
    /// Keep them without a cap.
    All,
    /// Keep them, at most one on the team.
    #[default]
    One,
    /// Drop them from the catalog.
    None,
}

impl FromStr for FossilPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "one" => Ok(Self::One),
            "none" => Ok(Self::None),
            other => Err(format!("unknown fossil policy '{other}' (expected all, one or none)")),
        }
    }
}

impl fmt::Display for FossilPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::One => "one",
            Self::None => "none",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Drop everything above this generation. Also picks the damage types in play.
    pub generation_cap: Option<u8>,
    /// Keep only these generations; empty keeps all.
    pub generations: Vec<u8>,
    pub include_legendaries: bool,
    pub include_pseudo_legendaries: bool,
    /// When set, starters are not capped.
    pub allow_multiple_starters: bool,
    pub fossils: FossilPolicy,
}

impl FilterOptions {
    fn keeps_generation(&self, generation: u8) -> bool {
        self.generation_cap.map_or(true, |cap| generation <= cap)
            && (self.generations.is_empty() || self.generations.contains(&generation))
    }

    /// Generation whose type chart applies: the cap, else the newest selected generation,
    /// else `fallback` (the newest generation in the catalog).
    pub fn effective_generation(&self, fallback: u8) -> u8 {
        let newest_selected = self.generations.iter().copied().max();
        match (self.generation_cap, newest_selected) {
            (Some(cap), Some(newest)) => cap.min(newest),
            (Some(cap), None) => cap,
            (None, Some(newest)) => newest,
            (None, None) => fallback,
        }
    }
}

/// Applies [FilterOptions] with an explicit set of [SpecialClasses].
#[derive(Debug, Clone)]
pub struct CatalogFilter {
    classes: SpecialClasses,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self::new(SpecialClasses::standard())
    }
}

impl CatalogFilter {
    pub fn new(classes: SpecialClasses) -> Self {
        Self { classes }
    }

    pub fn apply(&self, catalog: &Catalog, options: &FilterOptions) -> FilteredCatalog {
        let mut candidates = Vec::new();
        let mut dropped = 0usize;

        for entry in &catalog.entries {
            let is_starter = entry.is_starter || self.classes.is_starter(&entry.name);
            let is_fossil = entry.is_fossil || self.classes.is_fossil(&entry.name);
            let is_pseudo =
                entry.is_pseudo_legendary || self.classes.is_pseudo_legendary(&entry.name);

            let keep = options.keeps_generation(entry.generation)
                && (options.include_legendaries || !entry.is_legendary)
                && (options.include_pseudo_legendaries || !is_pseudo)
                && !(is_fossil && options.fossils == FossilPolicy::None);
            if !keep {
                dropped += 1;
                continue;
            }

            candidates.push(Candidate {
                id: entry.id,
                name: entry.name.clone(),
                strength: entry.base_total,
                damage_multipliers: entry.multipliers,
                is_starter: is_starter && !options.allow_multiple_starters,
                is_fossil: is_fossil && options.fossils == FossilPolicy::One,
            });
        }

        let generation = options.effective_generation(catalog.max_generation().unwrap_or(1));
        let categories = DamageType::for_generation(generation);
        tracing::debug!(
            kept = candidates.len(),
            dropped,
            generation,
            categories = categories.len(),
            "catalog filtered"
        );

        FilteredCatalog {
            candidates,
            categories,
        }
    }
}

/// Candidates that survived filtering plus the damage types that apply to them.
#[derive(Debug, Clone, Default)]
pub struct FilteredCatalog {
    pub candidates: Vec<Candidate>,
    pub categories: Vec<DamageType>,
}

impl FilteredCatalog {
    pub fn find(&self, name: &str) -> Option<&Candidate> {
        let wanted = name.trim().to_lowercase();
        self.candidates.iter().find(|candidate| candidate.name == wanted)
    }

    /// Maps names to candidate ids. The first name missing after filtering is an error.
    pub fn resolve_names<S: AsRef<str>>(&self, names: &[S]) -> Result<BTreeSet<usize>, InvalidRequest> {
        names
            .iter()
            .map(|name| {
                self.find(name.as_ref())
                    .map(|candidate| candidate.id)
                    .ok_or_else(|| InvalidRequest::UnknownName(name.as_ref().to_string()))
            })
            .collect()
    }

    /// Builds the optimizer request; `include`/`exclude` are creature names.
    pub fn problem<S: AsRef<str>>(
        &self,
        team_size: usize,
        include: &[S],
        exclude: &[S],
    ) -> Result<ProblemSpec, InvalidRequest> {
        if include.len() > team_size {
            return Err(InvalidRequest::TooManyForced {
                forced: include.len(),
                team_size,
            });
        }
        let force_include = self.resolve_names(include)?;
        let force_exclude = self.resolve_names(exclude)?;
        Ok(ProblemSpec {
            candidates: self.candidates.clone(),
            categories: self.categories.clone(),
            team_size,
            force_include,
            force_exclude,
        })
    }
}

/// Lookup helper for presenting results: the full dataset row of a candidate.
pub fn entry_for<'a>(catalog: &'a Catalog, candidate: &Candidate) -> Option<&'a CatalogEntry> {
    catalog.entries.get(candidate.id).filter(|entry| entry.id == candidate.id)
}
