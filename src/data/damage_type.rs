//! Damage types: the coverage categories of the optimizer.
//! Each one maps to an `against_<type>` column of the catalog dataset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generation that introduced dark and steel.
const DARK_STEEL_GENERATION: u8 = 2;
/// Generation that introduced fairy.
const FAIRY_GENERATION: u8 = 6;
/// Newest generation the type chart and special-class lists cover.
pub const NEWEST_GENERATION: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Bug,
    Dark,
    Dragon,
    Electric,
    Fairy,
    Fighting,
    Fire,
    Flying,
    Ghost,
    Grass,
    Ground,
    Ice,
    Normal,
    Poison,
    Psychic,
    Rock,
    Steel,
    Water,
}

impl DamageType {
    pub const ALL: [DamageType; 18] = [
        Self::Bug,
        Self::Dark,
        Self::Dragon,
        Self::Electric,
        Self::Fairy,
        Self::Fighting,
        Self::Fire,
        Self::Flying,
        Self::Ghost,
        Self::Grass,
        Self::Ground,
        Self::Ice,
        Self::Normal,
        Self::Poison,
        Self::Psychic,
        Self::Rock,
        Self::Steel,
        Self::Water,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Dark => "dark",
            Self::Dragon => "dragon",
            Self::Electric => "electric",
            Self::Fairy => "fairy",
            Self::Fighting => "fighting",
            Self::Fire => "fire",
            Self::Flying => "flying",
            Self::Ghost => "ghost",
            Self::Grass => "grass",
            Self::Ground => "ground",
            Self::Ice => "ice",
            Self::Normal => "normal",
            Self::Poison => "poison",
            Self::Psychic => "psychic",
            Self::Rock => "rock",
            Self::Steel => "steel",
            Self::Water => "water",
        }
    }

    /// Position in [DamageType::ALL]; also the index into [Multipliers].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Generation in which the type first appeared.
    pub fn introduced_in(self) -> u8 {
        match self {
            Self::Dark | Self::Steel => DARK_STEEL_GENERATION,
            Self::Fairy => FAIRY_GENERATION,
            _ => 1,
        }
    }

    /// Types that exist in the given generation, in [DamageType::ALL] order.
    ///
    /// ```
    /// # use porygon::data::DamageType;
    /// assert_eq!(DamageType::for_generation(1).len(), 15);
    /// assert_eq!(DamageType::for_generation(5).len(), 17);
    /// assert_eq!(DamageType::for_generation(9).len(), 18);
    /// ```
    pub fn for_generation(generation: u8) -> Vec<DamageType> {
        Self::ALL
            .into_iter()
            .filter(|damage_type| damage_type.introduced_in() <= generation)
            .collect()
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown damage type '{0}'")]
pub struct UnknownDamageType(pub String);

impl FromStr for DamageType {
    type Err = UnknownDamageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        // The dataset abbreviates fighting as "fight".
        if normalized == "fight" {
            return Ok(Self::Fighting);
        }
        Self::ALL
            .into_iter()
            .find(|damage_type| damage_type.as_str() == normalized)
            .ok_or_else(|| UnknownDamageType(s.to_string()))
    }
}

/// Damage multipliers of one creature, one slot per [DamageType].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers([f64; 18]);

impl Default for Multipliers {
    fn default() -> Self {
        Self([1.0; 18])
    }
}

impl Multipliers {
    pub fn new(values: [f64; 18]) -> Self {
        Self(values)
    }

    /// Neutral (1.0) everywhere except the given overrides.
    pub fn from_pairs(pairs: &[(DamageType, f64)]) -> Self {
        let mut multipliers = Self::default();
        for &(damage_type, value) in pairs {
            multipliers.set(damage_type, value);
        }
        multipliers
    }

    pub fn get(&self, damage_type: DamageType) -> f64 {
        self.0[damage_type.index()]
    }

    pub fn set(&mut self, damage_type: DamageType, value: f64) {
        self.0[damage_type.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (DamageType, f64)> + '_ {
        DamageType::ALL.into_iter().map(|damage_type| (damage_type, self.get(damage_type)))
    }
}
