//! Per-tier weapon material parameters.
//!
//! The table is immutable configuration injected as a resource. Lookups that miss resolve to
//! the default kind instead of failing.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind id used when a weapon kind cannot be resolved.
pub const DEFAULT_WEAPON_KIND: &str = "diamond_dagger";

/// Immutable stats of one weapon tier.
///
/// # Fields
/// * `durability` - Uses before the weapon breaks
/// * `mining_speed` - Block breaking efficiency
/// * `melee_damage` - Damage added to melee attacks
/// * `enchantability` - Enchant capacity
/// * `repair_tag` - Tag of the items that repair this weapon
/// * `ranged_damage` - Base damage dealt by a thrown hit
/// * `ranged_velocity` - Launch speed in blocks per tick
///
/// # Example
/// ```
/// use bevy_thrown_weapons::materials::MaterialParameters;
///
/// let flint = MaterialParameters {
///     durability: 80,
///     mining_speed: 2.0,
///     melee_damage: 2.5,
///     enchantability: 12,
///     repair_tag: "repairs_flint_dagger".to_string(),
///     ranged_damage: 5.5,
///     ranged_velocity: 1.7,
/// };
/// assert!(flint.ranged_velocity > 0.0);
/// ```
#[derive(Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct MaterialParameters {
    pub durability: u32,
    pub mining_speed: f32,
    pub melee_damage: f32,
    pub enchantability: u32,
    pub repair_tag: String,
    pub ranged_damage: f32,
    pub ranged_velocity: f32,
}

/// Registered weapon tiers keyed by weapon kind id.
///
/// Insertion order is kept so iteration is stable.
#[derive(Resource, Clone, Debug)]
pub struct MaterialTable {
    entries: Vec<(String, MaterialParameters)>,
    default_kind: String,
    fallback: MaterialParameters,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl MaterialTable {
    /// Creates an empty table whose fallback row is `fallback`, registered as `default_kind`.
    pub fn new(default_kind: impl Into<String>, fallback: MaterialParameters) -> Self {
        let default_kind = default_kind.into();
        Self {
            entries: vec![(default_kind.clone(), fallback.clone())],
            default_kind,
            fallback,
        }
    }

    /// The five dagger tiers.
    pub fn with_defaults() -> Self {
        let diamond = MaterialParameters {
            durability: 250,
            mining_speed: 2.0,
            melee_damage: 4.0,
            enchantability: 10,
            repair_tag: "repairs_diamond_dagger".to_string(),
            ranged_damage: 8.0,
            ranged_velocity: 2.0,
        };

        Self::new(DEFAULT_WEAPON_KIND, diamond)
            .with_material(
                "wooden_dagger",
                MaterialParameters {
                    durability: 30,
                    mining_speed: 2.0,
                    melee_damage: 1.0,
                    enchantability: 15,
                    repair_tag: "repairs_wooden_dagger".to_string(),
                    ranged_damage: 3.0,
                    ranged_velocity: 1.4,
                },
            )
            .with_material(
                "stone_dagger",
                MaterialParameters {
                    durability: 50,
                    mining_speed: 2.0,
                    melee_damage: 2.0,
                    enchantability: 12,
                    repair_tag: "repairs_stone_dagger".to_string(),
                    ranged_damage: 5.0,
                    ranged_velocity: 1.6,
                },
            )
            .with_material(
                "iron_dagger",
                MaterialParameters {
                    durability: 100,
                    mining_speed: 2.0,
                    melee_damage: 3.0,
                    enchantability: 11,
                    repair_tag: "repairs_iron_dagger".to_string(),
                    ranged_damage: 7.0,
                    ranged_velocity: 1.8,
                },
            )
            .with_material(
                "golden_dagger",
                MaterialParameters {
                    durability: 20,
                    mining_speed: 2.0,
                    melee_damage: 1.0,
                    enchantability: 25,
                    repair_tag: "repairs_golden_dagger".to_string(),
                    ranged_damage: 3.0,
                    ranged_velocity: 1.6,
                },
            )
    }

    /// Builder pattern: register or replace a material row.
    pub fn with_material(mut self, kind: impl Into<String>, params: MaterialParameters) -> Self {
        self.insert(kind, params);
        self
    }

    /// Registers or replaces a material row.
    pub fn insert(&mut self, kind: impl Into<String>, params: MaterialParameters) {
        let kind = kind.into();
        if kind == self.default_kind {
            self.fallback = params.clone();
        }
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, existing)) => *existing = params,
            None => self.entries.push((kind, params)),
        }
    }

    /// Exact lookup; `None` when the kind is not registered.
    pub fn lookup(&self, kind: &str) -> Option<&MaterialParameters> {
        self.entries
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, params)| params)
    }

    /// Lookup that never fails: unknown kinds resolve to the default row.
    pub fn resolve(&self, kind: &str) -> &MaterialParameters {
        self.lookup(kind).unwrap_or(&self.fallback)
    }

    /// Kind id of a representative item for `kind`, falling back to the default kind.
    pub fn representative_kind<'a>(&'a self, kind: &'a str) -> &'a str {
        if self.lookup(kind).is_some() {
            kind
        } else {
            &self.default_kind
        }
    }

    /// Kind id used for unresolved lookups.
    pub fn default_kind(&self) -> &str {
        &self.default_kind
    }

    /// Registered kind ids in insertion order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_has_all_tiers() {
        let table = MaterialTable::with_defaults();
        let kinds: Vec<_> = table.kinds().collect();
        assert_eq!(
            kinds,
            vec![
                "diamond_dagger",
                "wooden_dagger",
                "stone_dagger",
                "iron_dagger",
                "golden_dagger"
            ]
        );
        assert_eq!(table.resolve("iron_dagger").ranged_velocity, 1.8);
        assert_eq!(table.resolve("wooden_dagger").ranged_damage, 3.0);
    }

    #[test]
    fn test_unknown_kind_falls_back_to_default() {
        let table = MaterialTable::with_defaults();
        assert!(table.lookup("obsidian_dagger").is_none());
        assert_eq!(table.resolve("obsidian_dagger"), table.resolve(DEFAULT_WEAPON_KIND));
        assert_eq!(table.representative_kind("obsidian_dagger"), DEFAULT_WEAPON_KIND);
        assert_eq!(table.representative_kind("stone_dagger"), "stone_dagger");
    }

    #[test]
    fn test_replacing_default_row_updates_fallback() {
        let mut table = MaterialTable::with_defaults();
        let mut params = table.resolve(DEFAULT_WEAPON_KIND).clone();
        params.ranged_velocity = 3.0;
        table.insert(DEFAULT_WEAPON_KIND, params);
        assert_eq!(table.resolve("unknown").ranged_velocity, 3.0);
        assert_eq!(table.kinds().count(), 5);
    }
}
