//! Modifier lookups: the narrow query interface the simulation uses to read dynamic
//! multipliers attached to a weapon instance.
//!
//! Implement [`ModifierLookup`] to plug in a game's own enchantment rules. The
//! [`StandardModifiers`] implementation reads levels straight off the weapon instance.

use bevy::prelude::*;

use crate::components::{ModifierKind, WeaponInstance};
use crate::types::{AgentCapabilities, WorldContext};

/// Highest return affinity level a projectile can carry.
pub const MAX_RETURN_AFFINITY: u32 = 127;

/// What the simulation knows about a struck agent when asking modifier questions.
#[derive(Clone, Copy, Debug)]
pub struct TargetProfile {
    pub entity: Entity,
    pub position: Vec3,
    pub capabilities: AgentCapabilities,
    pub knockback_resistance: f32,
    pub fire_immune: bool,
}

/// Attribution of a thrown hit.
///
/// # Fields
/// * `projectile` - The projectile entity
/// * `attacker` - The owner when resolvable, otherwise the projectile itself
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageSource {
    pub projectile: Entity,
    pub attacker: Entity,
}

impl DamageSource {
    pub fn new(projectile: Entity, owner: Option<Entity>) -> Self {
        Self {
            projectile,
            attacker: owner.unwrap_or(projectile),
        }
    }
}

/// Response of an on-hit side-effect hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HookResponse {
    #[default]
    Continue,
    /// The hook consumed the projectile; remove it.
    RemoveProjectile,
}

/// Resolves dynamic multipliers for a specific weapon instance.
///
/// Lookups are pure queries; the simulation never mutates the lookup.
pub trait ModifierLookup: Send + Sync + 'static {
    /// Throw-speed affinity level, 0 when absent.
    fn throw_speed_level(&self, weapon: &WeaponInstance) -> u32;

    /// Return affinity level in `0..=127`, 0 when absent.
    fn return_affinity_level(&self, weapon: &WeaponInstance, ctx: WorldContext) -> u32;

    /// Knockback multiplier for a hit, 0 when absent.
    fn knockback_modifier(
        &self,
        weapon: &WeaponInstance,
        target: &TargetProfile,
        source: &DamageSource,
    ) -> f32;

    /// Adjusts `base_damage` for a hit.
    fn modify_damage(
        &self,
        weapon: &WeaponInstance,
        target: &TargetProfile,
        source: &DamageSource,
        base_damage: f32,
    ) -> f32;

    /// Called after a target took damage from the projectile.
    fn on_target_damaged(
        &self,
        _weapon: &WeaponInstance,
        _target: &TargetProfile,
        _source: &DamageSource,
    ) -> HookResponse {
        HookResponse::Continue
    }

    /// Called after the projectile struck a block at `point`.
    fn on_block_hit(
        &self,
        _weapon: &WeaponInstance,
        _owner: Option<Entity>,
        _block: Entity,
        _point: Vec3,
    ) -> HookResponse {
        HookResponse::Continue
    }
}

/// Reads modifier levels directly from [`WeaponInstance::modifiers`].
///
/// # Fields
/// * `sharpness_per_level` - Bonus damage per sharpness level
/// * `sharpness_base` - Flat bonus when sharpness is present
/// * `knockback_per_level` - Knockback multiplier per knockback level
#[derive(Clone, Debug)]
pub struct StandardModifiers {
    pub sharpness_per_level: f32,
    pub sharpness_base: f32,
    pub knockback_per_level: f32,
}

impl Default for StandardModifiers {
    fn default() -> Self {
        Self {
            sharpness_per_level: 0.5,
            sharpness_base: 0.5,
            knockback_per_level: 1.0,
        }
    }
}

impl ModifierLookup for StandardModifiers {
    fn throw_speed_level(&self, weapon: &WeaponInstance) -> u32 {
        weapon.level(ModifierKind::ThrowSpeed)
    }

    fn return_affinity_level(&self, weapon: &WeaponInstance, ctx: WorldContext) -> u32 {
        // Only the authoritative side can evaluate world-dependent modifiers.
        if !ctx.authoritative {
            return 0;
        }
        weapon.level(ModifierKind::Return).min(MAX_RETURN_AFFINITY)
    }

    fn knockback_modifier(
        &self,
        weapon: &WeaponInstance,
        _target: &TargetProfile,
        _source: &DamageSource,
    ) -> f32 {
        weapon.level(ModifierKind::Knockback) as f32 * self.knockback_per_level
    }

    fn modify_damage(
        &self,
        weapon: &WeaponInstance,
        _target: &TargetProfile,
        _source: &DamageSource,
        base_damage: f32,
    ) -> f32 {
        match weapon.level(ModifierKind::Sharpness) {
            0 => base_damage,
            level => base_damage + self.sharpness_base + self.sharpness_per_level * level as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetProfile {
        TargetProfile {
            entity: Entity::PLACEHOLDER,
            position: Vec3::ZERO,
            capabilities: AgentCapabilities::creature(),
            knockback_resistance: 0.0,
            fire_immune: false,
        }
    }

    #[test]
    fn test_return_affinity_only_on_authoritative_side() {
        let lookup = StandardModifiers::default();
        let weapon = WeaponInstance::new("iron_dagger").with_modifier(ModifierKind::Return, 3);
        assert_eq!(lookup.return_affinity_level(&weapon, WorldContext::AUTHORITATIVE), 3);
        assert_eq!(lookup.return_affinity_level(&weapon, WorldContext::OBSERVER), 0);

        let absurd = weapon.with_modifier(ModifierKind::Return, 1000);
        assert_eq!(
            lookup.return_affinity_level(&absurd, WorldContext::AUTHORITATIVE),
            MAX_RETURN_AFFINITY
        );
    }

    #[test]
    fn test_damage_and_knockback_modifiers() {
        let lookup = StandardModifiers::default();
        let source = DamageSource::new(Entity::PLACEHOLDER, None);
        let plain = WeaponInstance::new("iron_dagger");
        assert_eq!(lookup.modify_damage(&plain, &target(), &source, 7.0), 7.0);
        assert_eq!(lookup.knockback_modifier(&plain, &target(), &source), 0.0);

        let sharp = plain
            .with_modifier(ModifierKind::Sharpness, 2)
            .with_modifier(ModifierKind::Knockback, 2);
        assert_eq!(lookup.modify_damage(&sharp, &target(), &source, 7.0), 8.5);
        assert_eq!(lookup.knockback_modifier(&sharp, &target(), &source), 2.0);
    }

    #[test]
    fn test_damage_source_falls_back_to_projectile() {
        let source = DamageSource::new(Entity::PLACEHOLDER, None);
        assert_eq!(source.attacker, source.projectile);
    }
}
