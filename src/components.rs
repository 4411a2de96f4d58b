//! Core components for the thrown-weapon system.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{AgentCapabilities, FlightState, Orientation, PickupPermission};

/// Modifier kinds a weapon instance may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Multiplies launch speed
    ThrowSpeed,
    /// Return affinity (loyalty); activates homing
    Return,
    /// Knockback strength on hit
    Knockback,
    /// Bonus thrown damage
    Sharpness,
    /// Ignites the weapon when thrown
    Flame,
}

/// One modifier attached to a weapon instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub struct ModifierEntry {
    pub kind: ModifierKind,
    pub level: u32,
}

/// A single weapon item: its kind, wear and attached modifiers.
///
/// # Example
/// ```
/// use bevy_thrown_weapons::components::{ModifierKind, WeaponInstance};
///
/// let dagger = WeaponInstance::new("iron_dagger")
///     .with_modifier(ModifierKind::Return, 3)
///     .with_modifier(ModifierKind::ThrowSpeed, 2);
/// assert_eq!(dagger.level(ModifierKind::Return), 3);
/// assert!(dagger.has_modifiers());
/// ```
#[derive(Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct WeaponInstance {
    /// Weapon kind id (material table key)
    pub kind: String,
    /// Durability already consumed
    pub damage_taken: u32,
    /// Attached modifiers
    pub modifiers: Vec<ModifierEntry>,
}

impl WeaponInstance {
    /// Creates an unworn, unmodified weapon of `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            damage_taken: 0,
            modifiers: Vec::new(),
        }
    }

    /// Builder pattern: attach or replace a modifier.
    pub fn with_modifier(mut self, kind: ModifierKind, level: u32) -> Self {
        match self.modifiers.iter_mut().find(|m| m.kind == kind) {
            Some(entry) => entry.level = level,
            None => self.modifiers.push(ModifierEntry { kind, level }),
        }
        self
    }

    /// Builder pattern: set consumed durability.
    pub fn with_damage_taken(mut self, damage_taken: u32) -> Self {
        self.damage_taken = damage_taken;
        self
    }

    /// Level of `kind`, 0 when absent.
    pub fn level(&self, kind: ModifierKind) -> u32 {
        self.modifiers
            .iter()
            .find(|m| m.kind == kind)
            .map_or(0, |m| m.level)
    }

    /// True when any modifier is attached (drives the enchanted look).
    pub fn has_modifiers(&self) -> bool {
        self.modifiers.iter().any(|m| m.level > 0)
    }

    /// True when one more use would break a weapon with `max_durability` uses.
    pub fn will_break_next_use(&self, max_durability: u32) -> bool {
        max_durability > 0 && self.damage_taken + 1 >= max_durability
    }

    /// Consumes `amount` durability.
    pub fn wear(&mut self, amount: u32) {
        self.damage_taken = self.damage_taken.saturating_add(amount);
    }
}

/// The thrown weapon projectile.
///
/// Position lives in the entity's `Transform`. Everything else the tick needs is here.
///
/// # Fields
/// * `velocity` - Blocks per tick
/// * `previous_position` - Position before this tick's motion, used for swept collision
/// * `orientation` - Yaw/pitch derived from velocity
/// * `age` - Ticks since spawn
/// * `seconds` - `age / ticks_per_second`, for presentation
/// * `grounded_ticks` - Ticks spent embedded
/// * `dealt_damage` - Hit resolved; never reverts
/// * `return_affinity_level` - 0..=127, snapshotted from the weapon at spawn/load
/// * `is_enchanted_visual` - Cosmetic flag for the presentation layer
/// * `return_timer` - Ticks spent returning
/// * `approach_cue_played` - One-shot approach cue latch
/// * `pickup_permission` - Who may reclaim the weapon
/// * `owner` - Non-owning reference to the thrower, re-resolved every tick
/// * `weapon` - The item this projectile was thrown from
/// * `state` - Lifecycle state
/// * `no_clip` - Ignores world geometry (set while returning)
/// * `embedded_in` - Block entity the weapon is stuck in
/// * `fire_ticks` - Remaining burn time of the weapon itself
/// * `rng_seed` - Seed for deterministic deflection jitter
/// * `has_hit` - An agent was struck at least once (presentation)
#[derive(Component, Reflect, Clone, Debug)]
#[reflect(Component)]
pub struct ThrownWeapon {
    pub velocity: Vec3,
    pub previous_position: Vec3,
    pub orientation: Orientation,
    pub age: u32,
    pub seconds: f32,
    pub grounded_ticks: u32,
    pub dealt_damage: bool,
    pub return_affinity_level: u8,
    pub is_enchanted_visual: bool,
    pub return_timer: u32,
    pub approach_cue_played: bool,
    pub pickup_permission: PickupPermission,
    pub owner: Option<Entity>,
    pub weapon: WeaponInstance,
    pub state: FlightState,
    pub no_clip: bool,
    pub embedded_in: Option<Entity>,
    pub fire_ticks: u32,
    pub rng_seed: u64,
    pub has_hit: bool,
}

impl ThrownWeapon {
    /// Creates a flying projectile for `weapon` with initial `velocity`.
    pub fn new(weapon: WeaponInstance, velocity: Vec3) -> Self {
        Self {
            velocity,
            previous_position: Vec3::ZERO,
            orientation: Orientation::default(),
            age: 0,
            seconds: 0.0,
            grounded_ticks: 0,
            dealt_damage: false,
            return_affinity_level: 0,
            is_enchanted_visual: weapon.has_modifiers(),
            return_timer: 0,
            approach_cue_played: false,
            pickup_permission: PickupPermission::AnyAgent,
            owner: None,
            weapon,
            state: FlightState::Flying,
            no_clip: false,
            embedded_in: None,
            fire_ticks: 0,
            rng_seed: 0,
            has_hit: false,
        }
    }

    /// Builder pattern: set owner
    pub fn with_owner(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Builder pattern: set return affinity (clamped to 0..=127)
    pub fn with_return_affinity(mut self, level: u32) -> Self {
        self.return_affinity_level = level.min(127) as u8;
        self
    }

    /// Builder pattern: set pickup permission
    pub fn with_pickup(mut self, permission: PickupPermission) -> Self {
        self.pickup_permission = permission;
        self
    }

    /// Builder pattern: set deflection seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Marks the hit as resolved. There is no way back.
    pub fn mark_dealt_damage(&mut self) {
        self.dealt_damage = true;
    }

    /// Sticks the projectile into `block`.
    pub fn embed(&mut self, block: Option<Entity>) {
        self.state = FlightState::Embedded;
        self.embedded_in = block;
        self.velocity = Vec3::ZERO;
        self.grounded_ticks = 0;
    }

    /// True when swept agent collision should still run.
    pub fn checks_agent_collisions(&self) -> bool {
        !self.dealt_damage
    }

    /// Sets the weapon ablaze for `ticks`, never shortening an existing burn.
    pub fn ignite(&mut self, ticks: u32) {
        self.fire_ticks = self.fire_ticks.max(ticks);
    }

    pub fn is_on_fire(&self) -> bool {
        self.fire_ticks > 0
    }
}

/// An agent that can throw, be struck by, and collect thrown weapons.
///
/// # Fields
/// * `id` - Stable identifier, used by persisted records to refer to owners
/// * `eye_height` - Eye point above the transform origin
/// * `width` - Body width
/// * `alive` - False once incapacitated
/// * `spectator` - Spectating agents cannot own returning weapons if primary-controllable
/// * `unlimited_resources` - Throws do not consume the weapon
/// * `capabilities` - Capability tags
/// * `knockback_resistance` - 0 (none) to 1 (immune)
/// * `fire_immune` - Never ignited by burning weapons
#[derive(Component, Reflect, Clone, Debug)]
#[reflect(Component)]
pub struct Agent {
    pub id: u64,
    pub eye_height: f32,
    pub width: f32,
    pub alive: bool,
    pub spectator: bool,
    pub unlimited_resources: bool,
    pub capabilities: AgentCapabilities,
    pub knockback_resistance: f32,
    pub fire_immune: bool,
}

impl Default for Agent {
    /// A living, humanoid-sized agent without special capabilities.
    fn default() -> Self {
        Self {
            id: 0,
            eye_height: 1.62,
            width: 0.6,
            alive: true,
            spectator: false,
            unlimited_resources: false,
            capabilities: AgentCapabilities::default(),
            knockback_resistance: 0.0,
            fire_immune: false,
        }
    }
}

impl Agent {
    /// A living player-controlled agent.
    pub fn player(id: u64) -> Self {
        Self {
            id,
            capabilities: AgentCapabilities::player(),
            ..Default::default()
        }
    }

    /// World-space eye point for an agent at `origin`.
    pub fn eye_position(&self, origin: Vec3) -> Vec3 {
        origin + Vec3::Y * self.eye_height
    }

    /// Whether this agent can still own a returning weapon.
    pub fn is_eligible_owner(&self) -> bool {
        self.alive && !(self.capabilities.is_primary_controllable && self.spectator)
    }
}

/// Agent motion in blocks per tick; knockback is added here.
#[derive(Component, Reflect, Clone, Copy, Debug, Default)]
#[reflect(Component)]
pub struct AgentVelocity(pub Vec3);

/// Hit points of an agent.
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Applies `amount` damage. Returns false when nothing was taken.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if amount <= 0.0 || self.current <= 0.0 {
            return false;
        }
        self.current = (self.current - amount).max(0.0);
        true
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }
}

/// Burning state of an agent.
#[derive(Component, Reflect, Clone, Copy, Debug, Default)]
#[reflect(Component)]
pub struct Burning {
    /// Remaining burn ticks
    pub ticks: u32,
}

/// Weapons an agent carries.
#[derive(Component, Reflect, Clone, Debug, Default)]
#[reflect(Component)]
pub struct Holdings {
    pub items: Vec<WeaponInstance>,
}

impl Holdings {
    /// Removes and returns the item in `slot`.
    pub fn take(&mut self, slot: usize) -> Option<WeaponInstance> {
        (slot < self.items.len()).then(|| self.items.remove(slot))
    }

    pub fn insert(&mut self, item: WeaponInstance) {
        self.items.push(item);
    }
}

/// A solid block of world geometry, centred on its `Transform`.
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct WorldBlock {
    pub half_extents: Vec3,
}

impl Default for WorldBlock {
    /// A unit cube.
    fn default() -> Self {
        Self {
            half_extents: Vec3::splat(0.5),
        }
    }
}

/// An axis-aligned fluid region centred on its `Transform`.
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct FluidVolume {
    pub half_extents: Vec3,
}

impl FluidVolume {
    /// Whether `point` lies inside a volume centred at `center`.
    pub fn contains(&self, center: Vec3, point: Vec3) -> bool {
        let offset = (point - center).abs();
        offset.x <= self.half_extents.x
            && offset.y <= self.half_extents.y
            && offset.z <= self.half_extents.z
    }
}

/// A weapon lying loose in the world, collectable by any agent.
#[derive(Component, Reflect, Clone, Debug)]
#[reflect(Component)]
pub struct LooseItem {
    pub weapon: WeaponInstance,
}

/// Replication bookkeeping, updated at the end of every tick.
///
/// # Fields
/// * `position_urgent` - Push position this tick
/// * `velocity_urgent` - Force an exact resync on observers instead of smoothing
/// * `interpolation_steps` - Smoothing steps observers should use
/// * `ticks_since_sync` - Ticks since the last published snapshot
/// * `last_state` - State carried by the last published snapshot
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct ReplicationState {
    pub position_urgent: bool,
    pub velocity_urgent: bool,
    pub interpolation_steps: u32,
    pub ticks_since_sync: u32,
    pub last_state: Option<FlightState>,
}

impl Default for ReplicationState {
    fn default() -> Self {
        Self {
            position_urgent: false,
            velocity_urgent: false,
            interpolation_steps: 1,
            ticks_since_sync: 0,
            last_state: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_wear_and_breakage() {
        let mut weapon = WeaponInstance::new("golden_dagger").with_damage_taken(18);
        assert!(!weapon.will_break_next_use(20));
        weapon.wear(1);
        assert!(weapon.will_break_next_use(20));
        assert!(!WeaponInstance::new("x").will_break_next_use(0));
    }

    #[test]
    fn test_modifier_builder_replaces_levels() {
        let weapon = WeaponInstance::new("iron_dagger")
            .with_modifier(ModifierKind::Return, 1)
            .with_modifier(ModifierKind::Return, 4);
        assert_eq!(weapon.modifiers.len(), 1);
        assert_eq!(weapon.level(ModifierKind::Return), 4);
        assert_eq!(weapon.level(ModifierKind::Knockback), 0);
    }

    #[test]
    fn test_return_affinity_is_clamped() {
        let projectile = ThrownWeapon::new(WeaponInstance::new("iron_dagger"), Vec3::Z)
            .with_return_affinity(500);
        assert_eq!(projectile.return_affinity_level, 127);
    }

    #[test]
    fn test_owner_eligibility() {
        let mut player = Agent::player(1);
        assert!(player.is_eligible_owner());
        player.spectator = true;
        assert!(!player.is_eligible_owner());

        let mut creature = Agent {
            spectator: true,
            ..Default::default()
        };
        assert!(creature.is_eligible_owner());
        creature.alive = false;
        assert!(!creature.is_eligible_owner());
    }

    #[test]
    fn test_health_ignores_non_positive_damage() {
        let mut health = Health::new(20.0);
        assert!(!health.take_damage(0.0));
        assert!(health.take_damage(25.0));
        assert!(!health.is_alive());
        assert!(!health.take_damage(1.0));
    }

    #[test]
    fn test_fluid_containment() {
        let water = FluidVolume {
            half_extents: Vec3::new(2.0, 1.0, 2.0),
        };
        assert!(water.contains(Vec3::ZERO, Vec3::new(1.5, -0.5, 0.0)));
        assert!(!water.contains(Vec3::ZERO, Vec3::new(0.0, 1.5, 0.0)));
    }
}
