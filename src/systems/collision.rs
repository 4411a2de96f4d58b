//! Collision system - swept hit detection and hit resolution.
//!
//! Detection casts a ray from the previous to the current projectile position through
//! the physics backend. Resolution is plain code operating on components, so it runs the
//! same no matter which backend found the contact.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand::distr::Uniform;
use rand_distr::Distribution;

#[cfg(feature = "dim3")]
use avian3d::prelude::*;

#[cfg(feature = "dim3")]
use crate::components::{Agent, AgentVelocity, Burning};
use crate::components::{Health, ThrownWeapon, WorldBlock};
#[cfg(feature = "dim3")]
use crate::events::{BlockHitEvent, CueEvent, HitEvent, ProjectileRemoved, RemovalReason};
#[cfg(feature = "dim3")]
use crate::materials::MaterialTable;
use crate::modifiers::{DamageSource, HookResponse, ModifierLookup, TargetProfile};
#[cfg(feature = "dim3")]
use crate::resources::Modifiers;
use crate::resources::ThrowConfig;
#[cfg(feature = "dim3")]
use crate::types::{Cue, FlightState};

/// Maximum contacts gathered per sweep.
#[cfg(feature = "dim3")]
const MAX_SWEEP_HITS: u32 = 8;

/// Outcome of an agent hit, for the caller to apply to the target.
///
/// # Fields
/// * `damage` - Damage dealt after modifiers
/// * `landed` - The target actually took the damage
/// * `absorbed` - The target absorbs hits; no follow-up was applied
/// * `knockback` - Impulse to add to the target's velocity
/// * `ignite_ticks` - Burn duration to give the target
/// * `remove_projectile` - An on-hit hook consumed the projectile
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AgentHitOutcome {
    pub damage: f32,
    pub landed: bool,
    pub absorbed: bool,
    pub knockback: Vec3,
    pub ignite_ticks: Option<u32>,
    pub remove_projectile: bool,
}

impl AgentHitOutcome {
    /// The impact cue follows every deflection, whether or not the damage landed.
    pub fn plays_impact_cue(&self) -> bool {
        !self.absorbed && !self.remove_projectile
    }
}

/// Outcome of a block hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockHitOutcome {
    /// Hit point clamped into the block
    pub point: Vec3,
    /// The block-hit hook consumed the projectile
    pub remove_projectile: bool,
}

/// Sweep live projectiles against the physics world.
///
/// Casts a ray between frames to catch fast projectiles. The nearest agent is struck
/// while the projectile has not resolved its hit yet; the nearest block embeds it.
/// No-clip projectiles pass through everything.
///
/// # Arguments
/// * `commands` - Bevy Commands for despawning and igniting
/// * `config` - Tunable constants
/// * `materials` - Material table for base ranged damage
/// * `modifiers` - Modifier lookup for damage, knockback and hooks
/// * `spatial_query` - Avian3D spatial query
/// * `projectiles` - Live projectiles
/// * `agents` - Agents that can be struck
/// * `blocks` - World blocks
#[cfg(feature = "dim3")]
#[allow(clippy::too_many_arguments)]
pub fn detect_collisions(
    mut commands: Commands,
    config: Res<ThrowConfig>,
    materials: Res<MaterialTable>,
    modifiers: Res<Modifiers>,
    spatial_query: SpatialQuery,
    mut hit_events: MessageWriter<HitEvent>,
    mut block_events: MessageWriter<BlockHitEvent>,
    mut cues: MessageWriter<CueEvent>,
    mut removals: MessageWriter<ProjectileRemoved>,
    mut projectiles: Query<(Entity, &mut Transform, &mut ThrownWeapon)>,
    mut agents: Query<
        (
            &Transform,
            &Agent,
            Option<&mut Health>,
            Option<&mut AgentVelocity>,
            Option<&mut Burning>,
        ),
        Without<ThrownWeapon>,
    >,
    blocks: Query<(&Transform, &WorldBlock), (Without<ThrownWeapon>, Without<Agent>)>,
) {
    let lookup = modifiers.lookup();

    for (entity, mut transform, mut projectile) in projectiles.iter_mut() {
        if projectile.state != FlightState::Flying || projectile.no_clip {
            continue;
        }

        let ray_origin = projectile.previous_position;
        let ray_vector = transform.translation - ray_origin;
        let ray_length = ray_vector.length();

        // Skip if projectile hasn't moved enough
        if ray_length < 0.001 {
            continue;
        }
        let Ok(direction) = Dir3::new(ray_vector) else {
            continue;
        };

        let mut excluded = vec![entity];
        excluded.extend(projectile.owner);
        let filter = SpatialQueryFilter::default().with_excluded_entities(excluded);

        let mut contacts = spatial_query.ray_hits(
            ray_origin,
            direction,
            ray_length,
            MAX_SWEEP_HITS,
            true,
            &filter,
        );
        contacts.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        for contact in contacts {
            let hit_point = ray_origin + *direction * contact.distance;

            if agents.contains(contact.entity) {
                if !projectile.checks_agent_collisions() {
                    continue;
                }

                let attacker = projectile.owner.filter(|owner| agents.contains(*owner));
                let source = DamageSource::new(entity, attacker);
                let Ok((target_transform, agent, mut health, velocity, burning)) =
                    agents.get_mut(contact.entity)
                else {
                    continue;
                };

                let target = TargetProfile {
                    entity: contact.entity,
                    position: target_transform.translation,
                    capabilities: agent.capabilities,
                    knockback_resistance: agent.knockback_resistance,
                    fire_immune: agent.fire_immune,
                };
                let base_damage = materials.resolve(&projectile.weapon.kind).ranged_damage;
                let impact_velocity = projectile.velocity;

                let outcome = resolve_agent_hit(
                    &mut projectile,
                    &source,
                    &target,
                    health.as_deref_mut(),
                    base_damage,
                    lookup,
                    &config,
                );

                if let Some(mut velocity) = velocity {
                    velocity.0 += outcome.knockback;
                }
                if let Some(ticks) = outcome.ignite_ticks {
                    match burning {
                        Some(mut burning) => burning.ticks = burning.ticks.max(ticks),
                        None => {
                            commands.entity(contact.entity).insert(Burning { ticks });
                        }
                    }
                }

                hit_events.write(HitEvent {
                    projectile: entity,
                    target: contact.entity,
                    attacker: source.attacker,
                    impact_point: hit_point,
                    velocity: impact_velocity,
                    damage: outcome.damage,
                    knockback: outcome.knockback,
                });

                if outcome.remove_projectile {
                    debug!("On-hit effect consumed {:?}", entity);
                    projectile.state = FlightState::Discarded;
                    commands.entity(entity).despawn();
                    removals.write(ProjectileRemoved::new(
                        entity,
                        RemovalReason::Discarded,
                        transform.translation,
                    ));
                } else if outcome.plays_impact_cue() {
                    cues.write(CueEvent::new(entity, Cue::AgentImpact, hit_point));
                }
                break;
            }

            if let Ok((block_transform, block)) = blocks.get(contact.entity) {
                let outcome = resolve_block_hit(
                    &mut projectile,
                    contact.entity,
                    hit_point,
                    block_transform.translation,
                    block,
                    lookup,
                );
                transform.translation = outcome.point;

                block_events.write(BlockHitEvent {
                    projectile: entity,
                    block: contact.entity,
                    point: outcome.point,
                    normal: contact.normal,
                });
                cues.write(CueEvent::new(entity, Cue::GroundImpact, outcome.point));

                if outcome.remove_projectile {
                    debug!("Block-hit effect consumed {:?}", entity);
                    projectile.state = FlightState::Discarded;
                    commands.entity(entity).despawn();
                    removals.write(ProjectileRemoved::new(
                        entity,
                        RemovalReason::Discarded,
                        outcome.point,
                    ));
                }
                break;
            }
        }
    }
}

/// Resolve a projectile striking an agent.
///
/// Applies damage to `health` and updates the projectile. Knockback and ignition are
/// returned for the caller to apply, since they touch other components of the target.
///
/// Order of effects:
/// 1. Damage from the material's ranged damage, adjusted by modifiers
/// 2. The hit is marked resolved
/// 3. Hit-absorbing targets stop here; the projectile keeps flying untouched
/// 4. On-target-damaged hook, which may consume the projectile
/// 5. Knockback and ignition
/// 6. Deflection off the target and anisotropic damping
///
/// # Arguments
/// * `projectile` - Projectile that struck
/// * `source` - Damage attribution
/// * `target` - The struck agent
/// * `health` - Target hit points, when it has any
/// * `base_damage` - Ranged damage of the weapon's material
/// * `lookup` - Modifier lookup
/// * `config` - Knockback, ignition, deflection and damping constants
pub fn resolve_agent_hit(
    projectile: &mut ThrownWeapon,
    source: &DamageSource,
    target: &TargetProfile,
    health: Option<&mut Health>,
    base_damage: f32,
    lookup: &dyn ModifierLookup,
    config: &ThrowConfig,
) -> AgentHitOutcome {
    let damage = lookup.modify_damage(&projectile.weapon, target, source, base_damage);
    projectile.mark_dealt_damage();
    projectile.has_hit = true;

    let landed = health.is_none_or(|health| health.take_damage(damage));
    let mut outcome = AgentHitOutcome {
        damage,
        landed,
        ..Default::default()
    };

    if landed {
        if target.capabilities.is_hit_immune_to_followup {
            outcome.absorbed = true;
            return outcome;
        }

        let response = lookup.on_target_damaged(&projectile.weapon, target, source);
        if response == HookResponse::RemoveProjectile {
            outcome.remove_projectile = true;
            return outcome;
        }

        let base_knockback = lookup.knockback_modifier(&projectile.weapon, target, source);
        outcome.knockback = knockback_impulse(
            projectile.velocity,
            base_knockback,
            target.knockback_resistance,
            config,
        );

        if projectile.is_on_fire() && !target.fire_immune {
            outcome.ignite_ticks = Some(config.ignite_ticks);
        }
    }

    deflect(projectile, config);
    projectile.velocity *= Vec3::from_array(config.hit_damping);
    outcome
}

/// Knockback impulse for a hit.
///
/// Each axis of the projectile velocity is squared with its sign kept, so the dominant
/// axis dominates the push. The vertical component is at least `knockback_min_lift`.
///
/// # Returns
/// `Vec3::ZERO` when there is no knockback modifier or the target fully resists.
pub fn knockback_impulse(
    velocity: Vec3,
    base_knockback: f32,
    knockback_resistance: f32,
    config: &ThrowConfig,
) -> Vec3 {
    let resistance = (1.0 - knockback_resistance).max(0.0);
    if base_knockback <= 0.0 || resistance <= 0.0 {
        return Vec3::ZERO;
    }

    let shaped = velocity * velocity.abs();
    let mut impulse = shaped * base_knockback * resistance * config.knockback_scale;
    impulse.y = impulse.y.max(config.knockback_min_lift);
    impulse
}

/// Bounce off a struck agent: velocity is reversed and scaled down, and the weapon spins
/// around by a seeded yaw in `deflection_yaw_range`.
pub fn deflect(projectile: &mut ThrownWeapon, config: &ThrowConfig) {
    projectile.velocity *= -config.deflection_restitution;
    projectile.orientation.yaw += deflection_yaw(projectile.rng_seed, projectile.age, config);
}

/// Deterministic yaw jitter for a deflection.
pub fn deflection_yaw(seed: u64, age: u32, config: &ThrowConfig) -> f32 {
    let [low, high] = config.deflection_yaw_range;
    let mut rng = StdRng::seed_from_u64(seed ^ age as u64);
    Uniform::new_inclusive(low, high)
        .map(|dist| dist.sample(&mut rng))
        .unwrap_or((low + high) * 0.5)
}

/// Resolve a projectile striking a block.
///
/// The hit point is clamped into the block's bounds and the projectile embeds there.
/// The block-hit hook may then consume the projectile.
pub fn resolve_block_hit(
    projectile: &mut ThrownWeapon,
    block_entity: Entity,
    hit_point: Vec3,
    block_center: Vec3,
    block: &WorldBlock,
    lookup: &dyn ModifierLookup,
) -> BlockHitOutcome {
    let point = hit_point.clamp(
        block_center - block.half_extents,
        block_center + block.half_extents,
    );
    projectile.embed(Some(block_entity));

    let response = lookup.on_block_hit(&projectile.weapon, projectile.owner, block_entity, point);
    BlockHitOutcome {
        point,
        remove_projectile: response == HookResponse::RemoveProjectile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ModifierKind, WeaponInstance};
    use crate::modifiers::StandardModifiers;
    use crate::types::{AgentCapabilities, FlightState};

    fn target(capabilities: AgentCapabilities) -> TargetProfile {
        TargetProfile {
            entity: Entity::PLACEHOLDER,
            position: Vec3::ZERO,
            capabilities,
            knockback_resistance: 0.0,
            fire_immune: false,
        }
    }

    fn flying(weapon: WeaponInstance) -> ThrownWeapon {
        ThrownWeapon::new(weapon, Vec3::new(0.0, -0.2, 2.0)).with_seed(7)
    }

    #[test]
    fn test_agent_hit_damages_deflects_and_damps() {
        let config = ThrowConfig::default();
        let lookup = StandardModifiers::default();
        let mut projectile = flying(WeaponInstance::new("iron_dagger"));
        let source = DamageSource::new(Entity::PLACEHOLDER, None);
        let mut health = Health::new(20.0);

        let outcome = resolve_agent_hit(
            &mut projectile,
            &source,
            &target(AgentCapabilities::creature()),
            Some(&mut health),
            7.0,
            &lookup,
            &config,
        );

        assert!(outcome.landed);
        assert_eq!(health.current, 13.0);
        assert!(projectile.dealt_damage);
        assert!(projectile.has_hit);
        assert_eq!(outcome.knockback, Vec3::ZERO);
        // (0, -0.2, 2.0) * -0.5 * (0.02, 0.2, 0.02)
        assert!((projectile.velocity.z + 0.02).abs() < 1e-6);
        assert!((projectile.velocity.y - 0.02).abs() < 1e-6);
        let yaw = projectile.orientation.yaw;
        assert!((170.0..=190.0).contains(&yaw));
    }

    #[test]
    fn test_hit_absorbing_target_skips_follow_up() {
        let config = ThrowConfig::default();
        let lookup = StandardModifiers::default();
        let mut projectile = flying(
            WeaponInstance::new("iron_dagger").with_modifier(ModifierKind::Knockback, 2),
        );
        projectile.ignite(40);
        let before = projectile.velocity;
        let immune = AgentCapabilities {
            is_hit_immune_to_followup: true,
            ..Default::default()
        };

        let outcome = resolve_agent_hit(
            &mut projectile,
            &DamageSource::new(Entity::PLACEHOLDER, None),
            &target(immune),
            None,
            7.0,
            &lookup,
            &config,
        );

        assert!(outcome.absorbed);
        assert!(!outcome.plays_impact_cue());
        assert!(projectile.dealt_damage);
        assert_eq!(outcome.knockback, Vec3::ZERO);
        assert!(outcome.ignite_ticks.is_none());
        assert_eq!(projectile.velocity, before);
    }

    #[test]
    fn test_burning_weapon_ignites_unless_immune() {
        let config = ThrowConfig::default();
        let lookup = StandardModifiers::default();
        let source = DamageSource::new(Entity::PLACEHOLDER, None);

        let mut projectile = flying(WeaponInstance::new("iron_dagger"));
        projectile.ignite(40);
        let outcome = resolve_agent_hit(
            &mut projectile,
            &source,
            &target(AgentCapabilities::creature()),
            None,
            7.0,
            &lookup,
            &config,
        );
        assert_eq!(outcome.ignite_ticks, Some(config.ignite_ticks));

        let mut projectile = flying(WeaponInstance::new("iron_dagger"));
        projectile.ignite(40);
        let mut fireproof = target(AgentCapabilities::creature());
        fireproof.fire_immune = true;
        let outcome = resolve_agent_hit(
            &mut projectile,
            &source,
            &fireproof,
            None,
            7.0,
            &lookup,
            &config,
        );
        assert!(outcome.ignite_ticks.is_none());
    }

    #[test]
    fn test_failed_damage_still_deflects() {
        let config = ThrowConfig::default();
        let lookup = StandardModifiers::default();
        let mut projectile = flying(WeaponInstance::new("iron_dagger"));
        let mut dead = Health::new(10.0);
        dead.current = 0.0;

        let outcome = resolve_agent_hit(
            &mut projectile,
            &DamageSource::new(Entity::PLACEHOLDER, None),
            &target(AgentCapabilities::creature()),
            Some(&mut dead),
            7.0,
            &lookup,
            &config,
        );
        assert!(!outcome.landed);
        assert!(projectile.velocity.z < 0.0);
        assert!(outcome.plays_impact_cue());
    }

    #[test]
    fn test_knockback_shapes_and_lifts() {
        let config = ThrowConfig::default();
        let impulse = knockback_impulse(Vec3::new(-2.0, 0.0, 1.0), 1.0, 0.0, &config);

        assert!((impulse.x + 4.0 * config.knockback_scale).abs() < 1e-5);
        assert!((impulse.z - config.knockback_scale).abs() < 1e-5);
        assert_eq!(impulse.y, config.knockback_min_lift);

        let halved = knockback_impulse(Vec3::new(-2.0, 0.0, 1.0), 1.0, 0.5, &config);
        assert!((halved.x - impulse.x * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_knockback_zero_without_modifier_or_with_full_resistance() {
        let config = ThrowConfig::default();
        let velocity = Vec3::new(1.0, 0.5, 3.0);
        assert_eq!(knockback_impulse(velocity, 0.0, 0.0, &config), Vec3::ZERO);
        assert_eq!(knockback_impulse(velocity, 2.0, 1.0, &config), Vec3::ZERO);
        assert_eq!(knockback_impulse(velocity, 2.0, 1.5, &config), Vec3::ZERO);
    }

    #[test]
    fn test_deflection_jitter_is_deterministic() {
        let config = ThrowConfig::default();
        let first = deflection_yaw(42, 10, &config);
        assert_eq!(first, deflection_yaw(42, 10, &config));
        assert!((170.0..=190.0).contains(&first));
    }

    #[test]
    fn test_block_hit_clamps_and_embeds() {
        let lookup = StandardModifiers::default();
        let mut projectile = flying(WeaponInstance::new("iron_dagger"));
        let block = WorldBlock::default();

        let outcome = resolve_block_hit(
            &mut projectile,
            Entity::PLACEHOLDER,
            Vec3::new(0.0, 1.2, 0.3),
            Vec3::ZERO,
            &block,
            &lookup,
        );

        assert_eq!(outcome.point, Vec3::new(0.0, 0.5, 0.3));
        assert!(!outcome.remove_projectile);
        assert_eq!(projectile.state, FlightState::Embedded);
        assert_eq!(projectile.embedded_in, Some(Entity::PLACEHOLDER));
        assert_eq!(projectile.velocity, Vec3::ZERO);
    }

    struct Consuming;

    impl ModifierLookup for Consuming {
        fn throw_speed_level(&self, _: &WeaponInstance) -> u32 {
            0
        }
        fn return_affinity_level(&self, _: &WeaponInstance, _: crate::types::WorldContext) -> u32 {
            0
        }
        fn knockback_modifier(
            &self,
            _: &WeaponInstance,
            _: &TargetProfile,
            _: &DamageSource,
        ) -> f32 {
            0.0
        }
        fn modify_damage(
            &self,
            _: &WeaponInstance,
            _: &TargetProfile,
            _: &DamageSource,
            base: f32,
        ) -> f32 {
            base
        }
        fn on_target_damaged(
            &self,
            _: &WeaponInstance,
            _: &TargetProfile,
            _: &DamageSource,
        ) -> HookResponse {
            HookResponse::RemoveProjectile
        }
        fn on_block_hit(
            &self,
            _: &WeaponInstance,
            _: Option<Entity>,
            _: Entity,
            _: Vec3,
        ) -> HookResponse {
            HookResponse::RemoveProjectile
        }
    }

    #[test]
    fn test_hooks_can_consume_projectile() {
        let config = ThrowConfig::default();
        let mut projectile = flying(WeaponInstance::new("iron_dagger"));
        let outcome = resolve_agent_hit(
            &mut projectile,
            &DamageSource::new(Entity::PLACEHOLDER, None),
            &target(AgentCapabilities::creature()),
            None,
            7.0,
            &Consuming,
            &config,
        );
        assert!(outcome.remove_projectile);

        let outcome = resolve_block_hit(
            &mut projectile,
            Entity::PLACEHOLDER,
            Vec3::ZERO,
            Vec3::ZERO,
            &WorldBlock::default(),
            &Consuming,
        );
        assert!(outcome.remove_projectile);
    }
}
