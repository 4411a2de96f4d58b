//! Projectile lifecycle - hit resolution by grounding, homing eligibility and despawn.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::components::{Agent, LooseItem, ThrownWeapon, WorldBlock};
use crate::events::{ProjectileRemoved, RemovalReason};
use crate::resources::ThrowConfig;
use crate::types::{FlightState, PickupPermission};

/// What the lifecycle step decided for one projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleDecision {
    /// Keep simulating
    Continue,
    /// Start or keep homing toward the owner
    Return,
    /// Owner gone; leave the weapon as a loose item
    Drop,
    /// Remove the projectile
    Discard,
}

/// Where the owner stands, if it could be resolved this tick.
#[derive(Clone, Copy, Debug)]
pub struct OwnerStatus {
    pub eye: Vec3,
    pub width: f32,
    pub eligible: bool,
    pub always_chases: bool,
}

impl OwnerStatus {
    pub fn of(agent: &Agent, origin: Vec3) -> Self {
        Self {
            eye: agent.eye_position(origin),
            width: agent.width,
            eligible: agent.is_eligible_owner(),
            always_chases: agent.capabilities.is_primary_controllable,
        }
    }
}

/// Advance grounding bookkeeping for one tick.
///
/// Counts embedded ticks and marks the hit as resolved once the projectile has been
/// grounded for longer than `grounded_threshold`.
pub fn tick_grounding(projectile: &mut ThrownWeapon, config: &ThrowConfig) {
    if projectile.state == FlightState::Embedded {
        projectile.grounded_ticks = projectile.grounded_ticks.saturating_add(1);
    }
    if projectile.grounded_ticks > config.grounded_threshold {
        projectile.mark_dealt_damage();
    }
}

/// Decide the projectile's next lifecycle step.
///
/// # Arguments
/// * `projectile` - The projectile, after grounding bookkeeping
/// * `position` - Current projectile position
/// * `owner` - Owner status when the owner reference resolved to a live agent
/// * `config` - Point-blank margin and grounded despawn age
pub fn decide_lifecycle(
    projectile: &ThrownWeapon,
    position: Vec3,
    owner: Option<OwnerStatus>,
    config: &ThrowConfig,
) -> LifecycleDecision {
    let level = projectile.return_affinity_level;
    // Returning weapons stay bound to their owner even once the reference is lost.
    let bound_to_owner = projectile.owner.is_some()
        || projectile.no_clip
        || projectile.state == FlightState::Returning;

    if level > 0 && (projectile.dealt_damage || projectile.no_clip) && bound_to_owner {
        return match owner {
            Some(status) if status.eligible => {
                if !status.always_chases
                    && position.distance(status.eye) < status.width + config.point_blank_margin
                {
                    LifecycleDecision::Discard
                } else {
                    LifecycleDecision::Return
                }
            }
            _ if projectile.pickup_permission == PickupPermission::AnyAgent => {
                LifecycleDecision::Drop
            }
            _ => LifecycleDecision::Discard,
        };
    }

    let keeps_forever = level > 0 && projectile.pickup_permission == PickupPermission::AnyAgent;
    if projectile.state == FlightState::Embedded
        && projectile.grounded_ticks >= config.grounded_despawn_ticks
        && !keeps_forever
    {
        return LifecycleDecision::Discard;
    }

    if projectile.state == FlightState::Flying && projectile.age >= config.max_flight_ticks {
        return LifecycleDecision::Discard;
    }

    LifecycleDecision::Continue
}

/// Per-tick lifecycle of thrown weapons.
///
/// This system:
/// - Releases embedded projectiles whose block disappeared
/// - Counts grounded ticks and resolves the hit after the grounded threshold
/// - Resolves the owner and switches eligible projectiles into `Returning`
/// - Drops or discards projectiles whose owner is gone or ineligible
/// - Discards projectiles that stayed grounded too long or never landed
///
/// # Arguments
/// * `commands` - Bevy Commands for despawning and dropping items
/// * `config` - Tunable constants
/// * `removals` - Message writer for removal notifications
/// * `projectiles` - Live projectiles
/// * `agents` - Agents that may own a projectile
/// * `blocks` - World blocks, used to detect a vanished embedding block
pub fn update_flight_state(
    mut commands: Commands,
    config: Res<ThrowConfig>,
    mut removals: MessageWriter<ProjectileRemoved>,
    mut projectiles: Query<(Entity, &Transform, &mut ThrownWeapon)>,
    agents: Query<(&Transform, &Agent), Without<ThrownWeapon>>,
    blocks: Query<(), With<WorldBlock>>,
) {
    for (entity, transform, mut projectile) in projectiles.iter_mut() {
        if projectile.state.is_terminal() {
            continue;
        }

        if projectile.state == FlightState::Embedded {
            if let Some(block) = projectile.embedded_in {
                if blocks.get(block).is_err() {
                    debug!("Block under {:?} is gone, releasing it", entity);
                    projectile.state = FlightState::Flying;
                    projectile.embedded_in = None;
                    projectile.velocity = Vec3::ZERO;
                    projectile.grounded_ticks = 0;
                }
            }
        }

        tick_grounding(&mut projectile, &config);

        let position = transform.translation;
        let owner = projectile
            .owner
            .and_then(|owner| agents.get(owner).ok())
            .map(|(owner_transform, agent)| OwnerStatus::of(agent, owner_transform.translation));

        match decide_lifecycle(&projectile, position, owner, &config) {
            LifecycleDecision::Continue => {}
            LifecycleDecision::Return => {
                if projectile.state != FlightState::Returning {
                    debug!("{:?} returning to {:?}", entity, projectile.owner);
                }
                projectile.state = FlightState::Returning;
                projectile.no_clip = true;
                projectile.embedded_in = None;
            }
            LifecycleDecision::Drop => {
                info!("Owner of {:?} is gone, dropping {}", entity, projectile.weapon.kind);
                commands.spawn((
                    Transform::from_translation(position + Vec3::Y * config.drop_height_offset),
                    LooseItem {
                        weapon: projectile.weapon.clone(),
                    },
                ));
                projectile.state = FlightState::Discarded;
                commands.entity(entity).despawn();
                removals.write(ProjectileRemoved::new(entity, RemovalReason::Dropped, position));
            }
            LifecycleDecision::Discard => {
                info!("Discarding {:?} ({})", entity, projectile.weapon.kind);
                projectile.state = FlightState::Discarded;
                commands.entity(entity).despawn();
                removals.write(ProjectileRemoved::new(entity, RemovalReason::Discarded, position));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::WeaponInstance;
    use bevy::ecs::message::Messages;
    use bevy::ecs::system::RunSystemOnce;

    fn returning_weapon() -> ThrownWeapon {
        let mut projectile = ThrownWeapon::new(WeaponInstance::new("iron_dagger"), Vec3::ZERO)
            .with_owner(Entity::PLACEHOLDER)
            .with_return_affinity(3);
        projectile.mark_dealt_damage();
        projectile
    }

    #[test]
    fn test_grounded_threshold_resolves_hit() {
        let config = ThrowConfig::default();
        let mut projectile = ThrownWeapon::new(WeaponInstance::new("iron_dagger"), Vec3::X);
        projectile.embed(None);

        for tick in 1..=5 {
            tick_grounding(&mut projectile, &config);
            assert_eq!(projectile.dealt_damage, tick == 5, "tick {tick}");
        }
        assert!(!projectile.checks_agent_collisions());
    }

    #[test]
    fn test_eligible_owner_starts_return() {
        let config = ThrowConfig::default();
        let owner = OwnerStatus::of(&Agent::player(1), Vec3::new(0.0, 0.0, 20.0));
        assert_eq!(
            decide_lifecycle(&returning_weapon(), Vec3::ZERO, Some(owner), &config),
            LifecycleDecision::Return
        );
    }

    #[test]
    fn test_point_blank_guard_only_for_non_players() {
        let config = ThrowConfig::default();
        let creature = OwnerStatus::of(&Agent::default(), Vec3::ZERO);
        let player = OwnerStatus::of(&Agent::player(1), Vec3::ZERO);
        let near_eye = Vec3::new(0.5, 1.62, 0.0);

        assert_eq!(
            decide_lifecycle(&returning_weapon(), near_eye, Some(creature), &config),
            LifecycleDecision::Discard
        );
        assert_eq!(
            decide_lifecycle(&returning_weapon(), near_eye, Some(player), &config),
            LifecycleDecision::Return
        );
    }

    #[test]
    fn test_missing_owner_drops_or_discards() {
        let config = ThrowConfig::default();
        assert_eq!(
            decide_lifecycle(&returning_weapon(), Vec3::ZERO, None, &config),
            LifecycleDecision::Drop
        );

        let creative = returning_weapon().with_pickup(PickupPermission::OwnerOnly);
        assert_eq!(
            decide_lifecycle(&creative, Vec3::ZERO, None, &config),
            LifecycleDecision::Discard
        );

        let mut dead = Agent::player(1);
        dead.alive = false;
        let status = OwnerStatus::of(&dead, Vec3::ZERO);
        assert_eq!(
            decide_lifecycle(&returning_weapon(), Vec3::ZERO, Some(status), &config),
            LifecycleDecision::Drop
        );
    }

    #[test]
    fn test_no_affinity_never_returns() {
        let config = ThrowConfig::default();
        let mut projectile = ThrownWeapon::new(WeaponInstance::new("iron_dagger"), Vec3::ZERO)
            .with_owner(Entity::PLACEHOLDER);
        projectile.mark_dealt_damage();
        assert_eq!(
            decide_lifecycle(&projectile, Vec3::ZERO, None, &config),
            LifecycleDecision::Continue
        );
    }

    #[test]
    fn test_lost_owner_reference_ends_return() {
        let config = ThrowConfig::default();
        let mut orphan = returning_weapon();
        orphan.owner = None;
        orphan.state = FlightState::Returning;
        orphan.no_clip = true;
        assert_eq!(
            decide_lifecycle(&orphan, Vec3::ZERO, None, &config),
            LifecycleDecision::Drop
        );

        let creative = orphan.with_pickup(PickupPermission::OwnerOnly);
        assert_eq!(
            decide_lifecycle(&creative, Vec3::ZERO, None, &config),
            LifecycleDecision::Discard
        );
    }

    #[test]
    fn test_flight_age_limit() {
        let config = ThrowConfig::default();
        let mut projectile = ThrownWeapon::new(WeaponInstance::new("iron_dagger"), Vec3::NEG_Y)
            .with_return_affinity(2);
        projectile.age = config.max_flight_ticks - 1;
        assert_eq!(
            decide_lifecycle(&projectile, Vec3::ZERO, None, &config),
            LifecycleDecision::Continue
        );

        projectile.age = config.max_flight_ticks;
        assert_eq!(
            decide_lifecycle(&projectile, Vec3::ZERO, None, &config),
            LifecycleDecision::Discard
        );

        // Embedded weapons are governed by the grounded age instead.
        projectile.embed(None);
        assert_eq!(
            decide_lifecycle(&projectile, Vec3::ZERO, None, &config),
            LifecycleDecision::Continue
        );
    }

    #[test]
    fn test_grounded_despawn_age() {
        let config = ThrowConfig::default();
        let mut plain = ThrownWeapon::new(WeaponInstance::new("iron_dagger"), Vec3::ZERO);
        plain.embed(None);
        plain.grounded_ticks = config.grounded_despawn_ticks;
        assert_eq!(
            decide_lifecycle(&plain, Vec3::ZERO, None, &config),
            LifecycleDecision::Discard
        );

        // Loyal ownerless weapons that anyone may collect stay forever.
        let mut loyal = plain.clone().with_return_affinity(1);
        loyal.owner = None;
        assert_eq!(
            decide_lifecycle(&loyal, Vec3::ZERO, None, &config),
            LifecycleDecision::Continue
        );
    }

    #[test]
    fn test_vanished_block_releases_weapon() {
        let mut world = World::new();
        world.insert_resource(ThrowConfig::default());
        world.init_resource::<Messages<ProjectileRemoved>>();
        let block = world
            .spawn((Transform::default(), WorldBlock::default()))
            .id();

        let mut projectile = ThrownWeapon::new(WeaponInstance::new("iron_dagger"), Vec3::ZERO);
        projectile.embed(Some(block));
        projectile.grounded_ticks = 3;
        let dagger = world
            .spawn((Transform::from_xyz(0.0, 0.5, 0.0), projectile))
            .id();

        world.run_system_once(update_flight_state).unwrap();
        let weapon = world.get::<ThrownWeapon>(dagger).unwrap();
        assert_eq!(weapon.state, FlightState::Embedded);
        assert_eq!(weapon.grounded_ticks, 4);

        world.despawn(block);
        world.run_system_once(update_flight_state).unwrap();

        let weapon = world.get::<ThrownWeapon>(dagger).unwrap();
        assert_eq!(weapon.state, FlightState::Flying);
        assert_eq!(weapon.embedded_in, None);
        assert_eq!(weapon.velocity, Vec3::ZERO);
        assert_eq!(weapon.grounded_ticks, 0);
    }
}
