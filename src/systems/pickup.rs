//! Pickup - who may collect a thrown weapon, and collecting it.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::components::{Agent, Holdings, ThrownWeapon, WeaponInstance};
use crate::events::{ProjectileRemoved, RemovalReason};
use crate::resources::ThrowConfig;
use crate::types::{FlightState, PickupPermission};

/// Result of a pickup attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Pickup {
    /// The agent may not collect this projectile
    Denied,
    /// The projectile goes away; the collector never lost the weapon
    Absorb,
    /// The weapon goes into the collector's holdings
    Collect(WeaponInstance),
}

/// Decide whether `collector` may collect `projectile`.
///
/// Only embedded or returning projectiles can be collected, and only by their owner or,
/// for ownerless projectiles, by anyone. A returning weapon always goes back to its owner,
/// whatever its pickup permission says.
///
/// # Arguments
/// * `projectile` - The projectile
/// * `collector` - Agent entity touching it
/// * `collector_unlimited` - Whether the collector is in an unlimited-resource mode
pub fn evaluate_pickup(
    projectile: &ThrownWeapon,
    collector: Entity,
    collector_unlimited: bool,
) -> Pickup {
    let retrievable = projectile.state == FlightState::Embedded || projectile.no_clip;
    if !retrievable || projectile.state.is_terminal() {
        return Pickup::Denied;
    }

    let owned = projectile.owner == Some(collector);
    if !owned && projectile.owner.is_some() {
        return Pickup::Denied;
    }

    match projectile.pickup_permission {
        PickupPermission::AnyAgent => return Pickup::Collect(projectile.weapon.clone()),
        PickupPermission::OwnerOnly if collector_unlimited => return Pickup::Absorb,
        _ => {}
    }

    if projectile.no_clip && owned {
        Pickup::Collect(projectile.weapon.clone())
    } else {
        Pickup::Denied
    }
}

/// Whether `point` is within reach of an agent standing at `origin`.
///
/// Reach is measured to the segment from the agent's feet to its eyes.
pub fn within_reach(point: Vec3, origin: Vec3, agent: &Agent, reach: f32) -> bool {
    let eye = agent.eye_position(origin);
    let segment = eye - origin;
    let t = if segment.length_squared() > f32::EPSILON {
        ((point - origin).dot(segment) / segment.length_squared()).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = origin + segment * t;
    point.distance(closest) <= agent.width * 0.5 + reach
}

/// Let agents collect thrown weapons within reach.
///
/// The owner is tried first; other agents only matter for ownerless projectiles.
pub fn collect_thrown_weapons(
    mut commands: Commands,
    config: Res<ThrowConfig>,
    mut removals: MessageWriter<ProjectileRemoved>,
    mut projectiles: Query<(Entity, &Transform, &mut ThrownWeapon)>,
    mut agents: Query<(Entity, &Transform, &Agent, Option<&mut Holdings>), Without<ThrownWeapon>>,
) {
    for (entity, transform, mut projectile) in projectiles.iter_mut() {
        if projectile.state.is_terminal() {
            continue;
        }
        let position = transform.translation;

        let mut candidates: Vec<Entity> = agents
            .iter()
            .filter(|(_, agent_transform, agent, _)| {
                agent.alive
                    && within_reach(
                        position,
                        agent_transform.translation,
                        agent,
                        config.pickup_reach,
                    )
            })
            .map(|(agent_entity, ..)| agent_entity)
            .collect();
        candidates.sort_by_key(|candidate| Some(*candidate) != projectile.owner);

        for collector in candidates {
            let Ok((_, _, agent, holdings)) = agents.get_mut(collector) else {
                continue;
            };

            let decision = evaluate_pickup(&projectile, collector, agent.unlimited_resources);
            let collected = match decision {
                Pickup::Denied => false,
                Pickup::Absorb => true,
                Pickup::Collect(weapon) => match holdings {
                    Some(mut holdings) => {
                        holdings.insert(weapon);
                        true
                    }
                    None => false,
                },
            };

            if collected {
                info!("{:?} collected {:?} ({})", collector, entity, projectile.weapon.kind);
                projectile.state = FlightState::Retrieved;
                commands.entity(entity).despawn();
                removals.write(ProjectileRemoved::new(entity, RemovalReason::Retrieved, position));
                break;
            }
        }
    }
}
