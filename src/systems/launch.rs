//! Launch - turning a released throw into a projectile.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::components::{Agent, Holdings, ModifierKind, ReplicationState, ThrownWeapon};
use crate::events::{CueEvent, ThrowRequest};
use crate::materials::MaterialTable;
use crate::resources::{Modifiers, ThrowConfig};
use crate::systems::kinematics::orientation_for;
use crate::types::{Cue, FlightState, PickupPermission, WorldContext};

/// Launch speed for a weapon of `base_speed` with throw-speed affinity `level`.
///
/// Level 0 and 1 throw at base speed; every level above adds `step` times the base speed.
///
/// # Example
/// ```
/// use bevy_thrown_weapons::systems::launch::launch_speed;
///
/// assert!((launch_speed(1.8, 3, 0.5) - 3.6).abs() < 1e-6);
/// ```
pub fn launch_speed(base_speed: f32, level: u32, step: f32) -> f32 {
    if level >= 1 {
        base_speed * (1.0 + step * (level - 1) as f32)
    } else {
        base_speed
    }
}

/// Why a throw request did not produce a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrowRejection {
    UnknownThrower,
    EmptySlot,
    Undercharged,
    WouldBreak,
}

/// Spawn projectiles for released throws.
///
/// For every accepted request:
/// - The held weapon wears by one use, unless the thrower has unlimited resources
/// - A single-unit copy flies from the thrower's eye along its forward direction
/// - Throwers with unlimited resources keep the weapon and only they can absorb the
///   projectile; everyone else gives the weapon up and anyone may collect it
/// - Return affinity is snapshotted from the weapon on the authoritative side
pub fn release_throws(
    mut commands: Commands,
    config: Res<ThrowConfig>,
    materials: Res<MaterialTable>,
    modifiers: Res<Modifiers>,
    mut requests: MessageReader<ThrowRequest>,
    mut cues: MessageWriter<CueEvent>,
    mut throwers: Query<(&Transform, &Agent, &mut Holdings)>,
) {
    let lookup = modifiers.lookup();

    for request in requests.read() {
        let Ok((transform, agent, mut holdings)) = throwers.get_mut(request.thrower) else {
            debug!("Throw rejected: {:?}", ThrowRejection::UnknownThrower);
            continue;
        };
        let Some(held) = holdings.items.get_mut(request.slot) else {
            debug!("Throw rejected: {:?}", ThrowRejection::EmptySlot);
            continue;
        };
        if request.charge_ticks < config.min_charge_ticks {
            debug!(
                "Throw rejected: {:?} ({} ticks)",
                ThrowRejection::Undercharged,
                request.charge_ticks
            );
            continue;
        }

        let params = match materials.lookup(&held.kind) {
            Some(params) => params,
            None => {
                warn!(
                    "Unknown weapon kind {}, using {} stats (known kinds: {:?})",
                    held.kind,
                    materials.default_kind(),
                    materials.kinds().collect::<Vec<_>>()
                );
                materials.resolve(&held.kind)
            }
        };
        if held.will_break_next_use(params.durability) {
            debug!("Throw rejected: {:?}", ThrowRejection::WouldBreak);
            continue;
        }

        if !agent.unlimited_resources {
            held.wear(1);
        }
        let thrown = held.clone();
        let speed = launch_speed(
            params.ranged_velocity,
            lookup.throw_speed_level(&thrown),
            config.throw_speed_step,
        );

        let (permission, weapon) = if agent.unlimited_resources {
            (PickupPermission::OwnerOnly, thrown)
        } else {
            let taken = holdings.take(request.slot).unwrap_or(thrown);
            (PickupPermission::AnyAgent, taken)
        };

        let origin = agent.eye_position(transform.translation);
        let velocity = transform.forward().as_vec3() * speed;
        let affinity = lookup.return_affinity_level(&weapon, WorldContext::AUTHORITATIVE);
        let flame = weapon.level(ModifierKind::Flame) > 0;
        let kind = weapon.kind.clone();

        let mut projectile = ThrownWeapon::new(weapon, velocity)
            .with_owner(request.thrower)
            .with_return_affinity(affinity)
            .with_pickup(permission)
            .with_seed(request.seed);
        projectile.previous_position = origin;
        if let Some(orientation) = orientation_for(velocity, FlightState::Flying) {
            projectile.orientation = orientation;
        }
        if flame {
            projectile.ignite(config.flame_burn_ticks);
        }

        let entity = commands
            .spawn((
                Transform::from_translation(origin).with_rotation(projectile.orientation.to_quat()),
                projectile,
                ReplicationState::default(),
            ))
            .id();

        cues.write(CueEvent::new(entity, Cue::Throw, origin));
        info!(
            "{:?} threw {} at {:.2} blocks/tick (return affinity {})",
            request.thrower, kind, speed, affinity
        );
    }
}
