//! Return homing - speed-ramped flight back to the owner's eye point.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::components::{Agent, ThrownWeapon};
use crate::events::CueEvent;
use crate::materials::MaterialTable;
use crate::resources::ThrowConfig;
use crate::types::{Cue, FlightState};

/// Result of one homing step.
///
/// # Fields
/// * `velocity` - Velocity for this tick
/// * `distance` - Distance to the target before moving
/// * `max_speed` - Speed bound for this tick
/// * `acceleration` - Largest speed change the ramp allows per tick
/// * `time_to_target` - Predicted ticks until arrival at the current speed
/// * `arrived` - Within pickup epsilon; velocity is zero
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HomingStep {
    pub velocity: Vec3,
    pub distance: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub time_to_target: f32,
    pub arrived: bool,
}

/// Compute the homing velocity toward `target`.
///
/// The speed bound scales with base speed and affinity level, and shrinks with the
/// remaining distance so the weapon slows down as it closes in. Speed ramps toward the
/// bound by at most `acceleration` per tick and is finally clamped to the remaining
/// distance so the weapon never flies past its owner.
///
/// # Arguments
/// * `position` - Current projectile position
/// * `velocity` - Current projectile velocity
/// * `target` - Owner eye point
/// * `base_speed` - Ranged velocity of the weapon's material
/// * `level` - Return affinity level
/// * `config` - Return multiplier, acceleration factor and pickup epsilon
pub fn homing_step(
    position: Vec3,
    velocity: Vec3,
    target: Vec3,
    base_speed: f32,
    level: u8,
    config: &ThrowConfig,
) -> HomingStep {
    let to_target = target - position;
    let distance = to_target.length();
    let level = level as f32;

    let max_speed = (config.return_speed_multiplier * base_speed * level).min(distance);
    let acceleration = config.return_accel_factor * base_speed * level;
    let current_speed = velocity.length();

    let time_to_target = if current_speed > f32::EPSILON {
        distance / current_speed
    } else {
        f32::INFINITY
    };

    if distance < config.pickup_epsilon {
        return HomingStep {
            velocity: Vec3::ZERO,
            distance,
            max_speed,
            acceleration,
            time_to_target,
            arrived: true,
        };
    }

    let ramped = if current_speed < max_speed {
        (current_speed + acceleration).min(max_speed)
    } else if current_speed > max_speed {
        (current_speed - acceleration).max(max_speed)
    } else {
        current_speed
    };
    let next_speed = ramped.min(distance);

    HomingStep {
        velocity: to_target / distance * next_speed,
        distance,
        max_speed,
        acceleration,
        time_to_target,
        arrived: false,
    }
}

/// Steer returning projectiles toward their owners.
///
/// Owner eligibility was settled by the lifecycle step earlier in the tick; a projectile
/// whose owner cannot be resolved here is left for the next lifecycle pass.
///
/// Fires the one-shot return launch cue on the first homing tick and the approach cue when
/// the weapon is predicted to arrive within `approach_cue_ticks`.
pub fn update_return_homing(
    config: Res<ThrowConfig>,
    materials: Res<MaterialTable>,
    mut cues: MessageWriter<CueEvent>,
    mut projectiles: Query<(Entity, &Transform, &mut ThrownWeapon)>,
    agents: Query<(&Transform, &Agent), Without<ThrownWeapon>>,
) {
    for (entity, transform, mut projectile) in projectiles.iter_mut() {
        if projectile.state != FlightState::Returning {
            continue;
        }
        let Some((owner_transform, owner)) =
            projectile.owner.and_then(|owner| agents.get(owner).ok())
        else {
            continue;
        };

        let position = transform.translation;
        let target = owner.eye_position(owner_transform.translation);
        let base_speed = materials
            .lookup(&projectile.weapon.kind)
            .map_or(config.fallback_base_speed, |params| params.ranged_velocity);
        let level = projectile.return_affinity_level;

        let step = homing_step(position, projectile.velocity, target, base_speed, level, &config);
        projectile.velocity = step.velocity;

        trace!(
            "Homing {:?}: distance {:.3}, speed {:.3}/{:.3}",
            entity,
            step.distance,
            step.velocity.length(),
            step.max_speed
        );

        if projectile.return_timer == 0 {
            cues.write(CueEvent::new(entity, Cue::ReturnLaunch, position));
        }

        if !projectile.approach_cue_played && step.time_to_target < config.approach_cue_ticks {
            projectile.approach_cue_played = true;
            cues.write(
                CueEvent::new(entity, Cue::ReturnApproach, position)
                    .with_volume(10.0)
                    .with_pitch(1.0 + 0.5 * level as f32),
            );
        }

        projectile.return_timer += 1;
    }
}
