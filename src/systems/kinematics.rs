//! Kinematics system - per-tick ballistic integration, orientation and age.

use bevy::prelude::*;

use crate::components::{FluidVolume, ThrownWeapon};
use crate::resources::ThrowConfig;
use crate::types::{FlightState, Orientation};

/// Velocities below this squared length keep the previous orientation.
const MIN_ORIENT_SPEED_SQ: f32 = 1.0e-4;

/// Advance every live projectile by one tick.
///
/// Stores the previous position for swept collision, then moves the projectile:
/// - `Flying`: ballistic step with drag and gravity
/// - `Returning`: straight move along the velocity set by homing
/// - `Embedded`: stays put
///
/// Fire on the weapon burns down by one tick, and is put out inside a fluid volume.
///
/// # Arguments
/// * `config` - Tunable constants
/// * `projectiles` - Projectiles to move
/// * `fluids` - Fluid regions, which change drag and extinguish fire
pub fn integrate_motion(
    config: Res<ThrowConfig>,
    mut projectiles: Query<(&mut Transform, &mut ThrownWeapon)>,
    fluids: Query<(&Transform, &FluidVolume), Without<ThrownWeapon>>,
) {
    for (mut transform, mut projectile) in projectiles.iter_mut() {
        if projectile.state.is_terminal() {
            continue;
        }

        let position = transform.translation;
        projectile.previous_position = position;

        let in_fluid = fluids
            .iter()
            .any(|(fluid_transform, fluid)| fluid.contains(fluid_transform.translation, position));

        if in_fluid {
            projectile.fire_ticks = 0;
        } else {
            projectile.fire_ticks = projectile.fire_ticks.saturating_sub(1);
        }

        match projectile.state {
            FlightState::Flying => {
                let (next_position, next_velocity) = ballistic_step(
                    position,
                    projectile.velocity,
                    in_fluid,
                    projectile.no_clip,
                    &config,
                );
                transform.translation = next_position;
                projectile.velocity = next_velocity;
            }
            FlightState::Returning => {
                transform.translation = position + projectile.velocity;
            }
            _ => {}
        }
    }
}

/// One tick of ballistic motion.
///
/// The projectile moves by its current velocity, then drag scales the velocity and gravity
/// pulls it down. No-clip projectiles are weightless.
///
/// # Arguments
/// * `position` - Position at the start of the tick
/// * `velocity` - Velocity at the start of the tick (blocks/tick)
/// * `in_fluid` - Whether the projectile is inside a fluid
/// * `no_clip` - Whether gravity is suspended
/// * `config` - Drag and gravity constants
///
/// # Returns
/// `(position, velocity)` at the end of the tick
pub fn ballistic_step(
    position: Vec3,
    velocity: Vec3,
    in_fluid: bool,
    no_clip: bool,
    config: &ThrowConfig,
) -> (Vec3, Vec3) {
    let next_position = position + velocity;
    let drag = if in_fluid {
        config.fluid_drag
    } else {
        config.air_drag
    };

    let mut next_velocity = velocity * drag;
    if !no_clip {
        next_velocity.y -= config.gravity;
    }
    (next_position, next_velocity)
}

/// Orientation that points the weapon along its velocity.
///
/// While returning the weapon points hilt-first: yaw is flipped by 180° and pitch negated.
///
/// # Returns
/// `None` when the projectile is embedded or too slow to have a direction, in which
/// case the previous orientation is kept.
pub fn orientation_for(velocity: Vec3, state: FlightState) -> Option<Orientation> {
    if state == FlightState::Embedded || velocity.length_squared() <= MIN_ORIENT_SPEED_SQ {
        return None;
    }

    let horizontal = (velocity.x * velocity.x + velocity.z * velocity.z).sqrt();
    let yaw = velocity.x.atan2(velocity.z).to_degrees();
    let pitch = velocity.y.atan2(horizontal).to_degrees();

    Some(if state == FlightState::Returning {
        Orientation {
            yaw: yaw + 180.0,
            pitch: -pitch,
        }
    } else {
        Orientation { yaw, pitch }
    })
}

/// Derive orientation, age and presentation time.
///
/// Runs after motion and collision so the orientation reflects the final velocity
/// of the tick.
pub fn update_presentation_state(
    config: Res<ThrowConfig>,
    mut projectiles: Query<(&mut Transform, &mut ThrownWeapon)>,
) {
    for (mut transform, mut projectile) in projectiles.iter_mut() {
        if projectile.state.is_terminal() {
            continue;
        }

        if let Some(orientation) = orientation_for(projectile.velocity, projectile.state) {
            projectile.orientation = orientation;
        }
        transform.rotation = projectile.orientation.to_quat();

        projectile.age += 1;
        projectile.seconds = projectile.age as f32 * config.tick_seconds();
    }
}
