//! Replication policy - how urgently projectile state must reach observers.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::components::{ReplicationState, ThrownWeapon};
use crate::events::SnapshotMessage;
use crate::resources::ThrowConfig;
use crate::snapshot::ProjectileSnapshot;

/// Output of the replication policy for one tick.
///
/// # Fields
/// * `position_urgent` - Push the position now
/// * `velocity_urgent` - Observers resync exactly instead of interpolating
/// * `interpolation_steps` - Smoothing steps observers should apply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplicationDecision {
    pub position_urgent: bool,
    pub velocity_urgent: bool,
    pub interpolation_steps: u32,
}

impl Default for ReplicationDecision {
    fn default() -> Self {
        Self {
            position_urgent: false,
            velocity_urgent: false,
            interpolation_steps: 1,
        }
    }
}

/// Replication urgency as a pure function of velocity.
///
/// Velocity urgency implies position urgency. Smoothing shrinks as speed grows:
/// `steps = max(1, floor(base_steps / max(1, speed)))`.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_thrown_weapons::resources::ThrowConfig;
/// use bevy_thrown_weapons::systems::replication::replication_policy;
///
/// let decision = replication_policy(Vec3::new(0.0, 0.0, 3.0), &ThrowConfig::default());
/// assert!(decision.position_urgent && decision.velocity_urgent);
/// assert_eq!(decision.interpolation_steps, 1);
/// ```
pub fn replication_policy(velocity: Vec3, config: &ThrowConfig) -> ReplicationDecision {
    let speed_sq = velocity.length_squared();
    let velocity_urgent = speed_sq > config.velocity_urgency_speed_sq;
    let position_urgent = velocity_urgent || speed_sq > config.position_urgency_speed_sq;

    let speed = speed_sq.sqrt().max(1.0);
    let steps = (config.base_interpolation_steps as f32 / speed).floor() as u32;

    ReplicationDecision {
        position_urgent,
        velocity_urgent,
        interpolation_steps: steps.max(1),
    }
}

/// Evaluate the policy and publish snapshots.
///
/// A snapshot goes out when the position is urgent, when the flight state changed since
/// the last snapshot, or at least every `sync_interval_ticks`.
pub fn publish_snapshots(
    config: Res<ThrowConfig>,
    mut snapshots: MessageWriter<SnapshotMessage>,
    mut projectiles: Query<(Entity, &Transform, &ThrownWeapon, &mut ReplicationState)>,
) {
    for (entity, transform, projectile, mut replication) in projectiles.iter_mut() {
        if projectile.state.is_terminal() {
            continue;
        }

        let decision = replication_policy(projectile.velocity, &config);
        replication.position_urgent = decision.position_urgent;
        replication.velocity_urgent = decision.velocity_urgent;
        replication.interpolation_steps = decision.interpolation_steps;
        replication.ticks_since_sync += 1;

        let state_changed = replication.last_state != Some(projectile.state);
        if decision.position_urgent
            || state_changed
            || replication.ticks_since_sync >= config.sync_interval_ticks
        {
            snapshots.write(SnapshotMessage(ProjectileSnapshot::capture(
                entity,
                transform.translation,
                projectile,
                decision,
            )));
            replication.ticks_since_sync = 0;
            replication.last_state = Some(projectile.state);
        }
    }
}
