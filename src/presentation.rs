//! Observer-side mirroring of thrown weapons.
//!
//! Observers never touch the authoritative [`ThrownWeapon`](crate::components::ThrownWeapon)
//! entities. They keep their own [`ObserverView`] entities fed only by
//! [`SnapshotMessage`]s, and derive orientation with the same pure function the
//! authoritative side uses. Nothing here applies damage, removes items or mutates
//! persistent state.

use std::collections::HashMap;

use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use crate::events::{ProjectileRemoved, SnapshotMessage};
use crate::resources::ThrowConfig;
use crate::snapshot::ProjectileSnapshot;
use crate::systems::kinematics::orientation_for;
use crate::types::{FlightState, Orientation};

/// Observer-side mirror of one projectile.
///
/// # Fields
/// * `id` - Snapshot id of the mirrored projectile
/// * `position` - Rendered position
/// * `velocity` - Last replicated velocity, used for prediction
/// * `target` - Replicated position being interpolated toward
/// * `steps_remaining` - Interpolation steps left before reaching `target`
/// * `state` - Last replicated flight state
/// * `orientation` - Derived from velocity
/// * `age`, `seconds` - Presentation time
/// * `has_hit`, `is_enchanted_visual` - Replicated presentation flags
#[derive(Component, Clone, Debug)]
pub struct ObserverView {
    pub id: u64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub target: Vec3,
    pub steps_remaining: u32,
    pub state: FlightState,
    pub orientation: Orientation,
    pub age: u32,
    pub seconds: f32,
    pub has_hit: bool,
    pub is_enchanted_visual: bool,
    pub weapon_kind: String,
}

impl ObserverView {
    /// A view placed exactly where the snapshot says.
    pub fn from_snapshot(snapshot: &ProjectileSnapshot) -> Self {
        let mut view = Self {
            id: snapshot.id,
            position: snapshot.position(),
            velocity: snapshot.velocity(),
            target: snapshot.position(),
            steps_remaining: 0,
            state: snapshot.flight_state(),
            orientation: Orientation::default(),
            age: snapshot.age,
            seconds: 0.0,
            has_hit: snapshot.has_hit,
            is_enchanted_visual: snapshot.is_enchanted_visual,
            weapon_kind: snapshot.weapon_kind.clone(),
        };
        if let Some(orientation) = orientation_for(view.velocity, view.state) {
            view.orientation = orientation;
        }
        view
    }

    /// Fold a newer snapshot into the view.
    ///
    /// Velocity-urgent snapshots snap the view into place; others are approached over the
    /// advertised number of interpolation steps.
    pub fn apply(&mut self, snapshot: &ProjectileSnapshot) {
        self.velocity = snapshot.velocity();
        self.state = snapshot.flight_state();
        self.age = snapshot.age;
        self.has_hit = snapshot.has_hit;
        self.is_enchanted_visual = snapshot.is_enchanted_visual;
        self.target = snapshot.position();

        if snapshot.velocity_urgent {
            self.position = self.target;
            self.steps_remaining = 0;
        } else {
            self.steps_remaining = snapshot.interpolation_steps.max(1);
        }
    }

    /// Advance the view by one tick.
    pub fn advance(&mut self, ticks_per_second: f32) {
        if self.steps_remaining > 0 {
            self.position += (self.target - self.position) / self.steps_remaining as f32;
            self.steps_remaining -= 1;
        } else if self.state.is_airborne() {
            self.position += self.velocity;
        }

        if let Some(orientation) = orientation_for(self.velocity, self.state) {
            self.orientation = orientation;
        }
        self.age += 1;
        self.seconds = self.age as f32 / ticks_per_second;
    }
}

/// Maps snapshot ids to observer view entities.
#[derive(Resource, Default, Debug)]
pub struct ObserverRegistry {
    views: HashMap<u64, Entity>,
}

impl ObserverRegistry {
    pub fn get(&self, id: u64) -> Option<Entity> {
        self.views.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// Create or update views from received snapshots.
pub fn apply_snapshots(
    mut commands: Commands,
    mut registry: ResMut<ObserverRegistry>,
    mut snapshots: MessageReader<SnapshotMessage>,
    mut views: Query<&mut ObserverView>,
) {
    for SnapshotMessage(snapshot) in snapshots.read() {
        if let Some(entity) = registry.get(snapshot.id) {
            // A view spawned earlier in this batch is not queryable yet; the next
            // snapshot catches it up.
            if let Ok(mut view) = views.get_mut(entity) {
                view.apply(snapshot);
            }
            continue;
        }

        let view = ObserverView::from_snapshot(snapshot);
        let entity = commands
            .spawn((
                Transform::from_translation(view.position)
                    .with_rotation(view.orientation.to_quat()),
                view,
            ))
            .id();
        trace!("Observer view {:?} for projectile {}", entity, snapshot.id);
        registry.views.insert(snapshot.id, entity);
    }
}

/// Step every view and copy it into its transform.
pub fn advance_observer_views(
    config: Res<ThrowConfig>,
    mut views: Query<(&mut Transform, &mut ObserverView)>,
) {
    for (mut transform, mut view) in views.iter_mut() {
        view.advance(config.ticks_per_second);
        transform.translation = view.position;
        transform.rotation = view.orientation.to_quat();
    }
}

/// Drop views of projectiles that left the simulation.
pub fn despawn_removed_views(
    mut commands: Commands,
    mut registry: ResMut<ObserverRegistry>,
    mut removals: MessageReader<ProjectileRemoved>,
) {
    for removal in removals.read() {
        if let Some(entity) = registry.views.remove(&removal.id) {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ThrownWeapon, WeaponInstance};
    use crate::systems::replication::ReplicationDecision;

    fn snapshot(
        position: Vec3,
        velocity: Vec3,
        velocity_urgent: bool,
        steps: u32,
    ) -> ProjectileSnapshot {
        let mut projectile = ThrownWeapon::new(WeaponInstance::new("iron_dagger"), velocity);
        projectile.state = FlightState::Flying;
        ProjectileSnapshot::capture(
            Entity::PLACEHOLDER,
            position,
            &projectile,
            ReplicationDecision {
                position_urgent: velocity_urgent,
                velocity_urgent,
                interpolation_steps: steps,
            },
        )
    }

    #[test]
    fn test_urgent_snapshot_snaps_view() {
        let mut view = ObserverView::from_snapshot(&snapshot(Vec3::ZERO, Vec3::Z, false, 3));
        view.apply(&snapshot(Vec3::new(0.0, 0.0, 8.0), Vec3::Z * 4.0, true, 1));
        assert_eq!(view.position, Vec3::new(0.0, 0.0, 8.0));
        assert_eq!(view.steps_remaining, 0);
    }

    #[test]
    fn test_smooth_snapshot_interpolates_over_steps() {
        let mut view = ObserverView::from_snapshot(&snapshot(Vec3::ZERO, Vec3::ZERO, false, 3));
        view.apply(&snapshot(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO, false, 3));

        view.advance(20.0);
        assert!((view.position.x - 1.0).abs() < 1e-5);
        view.advance(20.0);
        view.advance(20.0);
        assert!((view.position.x - 3.0).abs() < 1e-5);
        assert_eq!(view.steps_remaining, 0);
    }

    #[test]
    fn test_view_predicts_and_orients() {
        let mut view = ObserverView::from_snapshot(&snapshot(Vec3::ZERO, Vec3::X, false, 1));
        view.advance(20.0);
        assert_eq!(view.position, Vec3::X);
        assert!((view.orientation.yaw - 90.0).abs() < 1e-3);
        assert_eq!(view.age, 1);
    }
}
