//! Replicated projectile snapshot and its wire codec.
//!
//! A snapshot is the only thing that crosses from the authoritative simulation to
//! observers. Vectors travel as plain arrays.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::ThrownWeapon;
use crate::systems::replication::ReplicationDecision;
use crate::types::FlightState;

/// Errors raised by the snapshot codec.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed")]
    Encode(#[source] bincode::Error),
    #[error("snapshot decoding failed")]
    Decode(#[source] bincode::Error),
}

/// Replicated state of one projectile.
///
/// # Fields
/// * `id` - Stable projectile id (`Entity::to_bits` on the authoritative side)
/// * `position`, `velocity` - Kinematic state
/// * `state` - Wire tag of the [`FlightState`]
/// * `age` - Ticks since spawn
/// * `return_affinity_level` - Drives return cues on observers
/// * `is_enchanted_visual`, `has_hit`, `no_clip` - Presentation flags
/// * `position_urgent`, `velocity_urgent`, `interpolation_steps` - Replication policy output
/// * `weapon_kind` - Material kind, for choosing a model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub state: u8,
    pub age: u32,
    pub return_affinity_level: u8,
    pub is_enchanted_visual: bool,
    pub has_hit: bool,
    pub no_clip: bool,
    pub position_urgent: bool,
    pub velocity_urgent: bool,
    pub interpolation_steps: u32,
    pub weapon_kind: String,
}

impl ProjectileSnapshot {
    /// Capture the current state of a projectile.
    pub fn capture(
        entity: Entity,
        position: Vec3,
        projectile: &ThrownWeapon,
        decision: ReplicationDecision,
    ) -> Self {
        Self {
            id: entity.to_bits(),
            position: position.to_array(),
            velocity: projectile.velocity.to_array(),
            state: projectile.state.as_u8(),
            age: projectile.age,
            return_affinity_level: projectile.return_affinity_level,
            is_enchanted_visual: projectile.is_enchanted_visual,
            has_hit: projectile.has_hit,
            no_clip: projectile.no_clip,
            position_urgent: decision.position_urgent,
            velocity_urgent: decision.velocity_urgent,
            interpolation_steps: decision.interpolation_steps,
            weapon_kind: projectile.weapon.kind.clone(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec3 {
        Vec3::from_array(self.velocity)
    }

    pub fn flight_state(&self) -> FlightState {
        FlightState::from_u8(self.state)
    }

    /// Encode with bincode.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(SnapshotError::Encode)
    }

    /// Decode from bincode bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(SnapshotError::Decode)
    }
}
