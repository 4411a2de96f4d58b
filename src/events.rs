//! Messages for the thrown-weapon system.
//!
//! Note: In Bevy 0.18, buffered events use the `Message` trait instead of `Event`.

use bevy::ecs::message::Message;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::snapshot::ProjectileSnapshot;
use crate::types::Cue;

/// Request to release a charged throw.
///
/// Sent by the external "use" state machine once the thrower lets go of the weapon.
///
/// # Fields
/// * `thrower` - Agent entity releasing the throw
/// * `slot` - Index into the thrower's [`Holdings`](crate::components::Holdings)
/// * `charge_ticks` - How long the throw was charged
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_thrown_weapons::events::ThrowRequest;
///
/// let request = ThrowRequest::new(Entity::PLACEHOLDER, 0).with_charge(12);
/// assert_eq!(request.charge_ticks, 12);
/// ```
#[derive(Message, Clone, Debug)]
pub struct ThrowRequest {
    pub thrower: Entity,
    pub slot: usize,
    pub charge_ticks: u32,
    /// Seed for the projectile's deflection jitter
    pub seed: u64,
}

impl ThrowRequest {
    /// Creates a request with no charge; use [`ThrowRequest::with_charge`] to set it.
    pub fn new(thrower: Entity, slot: usize) -> Self {
        Self {
            thrower,
            slot,
            charge_ticks: 0,
            seed: 0,
        }
    }

    /// Builder pattern: set charge duration
    pub fn with_charge(mut self, ticks: u32) -> Self {
        self.charge_ticks = ticks;
        self
    }

    /// Builder pattern: set deflection seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// A thrown weapon struck an agent.
///
/// Written after damage was applied. This is the generic on-hit callback: gameplay code
/// reacts to it (hurt animations, statistics) without the simulation knowing about it.
///
/// # Fields
/// * `projectile` - Projectile entity that hit
/// * `target` - Struck agent
/// * `attacker` - Owner of the projectile, or the projectile itself when ownerless
/// * `impact_point` - Projectile position at impact
/// * `velocity` - Projectile velocity at impact
/// * `damage` - Damage applied
/// * `knockback` - Impulse added to the target's velocity
#[derive(Message, Clone, Debug)]
pub struct HitEvent {
    pub projectile: Entity,
    pub target: Entity,
    pub attacker: Entity,
    pub impact_point: Vec3,
    pub velocity: Vec3,
    pub damage: f32,
    pub knockback: Vec3,
}

/// A thrown weapon struck a block and embedded in it.
#[derive(Message, Clone, Debug)]
pub struct BlockHitEvent {
    pub projectile: Entity,
    pub block: Entity,
    /// Hit point clamped into the block's bounds
    pub point: Vec3,
    pub normal: Vec3,
}

/// An audio/visual cue for the presentation layer.
///
/// # Fields
/// * `projectile` - Source projectile
/// * `cue` - Which cue
/// * `position` - Where it plays
/// * `volume` - Loudness factor
/// * `pitch` - Pitch factor
#[derive(Message, Clone, Debug)]
pub struct CueEvent {
    pub projectile: Entity,
    pub cue: Cue,
    pub position: Vec3,
    pub volume: f32,
    pub pitch: f32,
}

impl CueEvent {
    /// A cue at unit volume and pitch.
    pub fn new(projectile: Entity, cue: Cue, position: Vec3) -> Self {
        Self {
            projectile,
            cue,
            position,
            volume: 1.0,
            pitch: 1.0,
        }
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

/// Why a projectile left the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Collected by an agent
    Retrieved,
    /// Owner gone; left behind as a loose item
    Dropped,
    /// Removed without a trace (point-blank, grounded too long, hook request, ownerless)
    Discarded,
}

/// A projectile was despawned.
///
/// `id` is the same identifier carried by [`ProjectileSnapshot::id`] so observers can drop
/// their mirrored view. On a remote observer `projectile` is `Entity::PLACEHOLDER`.
#[derive(Message, Clone, Debug)]
pub struct ProjectileRemoved {
    pub projectile: Entity,
    pub id: u64,
    pub reason: RemovalReason,
    pub position: Vec3,
}

impl ProjectileRemoved {
    pub fn new(projectile: Entity, reason: RemovalReason, position: Vec3) -> Self {
        Self {
            projectile,
            id: projectile.to_bits(),
            reason,
            position,
        }
    }
}

/// Replicated projectile state pushed from the authoritative side to observers.
#[derive(Message, Clone, Debug)]
pub struct SnapshotMessage(pub ProjectileSnapshot);
