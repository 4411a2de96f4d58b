//! Common types and enums for the thrown-weapon system.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a thrown weapon.
///
/// A projectile starts `Flying`, becomes `Embedded` after striking a block and may enter
/// `Returning` once it has resolved its hit and carries return affinity. `Retrieved` and
/// `Discarded` are terminal: the entity is despawned in the same tick.
///
/// # Example
/// ```
/// use bevy_thrown_weapons::types::FlightState;
///
/// let state = FlightState::Flying;
/// assert!(state.is_airborne());
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Default, Reflect, Serialize, Deserialize,
)]
pub enum FlightState {
    #[default]
    /// Ballistic flight
    Flying,
    /// Stuck in a struck block
    Embedded,
    /// Homing back to the owner (no-clip)
    Returning,
    /// Picked up by an agent
    Retrieved,
    /// Removed without being collected
    Discarded,
}

impl FlightState {
    /// True while the projectile is moving through the world under its own motion.
    pub fn is_airborne(self) -> bool {
        matches!(self, Self::Flying | Self::Returning)
    }

    /// True once the projectile has left the simulation.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Retrieved | Self::Discarded)
    }

    /// Stable wire tag used by snapshots.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Flying => 0,
            Self::Embedded => 1,
            Self::Returning => 2,
            Self::Retrieved => 3,
            Self::Discarded => 4,
        }
    }

    /// Inverse of [`FlightState::as_u8`]; unknown tags decode as `Flying`.
    pub fn from_u8(tag: u8) -> Self {
        match tag {
            1 => Self::Embedded,
            2 => Self::Returning,
            3 => Self::Retrieved,
            4 => Self::Discarded,
            _ => Self::Flying,
        }
    }
}

/// Who may reclaim a projectile once it is retrievable.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Default, Reflect, Serialize, Deserialize,
)]
pub enum PickupPermission {
    /// Nobody, except the owner while the weapon is returning
    Disallowed,
    #[default]
    /// Any agent (the owner or, for ownerless projectiles, anyone)
    AnyAgent,
    /// Only the owner; nothing is added to their holdings
    OwnerOnly,
}

/// Capability tags an agent exposes to the simulation.
///
/// These replace "what kind of entity is this" checks.
///
/// # Fields
/// * `is_primary_controllable` - Player-like agents: they always chase their returning weapon
///   and may be disqualified as owners while spectating
/// * `is_hit_immune_to_followup` - Agents that absorb the hit; no on-hit follow-up is applied
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub struct AgentCapabilities {
    pub is_primary_controllable: bool,
    pub is_hit_immune_to_followup: bool,
}

impl AgentCapabilities {
    /// Capabilities of a player-controlled agent.
    pub fn player() -> Self {
        Self {
            is_primary_controllable: true,
            is_hit_immune_to_followup: false,
        }
    }

    /// Capabilities of an ordinary non-player agent.
    pub fn creature() -> Self {
        Self::default()
    }
}

/// Orientation derived from the velocity vector, in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Default, Reflect, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
}

impl Orientation {
    /// Rotation usable by a `Transform`.
    pub fn to_quat(self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            -self.pitch.to_radians(),
            0.0,
        )
    }
}

/// Audio/visual cue kinds emitted by the simulation.
///
/// Presentation layers map these to concrete sounds or particles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub enum Cue {
    /// Weapon left the thrower's hand
    Throw,
    /// Weapon struck an agent
    AgentImpact,
    /// Weapon struck a block
    GroundImpact,
    /// Homing started
    ReturnLaunch,
    /// Homing weapon is about to reach its owner
    ReturnApproach,
}

/// Whether the code runs on the authoritative side of the replication boundary.
///
/// Modifier lookups that depend on world state only answer on the authoritative side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldContext {
    pub authoritative: bool,
}

impl WorldContext {
    pub const AUTHORITATIVE: Self = Self {
        authoritative: true,
    };
    pub const OBSERVER: Self = Self {
        authoritative: false,
    };
}
