//! Global resources for the thrown-weapon system.

use bevy::prelude::*;
use serde::Deserialize;
use thiserror::Error;

use crate::modifiers::{ModifierLookup, StandardModifiers};

/// Tunable constants of the simulation.
///
/// All motion values are per tick. Several constants changed between revisions of the
/// weapon they model, so every one of them is exposed here rather than hard-coded.
///
/// # Example
/// ```
/// use bevy_thrown_weapons::resources::ThrowConfig;
///
/// let config = ThrowConfig {
///     return_speed_multiplier: 0.75,
///     ..Default::default()
/// };
/// assert_eq!(config.ticks_per_second, 20.0);
/// ```
#[derive(Resource, Reflect, Clone, Debug, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct ThrowConfig {
    /// Simulation ticks per second
    pub ticks_per_second: f32,
    /// Downward acceleration (blocks/tick²)
    pub gravity: f32,
    /// Velocity retained per tick in air
    pub air_drag: f32,
    /// Velocity retained per tick inside fluid
    pub fluid_drag: f32,
    /// Grounded ticks after which the hit counts as resolved
    pub grounded_threshold: u32,
    /// Return speed cap = multiplier × base speed × affinity level
    pub return_speed_multiplier: f32,
    /// Return acceleration = factor × base speed × affinity level
    pub return_accel_factor: f32,
    /// Base speed used when the weapon's material cannot be resolved
    pub fallback_base_speed: f32,
    /// Distance to the owner's eye below which the weapon stops
    pub pickup_epsilon: f32,
    /// Predicted ticks-to-owner below which the approach cue fires
    pub approach_cue_ticks: f32,
    /// Extra distance beyond body width inside which non-player owners drop the homing weapon
    pub point_blank_margin: f32,
    /// Knockback scale `K`
    pub knockback_scale: f32,
    /// Minimum vertical knockback
    pub knockback_min_lift: f32,
    /// Per-axis velocity multiplier after an agent hit
    pub hit_damping: [f32; 3],
    /// Fraction of velocity kept (reversed) by the deflection off a struck agent
    pub deflection_restitution: f32,
    /// Yaw rotation range applied by the deflection (degrees)
    pub deflection_yaw_range: [f32; 2],
    /// Burn duration given to struck agents by a burning weapon (ticks)
    pub ignite_ticks: u32,
    /// Burn duration of a weapon thrown with the flame modifier (ticks)
    pub flame_burn_ticks: u32,
    /// Squared speed above which position is pushed immediately
    pub position_urgency_speed_sq: f32,
    /// Squared speed above which observers resync velocity every tick
    pub velocity_urgency_speed_sq: f32,
    /// Interpolation steps observers use for a stationary projectile
    pub base_interpolation_steps: u32,
    /// Snapshot is published at least this often (ticks)
    pub sync_interval_ticks: u32,
    /// Minimum charge before a throw is released (ticks)
    pub min_charge_ticks: u32,
    /// Launch speed gain per throw-speed level above the first
    pub throw_speed_step: f32,
    /// Reach added to body half-width when collecting a weapon
    pub pickup_reach: f32,
    /// Grounded age after which an unrecoverable embedded weapon is discarded (ticks)
    pub grounded_despawn_ticks: u32,
    /// Age after which a weapon still in free flight is discarded (ticks)
    pub max_flight_ticks: u32,
    /// Vertical offset of a dropped loose item
    pub drop_height_offset: f32,
    /// Debug visualization
    pub debug_draw: bool,
}

impl Default for ThrowConfig {
    /// Creates a default ThrowConfig.
    ///
    /// Default values:
    /// - 20 ticks per second
    /// - 0.05 gravity, 0.99 drag in air and fluid
    /// - Return cap 0.5 × base × level, acceleration 0.05 × base × level
    /// - Knockback scale 0.6 with 0.05 minimum lift
    /// - Position urgency above speed² 2.0, velocity urgency above speed² 8.0
    /// - 3 interpolation steps, periodic sync every 20 ticks
    /// - Free flight and grounded time both capped at 1200 ticks
    fn default() -> Self {
        Self {
            ticks_per_second: 20.0,
            gravity: 0.05,
            air_drag: 0.99,
            fluid_drag: 0.99,
            grounded_threshold: 4,
            return_speed_multiplier: 0.5,
            return_accel_factor: 0.05,
            fallback_base_speed: 2.0,
            pickup_epsilon: 0.01,
            approach_cue_ticks: 5.0,
            point_blank_margin: 1.0,
            knockback_scale: 0.6,
            knockback_min_lift: 0.05,
            hit_damping: [0.02, 0.2, 0.02],
            deflection_restitution: 0.5,
            deflection_yaw_range: [170.0, 190.0],
            ignite_ticks: 100,
            flame_burn_ticks: 2000,
            position_urgency_speed_sq: 2.0,
            velocity_urgency_speed_sq: 8.0,
            base_interpolation_steps: 3,
            sync_interval_ticks: 20,
            min_charge_ticks: 5,
            throw_speed_step: 0.5,
            pickup_reach: 0.5,
            grounded_despawn_ticks: 1200,
            max_flight_ticks: 1200,
            drop_height_offset: 0.1,
            debug_draw: false,
        }
    }
}

/// Errors raised while loading a [`ThrowConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error")]
    Parse(#[from] serde_json::Error),
    #[error("ticks_per_second must be positive (got {0})")]
    TickRate(f32),
}

impl ThrowConfig {
    /// Parses a JSON object of overrides; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.ticks_per_second.is_nan() || config.ticks_per_second <= 0.0 {
            return Err(ConfigError::TickRate(config.ticks_per_second));
        }
        Ok(config.sanitized())
    }

    /// Repairs inconsistent tunables.
    ///
    /// The velocity urgency threshold never drops below the position threshold, so a
    /// velocity-urgent projectile is always position-urgent too.
    pub fn sanitized(mut self) -> Self {
        self.position_urgency_speed_sq = self.position_urgency_speed_sq.max(0.0);
        self.velocity_urgency_speed_sq = self
            .velocity_urgency_speed_sq
            .max(self.position_urgency_speed_sq);
        self.base_interpolation_steps = self.base_interpolation_steps.max(1);
        self.sync_interval_ticks = self.sync_interval_ticks.max(1);
        self.max_flight_ticks = self.max_flight_ticks.max(1);
        self.return_speed_multiplier = self.return_speed_multiplier.max(0.0);
        self.return_accel_factor = self.return_accel_factor.max(0.0);
        self.knockback_scale = self.knockback_scale.max(0.0);
        self.pickup_epsilon = self.pickup_epsilon.max(f32::EPSILON);
        if self.deflection_yaw_range[0] > self.deflection_yaw_range[1] {
            self.deflection_yaw_range.swap(0, 1);
        }
        self
    }

    /// Fixed tick length.
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.ticks_per_second
    }
}

/// The modifier lookup the simulation consults.
///
/// Inserted at construction time; replace it to plug in custom enchantment rules.
#[derive(Resource)]
pub struct Modifiers(pub Box<dyn ModifierLookup>);

impl Default for Modifiers {
    fn default() -> Self {
        Self(Box::new(StandardModifiers::default()))
    }
}

impl Modifiers {
    pub fn new(lookup: impl ModifierLookup) -> Self {
        Self(Box::new(lookup))
    }

    pub fn lookup(&self) -> &dyn ModifierLookup {
        self.0.as_ref()
    }
}
