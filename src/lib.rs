//! # Bevy Thrown Weapons
//!
//! Tick-based simulation of thrown, returning melee weapons for Bevy 0.18.
//!
//! ## Features
//! - Ballistic flight with drag, gravity and fluid handling
//! - Swept hit detection against agents and blocks (avian3d)
//! - Damage, knockback, ignition and deflection on agent hits
//! - Speed-ramped homing back to the thrower for weapons with return affinity
//! - Replication policy that scales update urgency and smoothing with speed
//! - Observer-side mirroring fed only by replicated snapshots
//! - Save/load of in-flight weapons
//!
//! ## Quick Start
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_thrown_weapons::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(ThrownWeaponsPluginGroup)
//!         .run();
//! }
//! ```

pub mod components;
pub mod events;
pub mod materials;
pub mod modifiers;
pub mod persistence;
pub mod presentation;
pub mod resources;
pub mod snapshot;
pub mod systems;
pub mod types;

#[cfg(feature = "netcode")]
pub mod network;


pub mod prelude {
    pub use crate::components::*;
    pub use crate::events::*;
    pub use crate::materials::{MaterialParameters, MaterialTable, DEFAULT_WEAPON_KIND};
    pub use crate::modifiers::{
        DamageSource, HookResponse, ModifierLookup, StandardModifiers, TargetProfile,
    };
    pub use crate::presentation::{ObserverRegistry, ObserverView};
    pub use crate::resources::*;
    pub use crate::snapshot::ProjectileSnapshot;
    pub use crate::types::*;
    pub use crate::{ObserverSet, ThrownWeaponSet, ThrownWeaponsPluginGroup};
    pub use crate::{ThrownWeaponsCorePlugin, ThrownWeaponsDebugPlugin, ThrownWeaponsObserverPlugin};

    #[cfg(feature = "netcode")]
    pub use crate::network::ThrownWeaponsNetworkPlugin;
}

use bevy::prelude::*;

/// Main plugin group that includes all thrown-weapon subsystems.
///
/// This plugin group bundles together:
/// - The authoritative simulation
/// - Observer-side mirroring
/// - Debug drawing
///
/// Headless servers add [`ThrownWeaponsCorePlugin`] alone; pure clients add
/// [`ThrownWeaponsObserverPlugin`] and feed it snapshots.
#[derive(Default)]
pub struct ThrownWeaponsPluginGroup;

impl PluginGroup for ThrownWeaponsPluginGroup {
    fn build(self) -> bevy::app::PluginGroupBuilder {
        bevy::app::PluginGroupBuilder::start::<Self>()
            .add(ThrownWeaponsCorePlugin)
            .add(ThrownWeaponsObserverPlugin)
            .add(ThrownWeaponsDebugPlugin)
    }
}

/// Ordering of the authoritative per-tick work in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrownWeaponSet {
    /// Released throws become projectiles
    Launch,
    /// Grounding, owner resolution, homing eligibility, drop and discard
    Lifecycle,
    /// Return homing velocity
    Homing,
    /// Ballistic integration
    Motion,
    /// Swept hit detection and resolution
    Collision,
    /// Pickup by agents
    Retrieval,
    /// Orientation and age
    Presentation,
    /// Replication policy and snapshot publishing
    Replication,
}

/// Observer-side mirroring, after the authoritative tick.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverSet;

/// Authoritative simulation plugin.
///
/// One `FixedUpdate` step is one simulation tick. The fixed timestep is set from
/// [`ThrowConfig::ticks_per_second`](resources::ThrowConfig), so insert a custom config
/// before adding this plugin.
///
/// # Systems
/// - `release_throws` - Spawns projectiles for throw requests
/// - `update_flight_state` - Lifecycle state machine
/// - `update_return_homing` - Homing velocity
/// - `integrate_motion` - Ballistic integration
/// - `detect_collisions` - Swept hits (requires avian3d's spatial query pipeline)
/// - `collect_thrown_weapons` - Pickup
/// - `update_presentation_state` - Orientation and age
/// - `publish_snapshots` - Replication policy
pub struct ThrownWeaponsCorePlugin;

impl Plugin for ThrownWeaponsCorePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<components::ThrownWeapon>()
            .register_type::<components::Agent>()
            .register_type::<components::AgentVelocity>()
            .register_type::<components::Health>()
            .register_type::<components::Burning>()
            .register_type::<components::Holdings>()
            .register_type::<components::WorldBlock>()
            .register_type::<components::FluidVolume>()
            .register_type::<components::LooseItem>()
            .register_type::<components::ReplicationState>()
            .register_type::<resources::ThrowConfig>()
            .init_resource::<resources::ThrowConfig>()
            .init_resource::<materials::MaterialTable>()
            .init_resource::<resources::Modifiers>()
            .add_message::<events::ThrowRequest>()
            .add_message::<events::HitEvent>()
            .add_message::<events::BlockHitEvent>()
            .add_message::<events::CueEvent>()
            .add_message::<events::ProjectileRemoved>()
            .add_message::<events::SnapshotMessage>();

        let ticks_per_second = app.world().resource::<resources::ThrowConfig>().ticks_per_second;
        app.insert_resource(Time::<Fixed>::from_hz(ticks_per_second as f64));

        app.configure_sets(
            FixedUpdate,
            (
                ThrownWeaponSet::Launch,
                ThrownWeaponSet::Lifecycle,
                ThrownWeaponSet::Homing,
                ThrownWeaponSet::Motion,
                ThrownWeaponSet::Collision,
                ThrownWeaponSet::Retrieval,
                ThrownWeaponSet::Presentation,
                ThrownWeaponSet::Replication,
            )
                .chain(),
        )
        .add_systems(
            FixedUpdate,
            (
                systems::launch::release_throws.in_set(ThrownWeaponSet::Launch),
                systems::logic::update_flight_state.in_set(ThrownWeaponSet::Lifecycle),
                systems::homing::update_return_homing.in_set(ThrownWeaponSet::Homing),
                systems::kinematics::integrate_motion.in_set(ThrownWeaponSet::Motion),
                systems::pickup::collect_thrown_weapons.in_set(ThrownWeaponSet::Retrieval),
                systems::kinematics::update_presentation_state
                    .in_set(ThrownWeaponSet::Presentation),
                systems::replication::publish_snapshots.in_set(ThrownWeaponSet::Replication),
            ),
        );

        // 3D Physics Systems
        #[cfg(feature = "dim3")]
        {
            use avian3d::prelude::SpatialQueryPipeline;
            app.add_systems(
                FixedUpdate,
                systems::collision::detect_collisions
                    .in_set(ThrownWeaponSet::Collision)
                    .run_if(resource_exists::<SpatialQueryPipeline>),
            );
        }
    }
}

/// Observer-side mirroring plugin.
///
/// Consumes [`SnapshotMessage`](events::SnapshotMessage) and
/// [`ProjectileRemoved`](events::ProjectileRemoved) only.
pub struct ThrownWeaponsObserverPlugin;

impl Plugin for ThrownWeaponsObserverPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<resources::ThrowConfig>()
            .init_resource::<presentation::ObserverRegistry>()
            .add_message::<events::SnapshotMessage>()
            .add_message::<events::ProjectileRemoved>()
            .configure_sets(FixedUpdate, ObserverSet.after(ThrownWeaponSet::Replication))
            .add_systems(
                FixedUpdate,
                (
                    presentation::despawn_removed_views,
                    presentation::apply_snapshots,
                    presentation::advance_observer_views,
                )
                    .chain()
                    .in_set(ObserverSet),
            );
    }
}

/// Debug plugin for thrown-weapon visualization.
pub struct ThrownWeaponsDebugPlugin;

impl Plugin for ThrownWeaponsDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, systems::debug::draw_thrown_weapon_debug);
    }
}
