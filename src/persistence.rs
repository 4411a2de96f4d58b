//! Save/load of in-flight thrown weapons.
//!
//! The record keeps what cannot be re-derived. Return affinity is not stored: it is
//! recomputed from the weapon instance on load, so a weapon whose modifiers changed comes
//! back with the new level. Owners are stored by [`Agent::id`], never by entity.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{Agent, ReplicationState, ThrownWeapon, WeaponInstance};
use crate::modifiers::ModifierLookup;
use crate::resources::Modifiers;
use crate::types::{FlightState, PickupPermission, WorldContext};

/// Errors raised while saving or loading thrown weapons.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("thrown weapon record could not be encoded")]
    Encode(#[source] serde_json::Error),
    #[error("thrown weapon record could not be decoded")]
    Decode(#[source] serde_json::Error),
    #[error("modifier lookup resource is missing")]
    MissingModifiers,
}

/// Persisted compound record of one thrown weapon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThrownWeaponRecord {
    pub dealt_damage: bool,
    pub weapon: WeaponInstance,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub state: FlightState,
    pub grounded_ticks: u32,
    pub age: u32,
    pub pickup: PickupPermission,
    #[serde(default)]
    pub owner_id: Option<u64>,
    #[serde(default)]
    pub no_clip: bool,
    #[serde(default)]
    pub fire_ticks: u32,
    #[serde(default)]
    pub has_hit: bool,
}

impl ThrownWeaponRecord {
    /// Capture a projectile; `owner_id` is the owner's [`Agent::id`] if it resolved.
    pub fn capture(position: Vec3, projectile: &ThrownWeapon, owner_id: Option<u64>) -> Self {
        Self {
            dealt_damage: projectile.dealt_damage,
            weapon: projectile.weapon.clone(),
            position: position.to_array(),
            velocity: projectile.velocity.to_array(),
            state: projectile.state,
            grounded_ticks: projectile.grounded_ticks,
            age: projectile.age,
            pickup: projectile.pickup_permission,
            owner_id,
            no_clip: projectile.no_clip,
            fire_ticks: projectile.fire_ticks,
            has_hit: projectile.has_hit,
        }
    }

    /// Rebuild the projectile.
    ///
    /// Return affinity is re-derived from the weapon instance; a returning weapon that lost
    /// its affinity comes back in free flight. An embedded projectile is restored without
    /// its block reference and stays embedded.
    ///
    /// # Arguments
    /// * `lookup` - Modifier lookup used to re-derive return affinity
    /// * `resolve_owner` - Maps a persisted owner id to a live agent entity
    pub fn restore(
        &self,
        lookup: &dyn ModifierLookup,
        resolve_owner: impl FnOnce(u64) -> Option<Entity>,
    ) -> (Transform, ThrownWeapon) {
        let position = Vec3::from_array(self.position);
        let affinity = lookup.return_affinity_level(&self.weapon, WorldContext::AUTHORITATIVE);

        let mut projectile = ThrownWeapon::new(self.weapon.clone(), Vec3::from_array(self.velocity))
            .with_return_affinity(affinity)
            .with_pickup(self.pickup);
        projectile.owner = self.owner_id.and_then(resolve_owner);
        projectile.dealt_damage = self.dealt_damage;
        projectile.state = self.state;
        projectile.grounded_ticks = self.grounded_ticks;
        projectile.age = self.age;
        projectile.no_clip = self.no_clip;
        projectile.fire_ticks = self.fire_ticks;
        projectile.has_hit = self.has_hit;
        projectile.previous_position = position;
        if affinity == 0 && self.state == FlightState::Returning {
            // Nothing pulls it home any more; let it fall.
            projectile.state = FlightState::Flying;
            projectile.no_clip = false;
        }

        (Transform::from_translation(position), projectile)
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string(self).map_err(PersistenceError::Encode)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(json).map_err(PersistenceError::Decode)
    }
}

/// Capture every live thrown weapon in `world` as a JSON array.
pub fn save_thrown_weapons(world: &mut World) -> Result<String, PersistenceError> {
    let mut agents = world.query::<&Agent>();
    let mut projectiles = world.query::<(&Transform, &ThrownWeapon)>();

    let records: Vec<ThrownWeaponRecord> = projectiles
        .iter(world)
        .filter(|(_, projectile)| !projectile.state.is_terminal())
        .map(|(transform, projectile)| {
            let owner_id = projectile
                .owner
                .and_then(|owner| agents.get(world, owner).ok())
                .map(|agent| agent.id);
            ThrownWeaponRecord::capture(transform.translation, projectile, owner_id)
        })
        .collect();

    debug!("Saving {} thrown weapons", records.len());
    serde_json::to_string(&records).map_err(PersistenceError::Encode)
}

/// Spawn thrown weapons from a JSON array produced by [`save_thrown_weapons`].
///
/// Owners are matched by [`Agent::id`] against the agents currently in `world`.
pub fn load_thrown_weapons(world: &mut World, json: &str) -> Result<Vec<Entity>, PersistenceError> {
    let records: Vec<ThrownWeaponRecord> =
        serde_json::from_str(json).map_err(PersistenceError::Decode)?;

    let owners: Vec<(u64, Entity)> = world
        .query::<(Entity, &Agent)>()
        .iter(world)
        .map(|(entity, agent)| (agent.id, entity))
        .collect();

    let restored: Vec<(Transform, ThrownWeapon)> = {
        let modifiers = world
            .get_resource::<Modifiers>()
            .ok_or(PersistenceError::MissingModifiers)?;
        records
            .iter()
            .map(|record| {
                record.restore(modifiers.lookup(), |id| {
                    owners.iter().find(|(agent_id, _)| *agent_id == id).map(|(_, e)| *e)
                })
            })
            .collect()
    };

    let entities: Vec<Entity> = restored
        .into_iter()
        .map(|(transform, projectile)| {
            world
                .spawn((transform, projectile, ReplicationState::default()))
                .id()
        })
        .collect();

    info!("Restored {} thrown weapons", entities.len());
    Ok(entities)
}
