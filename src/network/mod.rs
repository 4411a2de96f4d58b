//! Snapshot transport over renet2.
//!
//! The server forwards every [`SnapshotMessage`](crate::events::SnapshotMessage) and
//! [`ProjectileRemoved`](crate::events::ProjectileRemoved) to all clients; clients write them
//! back into their own world for the observer plugin to consume.

use bevy::prelude::*;

pub mod client;
pub mod protocol;
pub mod server;

pub struct ThrownWeaponsNetworkPlugin;

impl Plugin for ThrownWeaponsNetworkPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(server::ThrownWeaponsServerPlugin);
        app.add_plugins(client::ThrownWeaponsClientPlugin);
    }
}
