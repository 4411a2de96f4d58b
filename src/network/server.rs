use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use bevy_renet2::netcode::NetcodeServerPlugin;
use bevy_renet2::prelude::*;

use crate::events::{ProjectileRemoved, SnapshotMessage};
use crate::network::protocol::ServerMessage;

pub struct ThrownWeaponsServerPlugin;

impl Plugin for ThrownWeaponsServerPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RenetServerPlugin);
        app.add_plugins(NetcodeServerPlugin);

        app.add_message::<SnapshotMessage>()
            .add_message::<ProjectileRemoved>()
            .add_systems(
                Update,
                (
                    server_update_system,
                    broadcast_projectile_state.run_if(resource_exists::<RenetServer>),
                ),
            );
    }
}

fn server_update_system(mut server_events: MessageReader<ServerEvent>) {
    for event in server_events.read() {
        match event {
            ServerEvent::ClientConnected { client_id } => {
                info!("Client {} connected", client_id);
            }
            ServerEvent::ClientDisconnected { client_id, reason } => {
                info!("Client {} disconnected: {}", client_id, reason);
            }
        }
    }
}

/// Push snapshots and removals to every client.
fn broadcast_projectile_state(
    mut server: ResMut<RenetServer>,
    mut snapshots: MessageReader<SnapshotMessage>,
    mut removals: MessageReader<ProjectileRemoved>,
) {
    let outgoing = snapshots
        .read()
        .map(|SnapshotMessage(snapshot)| ServerMessage::Snapshot(snapshot.clone()))
        .chain(removals.read().map(|removal| ServerMessage::Removed {
            id: removal.id,
            reason: removal.reason,
            position: removal.position.to_array(),
        }));

    for message in outgoing {
        match message.encode() {
            Ok(bytes) => server.broadcast_message(message.channel().id(), bytes),
            Err(err) => warn!("Dropping outgoing projectile message: {}", err),
        }
    }
}
