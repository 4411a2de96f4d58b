use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use bevy_renet2::netcode::NetcodeClientPlugin;
use bevy_renet2::prelude::*;

use crate::events::{ProjectileRemoved, SnapshotMessage};
use crate::network::protocol::{Channel, ServerMessage};

pub struct ThrownWeaponsClientPlugin;

impl Plugin for ThrownWeaponsClientPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RenetClientPlugin);
        app.add_plugins(NetcodeClientPlugin);

        app.add_message::<SnapshotMessage>()
            .add_message::<ProjectileRemoved>()
            .add_systems(
                Update,
                client_receive_system.run_if(resource_exists::<RenetClient>),
            );
    }
}

/// Feed received server messages into the local observer path.
fn client_receive_system(
    mut client: ResMut<RenetClient>,
    mut snapshots: MessageWriter<SnapshotMessage>,
    mut removals: MessageWriter<ProjectileRemoved>,
) {
    if !client.is_connected() {
        return;
    }

    for channel in [Channel::Reliable, Channel::Unreliable] {
        while let Some(bytes) = client.receive_message(channel.id()) {
            match ServerMessage::decode(&bytes) {
                Ok(ServerMessage::Snapshot(snapshot)) => {
                    snapshots.write(SnapshotMessage(snapshot));
                }
                Ok(ServerMessage::Removed {
                    id,
                    reason,
                    position,
                }) => {
                    removals.write(ProjectileRemoved {
                        projectile: Entity::PLACEHOLDER,
                        id,
                        reason,
                        position: Vec3::from_array(position),
                    });
                }
                Err(err) => debug!("Ignoring malformed server message: {}", err),
            }
        }
    }
}
