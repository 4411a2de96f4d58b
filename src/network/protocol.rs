use renet2::{ChannelConfig, SendType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::events::RemovalReason;
use crate::snapshot::{ProjectileSnapshot, SnapshotError};

pub const PROTOCOL_ID: u64 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Removals; must not be lost
    Reliable,
    /// Snapshots; a dropped one is superseded by the next
    Unreliable,
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> u8 {
        match channel {
            Channel::Reliable => 0,
            Channel::Unreliable => 1,
        }
    }
}

impl Channel {
    pub fn id(&self) -> u8 {
        (*self).into()
    }

    pub fn config() -> Vec<ChannelConfig> {
        vec![
            ChannelConfig {
                channel_id: Channel::Reliable.id(),
                max_memory_usage_bytes: 5 * 1024 * 1024,
                send_type: SendType::ReliableOrdered {
                    resend_time: Duration::from_millis(300),
                },
            },
            ChannelConfig {
                channel_id: Channel::Unreliable.id(),
                max_memory_usage_bytes: 5 * 1024 * 1024,
                send_type: SendType::Unreliable,
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    Snapshot(ProjectileSnapshot),
    Removed {
        id: u64,
        reason: RemovalReason,
        position: [f32; 3],
    },
}

impl ServerMessage {
    /// Channel this message travels on.
    pub fn channel(&self) -> Channel {
        match self {
            ServerMessage::Snapshot(_) => Channel::Unreliable,
            ServerMessage::Removed { .. } => Channel::Reliable,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(SnapshotError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(SnapshotError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removals_travel_reliably() {
        let message = ServerMessage::Removed {
            id: 9,
            reason: RemovalReason::Retrieved,
            position: [1.0, 2.0, 3.0],
        };
        assert_eq!(message.channel(), Channel::Reliable);
        let bytes = message.encode().unwrap();
        assert_eq!(ServerMessage::decode(&bytes).unwrap(), message);
        assert!(ServerMessage::decode(&[0xff; 3]).is_err());
    }
}
