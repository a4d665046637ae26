use serde::{Deserialize, Serialize};

use flipshot_core::ids::{BallId, PaddleId};
use flipshot_core::math::Vec3;

use crate::ball::BallState;

#[derive(Debug)]
pub enum SnapshotError {
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerializeError(e) => write!(f, "snapshot serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "snapshot deserialize error: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<rmp_serde::encode::Error> for SnapshotError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Self::SerializeError(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for SnapshotError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Self::DeserializeError(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub id: BallId,
    pub state: BallState,
    pub position: Vec3,
    pub velocity: Vec3,
    pub assist: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaddleSnapshot {
    pub id: PaddleId,
    pub angle: f32,
    pub progress: f32,
    pub pending: usize,
    pub lift: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LauncherSnapshot {
    pub dragging: bool,
    pub active_ball: Option<BallId>,
    pub drag_vector: Vec3,
    pub preview: Vec<Vec3>,
}

/// Point-in-time view of a table for rendering, replay or reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub tick: u64,
    pub paused: bool,
    pub balls: Vec<BallSnapshot>,
    pub paddles: Vec<PaddleSnapshot>,
    pub launcher: LauncherSnapshot,
}

impl TableSnapshot {
    /// MessagePack encoding.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(rmp_serde::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = TableSnapshot::decode(&[0xc1, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, SnapshotError::DeserializeError(_)));
        assert!(err.to_string().starts_with("snapshot deserialize error"));
    }

    #[test]
    fn encoded_snapshot_decodes() {
        let snapshot = TableSnapshot {
            tick: 42,
            paused: true,
            balls: vec![BallSnapshot {
                id: BallId(1),
                state: BallState::Launched,
                position: Vec3::new(1.0, 2.0, 3.0),
                velocity: Vec3::Y,
                assist: true,
            }],
            paddles: vec![],
            launcher: LauncherSnapshot::default(),
        };
        let bytes = snapshot.encode().unwrap();
        assert_eq!(TableSnapshot::decode(&bytes).unwrap(), snapshot);
    }
}
