use crate::protocol::{CurrentModelResponse, MessageType, MoveModel};
use crate::rpc::{PendingResponse, RpcError, Transport, VtsLink, to_payload};
use serde::{Deserialize, Serialize};

/// Avatar placement in remote space: position, rotation in degrees, size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AvatarPose {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub size: f32,
}

impl AvatarPose {
    pub fn new(x: f32, y: f32, rotation: f32, size: f32) -> Self {
        Self {
            x,
            y,
            rotation,
            size,
        }
    }

    /// Absolute, immediate move back to this pose.
    pub fn restore(&self) -> MoveModel {
        MoveModel::to(self.x, self.y, self.rotation, self.size)
    }
}

pub struct Avatar<T> {
    link: VtsLink<T>,
}

impl<T> Clone for Avatar<T> {
    fn clone(&self) -> Self {
        Self {
            link: self.link.clone(),
        }
    }
}

impl<T: Transport> Avatar<T> {
    pub fn new(link: VtsLink<T>) -> Self {
        Self { link }
    }

    pub async fn get_pose(&self) -> Result<AvatarPose, RpcError> {
        let response: CurrentModelResponse =
            self.link.call(MessageType::CurrentModelRequest, None).await?;
        let position = response.model_position;
        Ok(AvatarPose::new(
            position.position_x,
            position.position_y,
            position.rotation,
            position.size,
        ))
    }

    /// Sends the move immediately; await the result or drop it.
    pub fn set_pose(&self, target: MoveModel) -> Result<PendingResponse, RpcError> {
        let payload = to_payload(&target)?;
        self.link.request(MessageType::MoveModelRequest, Some(payload))
    }

    /// Sends the move without tracking an answer; returns its correlation id.
    pub fn push_pose(&self, target: MoveModel) -> Result<u64, RpcError> {
        let payload = to_payload(&target)?;
        self.link.notify(MessageType::MoveModelRequest, Some(payload))
    }
}
