//! Wire format of the VTube Studio public API, limited to the messages the
//! crane uses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const API_NAME: &str = "VTubeStudioPublicAPI";
pub const API_VERSION: &str = "1.0";
pub const API_ERROR: &str = "APIError";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    AuthenticationTokenRequest,
    AuthenticationRequest,
    CurrentModelRequest,
    MoveModelRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEnvelope<'a> {
    #[serde(rename = "apiName")]
    pub api_name: &'static str,
    #[serde(rename = "apiVersion")]
    pub api_version: &'static str,
    #[serde(rename = "requestID")]
    pub request_id: String,
    #[serde(rename = "messageType")]
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a Value>,
}

impl<'a> RequestEnvelope<'a> {
    pub fn new(request_id: u64, message_type: MessageType, data: Option<&'a Value>) -> Self {
        Self {
            api_name: API_NAME,
            api_version: API_VERSION,
            request_id: request_id.to_string(),
            message_type,
            data,
        }
    }
}

/// Inbound envelope. Only the correlation id is required; everything else is
/// optional so unrelated server events still parse.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "requestID")]
    pub request_id: String,
    #[serde(rename = "messageType", default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ResponseEnvelope {
    pub fn correlation_id(&self) -> Option<u64> {
        self.request_id.parse().ok()
    }

    pub fn is_api_error(&self) -> bool {
        self.message_type.as_deref() == Some(API_ERROR)
    }

    pub fn error_message(&self) -> String {
        self.data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown API error")
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest<'a> {
    pub plugin_name: &'a str,
    pub plugin_developer: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(default)]
    pub authentication_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationRequest<'a> {
    pub plugin_name: &'a str,
    pub plugin_developer: &'a str,
    pub authentication_token: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPosition {
    pub position_x: f32,
    pub position_y: f32,
    pub rotation: f32,
    pub size: f32,
}

/// The current-model response carries many more fields (names, load times,
/// texture counts); only the position is read.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentModelResponse {
    pub model_position: ModelPosition,
}

/// Payload of a `MoveModelRequest`. Positions are in remote space, rotation in
/// degrees, size roughly -100..100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveModel {
    pub time_in_seconds: f32,
    pub values_are_relative_to_model: bool,
    pub position_x: f32,
    pub position_y: f32,
    pub rotation: f32,
    pub size: f32,
}

impl MoveModel {
    pub fn to(x: f32, y: f32, rotation: f32, size: f32) -> Self {
        Self {
            time_in_seconds: 0.0,
            values_are_relative_to_model: false,
            position_x: x,
            position_y: y,
            rotation,
            size,
        }
    }

    pub fn over(mut self, seconds: f32) -> Self {
        self.time_in_seconds = seconds;
        self
    }

    pub fn relative(mut self) -> Self {
        self.values_are_relative_to_model = true;
        self
    }
}
