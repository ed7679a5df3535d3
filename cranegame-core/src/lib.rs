pub mod avatar;
pub mod config;
pub mod coordinates;
pub mod crane;
pub mod geometry;
pub mod interp;
pub mod protocol;
pub mod rpc;
pub mod sequencer;

pub use avatar::{Avatar, AvatarPose};
pub use config::{ConfigError, ConnectionConfig, SceneConfig};
pub use coordinates::ScreenSpace;
pub use crane::{CraneLayout, CraneRig};
pub use geometry::{Bounds, Edge, GeometryError, Horizontal, Keyword, Vector3, Vertical};
pub use protocol::{MessageType, MoveModel};
pub use rpc::{
    AuthError, ConnectionState, PendingResponse, PluginIdentity, RequestPolicy, RpcClient,
    RpcError, Transport, TransportError, VtsLink,
};
pub use sequencer::{Choreography, Phase, Sequencer};
