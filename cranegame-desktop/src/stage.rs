//! Glue between the frame loop, the studio connection and the crane.
//!
//! Futures created by the handshake live in a `LocalPool` that is run until
//! stalled once per frame, right after the transport has been drained.

use cranegame_core::{
    Avatar, AvatarPose, CraneRig, MoveModel, PluginIdentity, RpcClient, SceneConfig, Sequencer,
    Transport, VtsLink,
};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use log::{error, info, warn};

pub struct Stage<T: Transport + 'static> {
    link: VtsLink<T>,
    avatar: Avatar<T>,
    sequencer: Sequencer,
    pool: LocalPool,
    pose: Option<oneshot::Receiver<AvatarPose>>,
}

impl<T: Transport + 'static> Stage<T> {
    pub fn new(config: &SceneConfig, transport: T) -> Self {
        let link = VtsLink::new(RpcClient::new(transport, config.connection.policy()));
        let avatar = Avatar::new(link.clone());
        let pool = LocalPool::new();
        let (pose_sender, pose_receiver) = oneshot::channel();

        let spawner = pool.spawner();
        let identity = config.connection.identity();
        let handshake_link = link.clone();
        let handshake_avatar = avatar.clone();
        link.on_open(move || {
            let task = handshake(handshake_link, handshake_avatar, identity, pose_sender);
            if let Err(err) = spawner.spawn_local(task) {
                error!("failed to start the handshake: {err}");
            }
        });

        Self {
            link,
            avatar,
            sequencer: Sequencer::from_config(config),
            pool,
            pose: Some(pose_receiver),
        }
    }

    /// Called once the transport has finished its own handshake.
    pub fn connection_ready(&self) {
        self.link.open();
    }

    pub fn link(&self) -> &VtsLink<T> {
        &self.link
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn crane(&self) -> &CraneRig {
        self.sequencer.crane()
    }

    pub fn update(&mut self, delta_ms: f32) {
        self.link.pump();
        self.link.tick(delta_ms);
        self.pool.run_until_stalled();
        self.receive_pose();

        if let Some(command) = self.sequencer.update(delta_ms) {
            self.send(command);
        }
    }

    /// Starts a cycle when the point hits the claw.
    pub fn trigger_at(&mut self, x: f32, y: f32) -> bool {
        if !self.sequencer.crane().bounds.is_within(x, y) {
            return false;
        }
        let started = self.sequencer.trigger();
        if !started {
            info!("claw clicked but a cycle cannot start right now");
        }
        started
    }

    fn receive_pose(&mut self) {
        let Some(receiver) = self.pose.as_mut() else {
            return;
        };
        match receiver.try_recv() {
            Ok(Some(pose)) => {
                self.sequencer.set_saved_pose(pose);
                self.pose = None;
            }
            Ok(None) => {}
            Err(_) => {
                warn!("avatar pose unavailable, the crane stays idle");
                self.pose = None;
            }
        }
    }

    fn send(&self, command: MoveModel) {
        // Moves are never awaited, so they stay out of the pending table.
        if let Err(err) = self.avatar.push_pose(command) {
            warn!("move not sent: {err}");
        }
    }
}

impl<T: Transport + 'static> Drop for Stage<T> {
    fn drop(&mut self) {
        self.link.close("stage dropped");
    }
}

async fn handshake<T: Transport>(
    link: VtsLink<T>,
    avatar: Avatar<T>,
    identity: PluginIdentity,
    pose_sender: oneshot::Sender<AvatarPose>,
) {
    if let Err(err) = link.authorize(&identity).await {
        warn!("continuing without authentication: {err}");
    }

    match avatar.get_pose().await {
        Ok(pose) => {
            info!(
                "avatar at ({}, {}), rotation {}, size {}",
                pose.x, pose.y, pose.rotation, pose.size
            );
            let _ = pose_sender.send(pose);
        }
        Err(err) => error!("failed to read the avatar pose: {err}"),
    }
}
