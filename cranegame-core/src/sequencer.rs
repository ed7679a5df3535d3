//! Timed crane choreography.
//!
//! Each active phase owns a cooldown in milliseconds. When a tick drives the
//! cooldown to zero or below, the overshoot is carried into the next phase and
//! that tick does no positional work. Phases that keep the avatar attached to
//! the claw hand back a move command instead of talking to the network.

use crate::avatar::AvatarPose;
use crate::config::SceneConfig;
use crate::coordinates::ScreenSpace;
use crate::crane::{CraneLayout, CraneRig};
use crate::interp::{lerp_2d, linear_interpolate};
use crate::protocol::MoveModel;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    MoveTo,
    Lowering,
    Grabbing,
    Raising,
    MoveBack,
    Dropping,
    /// `released` is set once the drop command has gone out.
    Falling { released: bool },
    Resting,
}

impl Phase {
    pub fn is_active(self) -> bool {
        self != Phase::Idle
    }

    pub fn next(self) -> Phase {
        match self {
            Phase::Idle => Phase::MoveTo,
            Phase::MoveTo => Phase::Lowering,
            Phase::Lowering => Phase::Grabbing,
            Phase::Grabbing => Phase::Raising,
            Phase::Raising => Phase::MoveBack,
            Phase::MoveBack => Phase::Dropping,
            Phase::Dropping => Phase::Falling { released: false },
            Phase::Falling { .. } => Phase::Resting,
            Phase::Resting => Phase::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Choreography {
    /// Delay before the first cycle starts on its own; `None` waits for `trigger`.
    pub start_delay_ms: Option<f32>,
    pub move_to_ms: f32,
    pub lowering_ms: f32,
    pub grabbing_ms: f32,
    pub raising_ms: f32,
    pub move_back_ms: f32,
    pub dropping_ms: f32,
    pub falling_ms: f32,
    pub resting_ms: f32,
    /// Remote-space distance between the claw and the avatar while carried.
    pub model_height_offset: f32,
    pub fall_y: f32,
    pub fall_transition_secs: f32,
}

impl Default for Choreography {
    fn default() -> Self {
        Self {
            start_delay_ms: Some(2_000.0),
            move_to_ms: 5_000.0,
            lowering_ms: 2_000.0,
            grabbing_ms: 1_000.0,
            raising_ms: 2_000.0,
            move_back_ms: 8_000.0,
            dropping_ms: 200.0,
            falling_ms: 500.0,
            resting_ms: 3_000.0,
            model_height_offset: 1.0,
            fall_y: -1.0,
            fall_transition_secs: 0.5,
        }
    }
}

impl Choreography {
    pub fn duration_of(&self, phase: Phase) -> f32 {
        match phase {
            Phase::Idle => 0.0,
            Phase::MoveTo => self.move_to_ms,
            Phase::Lowering => self.lowering_ms,
            Phase::Grabbing => self.grabbing_ms,
            Phase::Raising => self.raising_ms,
            Phase::MoveBack => self.move_back_ms,
            Phase::Dropping => self.dropping_ms,
            Phase::Falling { .. } => self.falling_ms,
            Phase::Resting => self.resting_ms,
        }
    }

    pub fn cycle_ms(&self) -> f32 {
        self.move_to_ms
            + self.lowering_ms
            + self.grabbing_ms
            + self.raising_ms
            + self.move_back_ms
            + self.dropping_ms
            + self.falling_ms
            + self.resting_ms
    }
}

pub struct Sequencer {
    choreography: Choreography,
    screen: ScreenSpace,
    rest: [f32; 2],
    crane: CraneRig,
    phase: Phase,
    cooldown_ms: f32,
    auto_start_pending: bool,
    saved: Option<AvatarPose>,
    target: Option<[f32; 2]>,
}

impl Sequencer {
    pub fn new(screen: ScreenSpace, layout: &CraneLayout, choreography: Choreography) -> Self {
        Self {
            choreography,
            screen,
            rest: [layout.rest_x, layout.rest_y],
            crane: CraneRig::new(layout),
            phase: Phase::Idle,
            cooldown_ms: choreography.start_delay_ms.unwrap_or(0.0),
            auto_start_pending: choreography.start_delay_ms.is_some(),
            saved: None,
            target: None,
        }
    }

    pub fn from_config(config: &SceneConfig) -> Self {
        Self::new(config.screen, &config.crane, config.choreography)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    pub fn cooldown_ms(&self) -> f32 {
        self.cooldown_ms
    }

    pub fn crane(&self) -> &CraneRig {
        &self.crane
    }

    pub fn saved_pose(&self) -> Option<AvatarPose> {
        self.saved
    }

    /// Canvas point the claw travels to, derived from the saved pose.
    pub fn target(&self) -> Option<[f32; 2]> {
        self.target
    }

    pub fn set_saved_pose(&mut self, pose: AvatarPose) {
        let target = self.screen.remote_to_screen(pose.x, pose.y);
        info!(
            "saved avatar pose {:?}, claw target ({:.1}, {:.1})",
            pose, target[0], target[1]
        );
        self.saved = Some(pose);
        self.target = Some(target);
    }

    /// Starts a cycle from idle. Does nothing while a cycle runs or before the
    /// avatar pose is known.
    pub fn trigger(&mut self) -> bool {
        if self.phase.is_active() || self.target.is_none() {
            return false;
        }
        self.auto_start_pending = false;
        self.enter(Phase::MoveTo, 0.0);
        true
    }

    pub fn update(&mut self, delta_ms: f32) -> Option<MoveModel> {
        // Also rejects NaN.
        if !(delta_ms >= 0.0) {
            return None;
        }
        match self.phase {
            Phase::Idle => {
                self.update_idle(delta_ms);
                None
            }
            phase => self.update_active(phase, delta_ms),
        }
    }

    fn update_idle(&mut self, delta_ms: f32) {
        if !self.auto_start_pending {
            return;
        }
        self.cooldown_ms -= delta_ms;
        if self.cooldown_ms > 0.0 {
            return;
        }
        if self.target.is_none() {
            // Waiting for the pose; the wait is not charged to the first phase.
            self.cooldown_ms = 0.0;
            return;
        }
        self.auto_start_pending = false;
        let overshoot = self.cooldown_ms;
        self.enter(Phase::MoveTo, overshoot);
    }

    fn update_active(&mut self, phase: Phase, delta_ms: f32) -> Option<MoveModel> {
        self.cooldown_ms -= delta_ms;
        let (Some(saved), Some(target)) = (self.saved, self.target) else {
            return None;
        };

        if self.cooldown_ms <= 0.0 {
            let overshoot = self.cooldown_ms;
            self.enter(phase.next(), overshoot);
            return match phase {
                Phase::Resting => Some(saved.restore()),
                _ => None,
            };
        }

        let percent = 1.0 - self.cooldown_ms / self.choreography.duration_of(phase);
        let [rest_x, rest_y] = self.rest;
        let [target_x, target_y] = target;

        match phase {
            Phase::MoveTo => {
                let x = linear_interpolate(rest_x, target_x, percent);
                self.crane.set_position([x, rest_y]);
                None
            }
            Phase::Lowering => {
                let position = lerp_2d(target_x, rest_y, target_x, target_y, percent);
                self.crane.set_position(position);
                None
            }
            Phase::Grabbing => {
                self.crane.close(percent);
                None
            }
            Phase::Raising => {
                let position = lerp_2d(target_x, target_y, target_x, rest_y, percent);
                self.crane.set_position(position);
                let [x, y] = self.remote_position();
                Some(MoveModel::to(
                    x,
                    y - self.choreography.model_height_offset,
                    saved.rotation,
                    saved.size,
                ))
            }
            Phase::MoveBack => {
                let position = lerp_2d(target_x, rest_y, rest_x, rest_y, percent);
                self.crane.set_position(position);
                let [x, y] = self.remote_position();
                Some(MoveModel::to(x, y, saved.rotation, saved.size))
            }
            Phase::Dropping => {
                self.crane.open(percent);
                None
            }
            Phase::Falling { released: false } => {
                self.phase = Phase::Falling { released: true };
                let [x, _] = self.remote_position();
                Some(
                    MoveModel::to(x, self.choreography.fall_y, saved.rotation, saved.size)
                        .over(self.choreography.fall_transition_secs),
                )
            }
            Phase::Falling { released: true } | Phase::Resting | Phase::Idle => None,
        }
    }

    fn enter(&mut self, phase: Phase, overshoot_ms: f32) {
        self.phase = phase;
        self.cooldown_ms = match phase {
            Phase::Idle => 0.0,
            _ => self.choreography.duration_of(phase) + overshoot_ms,
        };
        info!("crane phase {:?}", phase);
    }

    fn remote_position(&self) -> [f32; 2] {
        let [x, y] = self.crane.position();
        self.screen.screen_to_remote(x, y)
    }
}
