use crate::geometry::{Bounds, Horizontal, Vertical};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraneLayout {
    pub width: f32,
    pub height: f32,
    /// Anchor (bottom centre of the claw) position when parked.
    pub rest_x: f32,
    pub rest_y: f32,
}

impl Default for CraneLayout {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            rest_x: 160.0,
            rest_y: 100.0,
        }
    }
}

/// The claw's geometry plus how far it is closed (0 open, 1 shut).
#[derive(Debug, Clone, PartialEq)]
pub struct CraneRig {
    pub bounds: Bounds,
    closed: f32,
}

impl CraneRig {
    pub fn new(layout: &CraneLayout) -> Self {
        let mut bounds = Bounds::new(layout.width, layout.height)
            .with_anchor(Horizontal::Center, Vertical::Bottom);
        bounds.position_mut().set_vec2(layout.rest_x, layout.rest_y);
        Self {
            bounds,
            closed: 0.0,
        }
    }

    pub fn closed_fraction(&self) -> f32 {
        self.closed
    }

    pub fn close(&mut self, percent: f32) {
        self.closed = percent.clamp(0.0, 1.0);
    }

    pub fn open(&mut self, percent: f32) {
        self.closed = (1.0 - percent).clamp(0.0, 1.0);
    }

    pub fn position(&self) -> [f32; 2] {
        self.bounds.position().vec2()
    }

    pub fn set_position(&mut self, [x, y]: [f32; 2]) {
        self.bounds.position_mut().set_vec2(x, y);
    }
}
