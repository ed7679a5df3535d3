use crate::interp::{linear_interpolate, remap_range};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SCREEN_WIDTH: f32 = 1920.0;
pub const DEFAULT_SCREEN_HEIGHT: f32 = 1080.0;

/// Canvas dimensions in pixels. Remote space spans [-1, 1] on both axes with +1
/// at the top of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSpace {
    pub width: f32,
    pub height: f32,
}

impl ScreenSpace {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn screen_to_remote(&self, sx: f32, sy: f32) -> [f32; 2] {
        [
            linear_interpolate(-1.0, 1.0, sx / self.width),
            linear_interpolate(1.0, -1.0, sy / self.height),
        ]
    }

    pub fn remote_to_screen(&self, vx: f32, vy: f32) -> [f32; 2] {
        [
            remap_range(vx, -1.0, 1.0, 0.0, self.width),
            remap_range(vy, 1.0, -1.0, 0.0, self.height),
        ]
    }
}

impl Default for ScreenSpace {
    fn default() -> Self {
        Self::new(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_corners_map_to_remote_corners() {
        let screen = ScreenSpace::default();
        assert_eq!(screen.screen_to_remote(0.0, 0.0), [-1.0, 1.0]);
        assert_eq!(screen.screen_to_remote(1920.0, 1080.0), [1.0, -1.0]);
        assert_eq!(screen.screen_to_remote(960.0, 540.0), [0.0, 0.0]);
    }

    #[test]
    fn remote_corners_map_to_screen_corners() {
        let screen = ScreenSpace::default();
        assert_eq!(screen.remote_to_screen(-1.0, 1.0), [0.0, 0.0]);
        assert_eq!(screen.remote_to_screen(1.0, -1.0), [1920.0, 1080.0]);
        assert_eq!(screen.remote_to_screen(0.0, 0.0), [960.0, 540.0]);
    }

    #[test]
    fn round_trip_is_identity_within_tolerance() {
        let screen = ScreenSpace::default();
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..1000 {
            let x = rng.f32() * screen.width;
            let y = rng.f32() * screen.height;
            let [vx, vy] = screen.screen_to_remote(x, y);
            let [sx, sy] = screen.remote_to_screen(vx, vy);
            assert!((sx - x).abs() < 1e-2, "x {x} came back as {sx}");
            assert!((sy - y).abs() < 1e-2, "y {y} came back as {sy}");
        }
    }

    #[test]
    fn respects_custom_dimensions() {
        let screen = ScreenSpace::new(800.0, 600.0);
        assert_eq!(screen.screen_to_remote(400.0, 300.0), [0.0, 0.0]);
        assert_eq!(screen.remote_to_screen(1.0, 1.0), [800.0, 0.0]);
    }
}
