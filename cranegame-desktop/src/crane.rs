use c_gen_claw::{ClawShape, render_claw_sized};
use cranegame_core::{CraneRig, Horizontal, Vertical};
use macroquad::prelude::*;

pub const CABLE_COLOR: Color = Color::from_rgba(60, 60, 60, 255);
const CABLE_THICKNESS: f32 = 4.0;

/// Claw texture cache. The texture is re-rasterized only when the closed
/// fraction changes, which happens while grabbing and dropping.
pub struct CraneSprite {
    shape: ClawShape,
    texture: Texture2D,
    closed: f32,
}

impl CraneSprite {
    pub fn new(shape: ClawShape, rig: &CraneRig) -> Self {
        let closed = rig.closed_fraction();
        let texture = claw_texture(&shape, closed, rig);
        Self {
            shape,
            texture,
            closed,
        }
    }

    pub fn draw(&mut self, rig: &CraneRig) {
        let closed = rig.closed_fraction();
        if closed != self.closed {
            self.texture = claw_texture(&self.shape, closed, rig);
            self.closed = closed;
        }

        let [cable_x, cable_y] = rig.bounds.vec_of(Horizontal::Center, Vertical::Top);
        draw_line(cable_x, 0.0, cable_x, cable_y, CABLE_THICKNESS, CABLE_COLOR);

        let [x, y] = rig.bounds.raw_pos();
        let [width, height] = rig.bounds.size();
        draw_texture_ex(
            &self.texture,
            x,
            y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(width, height)),
                ..Default::default()
            },
        );
    }
}

fn claw_texture(shape: &ClawShape, closed: f32, rig: &CraneRig) -> Texture2D {
    let [width, height] = rig.bounds.size();
    let width = width.round().clamp(1.0, u16::MAX as f32) as u16;
    let height = height.round().clamp(1.0, u16::MAX as f32) as u16;
    let image = render_claw_sized(shape, closed, u32::from(width), u32::from(height));
    let texture = Texture2D::from_rgba8(width, height, image.as_raw());
    texture.set_filter(FilterMode::Linear);
    texture
}
