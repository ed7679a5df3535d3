use c_gen_claw::ClawShape;
use cranegame_core::{CraneRig, SceneConfig};
use log::{info, warn};
use macroquad::prelude::*;

pub mod crane;
pub mod stage;
pub mod transport;

use crate::crane::CraneSprite;
use crate::stage::Stage;
use crate::transport::SocketTransport;

pub const BACKGROUND: Color = Color::from_rgba(0, 255, 0, 255);

fn load_claw_shape(config: &SceneConfig) -> ClawShape {
    let loaded = match &config.claw_svg {
        Some(path) => ClawShape::from_file(path),
        None => ClawShape::builtin(),
    };
    loaded.unwrap_or_else(|err| {
        warn!("claw artwork unusable ({err}); drawing the default claw");
        ClawShape::default()
    })
}

fn connect(config: &SceneConfig) -> Option<Stage<SocketTransport>> {
    match SocketTransport::connect(&config.connection.url) {
        Ok(transport) => {
            let stage = Stage::new(config, transport);
            stage.connection_ready();
            Some(stage)
        }
        Err(err) => {
            warn!("{err}; running offline, the crane stays idle");
            None
        }
    }
}

pub async fn run(config: SceneConfig) {
    info!(
        "crane game on a {}x{} canvas, studio at {}",
        config.screen.width, config.screen.height, config.connection.url
    );
    let mut stage = connect(&config);
    let parked = CraneRig::new(&config.crane);
    let mut sprite = CraneSprite::new(load_claw_shape(&config), &parked);

    loop {
        let delta_ms = get_frame_time() * 1000.0;

        if let Some(stage) = stage.as_mut() {
            if is_mouse_button_pressed(MouseButton::Left) {
                let (mouse_x, mouse_y) = mouse_position();
                stage.trigger_at(mouse_x, mouse_y);
            }
            stage.update(delta_ms);
        }

        clear_background(BACKGROUND);
        let rig = stage.as_ref().map_or(&parked, |stage| stage.crane());
        sprite.draw(rig);

        next_frame().await;
    }
}
