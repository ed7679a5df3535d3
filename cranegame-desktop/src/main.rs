use cranegame_core::SceneConfig;
use env_logger::Env;
use log::{info, warn};
use macroquad::prelude::*;
use std::path::PathBuf;
use std::sync::OnceLock;

const DEFAULT_CONFIG_PATH: &str = "crane.json";

static CONFIG: OnceLock<SceneConfig> = OnceLock::new();

fn config() -> &'static SceneConfig {
    CONFIG.get_or_init(|| {
        let path = std::env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            return SceneConfig::default();
        }
        match SceneConfig::load(&path) {
            Ok(config) => {
                info!("loaded {}", path.display());
                config
            }
            Err(err) => {
                warn!("{err}; using defaults");
                SceneConfig::default()
            }
        }
    })
}

fn window_conf() -> Conf {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
    let screen = config().screen;
    Conf {
        window_title: "Crane Game".to_owned(),
        window_width: screen.width.round() as i32,
        window_height: screen.height.round() as i32,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    cranegame_desktop_lib::run(config().clone()).await;
}
