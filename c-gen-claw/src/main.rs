use std::error::Error;
use std::path::PathBuf;

use c_gen_claw::{ClawShape, render_preview_strip};

const PREVIEW_FRAMES: u32 = 5;

fn workspace_root() -> Result<PathBuf, Box<dyn Error>> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir
        .parent()
        .ok_or("crate directory has no parent")?;
    Ok(root.to_path_buf())
}

fn main() -> Result<(), Box<dyn Error>> {
    let root = workspace_root()?;

    let shape = match std::env::args_os().nth(1) {
        Some(path) => ClawShape::from_file(PathBuf::from(path).as_path())?,
        None => ClawShape::builtin()?,
    };

    let strip = render_preview_strip(&shape, PREVIEW_FRAMES);
    let path = root.join("assets").join("claw_preview.png");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    strip.save(&path)?;
    println!("wrote {}", path.display());

    Ok(())
}
