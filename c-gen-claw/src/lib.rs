pub mod raster;
pub mod shape;

pub use raster::{render_claw, render_claw_sized, render_preview_strip};
pub use shape::{ClawPart, ClawShape, ViewBox};
