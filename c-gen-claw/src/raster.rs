use image::imageops;
use image::{Rgba, RgbaImage};

use crate::shape::{ClawPart, ClawShape};

const AA_SAMPLES_PER_AXIS: u32 = 4;
const AA_SAMPLE_COUNT: u32 = AA_SAMPLES_PER_AXIS * AA_SAMPLES_PER_AXIS;

/// Renders the claw at one pixel per viewBox unit.
pub fn render_claw(shape: &ClawShape, closed: f32) -> RgbaImage {
    let width = shape.viewbox.width.round().max(1.0) as u32;
    let height = shape.viewbox.height.round().max(1.0) as u32;
    render_claw_sized(shape, closed, width, height)
}

/// `closed` runs from 0 (arms straight down) to 1 (arms swung fully inward).
pub fn render_claw_sized(shape: &ClawShape, closed: f32, width: u32, height: u32) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let scale_x = width as f32 / shape.viewbox.width;
    let scale_y = height as f32 / shape.viewbox.height;
    let swing = shape.swing_degrees.to_radians() * closed.clamp(0.0, 1.0);
    // The left arm turns clockwise on screen, the right arm counter-clockwise.
    let left_angle = -swing;
    let right_angle = swing;
    let samples_per_axis = AA_SAMPLES_PER_AXIS as f32;
    let inv_sample_count = 1.0 / AA_SAMPLE_COUNT as f32;

    for y in 0..height {
        for x in 0..width {
            let mut sum = [0.0f32; 4];
            let mut has_coverage = false;

            for sy in 0..AA_SAMPLES_PER_AXIS {
                for sx in 0..AA_SAMPLES_PER_AXIS {
                    let sample_x = x as f32 + (sx as f32 + 0.5) / samples_per_axis;
                    let sample_y = y as f32 + (sy as f32 + 0.5) / samples_per_axis;
                    let svg_x = sample_x / scale_x + shape.viewbox.min_x;
                    let svg_y = sample_y / scale_y + shape.viewbox.min_y;

                    if let Some(color) = sample_color(shape, svg_x, svg_y, left_angle, right_angle)
                    {
                        has_coverage = true;
                        for (channel, value) in sum.iter_mut().zip(color.0) {
                            *channel += value as f32;
                        }
                    }
                }
            }

            if has_coverage {
                let pixel = Rgba(sum.map(|channel| (channel * inv_sample_count).round() as u8));
                image.put_pixel(x, y, pixel);
            }
        }
    }

    image
}

/// Frames from open to closed, laid out left to right.
pub fn render_preview_strip(shape: &ClawShape, frames: u32) -> RgbaImage {
    let frames = frames.max(1);
    let first = render_claw(shape, 0.0);
    let (frame_width, frame_height) = first.dimensions();
    let mut strip = RgbaImage::from_pixel(frame_width * frames, frame_height, Rgba([0, 0, 0, 0]));
    imageops::replace(&mut strip, &first, 0, 0);

    for index in 1..frames {
        let closed = index as f32 / (frames - 1) as f32;
        let frame = render_claw(shape, closed);
        imageops::replace(&mut strip, &frame, i64::from(index * frame_width), 0);
    }

    strip
}

fn sample_color(
    shape: &ClawShape,
    svg_x: f32,
    svg_y: f32,
    left_angle: f32,
    right_angle: f32,
) -> Option<Rgba<u8>> {
    let mut color = None;

    if shape.top.contains(svg_x, svg_y) {
        color = Some(shape.top.fill);
    }
    if arm_contains(&shape.left, left_angle, svg_x, svg_y) {
        color = Some(shape.left.fill);
    }
    if arm_contains(&shape.right, right_angle, svg_x, svg_y) {
        color = Some(shape.right.fill);
    }

    color
}

fn arm_contains(arm: &ClawPart, angle: f32, x: f32, y: f32) -> bool {
    let (hinge_x, hinge_y) = arm.hinge();
    let (local_x, local_y) = rotate_point(x, y, hinge_x, hinge_y, -angle);
    arm.contains(local_x, local_y)
}

fn rotate_point(x: f32, y: f32, cx: f32, cy: f32, angle: f32) -> (f32, f32) {
    let dx = x - cx;
    let dy = y - cy;
    let cos_a = angle.cos();
    let sin_a = angle.sin();

    let rotated_x = dx * cos_a - dy * sin_a + cx;
    let rotated_y = dx * sin_a + dy * cos_a + cy;
    (rotated_x, rotated_y)
}
