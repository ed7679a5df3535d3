/// Unclamped: callers may pass a percent slightly past 1.0 on an overshooting tick.
pub fn linear_interpolate(a: f32, b: f32, percent: f32) -> f32 {
    a + (b - a) * percent
}

pub fn lerp_2d(x1: f32, y1: f32, x2: f32, y2: f32, percent: f32) -> [f32; 2] {
    [
        linear_interpolate(x1, x2, percent),
        linear_interpolate(y1, y2, percent),
    ]
}

/// Maps `value` from `[min_a, max_a]` onto `[min_b, max_b]`. `min_a == max_a` divides by zero.
pub fn remap_range(value: f32, min_a: f32, max_a: f32, min_b: f32, max_b: f32) -> f32 {
    (value - min_a) / (max_a - min_a) * (max_b - min_b) + min_b
}
