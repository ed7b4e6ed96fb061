//! Test-time scale selection.

/// Computes the resize factor for a `width x height` image.
///
/// The shorter side is brought to `target_short_side` unless that would push
/// the longer side past `max_long_side`, in which case the longer side is
/// pinned to `max_long_side` instead.
pub fn compute_scale_factor(
    width: usize,
    height: usize,
    target_short_side: f32,
    max_long_side: f32,
) -> f32 {
    let short = width.min(height) as f32;
    let long = width.max(height) as f32;
    let scale = target_short_side / short;
    if scale * long > max_long_side {
        max_long_side / long
    } else {
        scale
    }
}

/// Length of a side after scaling, rounded to the nearest pixel (at least 1).
pub fn scaled_len(len: usize, scale: f32) -> usize {
    ((len as f32 * scale).round() as usize).max(1)
}
