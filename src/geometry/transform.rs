//! Box-regression decoding and clipping.

use super::{BBox, RegressionDelta};

/// Applies a regression delta to a proposal.
///
/// The proposal centre is the inclusive midpoint `x1 + 0.5 * (w - 1)` with
/// `w = x2 - x1 + 1`. The centre moves by `dx * w`, the size becomes
/// `exp(dw) * w`, and the corners are placed at `centre ± 0.5 * (w' - 1)`.
/// A zero delta therefore returns the proposal unchanged.
///
/// The classic transform centres at `x1 + 0.5 * w`, half a pixel to the right
/// of this midpoint, and so shifts boxes even under a zero delta.
///
/// Degenerate proposals may yield NaN or infinite coordinates; they are passed
/// through untouched.
pub fn decode_box(roi: BBox, delta: RegressionDelta) -> BBox {
    let w = roi.width();
    let h = roi.height();
    let cx = roi.x1 + 0.5 * (w - 1.0);
    let cy = roi.y1 + 0.5 * (h - 1.0);

    let pred_cx = delta.dx * w + cx;
    let pred_cy = delta.dy * h + cy;
    let pred_w = delta.dw.exp() * w;
    let pred_h = delta.dh.exp() * h;

    BBox::new(
        pred_cx - 0.5 * (pred_w - 1.0),
        pred_cy - 0.5 * (pred_h - 1.0),
        pred_cx + 0.5 * (pred_w - 1.0),
        pred_cy + 0.5 * (pred_h - 1.0),
    )
}

/// Clamps a box to an image of `width x height` pixels.
///
/// Only the outer edges are clamped: `x1`/`y1` are floored at 0, `x2` is capped
/// at `width - 1` and `y2` at `height - 1`.
pub fn clip_to_image(bbox: BBox, width: f32, height: f32) -> BBox {
    BBox::new(
        bbox.x1.max(0.0),
        bbox.y1.max(0.0),
        bbox.x2.min(width - 1.0),
        bbox.y2.min(height - 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_moves_by_proposal_width() {
        let roi = BBox::new(10.0, 10.0, 29.0, 29.0);
        let out = decode_box(roi, RegressionDelta::new(0.25, -0.5, 0.0, 0.0));
        assert_eq!(out, BBox::new(15.0, 0.0, 34.0, 19.0));
    }

    #[test]
    fn log_scale_doubles_size_about_centre() {
        let roi = BBox::new(0.0, 0.0, 9.0, 9.0);
        let out = decode_box(roi, RegressionDelta::new(0.0, 0.0, 2f32.ln(), 0.0));
        assert!((out.width() - 20.0).abs() < 1e-4);
        assert!(((out.x1 + out.x2) * 0.5 - 4.5).abs() < 1e-4);
        assert_eq!(out.y1, 0.0);
        assert_eq!(out.y2, 9.0);
    }

    #[test]
    fn zero_delta_keeps_fractional_box_in_place() {
        // Centring at x1 + 0.5 * w would move this box half a pixel right.
        let roi = BBox::new(2.5, 3.0, 11.5, 8.0);
        let out = decode_box(roi, RegressionDelta::default());
        assert_eq!(out, roi);
    }

    #[test]
    fn clip_only_touches_outer_edges() {
        let b = clip_to_image(BBox::new(-5.0, -1.0, 120.0, 50.0), 100.0, 40.0);
        assert_eq!(b, BBox::new(0.0, 0.0, 99.0, 39.0));
    }

    #[test]
    fn degenerate_proposal_is_not_sanitized() {
        let roi = BBox::new(0.0, 0.0, 9.0, 9.0);
        let out = decode_box(roi, RegressionDelta::new(0.0, 0.0, f32::INFINITY, 0.0));
        assert!(out.x1.is_infinite() || out.x1.is_nan());
    }
}
