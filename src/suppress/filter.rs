//! Per-class score thresholding.

use crate::tensor::ClassScores;

/// Returns `(roi_index, score)` for every proposal whose score for
/// `class_index` is at least `threshold`, in proposal order.
///
/// The background class (index 0) is never scanned and yields nothing.
pub fn filter_by_score(
    scores: &ClassScores<'_>,
    class_index: usize,
    threshold: f32,
) -> Vec<(usize, f32)> {
    if class_index == 0 || class_index >= scores.num_classes() {
        return Vec::new();
    }
    (0..scores.num_rois())
        .map(|roi| (roi, scores.get(roi, class_index)))
        .filter(|&(_, score)| score >= threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::filter_by_score;
    use crate::tensor::ClassScores;

    #[test]
    fn keeps_scores_at_threshold() {
        let data = [0.9, 0.5, 0.1, 0.2, 0.4, 0.6];
        let scores = ClassScores::from_slice(&data, 2, 3).unwrap();
        assert_eq!(filter_by_score(&scores, 1, 0.5), vec![(0, 0.5)]);
        assert_eq!(filter_by_score(&scores, 2, 0.5), vec![(1, 0.6)]);
    }

    #[test]
    fn background_is_never_scanned() {
        let data = [0.9, 0.1];
        let scores = ClassScores::from_slice(&data, 1, 2).unwrap();
        assert!(filter_by_score(&scores, 0, 0.0).is_empty());
    }
}
