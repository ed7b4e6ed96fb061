use frcnn::lowlevel::{filter_by_score, non_max_suppress_above, ClassScores};
use frcnn::{iou, non_max_suppress, BBox, Detection};

fn det(b: [f32; 4], score: f32) -> Detection {
    Detection::new(BBox::new(b[0], b[1], b[2], b[3]), score, 1)
}

#[test]
fn threshold_one_removes_duplicates_only() {
    let b = [10.0, 10.0, 49.0, 49.0];
    let kept = non_max_suppress(
        vec![
            det(b, 0.4),
            det(b, 0.95),
            det(b, 0.7),
            det([12.0, 10.0, 51.0, 49.0], 0.6),
        ],
        1.0,
    );
    let scores: Vec<f32> = kept.iter().map(Detection::score).collect();
    assert_eq!(scores, vec![0.95, 0.6]);
}

#[test]
fn duplicates_are_dropped_even_above_unit_threshold() {
    let b = [10.0, 10.0, 49.0, 49.0];
    let kept = non_max_suppress(vec![det(b, 0.9), det(b, 0.8)], 1.5);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].score(), 0.9);
}

#[test]
fn threshold_zero_keeps_only_disjoint_boxes() {
    let kept = non_max_suppress(
        vec![
            det([0.0, 0.0, 9.0, 9.0], 0.9),
            // Shares a single pixel column with the first box.
            det([9.0, 0.0, 18.0, 9.0], 0.8),
            det([20.0, 0.0, 29.0, 9.0], 0.7),
            det([25.0, 5.0, 40.0, 20.0], 0.6),
            det([100.0, 100.0, 101.0, 101.0], 0.1),
        ],
        0.0,
    );
    let scores: Vec<f32> = kept.iter().map(Detection::score).collect();
    assert_eq!(scores, vec![0.9, 0.7, 0.1]);
    for (i, a) in kept.iter().enumerate() {
        for b in &kept[i + 1..] {
            assert_eq!(iou(&a.bbox(), &b.bbox()), 0.0);
        }
    }
}

#[test]
fn output_is_sorted_by_descending_score() {
    let kept = non_max_suppress(
        vec![
            det([0.0, 0.0, 5.0, 5.0], 0.2),
            det([50.0, 0.0, 55.0, 5.0], 0.8),
            det([100.0, 0.0, 105.0, 5.0], 0.5),
        ],
        0.5,
    );
    let scores: Vec<f32> = kept.iter().map(Detection::score).collect();
    assert_eq!(scores, vec![0.8, 0.5, 0.2]);
}

#[test]
fn empty_input_yields_nothing() {
    assert!(non_max_suppress(Vec::new(), 0.3).is_empty());
    assert!(non_max_suppress_above(Vec::new(), 0.3, 0.5).is_empty());
}

#[test]
fn sweep_stops_below_score_threshold() {
    let kept = non_max_suppress_above(
        vec![
            det([0.0, 0.0, 9.0, 9.0], 0.45),
            det([50.0, 0.0, 59.0, 9.0], 0.55),
            det([100.0, 0.0, 109.0, 9.0], 0.5),
        ],
        0.3,
        0.5,
    );
    let scores: Vec<f32> = kept.iter().map(Detection::score).collect();
    assert_eq!(scores, vec![0.55, 0.5]);
}

#[test]
fn filter_scans_one_class_column() {
    let data = [
        0.1, 0.8, 0.1, //
        0.6, 0.2, 0.2, //
        0.0, 0.5, 0.5,
    ];
    let scores = ClassScores::from_slice(&data, 3, 3).unwrap();
    assert_eq!(filter_by_score(&scores, 1, 0.5), vec![(0, 0.8), (2, 0.5)]);
    assert_eq!(filter_by_score(&scores, 2, 0.5), vec![(2, 0.5)]);
    assert!(filter_by_score(&scores, 0, 0.0).is_empty());
}
