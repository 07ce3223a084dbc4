use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::bbox::{xywh_to_ltrb, Ltrb};
use crate::r2::R2;

/// Width/height of a box with the given area and aspect ratio (height over width).
pub fn box_size(area: f64, aspect_ratio: f64) -> (f64, f64) {
    let w = (area / aspect_ratio).sqrt();
    (w, aspect_ratio * w)
}

/// One `(w, h)` per (area, aspect ratio) pair, area-major.
pub fn anchor_sizes(areas: &[f64], aspect_ratios: &[f64]) -> Vec<(f64, f64)> {
    iproduct!(areas.iter(), aspect_ratios.iter())
        .map(|(area, ar)| box_size(*area, *ar))
        .collect()
}

/// One box of `area` per aspect ratio, all centered on `center`.
pub fn target_boxes(area: f64, aspect_ratios: &[f64], center: R2<f64>) -> Vec<Ltrb<f64>> {
    let mut xywh: Vec<[f64; 4]> = aspect_ratios
        .iter()
        .map(|ar| {
            let (w, h) = box_size(area, *ar);
            [center.x, center.y, w, h]
        })
        .collect();
    xywh_to_ltrb(&mut xywh);
    xywh.into_iter().map(Ltrb::from_array).collect()
}

/// Regression cases laid out as a `(point, anchor shape, target)` grid.
///
/// Every anchor shape at every sample point is paired with every target, including targets whose aspect ratio
/// differs from the anchor's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorBatch {
    pub anchors: Vec<Ltrb<f64>>,
    pub targets: Vec<Ltrb<f64>>,
    pub n_points: usize,
    pub n_shapes: usize,
}

impl AnchorBatch {
    pub fn new(points: &[R2<f64>], sizes: &[(f64, f64)], targets: Vec<Ltrb<f64>>) -> Self {
        let n_targets = targets.len();
        let mut xywh: Vec<[f64; 4]> = Vec::with_capacity(points.len() * sizes.len() * n_targets);
        for p in points {
            for (w, h) in sizes {
                for _ in 0..n_targets {
                    xywh.push([p.x, p.y, *w, *h]);
                }
            }
        }
        xywh_to_ltrb(&mut xywh);
        AnchorBatch {
            anchors: xywh.into_iter().map(Ltrb::from_array).collect(),
            targets,
            n_points: points.len(),
            n_shapes: sizes.len(),
        }
    }
    pub fn n_targets(&self) -> usize {
        self.targets.len()
    }
    pub fn len(&self) -> usize {
        self.anchors.len()
    }
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n_points, self.n_shapes, self.n_targets())
    }
    pub fn index(&self, point: usize, shape: usize, target: usize) -> usize {
        (point * self.n_shapes + shape) * self.n_targets() + target
    }
    /// The target each anchor regresses toward, aligned with `anchors`.
    pub fn paired_targets(&self) -> Vec<Ltrb<f64>> {
        (0..self.len()).map(|i| self.targets[i % self.n_targets()]).collect()
    }
    /// Average `values` (one per anchor) over the shape and target axes, leaving one value per point.
    pub fn per_point_mean(&self, values: &[f64]) -> Vec<f64> {
        let per_point = self.n_shapes * self.n_targets();
        if per_point == 0 {
            return vec![];
        }
        values
            .chunks_exact(per_point)
            .map(|chunk| chunk.iter().sum::<f64>() / per_point as f64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const CENTER: R2<f64> = R2 { x: 0.5, y: 0.5 };

    #[test]
    fn test_box_size() {
        for (area, ar) in [(1. / 32., 1.), (1. / 8., 4.), (3. / 64., 1. / 3.)] {
            let (w, h) = box_size(area, ar);
            assert_relative_eq!(w * h, area, epsilon = 1e-15);
            assert_relative_eq!(h / w, ar, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_anchor_sizes_area_major() {
        let sizes = anchor_sizes(&[1. / 32., 1. / 8.], &[0.5, 1., 2.]);
        assert_eq!(sizes.len(), 6);
        assert_relative_eq!(sizes[1].0, (1f64 / 32.).sqrt());
        assert_relative_eq!(sizes[4].0 * sizes[4].1, 1. / 8., epsilon = 1e-15);
    }

    #[test]
    fn test_targets() {
        let targets = target_boxes(1. / 32., &[0.25, 1., 4.], CENTER);
        assert_eq!(targets.len(), 3);
        for (t, ar) in targets.iter().zip([0.25, 1., 4.]) {
            assert_relative_eq!(t.area(), 1. / 32., epsilon = 1e-15);
            assert_relative_eq!(t.aspect_ratio(), ar, epsilon = 1e-12);
            assert_relative_eq!(t.center().x, 0.5, epsilon = 1e-15);
            assert_relative_eq!(t.center().y, 0.5, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_layout() {
        let points = vec![R2 { x: 0.45, y: 0.5 }, R2 { x: 0.55, y: 0.52 }];
        let sizes = anchor_sizes(&[1. / 32., 1. / 16.], &[0.5, 2.]);
        let targets = target_boxes(1. / 32., &[0.5, 1., 2.], CENTER);
        let batch = AnchorBatch::new(&points, &sizes, targets.clone());
        assert_eq!(batch.shape(), (2, 4, 3));
        assert_eq!(batch.len(), 24);

        let idx = batch.index(1, 3, 2);
        let anchor = batch.anchors[idx];
        assert_relative_eq!(anchor.center().x, 0.55, epsilon = 1e-15);
        assert_relative_eq!(anchor.area(), 1. / 16., epsilon = 1e-15);
        assert_relative_eq!(anchor.aspect_ratio(), 2., epsilon = 1e-12);
        assert_eq!(batch.paired_targets()[idx], targets[2]);

        // Anchors are repeated, unchanged, along the target axis
        assert_eq!(batch.anchors[batch.index(0, 1, 0)], batch.anchors[batch.index(0, 1, 2)]);
    }

    #[test]
    fn test_per_point_mean() {
        let points = vec![CENTER; 2];
        let sizes = anchor_sizes(&[1. / 32.], &[1., 2.]);
        let batch = AnchorBatch::new(&points, &sizes, target_boxes(1. / 32., &[1.], CENTER));
        assert_eq!(batch.per_point_mean(&[1., 3., 0.5, 0.5]), vec![2., 0.5]);
    }

    #[test]
    fn test_empty_points() {
        let sizes = anchor_sizes(&[1. / 32.], &[1., 2.]);
        let batch = AnchorBatch::new(&[], &sizes, target_boxes(1. / 32., &[1., 2.], CENTER));
        assert!(batch.is_empty());
        assert_eq!(batch.shape(), (0, 2, 2));
        assert!(batch.paired_targets().is_empty());
        assert!(batch.per_point_mean(&[]).is_empty());
    }
}
