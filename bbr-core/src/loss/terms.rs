use num_dual::DualNum;

use crate::bbox::Ltrb;

/// Guards the penalty denominators (enclosing-box extents) against degenerate boxes.
pub const EPS: f64 = 1e-7;

/// Geometric quantities shared by the IoU-family losses, for one predicted/target box pair.
#[derive(Debug, Clone, Copy)]
pub struct PairTerms<D> {
    pub iou: D,
    /// `1 − IoU`
    pub l_iou: D,
    pub union: D,
    /// Width and height of the smallest enclosing box.
    pub cw: D,
    pub ch: D,
    /// Center offsets, prediction minus target.
    pub dx: D,
    pub dy: D,
    pub w: D,
    pub h: D,
    pub wt: D,
    pub ht: D,
}

impl<D: DualNum<f64> + PartialOrd + Copy> PairTerms<D> {
    pub fn new(pred: &Ltrb<D>, target: &Ltrb<D>) -> Self {
        let inter = pred.intersection(target);
        let union = pred.area() + target.area() - inter;
        let iou = if union.re() > 0. { inter / union } else { D::zero() };
        let enclosing = pred.enclosing(target);
        let (pc, tc) = (pred.center(), target.center());
        PairTerms {
            iou,
            l_iou: -iou + 1.,
            union,
            cw: enclosing.width(),
            ch: enclosing.height(),
            dx: pc.x - tc.x,
            dy: pc.y - tc.y,
            w: pred.width(),
            h: pred.height(),
            wt: target.width(),
            ht: target.height(),
        }
    }
    /// Squared distance between the box centers.
    pub fn rho2(&self) -> D {
        self.dx * self.dx + self.dy * self.dy
    }
    /// Squared diagonal of the enclosing box.
    pub fn c2(&self) -> D {
        self.cw * self.cw + self.ch * self.ch + EPS
    }
    pub fn enclosing_area(&self) -> D {
        self.cw * self.ch + EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_terms() {
        let pred = Ltrb::new(0., 0., 2., 1.);
        let target = Ltrb::new(1., 0., 2., 2.);
        let terms = PairTerms::new(&pred, &target);
        // inter 1, union 2 + 2 − 1
        assert_relative_eq!(terms.iou, 1. / 3.);
        assert_relative_eq!(terms.l_iou, 2. / 3.);
        assert_relative_eq!(terms.union, 3.);
        assert_eq!((terms.cw, terms.ch), (2., 2.));
        assert_eq!((terms.dx, terms.dy), (-0.5, -0.5));
        assert_relative_eq!(terms.rho2(), 0.5);
        assert_relative_eq!(terms.c2(), 8., epsilon = 1e-6);
        assert_eq!((terms.w, terms.h, terms.wt, terms.ht), (2., 1., 1., 2.));
    }
}
