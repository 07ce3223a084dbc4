use std::fmt::{self, Display, Formatter};

use num_dual::DualNum;
use serde::{Deserialize, Serialize};

use crate::dual::{self, one_hot, D4};
use crate::r2::R2;

/// Center-form box: `(cx, cy, w, h)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Xywh<D> {
    pub cx: D,
    pub cy: D,
    pub w: D,
    pub h: D,
}

/// Corner-form box: `(left, top, right, bottom)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ltrb<D> {
    pub l: D,
    pub t: D,
    pub r: D,
    pub b: D,
}

/// Convert a batch of center-form quadruples to corner form, in place.
///
/// A flat slice of quadruples stands for any leading shape; only the last axis is touched. Widths and heights are
/// not validated: negative ones produce an inverted box.
pub fn xywh_to_ltrb(boxes: &mut [[f64; 4]]) {
    for bx in boxes.iter_mut() {
        bx[0] -= bx[2] / 2.;
        bx[1] -= bx[3] / 2.;
        bx[2] += bx[0];
        bx[3] += bx[1];
    }
}

/// Inverse of [`xywh_to_ltrb`].
pub fn ltrb_to_xywh(boxes: &mut [[f64; 4]]) {
    for bx in boxes.iter_mut() {
        bx[2] -= bx[0];
        bx[3] -= bx[1];
        bx[0] += bx[2] / 2.;
        bx[1] += bx[3] / 2.;
    }
}

impl Xywh<f64> {
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Xywh { cx, cy, w, h }
    }
    pub fn ltrb(&self) -> Ltrb<f64> {
        let mut arr = [self.to_array()];
        xywh_to_ltrb(&mut arr);
        Ltrb::from_array(arr[0])
    }
    pub fn to_array(&self) -> [f64; 4] {
        [self.cx, self.cy, self.w, self.h]
    }
    pub fn from_array([cx, cy, w, h]: [f64; 4]) -> Self {
        Xywh { cx, cy, w, h }
    }
}

impl Ltrb<f64> {
    pub fn new(l: f64, t: f64, r: f64, b: f64) -> Self {
        Ltrb { l, t, r, b }
    }
    pub fn xywh(&self) -> Xywh<f64> {
        let mut arr = [self.to_array()];
        ltrb_to_xywh(&mut arr);
        Xywh::from_array(arr[0])
    }
    pub fn to_array(&self) -> [f64; 4] {
        [self.l, self.t, self.r, self.b]
    }
    pub fn from_array([l, t, r, b]: [f64; 4]) -> Self {
        Ltrb { l, t, r, b }
    }
    /// Height over width.
    pub fn aspect_ratio(&self) -> f64 {
        self.height() / self.width()
    }
    /// Seed each coordinate with its own derivative slot, in `l, t, r, b` order.
    pub fn dual(&self) -> Ltrb<D4> {
        Ltrb {
            l: one_hot(self.l, 0),
            t: one_hot(self.t, 1),
            r: one_hot(self.r, 2),
            b: one_hot(self.b, 3),
        }
    }
    /// Embed as constants (no derivative) in another numeric type.
    pub fn lift<D: DualNum<f64>>(&self) -> Ltrb<D> {
        Ltrb {
            l: dual::constant(self.l),
            t: dual::constant(self.t),
            r: dual::constant(self.r),
            b: dual::constant(self.b),
        }
    }
    /// Flatten a batch into the parameter vector layout used by the optimizer.
    pub fn flatten(boxes: &[Ltrb<f64>]) -> Vec<f64> {
        boxes.iter().flat_map(|b| b.to_array()).collect()
    }
    pub fn unflatten(params: &[f64]) -> Vec<Ltrb<f64>> {
        params
            .chunks_exact(4)
            .map(|c| Ltrb::new(c[0], c[1], c[2], c[3]))
            .collect()
    }
}

impl<D: DualNum<f64> + PartialOrd + Copy> Ltrb<D> {
    pub fn width(&self) -> D {
        self.r - self.l
    }
    pub fn height(&self) -> D {
        self.b - self.t
    }
    pub fn area(&self) -> D {
        self.width() * self.height()
    }
    pub fn center(&self) -> R2<D> {
        R2 {
            x: (self.l + self.r) * 0.5,
            y: (self.t + self.b) * 0.5,
        }
    }
    /// Overlap area with `o`, zero when the boxes are disjoint.
    pub fn intersection(&self, o: &Ltrb<D>) -> D {
        let w = dual::relu(dual::min(self.r, o.r) - dual::max(self.l, o.l));
        let h = dual::relu(dual::min(self.b, o.b) - dual::max(self.t, o.t));
        w * h
    }
    /// Smallest box containing both `self` and `o`.
    pub fn enclosing(&self, o: &Ltrb<D>) -> Ltrb<D> {
        Ltrb {
            l: dual::min(self.l, o.l),
            t: dual::min(self.t, o.t),
            r: dual::max(self.r, o.r),
            b: dual::max(self.b, o.b),
        }
    }
    pub fn iou(&self, o: &Ltrb<D>) -> D {
        let inter = self.intersection(o);
        let union = self.area() + o.area() - inter;
        if union.re() > 0. { inter / union } else { D::zero() }
    }
    pub fn v(&self) -> Ltrb<f64> {
        Ltrb {
            l: self.l.re(),
            t: self.t.re(),
            r: self.r.re(),
            b: self.b.re(),
        }
    }
}

impl<D: Display> Display for Ltrb<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}, {:.3}, {:.3}, {:.3}]", self.l, self.t, self.r, self.b)
    }
}
