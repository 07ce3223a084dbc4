//! IoU-family bounding-box regression losses.
//!
//! Each loss is evaluated generically over [`DualNum`] numbers: `f64` for plain values, [`D4`] for the exact gradient
//! w.r.t. the predicted box's corners.

pub mod terms;
pub mod wise;

use std::f64::consts::PI;
use std::fmt::{self, Display};
use std::str::FromStr;

use num_dual::DualNum;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bbox::Ltrb;
use crate::dual::{self, grad, D4};
use crate::error::LossError;
use terms::PairTerms;
use wise::{WiseConfig, WiseState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossKind {
    IoU,
    GIoU,
    DIoU,
    CIoU,
    EIoU,
    SIoU,
    /// Wise-IoU, the proposed loss
    WIoU,
}

impl LossKind {
    pub const ALL: [LossKind; 7] = [
        LossKind::IoU,
        LossKind::GIoU,
        LossKind::DIoU,
        LossKind::CIoU,
        LossKind::EIoU,
        LossKind::SIoU,
        LossKind::WIoU,
    ];
    pub fn name(&self) -> &'static str {
        match self {
            LossKind::IoU => "IoU",
            LossKind::GIoU => "GIoU",
            LossKind::DIoU => "DIoU",
            LossKind::CIoU => "CIoU",
            LossKind::EIoU => "EIoU",
            LossKind::SIoU => "SIoU",
            LossKind::WIoU => "WIoU",
        }
    }
}

impl Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LossKind {
    type Err = LossError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower == "proposed" || lower == "wise" {
            return Ok(LossKind::WIoU);
        }
        LossKind::ALL
            .into_iter()
            .find(|k| k.name().to_ascii_lowercase() == lower)
            .ok_or_else(|| LossError::UnknownLoss(s.to_string()))
    }
}

/// Mean loss over a batch, with its gradient w.r.t. every predicted coordinate (flattened `l, t, r, b` per box).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLoss {
    pub value: f64,
    pub grad: Vec<f64>,
}

/// A loss strategy, plus the running state some strategies keep across batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxLoss {
    pub kind: LossKind,
    pub wise: WiseState,
}

impl BoxLoss {
    pub fn new(kind: LossKind) -> Self {
        Self::with_wise(kind, WiseConfig::default())
    }
    pub fn with_wise(kind: LossKind, config: WiseConfig) -> Self {
        BoxLoss { kind, wise: WiseState::new(config) }
    }
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
    /// Forget running statistics accumulated by previous batches.
    pub fn reset(&mut self) {
        self.wise.reset();
    }
    /// Update running statistics from the current batch; called once per batch, before [`Self::eval`].
    pub fn prepare(&mut self, preds: &[Ltrb<f64>], targets: &[Ltrb<f64>]) {
        if self.kind == LossKind::WIoU {
            let l_ious: Vec<f64> = ious(preds, targets).into_iter().map(|iou| 1. - iou).collect();
            self.wise.update(&l_ious);
        }
    }
    /// Loss of one predicted box against its target.
    pub fn eval<D: DualNum<f64> + PartialOrd + Copy>(&self, pred: &Ltrb<D>, target: &Ltrb<f64>) -> D {
        let target: Ltrb<D> = target.lift();
        let t = PairTerms::new(pred, &target);
        match self.kind {
            LossKind::IoU => t.l_iou,
            LossKind::GIoU => {
                let enclosing = t.enclosing_area();
                t.l_iou + (enclosing - t.union) / enclosing
            }
            LossKind::DIoU => t.l_iou + t.rho2() / t.c2(),
            LossKind::CIoU => {
                let dtheta = (t.wt / t.ht).atan() - (t.w / t.h).atan();
                let v = dtheta * dtheta * (4. / (PI * PI));
                let denom = t.l_iou.re() + v.re();
                let alpha = if denom > 0. { v.re() / denom } else { 0. };
                t.l_iou + t.rho2() / t.c2() + v * alpha
            }
            LossKind::EIoU => {
                let dw = t.w - t.wt;
                let dh = t.h - t.ht;
                t.l_iou
                    + t.rho2() / t.c2()
                    + dw * dw / (t.cw * t.cw + terms::EPS)
                    + dh * dh / (t.ch * t.ch + terms::EPS)
            }
            LossKind::SIoU => siou(&t),
            LossKind::WIoU => {
                let attention = (t.rho2() / dual::detach(&t.c2())).exp();
                attention * t.l_iou * self.wise.scale(t.l_iou.re())
            }
        }
    }
    /// Mean loss over aligned `preds`/`targets`, evaluating boxes in parallel.
    pub fn batch(&mut self, preds: &[Ltrb<f64>], targets: &[Ltrb<f64>]) -> BatchLoss {
        self.prepare(preds, targets);
        let n = preds.len();
        if n == 0 {
            return BatchLoss { value: 0., grad: vec![] };
        }
        let this = &*self;
        let per_box: Vec<(f64, [f64; 4])> = preds
            .par_iter()
            .zip(targets.par_iter())
            .map(|(pred, target)| {
                let loss: D4 = this.eval(&pred.dual(), target);
                (loss.re, grad(&loss))
            })
            .collect();
        let scale = 1. / n as f64;
        let value = per_box.iter().map(|(v, _)| v).sum::<f64>() * scale;
        let grad = per_box.iter().flat_map(|(_, g)| g.map(|d| d * scale)).collect();
        BatchLoss { value, grad }
    }
}

/// SCYLLA-IoU: IoU loss plus angle-aware distance cost and shape cost (θ = 4).
fn siou<D: DualNum<f64> + PartialOrd + Copy>(t: &PairTerms<D>) -> D {
    let rho2 = t.rho2();
    let sin_alpha = if rho2.re() > 0. {
        dual::min(t.dx.abs(), t.dy.abs()) / rho2.sqrt()
    } else {
        D::zero()
    };
    // sin(2·asin(s)) = 2s·√(1 − s²)
    let angle = sin_alpha * (-(sin_alpha * sin_alpha) + 1.).sqrt() * 2.;
    let gamma = -angle + 2.;
    let rho_x = t.dx * t.dx / (t.cw * t.cw + terms::EPS);
    let rho_y = t.dy * t.dy / (t.ch * t.ch + terms::EPS);
    let distance = -(-gamma * rho_x).exp() - (-gamma * rho_y).exp() + 2.;
    let omega_w = (t.w - t.wt).abs() / dual::max(t.w, t.wt);
    let omega_h = (t.h - t.ht).abs() / dual::max(t.h, t.ht);
    let shape = (-(-omega_w).exp() + 1.).powi(4) + (-(-omega_h).exp() + 1.).powi(4);
    t.l_iou + (distance + shape) * 0.5
}

/// Element-wise IoU of aligned box slices.
pub fn ious(preds: &[Ltrb<f64>], targets: &[Ltrb<f64>]) -> Vec<f64> {
    preds
        .par_iter()
        .zip(targets.par_iter())
        .map(|(p, t)| p.iou(t))
        .collect()
}

/// Mean IoU of aligned box slices; `None` for an empty batch.
pub fn mean_iou(preds: &[Ltrb<f64>], targets: &[Ltrb<f64>]) -> Option<f64> {
    if preds.is_empty() {
        None
    } else {
        Some(ious(preds, targets).iter().sum::<f64>() / preds.len() as f64)
    }
}
