use serde::{Deserialize, Serialize};

use crate::bbox::Ltrb;
use crate::error::OptimizeError;
use crate::loss::{mean_iou, BatchLoss, BoxLoss};
use crate::optimization::log::ConvergenceLog;
use crate::optimization::minimize::{minimize, MinimizeConfig, Objective};

/// Mean loss of a batch of predicted boxes (flattened `l, t, r, b`) against aligned targets.
pub struct BoxRegression<'a> {
    pub loss: &'a mut BoxLoss,
    pub targets: &'a [Ltrb<f64>],
}

impl<'a> BoxRegression<'a> {
    pub fn new(loss: &'a mut BoxLoss, targets: &'a [Ltrb<f64>]) -> Self {
        BoxRegression { loss, targets }
    }
}

impl Objective for BoxRegression<'_> {
    fn value_and_grad(&mut self, x: &[f64]) -> (f64, Vec<f64>) {
        let preds = Ltrb::unflatten(x);
        let BatchLoss { value, grad } = self.loss.batch(&preds, self.targets);
        (value, grad)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub boxes: Vec<Ltrb<f64>>,
    /// Mean IoU after each step.
    pub log: ConvergenceLog,
    pub best_loss: f64,
    pub steps: usize,
}

/// Regress `anchors` toward `targets` (aligned) under `loss`, logging mean IoU per step.
pub fn regress(
    loss: &mut BoxLoss,
    anchors: &[Ltrb<f64>],
    targets: &[Ltrb<f64>],
    config: &MinimizeConfig,
) -> Result<Regression, OptimizeError> {
    let mut objective = BoxRegression::new(loss, targets);
    let eval = |x: &[f64]| mean_iou(&Ltrb::unflatten(x), targets).unwrap_or(0.);
    let result = minimize(Ltrb::flatten(anchors), &mut objective, eval, config)?;
    Ok(Regression {
        boxes: Ltrb::unflatten(&result.x),
        log: result.log,
        best_loss: result.best,
        steps: result.steps,
    })
}
