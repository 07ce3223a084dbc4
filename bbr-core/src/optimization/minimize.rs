use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::OptimizeError;
use super::adam::{Method, Optimizer};
use super::log::ConvergenceLog;

/// A differentiable function of a flat parameter vector.
pub trait Objective {
    /// Value and gradient at `x`; the gradient has one entry per parameter.
    fn value_and_grad(&mut self, x: &[f64]) -> (f64, Vec<f64>);
}

impl<F: FnMut(&[f64]) -> (f64, Vec<f64>)> Objective for F {
    fn value_and_grad(&mut self, x: &[f64]) -> (f64, Vec<f64>) {
        self(x)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinimizeConfig {
    pub lr: f64,
    pub max_iter: usize,
    /// Stop once the objective hasn't improved for this many consecutive iterations.
    pub patience: Option<usize>,
    #[serde(default)]
    pub method: Method,
    /// Prefix for progress logging.
    #[serde(default)]
    pub label: String,
}

impl Default for MinimizeConfig {
    fn default() -> Self {
        MinimizeConfig {
            lr: 0.01,
            max_iter: 1000,
            patience: Some(50),
            method: Method::Adam,
            label: "minimize".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Minimized {
    /// Parameters after the last update.
    pub x: Vec<f64>,
    /// Lowest objective value seen.
    pub best: f64,
    /// `eval(x)` after each update.
    pub log: ConvergenceLog,
    pub steps: usize,
}

const PROGRESS_INTERVAL: usize = 20;

/// Gradient-descent minimization of `objective`, starting from `x`.
///
/// Every iteration evaluates the objective and its gradient, updates `x` in place, and records `eval(x)`.
pub fn minimize<O, E>(mut x: Vec<f64>, objective: &mut O, mut eval: E, config: &MinimizeConfig) -> Result<Minimized, OptimizeError>
where
    O: Objective + ?Sized,
    E: FnMut(&[f64]) -> f64,
{
    let label = &config.label;
    let mut optimizer = Optimizer::new(config.method, x.len());
    let mut log = ConvergenceLog::default();
    let mut best = f64::INFINITY;
    let mut stale = 0;
    let mut steps = 0;
    for step in 0..config.max_iter {
        let (value, grad) = objective.value_and_grad(&x);
        if !value.is_finite() {
            return Err(OptimizeError::NonFinite { label: label.clone(), step, value });
        }
        if grad.len() != x.len() {
            return Err(OptimizeError::GradientLength { label: label.clone(), expected: x.len(), actual: grad.len() });
        }
        if let Some((index, &value)) = grad.iter().enumerate().find(|(_, g)| !g.is_finite()) {
            return Err(OptimizeError::NonFiniteGradient { label: label.clone(), step, index, value });
        }
        if value < best {
            best = value;
            stale = 0;
        } else {
            stale += 1;
        }
        optimizer.descend(&mut x, &grad, config.lr);
        let evaluation = eval(&x);
        log.push(evaluation);
        steps = step + 1;
        if step % PROGRESS_INTERVAL == 0 {
            debug!("{}: step {:4}, objective {:.6}, eval {:.4}", label, step, value, evaluation);
        }
        if config.patience.is_some_and(|patience| stale >= patience) {
            debug!("{}: no improvement in {} steps, stopping at step {}", label, stale, step);
            break;
        }
    }
    info!("{}: {} steps, best objective {:.5}, final eval {}", label, steps, best, log.last().map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string()));
    Ok(Minimized { x, best, log, steps })
}
