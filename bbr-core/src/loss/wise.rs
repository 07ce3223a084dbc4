use log::debug;
use serde::{Deserialize, Serialize};

/// Focusing mechanism applied on top of the Wise-IoU distance attention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Focusing {
    /// v1: distance attention only
    None,
    /// v2: scale by `(L*/μ)^0.5`
    Monotonic,
    /// v3: scale by the gradient gain `r(β; γ, δ)` of the outlier degree `β = L*/μ`
    NonMonotonic { gamma: f64, delta: f64 },
}

impl Focusing {
    pub fn non_monotonic() -> Self {
        Focusing::NonMonotonic { gamma: 1.9, delta: 3. }
    }
}

impl Default for Focusing {
    fn default() -> Self {
        Focusing::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WiseConfig {
    #[serde(default)]
    pub focusing: Focusing,
    /// Weight of the newest batch in the running mean of the IoU loss.
    #[serde(default = "default_momentum")]
    pub momentum: f64,
}

fn default_momentum() -> f64 {
    0.06
}

impl Default for WiseConfig {
    fn default() -> Self {
        WiseConfig { focusing: Focusing::default(), momentum: default_momentum() }
    }
}

/// Gradient gain `r = β / (δ·γ^{β−δ})` for outlier degree `β`.
///
/// `r(δ) = 1`; boxes much better or much worse than average get a smaller gain.
pub fn gradient_gain(beta: f64, gamma: f64, delta: f64) -> f64 {
    beta / (delta * gamma.powf(beta - delta))
}

/// Running statistics behind Wise-IoU's focusing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WiseState {
    pub config: WiseConfig,
    /// Running mean `μ` of the IoU loss.
    pub iou_mean: f64,
}

impl WiseState {
    pub fn new(config: WiseConfig) -> Self {
        WiseState { config, iou_mean: 1. }
    }
    pub fn reset(&mut self) {
        self.iou_mean = 1.;
    }
    /// Fold one batch's detached IoU losses into the running mean.
    pub fn update(&mut self, l_ious: &[f64]) {
        if l_ious.is_empty() {
            return;
        }
        let m = self.config.momentum;
        let batch_mean = l_ious.iter().sum::<f64>() / l_ious.len() as f64;
        self.iou_mean = (1. - m) * self.iou_mean + m * batch_mean;
        debug!("WIoU running mean {:.5} (batch {:.5})", self.iou_mean, batch_mean);
    }
    /// Constant factor multiplying one box's loss, given its detached IoU loss.
    pub fn scale(&self, l_iou: f64) -> f64 {
        if self.iou_mean <= 0. {
            return 1.;
        }
        let beta = l_iou / self.iou_mean;
        match self.config.focusing {
            Focusing::None => 1.,
            Focusing::Monotonic => beta.sqrt(),
            Focusing::NonMonotonic { gamma, delta } => gradient_gain(beta, gamma, delta),
        }
    }
}
