use serde::{Deserialize, Serialize};

/// Adam optimizer state over a flat parameter vector.
///
/// Keeps per-parameter first (mean) and second (uncentered variance) moment estimates of the gradient; each update
/// moves a parameter by roughly `lr` in the direction of its smoothed gradient, independent of gradient scale.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdamState {
    pub m: Vec<f64>,
    pub v: Vec<f64>,
    /// Steps taken (for bias correction)
    pub t: usize,
    pub config: AdamConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        AdamConfig {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl AdamState {
    pub fn new(n: usize) -> Self {
        Self::with_config(n, AdamConfig::default())
    }

    pub fn with_config(n: usize, config: AdamConfig) -> Self {
        AdamState {
            m: vec![0.0; n],
            v: vec![0.0; n],
            t: 0,
            config,
        }
    }

    /// Move `params` against `grads`, in place.
    pub fn descend(&mut self, params: &mut [f64], grads: &[f64], lr: f64) {
        self.t += 1;
        let AdamConfig { beta1, beta2, epsilon } = self.config;
        let beta1_correction = 1.0 - beta1.powi(self.t as i32);
        let beta2_correction = 1.0 - beta2.powi(self.t as i32);

        for (i, (p, &g)) in params.iter_mut().zip(grads).enumerate() {
            self.m[i] = beta1 * self.m[i] + (1.0 - beta1) * g;
            self.v[i] = beta2 * self.v[i] + (1.0 - beta2) * g * g;
            let m_hat = self.m[i] / beta1_correction;
            let v_hat = self.v[i] / beta2_correction;
            *p -= lr * m_hat / (v_hat.sqrt() + epsilon);
        }
    }
}

/// Parameter update rule used by [`super::minimize::minimize`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Adam,
    /// Plain gradient descent: `x ← x − lr·∇f`
    Sgd,
}

pub enum Optimizer {
    Adam(AdamState),
    Sgd,
}

impl Optimizer {
    pub fn new(method: Method, n: usize) -> Self {
        match method {
            Method::Adam => Optimizer::Adam(AdamState::new(n)),
            Method::Sgd => Optimizer::Sgd,
        }
    }
    pub fn descend(&mut self, params: &mut [f64], grads: &[f64], lr: f64) {
        match self {
            Optimizer::Adam(adam) => adam.descend(params, grads, lr),
            Optimizer::Sgd => {
                for (p, g) in params.iter_mut().zip(grads) {
                    *p -= lr * g;
                }
            }
        }
    }
}
