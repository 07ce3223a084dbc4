//! Regression trajectories of single boxes, for side-by-side comparison of losses.

use serde::{Deserialize, Serialize};

use crate::bbox::{Ltrb, Xywh};
use crate::error::PlotError;
use crate::loss::BoxLoss;
use crate::optimization::log::ConvergenceLog;
use crate::optimization::minimize::MinimizeConfig;
use crate::regression::regress;

/// `(anchor, target)` pairs, center form.
pub const CASES: [([f64; 4], [f64; 4]); 2] = [
    ([0.7, 0.7, 0.2, 0.4], [0.2, 0.2, 0.05, 0.1]),
    ([0.5, 0.8, 0.6, 0.1], [0.5, 0.1, 0.05, 0.05]),
];

/// Epochs to run a loss for: the same count for every case, or one per case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Epochs {
    Same(usize),
    PerCase(Vec<usize>),
}

impl Epochs {
    pub fn per_case(&self, loss: &str) -> Result<[usize; 2], PlotError> {
        match self {
            Epochs::Same(n) => Ok([*n; 2]),
            Epochs::PerCase(counts) => <[usize; 2]>::try_from(counts.as_slice())
                .map_err(|_| PlotError::EpochCount { loss: loss.to_string(), count: counts.len() }),
        }
    }
}

impl From<usize> for Epochs {
    fn from(n: usize) -> Self {
        Epochs::Same(n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub epochs: usize,
    pub bbox: Ltrb<f64>,
    pub log: ConvergenceLog,
}

impl Track {
    pub fn label(&self) -> String {
        format!("{} {} epochs", self.name, self.epochs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackCase {
    pub anchor: Ltrb<f64>,
    pub target: Ltrb<f64>,
    /// One per loss, in input order.
    pub tracks: Vec<Track>,
}

/// Regress each case's anchor under each loss, for exactly that loss's epoch count (no early stopping).
///
/// Epoch counts are all checked before anything runs.
pub fn regression_tracks(losses: &mut [(BoxLoss, Epochs)], lr: f64) -> Result<Vec<TrackCase>, PlotError> {
    let epochs = losses
        .iter()
        .map(|(loss, epochs)| epochs.per_case(loss.name()))
        .collect::<Result<Vec<_>, _>>()?;
    let mut cases = Vec::with_capacity(CASES.len());
    for (idx, (anchor, target)) in CASES.iter().enumerate() {
        let anchor = Xywh::from_array(*anchor).ltrb();
        let target = Xywh::from_array(*target).ltrb();
        let mut tracks = Vec::with_capacity(losses.len());
        for ((loss, _), epochs) in losses.iter_mut().zip(&epochs) {
            loss.reset();
            let config = MinimizeConfig {
                lr,
                max_iter: epochs[idx],
                patience: None,
                label: format!("{} case {}", loss.name(), idx + 1),
                ..MinimizeConfig::default()
            };
            let regression = regress(loss, &[anchor], &[target], &config)?;
            tracks.push(Track {
                name: loss.name().to_string(),
                epochs: epochs[idx],
                bbox: regression.boxes[0],
                log: regression.log,
            });
        }
        cases.push(TrackCase { anchor, target, tracks });
    }
    Ok(cases)
}
