//! Simulated bounding-box regression: a cloud of anchor boxes regressed toward centered targets.

use std::fmt::{self, Display};

use log::info;
use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::anchors::{anchor_sizes, target_boxes, AnchorBatch};
use crate::bbox::Ltrb;
use crate::error::ExperimentError;
use crate::loss::{ious, BoxLoss};
use crate::optimization::adam::Method;
use crate::optimization::log::ConvergenceLog;
use crate::optimization::minimize::MinimizeConfig;
use crate::r2::R2;
use crate::regression::regress;
use crate::scatter::{scatter_circle, DEFAULT_ALPHA};

pub const CENTER: R2<f64> = R2 { x: 0.5, y: 0.5 };

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub lr: f64,
    pub max_iter: usize,
    /// Render the anchor-point cloud and target boxes.
    pub plot_points: bool,
    /// Defaults to `2e4·radius²`.
    pub n_points: Option<usize>,
    /// Only the main regression cases: points within 0.1 of the center, and half the iterations.
    pub major_cases: bool,
    pub target_area: f64,
    pub anchor_areas: Vec<f64>,
    /// Height over width.
    pub aspect_ratios: Vec<f64>,
    pub patience: Option<usize>,
    /// Radial concentration of the anchor points.
    pub alpha: f64,
    pub method: Method,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            lr: 0.01,
            max_iter: 120,
            plot_points: false,
            n_points: None,
            major_cases: true,
            target_area: 1. / 32.,
            anchor_areas: vec![1. / 32., 1. / 24., 3. / 64., 1. / 16., 1. / 12., 3. / 32., 1. / 8.],
            aspect_ratios: vec![1. / 4., 1. / 3., 1. / 2., 1., 2., 3., 4.],
            patience: Some(50),
            alpha: DEFAULT_ALPHA,
            method: Method::Adam,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ExperimentError> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(ExperimentError::InvalidParameter { name, value })
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), ExperimentError> {
        positive("learning rate", self.lr)?;
        positive("target area", self.target_area)?;
        for area in &self.anchor_areas {
            positive("anchor area", *area)?;
        }
        for ar in &self.aspect_ratios {
            positive("aspect ratio", *ar)?;
        }
        if !self.alpha.is_finite() {
            return Err(ExperimentError::InvalidParameter { name: "alpha", value: self.alpha });
        }
        Ok(())
    }
    pub fn radius(&self) -> f64 {
        if self.major_cases { 0.1 } else { 0.5 }
    }
    pub fn n_points(&self) -> usize {
        let radius = self.radius();
        self.n_points.unwrap_or((2e4 * radius * radius) as usize)
    }
    pub fn iterations(&self) -> usize {
        if self.major_cases { self.max_iter / 2 } else { self.max_iter }
    }
}

/// Sample points plus the full anchor/target grid built on them.
#[derive(Debug, Clone, PartialEq)]
pub struct Setup {
    pub points: Vec<R2<f64>>,
    pub batch: AnchorBatch,
}

pub fn setup<R: Rng + ?Sized>(config: &ExperimentConfig, rng: &mut R) -> Setup {
    let points = scatter_circle(rng, config.n_points(), config.radius(), CENTER, config.alpha);
    let sizes = anchor_sizes(&config.anchor_areas, &config.aspect_ratios);
    let targets = target_boxes(config.target_area, &config.aspect_ratios, CENTER);
    let batch = AnchorBatch::new(&points, &sizes, targets);
    Setup { points, batch }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean_iou: f64,
    /// Worst per-point IoU.
    pub min_iou: f64,
}

impl Summary {
    pub fn new(per_point: &[f64]) -> Option<Self> {
        let min_iou = per_point.iter().copied().map(OrderedFloat).min()?.0;
        let mean_iou = per_point.iter().sum::<f64>() / per_point.len() as f64;
        Some(Summary { mean_iou, min_iou })
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mean IoU = {:.3}, Min IoU = {:.3}", self.mean_iou, self.min_iou)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentResult {
    /// Legend name of the loss.
    pub name: String,
    pub log: ConvergenceLog,
    pub points: Vec<R2<f64>>,
    /// One per aspect ratio.
    pub targets: Vec<Ltrb<f64>>,
    /// Regressed anchors, in batch order.
    pub boxes: Vec<Ltrb<f64>>,
    /// Final IoU averaged over each point's anchors.
    pub per_point_iou: Vec<f64>,
    /// `None` when there were no anchors.
    pub summary: Option<Summary>,
}

impl ExperimentResult {
    /// `"{loss}: Mean IoU = …, Min IoU = …"`
    pub fn report(&self) -> String {
        match &self.summary {
            Some(summary) => format!("{}: {}", self.name, summary),
            None => format!("{}: no regression cases", self.name),
        }
    }
}

/// Sample an anchor population, regress it under `loss`, and summarize the final IoUs.
pub fn simulate_exp<R: Rng + ?Sized>(
    loss: &mut BoxLoss,
    config: &ExperimentConfig,
    rng: &mut R,
) -> Result<ExperimentResult, ExperimentError> {
    config.validate()?;
    loss.reset();
    let name = loss.name().to_string();
    let Setup { points, batch } = setup(config, rng);
    let (n_points, n_shapes, n_targets) = batch.shape();
    info!("{}: {} points × {} anchor shapes × {} targets = {} boxes", name, n_points, n_shapes, n_targets, batch.len());
    if batch.is_empty() {
        return Ok(ExperimentResult {
            name,
            log: ConvergenceLog::default(),
            points,
            targets: batch.targets,
            boxes: vec![],
            per_point_iou: vec![],
            summary: None,
        });
    }
    let paired = batch.paired_targets();
    let minimize_config = MinimizeConfig {
        lr: config.lr,
        max_iter: config.iterations(),
        patience: config.patience,
        method: config.method,
        label: name.clone(),
    };
    let regression = regress(loss, &batch.anchors, &paired, &minimize_config)?;
    let per_point_iou = batch.per_point_mean(&ious(&regression.boxes, &paired));
    let summary = Summary::new(&per_point_iou);
    let result = ExperimentResult {
        name,
        log: regression.log,
        points,
        targets: batch.targets,
        boxes: regression.boxes,
        per_point_iou,
        summary,
    };
    info!("{}", result.report());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::LossKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    #[test]
    fn test_derived_sizes() {
        let config = ExperimentConfig::default();
        assert_eq!(config.radius(), 0.1);
        assert_eq!(config.n_points(), 200);
        assert_eq!(config.iterations(), 60);
        let all = ExperimentConfig { major_cases: false, ..ExperimentConfig::default() };
        assert_eq!(all.radius(), 0.5);
        assert_eq!(all.n_points(), 5000);
        assert_eq!(all.iterations(), 120);
        let given = ExperimentConfig { n_points: Some(500), ..ExperimentConfig::default() };
        assert_eq!(given.n_points(), 500);
    }

    #[test]
    fn test_no_points() {
        let config = ExperimentConfig { n_points: Some(0), ..ExperimentConfig::default() };
        let mut rng = StdRng::seed_from_u64(0);
        let mut loss = BoxLoss::new(LossKind::CIoU);
        let result = simulate_exp(&mut loss, &config, &mut rng).unwrap();
        assert!(result.boxes.is_empty());
        assert!(result.log.is_empty());
        assert_eq!(result.summary, None);
        assert_eq!(result.targets.len(), 7);
        assert_eq!(result.report(), "CIoU: no regression cases");
    }

    #[test]
    fn test_single_anchor_matches_target() {
        let config = ExperimentConfig {
            n_points: Some(1),
            aspect_ratios: vec![1.],
            anchor_areas: vec![1. / 32.],
            max_iter: 0,
            ..ExperimentConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let Setup { points, batch } = setup(&config, &mut rng);
        assert_eq!(points.len(), 1);
        assert_eq!(batch.len(), 1);
        let (anchor, target) = (batch.anchors[0], batch.targets[0]);
        assert_relative_eq!(anchor.area(), target.area(), epsilon = 1e-15);
        assert_relative_eq!(anchor.aspect_ratio(), target.aspect_ratio(), epsilon = 1e-12);
        assert_relative_eq!(anchor.center().x, points[0].x, epsilon = 1e-15);

        let mut loss = BoxLoss::new(LossKind::GIoU);
        let result = simulate_exp(&mut loss, &config, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(result.boxes, batch.anchors);
        let summary = result.summary.unwrap();
        assert_relative_eq!(summary.mean_iou, anchor.iou(&target));
        assert_eq!(summary.mean_iou, summary.min_iou);
    }

    #[test]
    fn test_simulation_improves_iou() {
        let config = ExperimentConfig {
            n_points: Some(20),
            anchor_areas: vec![1. / 32., 1. / 16.],
            aspect_ratios: vec![0.5, 1., 2.],
            ..ExperimentConfig::default()
        };
        let mut loss = BoxLoss::new(LossKind::WIoU);
        let mut rng = StdRng::seed_from_u64(1);
        let result = simulate_exp(&mut loss, &config, &mut rng).unwrap();
        assert_eq!(result.boxes.len(), 20 * 6 * 3);
        assert_eq!(result.per_point_iou.len(), 20);
        assert!(result.log.len() <= 60);
        let first = result.log[0];
        let last = result.log.last().unwrap();
        assert!(last > first, "{} → {}", first, last);
        let summary = result.summary.unwrap();
        assert!(summary.min_iou <= summary.mean_iou);
        assert!(result.report().starts_with("WIoU: Mean IoU = "));
    }

    #[test]
    fn test_invalid_parameters() {
        let mut loss = BoxLoss::new(LossKind::IoU);
        let mut rng = StdRng::seed_from_u64(0);
        let config = ExperimentConfig { lr: 0., ..ExperimentConfig::default() };
        assert_eq!(
            simulate_exp(&mut loss, &config, &mut rng).unwrap_err(),
            ExperimentError::InvalidParameter { name: "learning rate", value: 0. }
        );
        let config = ExperimentConfig { aspect_ratios: vec![1., -2.], ..ExperimentConfig::default() };
        assert!(matches!(
            simulate_exp(&mut loss, &config, &mut rng),
            Err(ExperimentError::InvalidParameter { name: "aspect ratio", .. })
        ));
    }

    #[test]
    fn test_config_serde() {
        let config: ExperimentConfig = serde_json::from_str(r#"{"n_points": 500, "plot_points": true}"#).unwrap();
        assert_eq!(config.n_points, Some(500));
        assert!(config.plot_points);
        assert_eq!(config.max_iter, 120);
        assert_eq!(config.aspect_ratios.len(), 7);
    }
}
