//! Palette, loss settings and the command list, loadable from a JSON file.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use bbr_core::experiment::ExperimentConfig;
use bbr_core::loss::wise::WiseConfig;
use bbr_core::track::Epochs;
use bbr_core::{LossKind, RetryPolicy};
use serde::{Deserialize, Serialize};

pub const RED: &str = "orangered";
pub const ORANGE: &str = "darkorange";
pub const YELLOW: &str = "gold";
pub const GREEN: &str = "greenyellow";
pub const CYAN: &str = "aqua";
pub const BLUE: &str = "deepskyblue";
pub const PURPLE: &str = "mediumpurple";
pub const PINK: &str = "violet";

fn colors(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}

pub fn default_colors() -> Vec<String> {
    colors(&[PURPLE, BLUE, GREEN, YELLOW, ORANGE])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub loss: LossKind,
    pub epochs: Epochs,
}

/// One plotting/simulation step of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    /// Convergence curves (mean IoU per epoch) of several losses on the same simulated population.
    PlotLoss {
        losses: Vec<LossKind>,
        #[serde(flatten)]
        experiment: ExperimentConfig,
    },
    /// A single simulation, optionally rendering its anchor points.
    Simulate {
        loss: LossKind,
        #[serde(flatten)]
        experiment: ExperimentConfig,
    },
    /// Single-box regression trajectories for two fixed cases.
    Track {
        losses: Vec<TrackEntry>,
        #[serde(default = "default_track_lr")]
        lr: f64,
        /// Falls back to the global palette.
        #[serde(default)]
        colors: Option<Vec<String>>,
    },
    /// Wise-IoU gradient gain against outlier degree.
    Gain {
        gammas: Vec<f64>,
        deltas: Vec<f64>,
        colors: Vec<String>,
    },
}

fn default_track_lr() -> f64 {
    0.01
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::PlotLoss { .. } => "plot-loss",
            Command::Simulate { .. } => "simulate",
            Command::Track { .. } => "track",
            Command::Gain { .. } => "gain",
        }
    }

    pub fn gain() -> Self {
        Command::Gain {
            gammas: vec![2.5, 1.9, 1.6, 1.4],
            deltas: vec![2., 3., 4., 5.],
            colors: colors(&[PINK, BLUE, YELLOW, ORANGE]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Series colors for loss curves (and tracks without their own colors).
    pub colors: Vec<String>,
    /// Focusing and momentum of every Wise-IoU loss.
    pub wise: WiseConfig,
    /// Applied to each simulation run.
    pub retry: RetryPolicy,
    /// Write convergence logs gzip-compressed (`.json.gz`) instead of plain `.json`.
    pub compress_logs: bool,
    pub commands: Vec<Command>,
}

impl Default for Config {
    fn default() -> Self {
        let simulate = |loss| Command::Simulate {
            loss,
            experiment: ExperimentConfig { plot_points: true, ..ExperimentConfig::default() },
        };
        Config {
            colors: default_colors(),
            wise: WiseConfig::default(),
            retry: RetryPolicy::default(),
            compress_logs: true,
            commands: vec![
                Command::PlotLoss {
                    losses: vec![LossKind::WIoU, LossKind::GIoU, LossKind::CIoU],
                    experiment: ExperimentConfig { n_points: Some(500), ..ExperimentConfig::default() },
                },
                simulate(LossKind::CIoU),
                simulate(LossKind::WIoU),
                simulate(LossKind::GIoU),
                Command::Track {
                    losses: vec![
                        TrackEntry { loss: LossKind::WIoU, epochs: Epochs::Same(240) },
                        TrackEntry { loss: LossKind::CIoU, epochs: Epochs::Same(260) },
                        TrackEntry { loss: LossKind::GIoU, epochs: Epochs::Same(550) },
                    ],
                    lr: default_track_lr(),
                    colors: Some(colors(&[CYAN, PINK, YELLOW])),
                },
            ],
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbr_core::loss::wise::Focusing;
    use test_log::test;

    #[test]
    fn test_default_commands() {
        let config = Config::default();
        assert_eq!(config.colors.len(), 5);
        let names: Vec<_> = config.commands.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["plot-loss", "simulate", "simulate", "simulate", "track"]);
        match &config.commands[0] {
            Command::PlotLoss { losses, experiment } => {
                assert_eq!(losses.len(), 3);
                assert_eq!(experiment.n_points, Some(500));
                assert!(experiment.major_cases);
            }
            c => panic!("unexpected {:?}", c),
        }
    }

    #[test]
    fn test_parse() {
        let json = r#"{
            "wise": {"focusing": {"type": "non-monotonic", "gamma": 1.9, "delta": 3}},
            "commands": [
                {"command": "simulate", "loss": "SIoU", "n_points": 10, "major_cases": false},
                {"command": "track", "losses": [{"loss": "WIoU", "epochs": [10, 20]}]},
                {"command": "gain", "gammas": [1.9], "deltas": [3], "colors": ["gold"]}
            ]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.wise.focusing, Focusing::NonMonotonic { gamma: 1.9, delta: 3. });
        assert_eq!(config.wise.momentum, 0.06);
        assert_eq!(config.colors, default_colors());
        assert!(config.compress_logs);
        assert_eq!(
            config.commands[0],
            Command::Simulate {
                loss: LossKind::SIoU,
                experiment: ExperimentConfig { n_points: Some(10), major_cases: false, ..ExperimentConfig::default() },
            }
        );
        match &config.commands[1] {
            Command::Track { losses, lr, colors } => {
                assert_eq!(losses[0].epochs, Epochs::PerCase(vec![10, 20]));
                assert_eq!(*lr, 0.01);
                assert_eq!(*colors, None);
            }
            c => panic!("unexpected {:?}", c),
        }
    }

    #[test]
    fn test_default_round_trips() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
    }
}
