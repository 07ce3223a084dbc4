//! CLI for bounding-box regression loss simulations.
//!
//! Runs a list of commands (from a JSON config, or the built-in default), each writing SVG plots and convergence
//! logs to an output directory:
//! - convergence curves of several losses on a simulated anchor population
//! - single simulations, with their anchor-point cloud
//! - regression trajectories of single boxes
//! - the Wise-IoU gradient gain curve

mod commands;
mod config;
mod memory;
mod output;
mod render;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use bbr_core::experiment::ExperimentConfig;
use bbr_core::plot::check_colors;
use bbr_core::track::Epochs;
use bbr_core::{parse_log_level, LossKind};
use clap::{Args, Parser, Subcommand};

use commands::Runner;
use config::{Command, Config, TrackEntry};

#[derive(Parser)]
#[command(name = "bbr")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BBR_BUILD_SHA"), ")"))]
#[command(about = "Bounding-box regression loss simulations", long_about = None)]
struct Cli {
    /// Config file (JSON): palette, Wise-IoU settings, retry policy, command list
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for plots and logs
    #[arg(short, long, global = true, default_value = "out")]
    out_dir: PathBuf,

    /// Seed for anchor sampling
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Log level (`RUST_LOG` takes precedence)
    #[arg(short, long, global = true, value_parser = ["error", "warn", "info", "debug", "trace"])]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ExperimentArgs {
    /// Number of anchor points (default: derived from the sampling radius)
    #[arg(short, long)]
    n_points: Option<usize>,

    /// Sample anchors anywhere within 0.5 of the center, not just near the target
    #[arg(long)]
    all_cases: bool,

    /// Maximum iterations (halved unless `--all-cases`)
    #[arg(short, long, default_value = "120")]
    max_iter: usize,

    /// Learning rate
    #[arg(long, default_value = "0.01")]
    lr: f64,
}

impl ExperimentArgs {
    fn config(&self, plot_points: bool) -> ExperimentConfig {
        ExperimentConfig {
            lr: self.lr,
            max_iter: self.max_iter,
            plot_points,
            n_points: self.n_points,
            major_cases: !self.all_cases,
            ..ExperimentConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured command list (the default)
    Run,

    /// Simulate regression of an anchor population under one loss
    Simulate {
        /// Loss (IoU, GIoU, DIoU, CIoU, EIoU, SIoU, WIoU)
        #[arg(long, default_value = "WIoU")]
        loss: LossKind,

        /// Also render the anchor points and target boxes
        #[arg(short, long)]
        plot_points: bool,

        #[command(flatten)]
        experiment: ExperimentArgs,
    },

    /// Plot convergence curves of several losses
    PlotLoss {
        /// Comma-separated losses
        #[arg(long, value_delimiter = ',', default_value = "WIoU,GIoU,CIoU")]
        losses: Vec<LossKind>,

        #[command(flatten)]
        experiment: ExperimentArgs,
    },

    /// Visualize single-box regression trajectories
    Track {
        /// `LOSS=EPOCHS` or `LOSS=EPOCHS1,EPOCHS2` (one count per case); repeatable
        #[arg(long = "loss", value_parser = parse_track, default_values = ["WIoU=240", "CIoU=260", "GIoU=550"])]
        losses: Vec<TrackEntry>,

        /// Learning rate
        #[arg(long, default_value = "0.01")]
        lr: f64,
    },

    /// Plot the Wise-IoU gradient gain against outlier degree
    Gain,

    /// Re-render convergence curves from a saved log file (.json or .json.gz)
    Replot {
        logs: PathBuf,
    },
}

fn parse_track(s: &str) -> Result<TrackEntry, String> {
    let (loss, epochs) = s.split_once('=').ok_or_else(|| format!("expected LOSS=EPOCHS, found {:?}", s))?;
    let loss: LossKind = loss.parse().map_err(|e| format!("{}", e))?;
    let counts = epochs
        .split(',')
        .map(|n| n.trim().parse::<usize>().map_err(|e| format!("invalid epoch count {:?}: {}", n, e)))
        .collect::<Result<Vec<_>, _>>()?;
    let epochs = match counts.as_slice() {
        [n] => Epochs::Same(*n),
        _ => Epochs::PerCase(counts),
    };
    Ok(TrackEntry { loss, epochs })
}

/// Render `path`'s logs to `<out_dir>/<file stem>.svg`.
fn replot(path: &Path, config: &Config, out_dir: &Path) -> Result<()> {
    let logs = output::read_logs(path)?;
    check_colors(&config.colors, logs.len())?;
    let svg = render::render_loss_curves(&logs, &config.colors, &render::RenderConfig::default())?;
    fs::create_dir_all(out_dir)?;
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("logs");
    let stem = name.trim_end_matches(".gz").trim_end_matches(".json");
    output::write_svg(&out_dir.join(format!("{}.svg", stem)), &svg)
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(parse_log_level(cli.log_level.as_deref()))
        .parse_default_env()
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let commands = match cli.command.take().unwrap_or(Commands::Run) {
        Commands::Run => config.commands.clone(),
        Commands::Simulate { loss, plot_points, experiment } => vec![Command::Simulate {
            loss,
            experiment: experiment.config(plot_points),
        }],
        Commands::PlotLoss { losses, experiment } => vec![Command::PlotLoss {
            losses,
            experiment: experiment.config(false),
        }],
        Commands::Track { losses, lr } => vec![Command::Track { losses, lr, colors: None }],
        Commands::Gain => vec![Command::gain()],
        Commands::Replot { logs } => return replot(&logs, &config, &cli.out_dir),
    };

    let mut runner = Runner::new(config, &cli.out_dir, cli.seed)?;
    let paths = runner.run_all(&commands)?;
    log::info!("Wrote {} file(s) to {}", paths.len(), cli.out_dir.display());
    Ok(())
}
