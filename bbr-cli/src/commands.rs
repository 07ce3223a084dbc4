use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result};
use bbr_core::experiment::{simulate_exp, ExperimentConfig, ExperimentResult};
use bbr_core::plot::{check_colors, gain_curves};
use bbr_core::track::{regression_tracks, Epochs};
use bbr_core::{BoxLoss, LogSet, LossKind};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{Command, Config, TrackEntry};
use crate::memory::{self, Usage};
use crate::output::{write_logs, write_svg};
use crate::render::{palette, render_gain, render_loss_curves, render_points, render_tracks, RenderConfig};

/// Executes commands in order, writing each one's plots and logs to `out_dir`.
pub struct Runner {
    pub config: Config,
    pub out_dir: PathBuf,
    pub render: RenderConfig,
    rng: StdRng,
}

impl Runner {
    pub fn new(config: Config, out_dir: &Path, seed: Option<u64>) -> Result<Self> {
        fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Runner { config, out_dir: out_dir.to_path_buf(), render: RenderConfig::default(), rng })
    }

    fn loss(&self, kind: LossKind) -> BoxLoss {
        BoxLoss::with_wise(kind, self.config.wise)
    }

    fn path(&self, idx: usize, name: &str) -> PathBuf {
        self.out_dir.join(format!("{:02}-{}", idx, name))
    }

    fn logs_path(&self, idx: usize, name: &str) -> PathBuf {
        let ext = if self.config.compress_logs { "json.gz" } else { "json" };
        self.path(idx, &format!("{}.{}", name, ext))
    }

    /// One simulation, retried per the configured policy.
    fn simulate(&mut self, kind: LossKind, experiment: &ExperimentConfig) -> Result<ExperimentResult> {
        // Configuration errors aren't worth retrying
        experiment.validate()?;
        let mut loss = self.loss(kind);
        // Failed attempts are reported on stdout, alongside the result lines
        let retried = self.config.retry.run_with(
            || simulate_exp(&mut loss, experiment, &mut self.rng),
            thread::sleep,
            |msg| println!("{}: {}", kind, msg),
        )?;
        if retried.failures > 0 {
            warn!("{}: succeeded after {} failed attempt(s)", kind, retried.failures);
        }
        let result = retried.value;
        println!("{}", result.report());
        Ok(result)
    }

    fn plot_loss(&mut self, idx: usize, losses: &[LossKind], experiment: &ExperimentConfig) -> Result<Vec<PathBuf>> {
        check_colors(&self.config.colors, losses.len())?;
        palette(&self.config.colors)?;
        let mut logs = LogSet::default();
        for kind in losses {
            let result = self.simulate(*kind, experiment)?;
            logs.insert(&result.name, result.log);
        }
        let svg = render_loss_curves(&logs, &self.config.colors, &self.render)?;
        let svg_path = self.path(idx, "loss.svg");
        write_svg(&svg_path, &svg)?;
        let logs_path = self.logs_path(idx, "loss");
        write_logs(&logs_path, &logs)?;
        Ok(vec![svg_path, logs_path])
    }

    fn simulate_one(&mut self, idx: usize, kind: LossKind, experiment: &ExperimentConfig) -> Result<Vec<PathBuf>> {
        let result = self.simulate(kind, experiment)?;
        let mut paths = vec![];
        if experiment.plot_points {
            let svg = render_points(&result.points, &result.targets, &self.render)?;
            let path = self.path(idx, &format!("points-{}.svg", result.name));
            write_svg(&path, &svg)?;
            paths.push(path);
        }
        let mut logs = LogSet::default();
        logs.insert(&result.name, result.log);
        let path = self.logs_path(idx, &format!("simulate-{}", result.name));
        write_logs(&path, &logs)?;
        paths.push(path);
        Ok(paths)
    }

    fn track(&self, idx: usize, entries: &[TrackEntry], lr: f64, colors: Option<&[String]>) -> Result<Vec<PathBuf>> {
        let colors = colors.unwrap_or(&self.config.colors);
        check_colors(colors, entries.len())?;
        palette(colors)?;
        let mut losses: Vec<(BoxLoss, Epochs)> = entries
            .iter()
            .map(|entry| (self.loss(entry.loss), entry.epochs.clone()))
            .collect();
        let cases = regression_tracks(&mut losses, lr)?;
        for (case_idx, case) in cases.iter().enumerate() {
            for track in &case.tracks {
                info!("case {}: {}, IoU {:.3}", case_idx + 1, track.label(), track.bbox.iou(&case.target));
            }
        }
        let svg = render_tracks(&cases, colors, &self.render)?;
        let path = self.path(idx, "track.svg");
        write_svg(&path, &svg)?;
        Ok(vec![path])
    }

    fn gain(&self, idx: usize, gammas: &[f64], deltas: &[f64], colors: &[String]) -> Result<Vec<PathBuf>> {
        let curves = gain_curves(gammas, deltas);
        check_colors(colors, curves.len())?;
        let svg = render_gain(&curves, colors, &self.render)?;
        let path = self.path(idx, "gain.svg");
        write_svg(&path, &svg)?;
        Ok(vec![path])
    }

    /// Run command `idx` (1-based), returning the files it wrote.
    pub fn execute(&mut self, idx: usize, command: &Command) -> Result<Vec<PathBuf>> {
        info!("Command {}: {}", idx, command.name());
        match command {
            Command::PlotLoss { losses, experiment } => self.plot_loss(idx, losses, experiment),
            Command::Simulate { loss, experiment } => self.simulate_one(idx, *loss, experiment),
            Command::Track { losses, lr, colors } => self.track(idx, losses, *lr, colors.as_deref()),
            Command::Gain { gammas, deltas, colors } => self.gain(idx, gammas, deltas, colors),
        }
    }

    /// Run every command in order, printing memory usage around each.
    pub fn run_all(&mut self, commands: &[Command]) -> Result<Vec<PathBuf>> {
        println!("Initial memory usage: {}", memory::fmt_mb(memory::rss_mb()));
        let mut paths = vec![];
        for (i, command) in commands.iter().enumerate() {
            let idx = i + 1;
            let before = memory::rss_mb();
            paths.extend(self.execute(idx, command)?);
            let usage = Usage { before, after: memory::rss_mb() };
            for line in usage.report(idx) {
                println!("{}", line);
            }
        }
        Ok(paths)
    }
}
