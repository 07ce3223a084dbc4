#![allow(mixed_script_confusables)]

#[cfg_attr(not(test), allow(unused_imports))]
#[macro_use]
extern crate approx;

pub mod geometry;
pub mod loss;
pub mod optimization;
pub mod sampling;

pub use geometry::bbox;
pub use geometry::r2;

pub use sampling::anchors;
pub use sampling::scatter;

pub use optimization::adam;
pub use optimization::minimize;

pub mod dual;
pub mod error;
pub mod experiment;
pub mod plot;
pub mod regression;
pub mod retry;
pub mod track;

pub use bbox::{Ltrb, Xywh};
pub use error::{ExperimentError, LossError, OptimizeError, PlotError};
pub use experiment::{simulate_exp, ExperimentConfig, ExperimentResult};
pub use loss::{BoxLoss, LossKind};
pub use optimization::log::{ConvergenceLog, LogSet};
pub use r2::R2;
pub use retry::RetryPolicy;

/// Parse a log level string into LevelFilter.
pub fn parse_log_level(level: Option<&str>) -> log::LevelFilter {
    match level {
        Some("error") => log::LevelFilter::Error,
        Some("warn") => log::LevelFilter::Warn,
        Some("info") | Some("") | None => log::LevelFilter::Info,
        Some("debug") => log::LevelFilter::Debug,
        Some("trace") => log::LevelFilter::Trace,
        Some(level) => panic!("invalid log level: {}", level),
    }
}
