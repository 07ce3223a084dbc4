#[derive(Debug, thiserror::Error)]
pub enum LossError {
    #[error("Unrecognized loss: {0:?}")]
    UnknownLoss(String),
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    #[error("{label}: non-finite objective {value} at step {step}")]
    NonFinite {
        label: String,
        step: usize,
        value: f64,
    },

    #[error("{label}: non-finite gradient {value} (entry {index}) at step {step}")]
    NonFiniteGradient {
        label: String,
        step: usize,
        index: usize,
        value: f64,
    },

    #[error("{label}: gradient has {actual} entries, expected {expected}")]
    GradientLength {
        label: String,
        expected: usize,
        actual: usize,
    },
}

/// Failures of one simulation run; callers treat every variant as retryable.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ExperimentError {
    #[error("Invalid {name}: {value} (expected a positive, finite number)")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error(transparent)]
    Optimize(#[from] OptimizeError),
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PlotError {
    #[error("Insufficient amount of color provided: {colors} color(s) for {series} series")]
    InsufficientColors { colors: usize, series: usize },

    #[error("Expected 1 or 2 epoch counts for {loss}, found {count}")]
    EpochCount { loss: String, count: usize },

    #[error(transparent)]
    Optimize(#[from] OptimizeError),
}
