//! Re-run a fallible operation until it succeeds.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use log::error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Fixed pause between attempts, in seconds.
    pub delay_secs: f64,
    /// Give up (returning the last error) after this many failed attempts; `None` retries forever.
    pub max_attempts: Option<usize>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { delay_secs: 20., max_attempts: None }
    }
}

/// A successful result, and how many failed attempts preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    pub failures: usize,
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_secs).unwrap_or(Duration::ZERO)
    }

    /// Retry `op`, logging each failure at error level and sleeping between attempts.
    pub fn run<T, E, F>(&self, op: F) -> Result<Retried<T>, E>
    where
        E: Display,
        F: FnMut() -> Result<T, E>,
    {
        self.run_with(op, thread::sleep, |msg| error!("{}", msg))
    }

    /// [`Self::run`], with the pause between attempts delegated to `sleep`.
    pub fn run_with_sleep<T, E, F, S>(&self, op: F, sleep: S) -> Result<Retried<T>, E>
    where
        E: Display,
        F: FnMut() -> Result<T, E>,
        S: FnMut(Duration),
    {
        self.run_with(op, sleep, |msg| error!("{}", msg))
    }

    /// Retry `op`, passing one message per failed attempt to `report`.
    pub fn run_with<T, E, F, S, R>(&self, mut op: F, mut sleep: S, mut report: R) -> Result<Retried<T>, E>
    where
        E: Display,
        F: FnMut() -> Result<T, E>,
        S: FnMut(Duration),
        R: FnMut(&str),
    {
        let delay = self.delay();
        let mut failures = 0;
        loop {
            match op() {
                Ok(value) => return Ok(Retried { value, failures }),
                Err(e) => {
                    failures += 1;
                    if self.max_attempts.is_some_and(|max| failures >= max) {
                        report(&format!("{} (attempt {}), giving up", e, failures));
                        return Err(e);
                    }
                    report(&format!("{} (attempt {}), retrying in {:?}", e, failures, delay));
                    sleep(delay);
                }
            }
        }
    }
}
