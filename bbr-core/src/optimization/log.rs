use serde::{Deserialize, Serialize};

/// Per-iteration evaluation values of one optimization run.
#[derive(Debug, Clone, Default, PartialEq, derive_more::Deref, Serialize, Deserialize)]
pub struct ConvergenceLog(pub Vec<f64>);

impl ConvergenceLog {
    pub fn push(&mut self, value: f64) {
        self.0.push(value);
    }
    pub fn last(&self) -> Option<f64> {
        self.0.last().copied()
    }
    /// `(iteration, value)` pairs, iterations counted from 1.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.0.iter().enumerate().map(|(idx, v)| (idx + 1, *v))
    }
}

/// Convergence logs keyed by loss name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSet(pub Vec<(String, ConvergenceLog)>);

impl LogSet {
    /// Insert or replace the log for `name`, keeping its existing position.
    pub fn insert(&mut self, name: &str, log: ConvergenceLog) {
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = log,
            None => self.0.push((name.to_string(), log)),
        }
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConvergenceLog)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_points() {
        let log = ConvergenceLog(vec![0.2, 0.5, 0.7]);
        assert_eq!(log.len(), 3);
        assert_eq!(log.last(), Some(0.7));
        assert_eq!(log.points().collect::<Vec<_>>(), vec![(1, 0.2), (2, 0.5), (3, 0.7)]);
    }

    #[test]
    fn test_log_set() {
        let mut logs = LogSet::default();
        logs.insert("WIoU", ConvergenceLog(vec![0.1]));
        logs.insert("GIoU", ConvergenceLog(vec![0.2]));
        logs.insert("WIoU", ConvergenceLog(vec![0.3]));
        assert_eq!(logs.len(), 2);
        let keys: Vec<&str> = logs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["WIoU", "GIoU"]);
        assert_eq!(logs.0[0].1, ConvergenceLog(vec![0.3]));
    }

    #[test]
    fn test_serde() {
        let log = ConvergenceLog(vec![0.25, 0.5]);
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(json, "[0.25,0.5]");
        assert_eq!(serde_json::from_str::<ConvergenceLog>(&json).unwrap(), log);
    }
}
