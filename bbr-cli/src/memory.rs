//! Resident set size of the current process.

use std::fs;

/// Resident set size in MB, from `/proc/self/status`; `None` where that isn't available.
pub fn rss_mb() -> Option<f64> {
    let status = fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

/// Extract `VmRSS` (reported in kB) from a `/proc/<pid>/status` listing, as MB.
pub fn parse_vm_rss(status: &str) -> Option<f64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let mut fields = line["VmRSS:".len()..].split_whitespace();
    let value: f64 = fields.next()?.parse().ok()?;
    let scale = match fields.next() {
        Some("kB") | None => 1024.,
        Some("mB") | Some("MB") => 1024. * 1024.,
        Some("B") => 1.,
        Some(_) => return None,
    };
    Some(value * scale / (1024. * 1024.))
}

pub fn fmt_mb(mb: Option<f64>) -> String {
    match mb {
        Some(mb) => format!("{} MB", mb),
        None => "unavailable".to_string(),
    }
}

/// Memory readings around one command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Usage {
    pub before: Option<f64>,
    pub after: Option<f64>,
}

impl Usage {
    pub fn increase(&self) -> Option<f64> {
        Some(self.after? - self.before?)
    }
    /// Lines printed after command `idx` (1-based).
    pub fn report(&self, idx: usize) -> [String; 3] {
        [
            format!("Memory usage before command {}: {}", idx, fmt_mb(self.before)),
            format!("Memory usage after command {}: {}", idx, fmt_mb(self.after)),
            format!("Memory usage increase for command {}: {}", idx, fmt_mb(self.increase())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const STATUS: &str = "Name:\tbbr\nVmPeak:\t  20000 kB\nVmRSS:\t   10240 kB\nThreads:\t4\n";

    #[test]
    fn test_parse_vm_rss() {
        assert_eq!(parse_vm_rss(STATUS), Some(10.));
        assert_eq!(parse_vm_rss("Name:\tbbr\n"), None);
        assert_eq!(parse_vm_rss("VmRSS:\tlots kB\n"), None);
    }

    #[test]
    fn test_report() {
        let usage = Usage { before: Some(10.), after: Some(12.5) };
        assert_eq!(usage.increase(), Some(2.5));
        assert_eq!(
            usage.report(3),
            [
                "Memory usage before command 3: 10 MB".to_string(),
                "Memory usage after command 3: 12.5 MB".to_string(),
                "Memory usage increase for command 3: 2.5 MB".to_string(),
            ]
        );
        let unknown = Usage { before: None, after: Some(1.) };
        assert_eq!(unknown.report(1)[2], "Memory usage increase for command 1: unavailable");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_rss() {
        assert!(rss_mb().unwrap() > 0.);
    }
}
