//! Output files: SVG plots and convergence logs (`.json`, or gzip-compressed `.json.gz`).

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bbr_core::LogSet;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::info;

fn is_gz(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "gz")
}

pub fn write_svg(path: &Path, svg: &str) -> Result<()> {
    fs::write(path, svg).with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Write logs as JSON, compressed when `path` ends in `.gz`.
pub fn write_logs(path: &Path, logs: &LogSet) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let writer = BufWriter::new(file);
    if is_gz(path) {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer(&mut encoder, logs)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = writer;
        serde_json::to_writer_pretty(&mut writer, logs)?;
        writer.flush()?;
    }
    info!("Wrote {}", path.display());
    Ok(())
}

/// Load logs written by [`write_logs`] (supports .json and .json.gz).
pub fn read_logs(path: &Path) -> Result<LogSet> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let logs = if is_gz(path) {
        serde_json::from_reader(GzDecoder::new(reader))?
    } else {
        serde_json::from_reader(reader)?
    };
    Ok(logs)
}
