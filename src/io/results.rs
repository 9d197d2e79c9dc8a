//! Result writers: per-sensor CSV, per-grid `.res` files with
//! `grids_info.json`, and the JSON run summary.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::sim::radiation::result::{IrradianceResult, ResultSummary};
use crate::sim::radiation::sensor::GridInfo;

pub const GRIDS_INFO_FILE: &str = "grids_info.json";

/// Writes `sensor_id,value` rows in sensor order.
pub fn write_values_csv(path: &Path, result: &IrradianceResult) -> Result<()> {
    let mut out = format!("sensor_id,value_{}\n", result.unit());
    for (i, v) in result.values().iter().enumerate() {
        writeln!(out, "{i},{v}")?;
    }
    fs::write(path, out).with_context(|| format!("Failed to write {}", path.display()))
}

/// Writes one `<identifier>.res` file per grid (one value per line) and the
/// `grids_info.json` index into `dir`. Returns the written `.res` paths.
pub fn write_grid_results(
    dir: &Path,
    result: &IrradianceResult,
    grids: &[GridInfo],
) -> Result<Vec<PathBuf>> {
    let expected: usize = grids.iter().map(|g| g.count).sum();
    if expected != result.len() {
        bail!(
            "Grids hold {expected} sensors but the result has {} values",
            result.len()
        );
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut paths = Vec::with_capacity(grids.len());
    for (grid, values) in result.split(grids) {
        let path = dir.join(format!("{}.res", grid.identifier));
        let mut out = String::with_capacity(values.len() * 12);
        for v in values {
            writeln!(out, "{v}")?;
        }
        fs::write(&path, out).with_context(|| format!("Failed to write {}", path.display()))?;
        paths.push(path);
    }

    let info_path = dir.join(GRIDS_INFO_FILE);
    let json = serde_json::to_string_pretty(grids)?;
    fs::write(&info_path, json)
        .with_context(|| format!("Failed to write {}", info_path.display()))?;
    Ok(paths)
}

/// Reads a `.res` file back into values.
pub fn read_res(path: &Path) -> Result<Vec<f64>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .enumerate()
        .map(|(i, l)| {
            l.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid value at line {} of {}", i + 1, path.display()))
        })
        .collect()
}

pub fn read_grids_info(dir: &Path) -> Result<Vec<GridInfo>> {
    let path = dir.join(GRIDS_INFO_FILE);
    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut grids: Vec<GridInfo> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let mut start = 0;
    for g in &mut grids {
        g.start = start;
        start += g.count;
    }
    Ok(grids)
}

pub fn write_summary(path: &Path, summary: &ResultSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
