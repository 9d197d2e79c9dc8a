//! Radiance `.pts` sensor files: one `x y z nx ny nz` line per sensor.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::sim::radiation::sensor::SensorPoint;
use crate::{Point, Vector};

pub fn parse_pts(content: &str) -> Result<Vec<SensorPoint>> {
    let mut sensors = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f64>()
                    .with_context(|| format!("Invalid number '{s}' at line {}", n + 1))
            })
            .collect::<Result<Vec<f64>>>()?;
        if values.len() != 6 {
            bail!(
                "Line {} has {} values, expected 6 (x y z nx ny nz)",
                n + 1,
                values.len()
            );
        }
        sensors.push(SensorPoint::new(
            Point::new(values[0], values[1], values[2]),
            Vector::new(values[3], values[4], values[5]),
        ));
    }
    Ok(sensors)
}

pub fn read_pts(path: &Path) -> Result<Vec<SensorPoint>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sensors: {}", path.display()))?;
    parse_pts(&content).with_context(|| format!("Failed to parse sensors: {}", path.display()))
}

pub fn write_pts(path: &Path, sensors: &[SensorPoint]) -> Result<()> {
    let mut out = String::new();
    for s in sensors {
        let (p, n) = (s.position, s.normal);
        writeln!(out, "{} {} {} {} {} {}", p.x, p.y, p.z, n.dx, n.dy, n.dz)?;
    }
    std::fs::write(path, out)
        .with_context(|| format!("Failed to write sensors: {}", path.display()))
}
