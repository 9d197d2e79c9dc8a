//! Discretization of the upper hemisphere into sky patches.
//!
//! The base layout is the Tregenza dome: seven 12° altitude bands holding
//! 30/30/24/24/18/12/6 patches and a 6° zenith cap. The Reinhart
//! subdivision `n` splits every band into `n` rows and every patch into `n`
//! azimuthal sectors, keeping the zenith cap whole (144·n² + 1 patches).

use serde::{Deserialize, Serialize};

use crate::error::{RadiationError, Result};
use crate::geom::vector::Vector;

/// Patches per Tregenza altitude band, from the horizon up (zenith cap excluded).
pub const TREGENZA_BANDS: [usize; 7] = [30, 30, 24, 24, 18, 12, 6];

/// Altitude width of a Tregenza band in degrees.
pub const BAND_WIDTH: f64 = 12.0;

/// Lower altitude of the zenith cap in degrees.
pub const CAP_ALTITUDE: f64 = 84.0;

/// Number of patches of the Tregenza dome.
pub const TREGENZA_PATCHES: usize = 145;

/// Largest accepted Reinhart subdivision (5185 patches).
pub const MAX_SUBDIVISIONS: u32 = 6;

/// Dome density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyDensity {
    /// 145 patches.
    #[default]
    Tregenza,
    /// Tregenza dome subdivided `n` times along altitude and azimuth.
    Reinhart(u32),
}

impl SkyDensity {
    /// The "high density" sky (577 patches).
    pub fn high() -> Self {
        SkyDensity::Reinhart(2)
    }

    pub fn subdivisions(&self) -> u32 {
        match self {
            SkyDensity::Tregenza => 1,
            SkyDensity::Reinhart(n) => *n,
        }
    }

    /// Number of patches of the dome. Saturates for subdivisions that
    /// [`SkyDensity::validate`] rejects.
    pub fn num_patches(&self) -> usize {
        let n = self.subdivisions() as usize;
        n.saturating_mul(n)
            .saturating_mul(144)
            .saturating_add(1)
    }

    pub fn validate(&self) -> Result<()> {
        match self.subdivisions() {
            0 => Err(RadiationError::config(
                "Reinhart subdivision must be at least 1",
            )),
            n if n > MAX_SUBDIVISIONS => Err(RadiationError::config(format!(
                "Reinhart subdivision {n} exceeds the maximum of {MAX_SUBDIVISIONS}"
            ))),
            _ => Ok(()),
        }
    }

    /// Rows of the dome from the horizon up, zenith cap excluded.
    fn rows(&self) -> Vec<DomeRow> {
        let n = self.subdivisions() as usize;
        let row_width = BAND_WIDTH / n as f64;
        let mut rows = Vec::with_capacity(TREGENZA_BANDS.len() * n);
        let mut offset = 0;
        for (band, &count) in TREGENZA_BANDS.iter().enumerate() {
            for sub in 0..n {
                let lo = band as f64 * BAND_WIDTH + sub as f64 * row_width;
                let row = DomeRow {
                    altitude: (lo, lo + row_width),
                    count: count * n,
                    offset,
                };
                offset += row.count;
                rows.push(row);
            }
        }
        rows
    }

    /// Index of the patch that contains the direction at (`altitude`,
    /// `azimuth`) in degrees. None below the horizon.
    pub fn locate(&self, altitude: f64, azimuth: f64) -> Option<usize> {
        if self.subdivisions() == 0 || !(altitude > 0.0) || !azimuth.is_finite() {
            return None;
        }
        if altitude >= CAP_ALTITUDE {
            return Some(self.num_patches() - 1);
        }
        let n = self.subdivisions() as usize;
        let row_idx = ((altitude / (BAND_WIDTH / n as f64)).floor() as usize)
            .min(TREGENZA_BANDS.len() * n - 1);
        let row = self.rows().swap_remove(row_idx);
        let width = 360.0 / row.count as f64;
        let j = (azimuth.rem_euclid(360.0) / width).round() as usize % row.count;
        Some(row.offset + j)
    }
}

#[derive(Debug, Clone, Copy)]
struct DomeRow {
    altitude: (f64, f64),
    count: usize,
    offset: usize,
}

/// Geometry of one sky patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchGeometry {
    /// Azimuth range in degrees, clockwise from north. The lower bound may be
    /// negative for patches centered on north.
    pub azimuth: (f64, f64),
    /// Altitude range in degrees.
    pub altitude: (f64, f64),
    /// Solid angle in steradians.
    pub solid_angle: f64,
    /// Unit vector toward the patch in scene coordinates.
    pub direction: Vector,
}

impl PatchGeometry {
    /// Patch between two altitudes and azimuths (degrees).
    ///
    /// The direction points at the z-centroid altitude, so that
    /// `solid_angle * direction.dz` is the exact projected solid angle of
    /// the patch on a horizontal plane. `north` rotates the direction
    /// counter-clockwise around +Z (radians).
    pub fn new(azimuth: (f64, f64), altitude: (f64, f64), north: f64) -> Self {
        let sin_lo = altitude.0.to_radians().sin();
        let sin_hi = altitude.1.to_radians().sin();
        let solid_angle = (sin_hi - sin_lo) * (azimuth.1 - azimuth.0).to_radians();
        let alt_c = ((sin_lo + sin_hi) / 2.0).asin().to_degrees();
        let az_c = (azimuth.0 + azimuth.1) / 2.0;
        let direction = Vector::from_altitude_azimuth(alt_c, az_c).rotate_xy(north);
        Self {
            azimuth,
            altitude,
            solid_angle,
            direction,
        }
    }

    /// Altitude of the patch direction in degrees.
    pub fn direction_altitude(&self) -> f64 {
        self.direction.dz.clamp(-1.0, 1.0).asin().to_degrees()
    }
}

/// Generates the patches of the dome, ordered from the horizon up and
/// clockwise from north within each row, with the zenith cap last.
pub fn discretize(density: SkyDensity, north_deg: f64) -> Result<Vec<PatchGeometry>> {
    density.validate()?;
    if !north_deg.is_finite() {
        return Err(RadiationError::config(format!(
            "north angle must be finite, got {north_deg}"
        )));
    }
    let north = north_deg.to_radians();

    let mut patches = Vec::with_capacity(density.num_patches());
    for row in density.rows() {
        let width = 360.0 / row.count as f64;
        for j in 0..row.count {
            let center = j as f64 * width;
            patches.push(PatchGeometry::new(
                (center - width / 2.0, center + width / 2.0),
                row.altitude,
                north,
            ));
        }
    }
    patches.push(PatchGeometry::new((0.0, 360.0), (CAP_ALTITUDE, 90.0), north));

    Ok(patches)
}
