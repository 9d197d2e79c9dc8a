use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RadiationError, Result};
use crate::geom::vector::Vector;
use crate::sim::period::AnalysisPeriod;
use crate::sim::sky::clear_sky::ClearSkyModel;
use crate::sim::sky::dome::{self, PatchGeometry, SkyDensity, TREGENZA_PATCHES};
use crate::sim::sky::luminance::DiffuseModel;
use crate::sim::solar::SolarPosition;
use crate::sim::weather::WeatherSeries;

/// Where the sky irradiance comes from.
#[derive(Debug, Clone)]
pub enum SkySource {
    /// Recorded hourly direct normal and diffuse horizontal irradiance.
    Measured(WeatherSeries),
    /// Analytic clear sky evaluated for every hour of the period.
    ClearSky(ClearSkyModel),
}

/// Kind of source a sky matrix was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyKind {
    Measured,
    ClearSky,
    Custom,
}

/// Configuration of the sky dome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    pub density: SkyDensity,
    /// Smallest dome accepted by the builder.
    pub min_patches: usize,
    /// Counter-clockwise rotation of north from +Y, in degrees.
    pub north: f64,
    pub diffuse_model: DiffuseModel,
}

impl SkyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.density.validate()?;
        if !self.north.is_finite() {
            return Err(RadiationError::config(format!(
                "north angle must be finite, got {}",
                self.north
            )));
        }
        let n = self.density.num_patches();
        if n < self.min_patches {
            return Err(RadiationError::config(format!(
                "sky dome has {n} patches, at least {} required",
                self.min_patches
            )));
        }
        Ok(())
    }
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            density: SkyDensity::Tregenza,
            min_patches: TREGENZA_PATCHES,
            north: 0.0,
            diffuse_model: DiffuseModel::Isotropic,
        }
    }
}

/// One patch of the dome with its mean radiance over the analysis period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPatch {
    pub geometry: PatchGeometry,
    /// Direct (solar) radiance in W/m^2/sr.
    pub direct: f64,
    /// Diffuse radiance in W/m^2/sr.
    pub diffuse: f64,
}

impl SkyPatch {
    pub fn new(geometry: PatchGeometry, direct: f64, diffuse: f64) -> Self {
        Self {
            geometry,
            direct,
            diffuse,
        }
    }

    /// Patch defined only by its direction and solid angle.
    pub fn custom(direction: Vector, solid_angle: f64, radiance: f64) -> Self {
        let alt = direction.dz.clamp(-1.0, 1.0).asin().to_degrees();
        let az = direction.dx.atan2(direction.dy).to_degrees().rem_euclid(360.0);
        Self {
            geometry: PatchGeometry {
                azimuth: (az, az),
                altitude: (alt, alt),
                solid_angle,
                direction,
            },
            direct: 0.0,
            diffuse: radiance,
        }
    }

    /// Total radiance in W/m^2/sr.
    pub fn radiance(&self) -> f64 {
        self.direct + self.diffuse
    }

    pub fn direction(&self) -> Vector {
        self.geometry.direction
    }

    pub fn solid_angle(&self) -> f64 {
        self.geometry.solid_angle
    }
}

/// Discretized sky dome with mean radiance per patch.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyMatrix {
    patches: Vec<SkyPatch>,
    duration_hours: f64,
    kind: SkyKind,
    north: f64,
}

impl SkyMatrix {
    /// Builds the sky matrix for the analysis period.
    ///
    /// Configuration and period are validated before any accumulation.
    /// Direct normal irradiance of each hour goes to the patch containing the
    /// sun; diffuse horizontal irradiance is spread over the dome with the
    /// configured luminance distribution.
    pub fn build(source: &SkySource, config: &SkyConfig, period: &AnalysisPeriod) -> Result<Self> {
        config.validate()?;
        period.validate()?;

        let (series, kind) = match source {
            SkySource::Measured(series) => (Cow::Borrowed(series), SkyKind::Measured),
            SkySource::ClearSky(model) => {
                (Cow::Owned(model.series(period)?), SkyKind::ClearSky)
            }
        };

        let geometry = dome::discretize(config.density, config.north)?;
        // Luminance models work in the geographic frame (north = +Y)
        let geo_dirs: Vec<Vector> = dome::discretize(config.density, 0.0)?
            .iter()
            .map(|g| g.direction)
            .collect();
        let projected: Vec<f64> = geometry
            .iter()
            .map(|g| g.solid_angle * g.direction.dz.max(0.0))
            .collect();

        let n = geometry.len();
        let mut direct = vec![0.0; n];
        let mut diffuse = vec![0.0; n];
        let mut used = 0;
        let mut outside = 0;
        let mut direct_below_horizon = 0;

        for record in series.records() {
            let Some(hoy) = record.timestamp.hour_of_year() else {
                continue;
            };
            if !period.contains_hoy(hoy) {
                outside += 1;
                continue;
            }
            let Some(sun) = SolarPosition::at(&series.location, &record.timestamp) else {
                continue;
            };
            used += 1;

            if record.direct_normal > 0.0 {
                match config.density.locate(sun.altitude, sun.azimuth) {
                    Some(i) => direct[i] += record.direct_normal / geometry[i].solid_angle,
                    None => direct_below_horizon += 1,
                }
            }

            if record.diffuse_horizontal > 0.0 {
                let weights = config.diffuse_model.weights(
                    &geo_dirs,
                    &sun,
                    record.direct_normal,
                    record.diffuse_horizontal,
                );
                let norm: f64 = weights.iter().zip(&projected).map(|(w, p)| w * p).sum();
                if norm > 0.0 {
                    let scale = record.diffuse_horizontal / norm;
                    for (d, w) in diffuse.iter_mut().zip(&weights) {
                        *d += w * scale;
                    }
                }
            }
        }

        if outside > 0 {
            debug!(outside, "Weather records outside the analysis period were ignored");
        }
        if direct_below_horizon > 0 {
            debug!(
                direct_below_horizon,
                "Direct irradiance with the sun below the horizon was ignored"
            );
        }

        let duration_hours = period.duration_hours();
        let patches = geometry
            .into_iter()
            .zip(direct.into_iter().zip(diffuse))
            .map(|(g, (dir, dif))| SkyPatch::new(g, dir / duration_hours, dif / duration_hours))
            .collect();

        let sky = Self {
            patches,
            duration_hours,
            kind,
            north: config.north,
        };
        debug!(
            patches = sky.num_patches(),
            hours = used,
            duration_hours,
            horizontal_irradiance = sky.horizontal_irradiance(),
            "Built sky matrix"
        );
        Ok(sky)
    }

    /// Sky from explicit patches.
    pub fn from_patches(patches: Vec<SkyPatch>, duration_hours: f64) -> Result<Self> {
        if patches.is_empty() {
            return Err(RadiationError::config("sky dome has no patches"));
        }
        if !duration_hours.is_finite() || duration_hours <= 0.0 {
            return Err(RadiationError::config(format!(
                "duration must be positive, got {duration_hours}"
            )));
        }
        validate_patches(&patches)?;
        Ok(Self {
            patches,
            duration_hours,
            kind: SkyKind::Custom,
            north: 0.0,
        })
    }

    /// Dome of the given density where every patch has the same radiance.
    pub fn uniform(density: SkyDensity, radiance: f64, duration_hours: f64) -> Result<Self> {
        let patches = dome::discretize(density, 0.0)?
            .into_iter()
            .map(|g| SkyPatch::new(g, 0.0, radiance))
            .collect();
        Self::from_patches(patches, duration_hours)
    }

    pub fn patches(&self) -> &[SkyPatch] {
        &self.patches
    }

    pub fn num_patches(&self) -> usize {
        self.patches.len()
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_hours
    }

    pub fn kind(&self) -> SkyKind {
        self.kind
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    /// Mean irradiance on an unobstructed horizontal plane (W/m^2).
    pub fn horizontal_irradiance(&self) -> f64 {
        self.patches
            .iter()
            .map(|p| p.radiance() * p.solid_angle() * p.direction().dz.max(0.0))
            .sum()
    }
}

/// Checks directions, solid angles and radiance of custom patches.
pub(crate) fn validate_patches(patches: &[SkyPatch]) -> Result<()> {
    for (i, p) in patches.iter().enumerate() {
        let omega = p.solid_angle();
        if !omega.is_finite() || omega <= 0.0 {
            return Err(RadiationError::config(format!(
                "patch {i} has invalid solid angle {omega}"
            )));
        }
        for value in [p.direct, p.diffuse] {
            if !value.is_finite() || value < 0.0 {
                return Err(RadiationError::config(format!(
                    "patch {i} has invalid radiance {value}"
                )));
            }
        }
        let len = p.direction().length();
        if !len.is_finite() || (len - 1.0).abs() > 1e-6 {
            return Err(RadiationError::config(format!(
                "patch {i} direction is not a unit vector"
            )));
        }
    }
    Ok(())
}
