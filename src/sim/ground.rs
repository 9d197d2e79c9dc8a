//! Ground hemisphere: the sky dome mirrored below the horizon, emitting the
//! irradiance reflected by a Lambertian ground plane.

use std::f64::consts::PI;

use tracing::debug;

use crate::error::{RadiationError, Result};
use crate::geom::vector::Vector;
use crate::sim::sky::dome::PatchGeometry;
use crate::sim::sky::matrix::{SkyMatrix, SkyPatch, validate_patches};

#[derive(Debug, Clone, PartialEq)]
pub struct GroundHemisphere {
    patches: Vec<SkyPatch>,
    /// None for custom hemispheres.
    reflectance: Option<f64>,
}

impl GroundHemisphere {
    /// Mirrors the sky dome and assigns the uniform radiance `ρ·E_g/π`,
    /// where `E_g` is the mean irradiance the sky delivers to the ground.
    pub fn from_sky(sky: &SkyMatrix, reflectance: f64) -> Result<Self> {
        if !reflectance.is_finite() || !(0.0..=1.0).contains(&reflectance) {
            return Err(RadiationError::InvalidReflectance(reflectance));
        }
        let ground_irradiance = sky.horizontal_irradiance();
        let radiance = reflectance * ground_irradiance / PI;

        let patches = sky
            .patches()
            .iter()
            .map(|p| SkyPatch::new(mirror(&p.geometry), 0.0, radiance))
            .collect();

        debug!(reflectance, ground_irradiance, radiance, "Built ground hemisphere");
        Ok(Self {
            patches,
            reflectance: Some(reflectance),
        })
    }

    /// Ground hemisphere from explicit patches pointing below the horizon.
    pub fn from_patches(patches: Vec<SkyPatch>) -> Result<Self> {
        validate_patches(&patches)?;
        if let Some(i) = patches.iter().position(|p| p.direction().dz > 0.0) {
            return Err(RadiationError::config(format!(
                "ground patch {i} points above the horizon"
            )));
        }
        Ok(Self {
            patches,
            reflectance: None,
        })
    }

    pub fn patches(&self) -> &[SkyPatch] {
        &self.patches
    }

    pub fn num_patches(&self) -> usize {
        self.patches.len()
    }

    pub fn reflectance(&self) -> Option<f64> {
        self.reflectance
    }

    /// Radiance of each patch times its solid angle, summed (W/m^2).
    pub fn total_flux(&self) -> f64 {
        self.patches
            .iter()
            .map(|p| p.radiance() * p.solid_angle())
            .sum()
    }
}

fn mirror(g: &PatchGeometry) -> PatchGeometry {
    let d = g.direction;
    PatchGeometry {
        azimuth: g.azimuth,
        altitude: (-g.altitude.1, -g.altitude.0),
        solid_angle: g.solid_angle,
        direction: Vector::new(d.dx, d.dy, -d.dz),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sky::dome::SkyDensity;

    #[test]
    fn test_mirrored_directions() -> anyhow::Result<()> {
        let sky = SkyMatrix::uniform(SkyDensity::Tregenza, 10.0, 1.0)?;
        let ground = GroundHemisphere::from_sky(&sky, 0.2)?;
        assert_eq!(ground.num_patches(), sky.num_patches());
        for (s, g) in sky.patches().iter().zip(ground.patches()) {
            assert_eq!(s.direction().dx, g.direction().dx);
            assert_eq!(s.direction().dy, g.direction().dy);
            assert_eq!(s.direction().dz, -g.direction().dz);
            assert_eq!(s.solid_angle(), g.solid_angle());
        }
        Ok(())
    }

    #[test]
    fn test_uniform_ground_radiance() -> anyhow::Result<()> {
        // Uniform sky of radiance R delivers πR to the ground
        let sky = SkyMatrix::uniform(SkyDensity::Tregenza, 10.0, 1.0)?;
        let ground = GroundHemisphere::from_sky(&sky, 0.5)?;
        for p in ground.patches() {
            assert!((p.radiance() - 5.0).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_flux_linear_in_reflectance() -> anyhow::Result<()> {
        let sky = SkyMatrix::uniform(SkyDensity::Tregenza, 3.0, 1.0)?;
        let f1 = GroundHemisphere::from_sky(&sky, 0.1)?.total_flux();
        let f2 = GroundHemisphere::from_sky(&sky, 0.2)?.total_flux();
        let f4 = GroundHemisphere::from_sky(&sky, 0.4)?.total_flux();
        assert!((f2 - 2.0 * f1).abs() < 1e-9 * f2);
        assert!((f4 - 4.0 * f1).abs() < 1e-9 * f4);
        assert_eq!(GroundHemisphere::from_sky(&sky, 0.0)?.total_flux(), 0.0);
        Ok(())
    }

    #[test]
    fn test_invalid_reflectance() -> anyhow::Result<()> {
        let sky = SkyMatrix::uniform(SkyDensity::Tregenza, 1.0, 1.0)?;
        for r in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                GroundHemisphere::from_sky(&sky, r),
                Err(RadiationError::InvalidReflectance(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn test_from_patches_rejects_upward() {
        let up = SkyPatch::custom(Vector::new(0.0, 0.0, 1.0), 0.1, 1.0);
        assert!(GroundHemisphere::from_patches(vec![up]).is_err());
        let down = SkyPatch::custom(Vector::new(0.0, 0.0, -1.0), 0.1, 1.0);
        assert!(GroundHemisphere::from_patches(vec![down]).is_ok());
    }
}
