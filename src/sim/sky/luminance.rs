//! Relative sky luminance distributions used to spread diffuse irradiance
//! over the dome.

use serde::{Deserialize, Serialize};

use crate::geom::vector::Vector;
use crate::sim::solar::SolarPosition;

/// Trait for sky luminance distribution models.
pub trait SkyModel {
    /// Returns the relative sky luminance for a given sky direction.
    ///
    /// - `direction`: unit vector pointing toward the sky point
    /// - `solar_pos`: current solar position
    fn luminance(&self, direction: Vector, solar_pos: &SolarPosition) -> f64;
}

/// Uniform sky.
pub struct Isotropic;

impl SkyModel for Isotropic {
    fn luminance(&self, direction: Vector, _solar_pos: &SolarPosition) -> f64 {
        if direction.dz < 0.0 { 0.0 } else { 1.0 }
    }
}

/// CIE Standard Overcast Sky.
///
/// Luminance varies only with altitude: L = Lz * (1 + 2*sin(alt)) / 3
pub struct CieOvercast;

impl SkyModel for CieOvercast {
    fn luminance(&self, direction: Vector, _solar_pos: &SolarPosition) -> f64 {
        let sin_alt = direction.dz;
        if sin_alt < 0.0 {
            return 0.0;
        }
        (1.0 + 2.0 * sin_alt) / 3.0
    }
}

/// Perez All-Weather Sky model.
///
/// Uses 5 parameters (a-e) that vary with sky conditions.
pub struct PerezAllWeather {
    /// Perez coefficients [a, b, c, d, e].
    pub coefficients: [f64; 5],
}

/// Sky clearness at which the clear-sky coefficient set is fully used.
const CLEAR_SKY_CLEARNESS: f64 = 6.2;

impl PerezAllWeather {
    pub const OVERCAST: [f64; 5] = [1.0, 0.0, 0.0, -1.0, 0.0];
    pub const CLEAR: [f64; 5] = [-1.0, -0.7, 3.0, -2.5, 0.6];

    pub fn new(coefficients: [f64; 5]) -> Self {
        Self { coefficients }
    }

    pub fn overcast() -> Self {
        Self::new(Self::OVERCAST)
    }

    pub fn clear() -> Self {
        Self::new(Self::CLEAR)
    }

    /// Blends the overcast and clear coefficient sets by sky clearness.
    pub fn from_clearness(clearness: f64) -> Self {
        let t = ((clearness - 1.0) / (CLEAR_SKY_CLEARNESS - 1.0)).clamp(0.0, 1.0);
        let mut coefficients = [0.0; 5];
        for (k, c) in coefficients.iter_mut().enumerate() {
            *c = Self::OVERCAST[k] + t * (Self::CLEAR[k] - Self::OVERCAST[k]);
        }
        Self { coefficients }
    }

    /// Creates the model for one hour of measured irradiance.
    pub fn from_irradiance(
        direct_normal: f64,
        diffuse_horizontal: f64,
        solar_pos: &SolarPosition,
    ) -> Self {
        Self::from_clearness(sky_clearness(direct_normal, diffuse_horizontal, solar_pos))
    }
}

impl SkyModel for PerezAllWeather {
    fn luminance(&self, direction: Vector, solar_pos: &SolarPosition) -> f64 {
        let dir = match direction.normalize() {
            Some(v) => v,
            None => return 0.0,
        };

        let alt = dir.dz.asin();
        if alt < 0.0 {
            return 0.0;
        }

        let sun_dir = solar_pos.to_direction();
        let cos_gamma = dir.dot(sun_dir).clamp(-1.0, 1.0);
        let gamma = cos_gamma.acos();

        let solar_zenith = solar_pos.zenith().to_radians();
        let zenith = std::f64::consts::FRAC_PI_2 - alt;

        let [a, b, c, d, e] = self.coefficients;

        // Perez luminance function
        let f = |theta: f64, g: f64| -> f64 {
            (1.0 + a * (b / (theta.cos().max(0.01))).exp())
                * (1.0 + c * (d * g).exp() + e * g.cos().powi(2))
        };

        let f_sky = f(zenith, gamma);
        let f_zenith = f(0.0, solar_zenith);

        if f_zenith.abs() < 1e-10 {
            return 0.0;
        }

        (f_sky / f_zenith).max(0.0)
    }
}

/// Perez sky clearness ε.
pub fn sky_clearness(direct_normal: f64, diffuse_horizontal: f64, solar_pos: &SolarPosition) -> f64 {
    if diffuse_horizontal <= 0.0 {
        return CLEAR_SKY_CLEARNESS;
    }
    let z = solar_pos.zenith().to_radians().clamp(0.0, std::f64::consts::FRAC_PI_2);
    let kz = 1.041 * z.powi(3);
    ((diffuse_horizontal + direct_normal) / diffuse_horizontal + kz) / (1.0 + kz)
}

/// Diffuse distribution selected in the sky configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffuseModel {
    #[default]
    Isotropic,
    CieOvercast,
    Perez,
}

impl DiffuseModel {
    /// Relative luminance of each direction for one hour of data.
    ///
    /// Falls back to the isotropic sky when the sun is below the horizon.
    pub fn weights(
        &self,
        directions: &[Vector],
        solar_pos: &SolarPosition,
        direct_normal: f64,
        diffuse_horizontal: f64,
    ) -> Vec<f64> {
        let model: Box<dyn SkyModel> = if !solar_pos.is_above_horizon() {
            Box::new(Isotropic)
        } else {
            match self {
                DiffuseModel::Isotropic => Box::new(Isotropic),
                DiffuseModel::CieOvercast => Box::new(CieOvercast),
                DiffuseModel::Perez => Box::new(PerezAllWeather::from_irradiance(
                    direct_normal,
                    diffuse_horizontal,
                    solar_pos,
                )),
            }
        };
        directions
            .iter()
            .map(|d| model.luminance(*d, solar_pos))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sun() -> SolarPosition {
        SolarPosition {
            altitude: 45.0,
            azimuth: 180.0,
        }
    }

    #[test]
    fn test_cie_overcast_zenith_brightest() {
        let l_zenith = CieOvercast.luminance(Vector::new(0.0, 0.0, 1.0), &sun());
        let l_horizon = CieOvercast.luminance(Vector::new(1.0, 0.0, 0.01), &sun());
        assert!(l_zenith > l_horizon);
        assert!((l_zenith / l_horizon - 3.0).abs() < 0.1);
    }

    #[test]
    fn test_below_horizon_is_dark() {
        let down = Vector::new(0.0, 0.0, -1.0);
        assert_eq!(Isotropic.luminance(down, &sun()), 0.0);
        assert_eq!(CieOvercast.luminance(down, &sun()), 0.0);
        assert_eq!(PerezAllWeather::clear().luminance(down, &sun()), 0.0);
    }

    #[test]
    fn test_perez_clear_circumsolar() {
        let solar = sun();
        let sky = PerezAllWeather::clear();
        let l_sun = sky.luminance(solar.to_direction(), &solar);
        let l_away = sky.luminance(Vector::new(0.0, 1.0, 1.0), &solar);
        assert!(l_sun > l_away);
        assert!(l_away > 0.0);
    }

    #[test]
    fn test_perez_blend_is_non_negative() {
        let solar = sun();
        let dirs = [
            Vector::new(0.0, 0.0, 1.0),
            Vector::new(1.0, 0.0, 0.05),
            Vector::new(0.0, -1.0, 1.0),
            Vector::new(-1.0, 1.0, 0.2),
        ];
        for clearness in [1.0, 1.5, 3.0, 4.5, 6.2, 12.0] {
            let sky = PerezAllWeather::from_clearness(clearness);
            for d in dirs {
                assert!(sky.luminance(d, &solar) >= 0.0);
            }
        }
    }

    #[test]
    fn test_clearness_bounds() {
        let solar = sun();
        assert!((sky_clearness(0.0, 100.0, &solar) - 1.0).abs() < 1e-12);
        assert!(sky_clearness(800.0, 100.0, &solar) > 3.0);
        assert_eq!(PerezAllWeather::from_clearness(0.5).coefficients, PerezAllWeather::OVERCAST);
        assert_eq!(PerezAllWeather::from_clearness(20.0).coefficients, PerezAllWeather::CLEAR);
    }

    #[test]
    fn test_night_falls_back_to_isotropic() {
        let night = SolarPosition {
            altitude: -10.0,
            azimuth: 0.0,
        };
        let dirs = [Vector::new(0.0, 0.0, 1.0), Vector::new(1.0, 0.0, 0.1)];
        let w = DiffuseModel::CieOvercast.weights(&dirs, &night, 0.0, 20.0);
        assert_eq!(w, vec![1.0, 1.0]);
    }
}
