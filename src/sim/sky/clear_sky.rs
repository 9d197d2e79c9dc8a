//! Analytic clear-sky irradiance (Hottel beam transmittance with the
//! Liu-Jordan diffuse correlation).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{RadiationError, Result};
use crate::sim::period::AnalysisPeriod;
use crate::sim::solar::SolarPosition;
use crate::sim::weather::{IrradianceRecord, Location, Timestamp, WeatherSeries};

const SOLAR_CONSTANT: f64 = 1367.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearSkyModel {
    pub location: Location,
    /// Multiplier applied to both components (1.0 = standard clear sky).
    pub clearness: f64,
}

impl ClearSkyModel {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            clearness: 1.0,
        }
    }

    pub fn with_clearness(mut self, clearness: f64) -> Self {
        self.clearness = clearness;
        self
    }

    /// Normal extraterrestrial irradiance in W/m^2 (Duffie and Beckman 1.4.1b).
    pub fn extraterrestrial_normal(day_of_year: u16) -> f64 {
        let b = (day_of_year as f64 - 1.0) * 2.0 * PI / 365.0;
        let aux = 1.000110
            + 0.034221 * b.cos()
            + 0.001280 * b.sin()
            + 0.000719 * (2.0 * b).cos()
            + 0.000077 * (2.0 * b).sin();
        SOLAR_CONSTANT * aux
    }

    /// Beam atmosphere transmittance for a given sun height (cosine of the
    /// zenith angle).
    fn beam_transmittance(&self, cos_zenith: f64) -> f64 {
        // The correlation is given in km.
        let elevation = (self.location.elevation / 1000.0).clamp(0.0, 2.5);
        let a0 = 0.4237 - 0.00821 * (6.0 - elevation).powi(2);
        let a1 = 0.5055 + 0.00595 * (6.5 - elevation).powi(2);
        let k = 0.2711 + 0.01858 * (2.5 - elevation).powi(2);
        a0 + a1 * (-k / cos_zenith).exp()
    }

    /// Direct normal and diffuse horizontal irradiance (W/m^2) for the hour
    /// starting at `timestamp`. Zero with the sun below the horizon.
    pub fn irradiance(&self, timestamp: &Timestamp) -> (f64, f64) {
        let Some(sun) = SolarPosition::at(&self.location, timestamp) else {
            return (0.0, 0.0);
        };
        if !sun.is_above_horizon() {
            return (0.0, 0.0);
        }
        let cos_zenith = sun.altitude.to_radians().sin();
        let tb = self.beam_transmittance(cos_zenith);
        let td = 0.271 - 0.294 * tb;
        let extra = timestamp
            .day_of_year()
            .map(Self::extraterrestrial_normal)
            .unwrap_or(SOLAR_CONSTANT);

        let direct_normal = (extra * tb * self.clearness).max(0.0);
        let diffuse_horizontal = (extra * td * cos_zenith * self.clearness).max(0.0);
        (direct_normal, diffuse_horizontal)
    }

    /// Hourly series covering the analysis period.
    pub fn series(&self, period: &AnalysisPeriod) -> Result<WeatherSeries> {
        if !self.clearness.is_finite() || self.clearness < 0.0 {
            return Err(RadiationError::config(format!(
                "clear-sky clearness must be a non-negative number, got {}",
                self.clearness
            )));
        }
        period.validate()?;
        let mut hoys = period.hoys();
        hoys.sort_unstable();
        let records = hoys
            .into_iter()
            .filter_map(Timestamp::from_hour_of_year)
            .map(|ts| {
                let (dni, dhi) = self.irradiance(&ts);
                IrradianceRecord::new(ts, dni, dhi)
            })
            .collect();
        WeatherSeries::new(self.location.clone(), records)
    }
}
