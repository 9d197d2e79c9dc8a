use crate::geom::vector::Vector;
use crate::sim::weather::{Location, Timestamp};

/// Solar position (azimuth and elevation angles).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Solar altitude angle in degrees (0 = horizon, 90 = zenith).
    pub altitude: f64,
    /// Solar azimuth angle in degrees from north, clockwise (0=N, 90=E, 180=S, 270=W).
    pub azimuth: f64,
}

impl SolarPosition {
    /// Calculates the solar position with the NOAA fractional-year series.
    ///
    /// - `latitude`: in degrees (positive north)
    /// - `longitude`: in degrees (positive east)
    /// - `timezone`: hours from UTC of the local standard time
    /// - `day_of_year`: 1-365
    /// - `hour`: local standard time in hours (0-24, fractional)
    pub fn calculate(
        latitude: f64,
        longitude: f64,
        timezone: f64,
        day_of_year: u16,
        hour: f64,
    ) -> Self {
        let lat = latitude.to_radians();

        // Fractional year
        let gamma =
            2.0 * std::f64::consts::PI * (day_of_year as f64 - 1.0 + (hour - 12.0) / 24.0) / 365.0;

        // Equation of time (minutes)
        let eqtime = 229.18
            * (0.000075 + 0.001868 * gamma.cos()
                - 0.032077 * gamma.sin()
                - 0.014615 * (2.0 * gamma).cos()
                - 0.040849 * (2.0 * gamma).sin());

        let declination = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
            - 0.006758 * (2.0 * gamma).cos()
            + 0.000907 * (2.0 * gamma).sin()
            - 0.002697 * (3.0 * gamma).cos()
            + 0.00148 * (3.0 * gamma).sin();

        // True solar time (minutes) and hour angle
        let time_offset = eqtime + 4.0 * longitude - 60.0 * timezone;
        let true_solar_time = hour * 60.0 + time_offset;
        let hour_angle = (true_solar_time / 4.0 - 180.0).to_radians();

        // Sun direction in east/north/up components
        let east = -declination.cos() * hour_angle.sin();
        let north =
            declination.sin() * lat.cos() - declination.cos() * lat.sin() * hour_angle.cos();
        let up = lat.sin() * declination.sin() + lat.cos() * declination.cos() * hour_angle.cos();

        let altitude = up.clamp(-1.0, 1.0).asin().to_degrees();
        let azimuth = east.atan2(north).to_degrees().rem_euclid(360.0);

        Self { altitude, azimuth }
    }

    /// Solar position at the middle of the hour that starts at `timestamp`.
    pub fn at(location: &Location, timestamp: &Timestamp) -> Option<Self> {
        let doy = timestamp.day_of_year()?;
        Some(Self::calculate(
            location.latitude,
            location.longitude,
            location.timezone,
            doy,
            timestamp.hour as f64 + 0.5,
        ))
    }

    /// Returns true if the sun is above the horizon.
    pub fn is_above_horizon(&self) -> bool {
        self.altitude > 0.0
    }

    /// Converts solar position to a direction vector (pointing toward the sun).
    pub fn to_direction(&self) -> Vector {
        Vector::from_altitude_azimuth(self.altitude, self.azimuth)
    }

    /// Solar zenith angle in degrees.
    pub fn zenith(&self) -> f64 {
        90.0 - self.altitude
    }
}
