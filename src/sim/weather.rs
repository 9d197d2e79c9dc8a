//! Hourly irradiance time series (EPW files or columnar CSV).

use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{RadiationError, Result};
use crate::sim::period::{HOURS_PER_YEAR, day_of_year};

/// Site location used for solar geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    /// Latitude in degrees (positive north).
    pub latitude: f64,
    /// Longitude in degrees (positive east).
    pub longitude: f64,
    /// Time zone (hours from UTC).
    pub timezone: f64,
    /// Elevation in meters.
    pub elevation: f64,
}

impl Location {
    pub fn new(name: &str, latitude: f64, longitude: f64, timezone: f64, elevation: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
            timezone,
            elevation,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("Unknown", 0.0, 0.0, 0.0, 0.0)
    }
}

/// Start of an hourly interval in local standard time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
    /// Hour (0-23).
    pub hour: u8,
}

impl Timestamp {
    pub fn new(month: u8, day: u8, hour: u8) -> Self {
        Self { month, day, hour }
    }

    pub fn is_valid(&self) -> bool {
        self.hour < 24 && day_of_year(self.month, self.day).is_some()
    }

    /// Day of year (1-365), None for an invalid date.
    pub fn day_of_year(&self) -> Option<u16> {
        day_of_year(self.month, self.day)
    }

    /// Hour of year (0-8759), None for an invalid timestamp.
    pub fn hour_of_year(&self) -> Option<usize> {
        if self.hour >= 24 {
            return None;
        }
        let doy = self.day_of_year()? as usize;
        Some((doy - 1) * 24 + self.hour as usize)
    }

    pub fn from_hour_of_year(hoy: usize) -> Option<Self> {
        if hoy >= HOURS_PER_YEAR {
            return None;
        }
        let mut doy = hoy / 24 + 1;
        let hour = (hoy % 24) as u8;
        for (m, &days) in crate::sim::period::DAYS_IN_MONTH.iter().enumerate() {
            if doy <= days as usize {
                return Some(Self::new(m as u8 + 1, doy as u8, hour));
            }
            doy -= days as usize;
        }
        None
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02} {:02}:00", self.month, self.day, self.hour)
    }
}

/// Parses `"MM-DD HH:00"`.
impl FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        let bad = || format!("malformed timestamp '{s}', expected 'MM-DD HH:00'");
        let (date, time) = s.trim().split_once(' ').ok_or_else(bad)?;
        let (month, day) = date.split_once('-').ok_or_else(bad)?;
        let (hour, minute) = time.split_once(':').ok_or_else(bad)?;
        let minute: u8 = minute.parse().map_err(|_| bad())?;
        if minute != 0 {
            return Err(format!("timestamp '{s}' is not on the hour"));
        }
        Ok(Self::new(
            month.parse().map_err(|_| bad())?,
            day.parse().map_err(|_| bad())?,
            hour.parse().map_err(|_| bad())?,
        ))
    }
}

/// A single hourly record.
#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceRecord {
    pub timestamp: Timestamp,
    /// Direct normal irradiance in W/m^2 (equal to Wh/m^2 over the hour).
    pub direct_normal: f64,
    /// Diffuse horizontal irradiance in W/m^2.
    pub diffuse_horizontal: f64,
    /// Dry bulb temperature in °C, when the source provides it.
    pub dry_bulb_temperature: Option<f64>,
}

impl IrradianceRecord {
    pub fn new(timestamp: Timestamp, direct_normal: f64, diffuse_horizontal: f64) -> Self {
        Self {
            timestamp,
            direct_normal,
            diffuse_horizontal,
            dry_bulb_temperature: None,
        }
    }
}

/// Validated weather time series.
///
/// Timestamps are valid calendar hours and strictly increasing;
/// irradiance values are finite and non-negative.
#[derive(Debug, Clone)]
pub struct WeatherSeries {
    pub location: Location,
    records: Vec<IrradianceRecord>,
}

impl WeatherSeries {
    pub fn new(location: Location, records: Vec<IrradianceRecord>) -> Result<Self> {
        validate_records(&records)?;
        Ok(Self { location, records })
    }

    pub fn records(&self) -> &[IrradianceRecord] {
        &self.records
    }

    /// Returns the number of hours in the dataset.
    pub fn num_hours(&self) -> usize {
        self.records.len()
    }

    /// Parses EPW (EnergyPlus Weather) file content.
    ///
    /// EPW format: 8 header lines followed by hourly data rows.
    /// Each data row has 35 fields, comma-separated. EPW hours (1-24) mark the
    /// end of the interval and are shifted to interval starts (0-23).
    pub fn from_epw(content: &str) -> anyhow::Result<Self> {
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() < 9 {
            anyhow::bail!("EPW file too short: expected at least 9 lines");
        }

        // Format: LOCATION,city,state_province,country,source,WMO,lat,lon,tz,elevation
        let location_fields: Vec<&str> = lines[0].split(',').collect();
        if location_fields.len() < 10 || location_fields[0].trim() != "LOCATION" {
            anyhow::bail!("Invalid LOCATION header");
        }

        let location = Location {
            name: format!(
                "{}, {}",
                location_fields[1].trim(),
                location_fields[3].trim()
            ),
            latitude: location_fields[6]
                .trim()
                .parse()
                .context("Invalid latitude")?,
            longitude: location_fields[7]
                .trim()
                .parse()
                .context("Invalid longitude")?,
            timezone: location_fields[8]
                .trim()
                .parse()
                .context("Invalid timezone")?,
            elevation: location_fields[9]
                .trim()
                .parse()
                .context("Invalid elevation")?,
        };

        let mut records = Vec::with_capacity(HOURS_PER_YEAR);
        for (i, line) in lines.iter().enumerate().skip(8) {
            if line.trim().is_empty() {
                continue;
            }
            let index = records.len();
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < 35 {
                return Err(RadiationError::time_series(
                    index,
                    format!("line {} has {} fields, expected 35", i + 1, fields.len()),
                )
                .into());
            }

            let month: u8 = fields[1]
                .trim()
                .parse()
                .with_context(|| format!("Invalid month at line {}", i + 1))?;
            let day: u8 = fields[2]
                .trim()
                .parse()
                .with_context(|| format!("Invalid day at line {}", i + 1))?;
            let hour: u8 = fields[3]
                .trim()
                .parse()
                .with_context(|| format!("Invalid hour at line {}", i + 1))?;
            if !(1..=24).contains(&hour) {
                return Err(RadiationError::time_series(
                    index,
                    format!("EPW hour {hour} outside 1-24 at line {}", i + 1),
                )
                .into());
            }

            records.push(IrradianceRecord {
                timestamp: Timestamp::new(month, day, hour - 1),
                dry_bulb_temperature: Some(
                    fields[6]
                        .trim()
                        .parse()
                        .with_context(|| format!("Invalid dry bulb at line {}", i + 1))?,
                ),
                direct_normal: fields[14]
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid DNR at line {}", i + 1))?,
                diffuse_horizontal: fields[15]
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid DHR at line {}", i + 1))?,
            });
        }

        Ok(Self::new(location, records)?)
    }

    /// Parses columnar CSV content: `timestamp,direct_normal,diffuse_horizontal`.
    ///
    /// The header row is optional; timestamps use the `MM-DD HH:00` format.
    pub fn from_csv(content: &str, location: Location) -> anyhow::Result<Self> {
        let mut records = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || (i == 0 && line.starts_with("timestamp")) {
                continue;
            }
            let index = records.len();
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 3 {
                return Err(RadiationError::time_series(
                    index,
                    format!("line {} has {} columns, expected 3", i + 1, fields.len()),
                )
                .into());
            }
            let timestamp: Timestamp = fields[0]
                .parse()
                .map_err(|reason: String| RadiationError::time_series(index, reason))?;
            let direct_normal: f64 = fields[1]
                .parse()
                .with_context(|| format!("Invalid direct normal at line {}", i + 1))?;
            let diffuse_horizontal: f64 = fields[2]
                .parse()
                .with_context(|| format!("Invalid diffuse horizontal at line {}", i + 1))?;
            records.push(IrradianceRecord::new(
                timestamp,
                direct_normal,
                diffuse_horizontal,
            ));
        }
        Ok(Self::new(location, records)?)
    }

    /// Creates simple synthetic weather data for testing.
    ///
    /// Generates 8760 hours with a parabolic daytime irradiance profile
    /// (peak `peak_global` W/m^2 at noon, 60 % direct normal, 40 % diffuse).
    pub fn synthetic(location: Location, peak_global: f64) -> Self {
        let records = (0..HOURS_PER_YEAR)
            .filter_map(Timestamp::from_hour_of_year)
            .map(|ts| {
                let solar_hour = (ts.hour as f64 + 0.5 - 12.0) / 6.0;
                let factor = (1.0 - solar_hour * solar_hour).max(0.0);
                let ghr = peak_global * factor;
                IrradianceRecord::new(ts, ghr * 0.6, ghr * 0.4)
            })
            .collect();
        Self { location, records }
    }
}

/// EPW marker for a missing irradiance value.
pub const MISSING_IRRADIANCE: f64 = 9999.0;

fn validate_records(records: &[IrradianceRecord]) -> Result<()> {
    let mut prev_hoy: Option<usize> = None;
    for (i, r) in records.iter().enumerate() {
        let hoy = r.timestamp.hour_of_year().ok_or_else(|| {
            RadiationError::time_series(i, format!("malformed timestamp {}", r.timestamp))
        })?;
        if let Some(prev) = prev_hoy
            && hoy <= prev
        {
            return Err(RadiationError::time_series(
                i,
                format!("timestamp {} is not after the previous record", r.timestamp),
            ));
        }
        prev_hoy = Some(hoy);

        for (name, v) in [
            ("direct normal", r.direct_normal),
            ("diffuse horizontal", r.diffuse_horizontal),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(RadiationError::time_series(
                    i,
                    format!("{name} irradiance {v} at {} is invalid", r.timestamp),
                ));
            }
            if v >= MISSING_IRRADIANCE {
                return Err(RadiationError::time_series(
                    i,
                    format!("{name} irradiance at {} is missing", r.timestamp),
                ));
            }
        }
    }
    Ok(())
}
