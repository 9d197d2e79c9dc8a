//! Analysis periods over a typical (non-leap) 8760-hour year.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RadiationError, Result};

pub const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
pub const HOURS_PER_YEAR: usize = 8760;

/// Returns the day of year (1-365) or None for an invalid date.
pub fn day_of_year(month: u8, day: u8) -> Option<u16> {
    if !(1..=12).contains(&month) {
        return None;
    }
    if day == 0 || day > DAYS_IN_MONTH[month as usize - 1] {
        return None;
    }
    let before: u16 = DAYS_IN_MONTH[..month as usize - 1]
        .iter()
        .map(|&d| d as u16)
        .sum();
    Some(before + day as u16)
}

/// A range of hours of the year.
///
/// Hours `st_hour..=end_hour` are included on every day from the start date to the
/// end date. A start date after the end date wraps over the new year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub st_month: u8,
    pub st_day: u8,
    pub st_hour: u8,
    pub end_month: u8,
    pub end_day: u8,
    pub end_hour: u8,
}

impl AnalysisPeriod {
    pub fn new(
        st_month: u8,
        st_day: u8,
        st_hour: u8,
        end_month: u8,
        end_day: u8,
        end_hour: u8,
    ) -> Result<Self> {
        let period = Self {
            st_month,
            st_day,
            st_hour,
            end_month,
            end_day,
            end_hour,
        };
        period.validate()?;
        Ok(period)
    }

    /// The whole year.
    pub fn annual() -> Self {
        Self {
            st_month: 1,
            st_day: 1,
            st_hour: 0,
            end_month: 12,
            end_day: 31,
            end_hour: 23,
        }
    }

    /// A single hour.
    pub fn point_in_time(month: u8, day: u8, hour: u8) -> Result<Self> {
        Self::new(month, day, hour, month, day, hour)
    }

    pub fn validate(&self) -> Result<()> {
        if day_of_year(self.st_month, self.st_day).is_none() {
            return Err(RadiationError::config(format!(
                "invalid period start date {}/{}",
                self.st_month, self.st_day
            )));
        }
        if day_of_year(self.end_month, self.end_day).is_none() {
            return Err(RadiationError::config(format!(
                "invalid period end date {}/{}",
                self.end_month, self.end_day
            )));
        }
        if self.st_hour > 23 || self.end_hour > 23 {
            return Err(RadiationError::config("period hours must be within 0-23"));
        }
        if self.st_hour > self.end_hour {
            return Err(RadiationError::config(format!(
                "period start hour {} is after end hour {}",
                self.st_hour, self.end_hour
            )));
        }
        Ok(())
    }

    pub fn is_annual(&self) -> bool {
        *self == Self::annual()
    }

    fn start_doy(&self) -> u16 {
        day_of_year(self.st_month, self.st_day).unwrap_or(1)
    }

    fn end_doy(&self) -> u16 {
        day_of_year(self.end_month, self.end_day).unwrap_or(365)
    }

    fn contains_day(&self, doy: u16) -> bool {
        let (st, end) = (self.start_doy(), self.end_doy());
        if st <= end {
            (st..=end).contains(&doy)
        } else {
            doy >= st || doy <= end
        }
    }

    /// Checks whether the hour of year (0-8759) lies inside the period.
    pub fn contains_hoy(&self, hoy: usize) -> bool {
        if hoy >= HOURS_PER_YEAR {
            return false;
        }
        let doy = (hoy / 24) as u16 + 1;
        let hour = (hoy % 24) as u8;
        self.contains_day(doy) && (self.st_hour..=self.end_hour).contains(&hour)
    }

    /// All hours of the year inside the period, in chronological order
    /// starting from the period start.
    pub fn hoys(&self) -> Vec<usize> {
        let (st, end) = (self.start_doy() as usize, self.end_doy() as usize);
        let days: Vec<usize> = if st <= end {
            (st..=end).collect()
        } else {
            (st..=365).chain(1..=end).collect()
        };
        let mut hoys = Vec::with_capacity(days.len() * 24);
        for doy in days {
            for hour in self.st_hour..=self.end_hour {
                hoys.push((doy - 1) * 24 + hour as usize);
            }
        }
        hoys
    }

    /// Duration in hours.
    pub fn duration_hours(&self) -> f64 {
        let (st, end) = (self.start_doy() as usize, self.end_doy() as usize);
        let num_days = if st <= end { end - st + 1 } else { 365 - st + 1 + end };
        let hours_per_day = (self.end_hour - self.st_hour) as usize + 1;
        (num_days * hours_per_day) as f64
    }
}

impl Default for AnalysisPeriod {
    fn default() -> Self {
        Self::annual()
    }
}

impl fmt::Display for AnalysisPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {}-{}/{} {}",
            self.st_month, self.st_day, self.st_hour, self.end_month, self.end_day, self.end_hour
        )
    }
}

/// Parses `"M/D H-M/D H"`, e.g. `"1/1 0-12/31 23"` or `"6/21 12-6/21 12"`.
impl FromStr for AnalysisPeriod {
    type Err = RadiationError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || RadiationError::config(format!("cannot parse analysis period '{s}'"));
        let (start, end) = s.split_once('-').ok_or_else(bad)?;
        let parse_part = |part: &str| -> Result<(u8, u8, u8)> {
            let (date, hour) = part.trim().split_once(' ').ok_or_else(bad)?;
            let (month, day) = date.split_once('/').ok_or_else(bad)?;
            Ok((
                month.trim().parse().map_err(|_| bad())?,
                day.trim().parse().map_err(|_| bad())?,
                hour.trim().parse().map_err(|_| bad())?,
            ))
        };
        let (sm, sd, sh) = parse_part(start)?;
        let (em, ed, eh) = parse_part(end)?;
        Self::new(sm, sd, sh, em, ed, eh)
    }
}
