use std::fmt;

use serde::{Deserialize, Serialize};

use super::sensor::{GridInfo, SensorPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadiationUnit {
    #[serde(rename = "Wh/m2")]
    WattHoursPerSquareMeter,
    #[serde(rename = "W/m2")]
    WattsPerSquareMeter,
}

impl fmt::Display for RadiationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadiationUnit::WattHoursPerSquareMeter => write!(f, "Wh/m2"),
            RadiationUnit::WattsPerSquareMeter => write!(f, "W/m2"),
        }
    }
}

/// One value per sensor, in sensor order.
#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceResult {
    values: Vec<f64>,
    unit: RadiationUnit,
}

impl IrradianceResult {
    pub fn new(values: Vec<f64>, unit: RadiationUnit) -> Self {
        Self { values, unit }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn unit(&self) -> RadiationUnit {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Values of each grid of a joined run.
    pub fn split<'a>(&'a self, grids: &'a [GridInfo]) -> Vec<(&'a GridInfo, &'a [f64])> {
        grids
            .iter()
            .filter_map(|g| {
                self.values
                    .get(g.start..g.start + g.count)
                    .map(|values| (g, values))
            })
            .collect()
    }
}

/// Aggregate statistics of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub run_id: String,
    pub sensor_count: usize,
    pub unit: RadiationUnit,
    pub duration_hours: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// Σ value·area in kWh; only for cumulative results where every sensor has an area.
    pub total_radiation_kwh: Option<f64>,
    /// Mean irradiance over the period (W/m^2).
    pub average_irradiance: Option<f64>,
}

impl ResultSummary {
    pub fn new(
        run_id: &str,
        result: &IrradianceResult,
        sensors: &[SensorPoint],
        duration_hours: f64,
    ) -> Self {
        let mean = result.mean();
        let (total_radiation_kwh, average_irradiance) = match result.unit() {
            RadiationUnit::WattHoursPerSquareMeter => {
                let areas: Option<Vec<f64>> = sensors.iter().map(|s| s.area).collect();
                let total = areas
                    .filter(|a| a.len() == result.len() && !a.is_empty())
                    .map(|a| {
                        a.iter()
                            .zip(result.values())
                            .map(|(area, v)| area * v)
                            .sum::<f64>()
                            / 1000.0
                    });
                (total, mean.map(|m| m / duration_hours))
            }
            RadiationUnit::WattsPerSquareMeter => (None, mean),
        };
        Self {
            run_id: run_id.to_string(),
            sensor_count: result.len(),
            unit: result.unit(),
            duration_hours,
            min: result.min(),
            max: result.max(),
            mean,
            total_radiation_kwh,
            average_irradiance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, Vector};

    #[test]
    fn test_statistics() {
        let r = IrradianceResult::new(vec![1.0, 4.0, 2.5], RadiationUnit::WattHoursPerSquareMeter);
        assert_eq!(r.min(), Some(1.0));
        assert_eq!(r.max(), Some(4.0));
        assert_eq!(r.mean(), Some(2.5));
        let empty = IrradianceResult::new(vec![], RadiationUnit::WattsPerSquareMeter);
        assert_eq!(empty.mean(), None);
        assert_eq!(empty.min(), None);
    }

    #[test]
    fn test_summary_total_radiation() {
        let p = SensorPoint::new(Point::new(0.0, 0.0, 0.0), Vector::new(0.0, 0.0, 1.0));
        let sensors = vec![p.with_area(2.0), p.with_area(0.5)];
        let r = IrradianceResult::new(vec![1000.0, 4000.0], RadiationUnit::WattHoursPerSquareMeter);
        let summary = ResultSummary::new("run", &r, &sensors, 10.0);
        assert!((summary.total_radiation_kwh.unwrap() - 4.0).abs() < 1e-12);
        assert!((summary.average_irradiance.unwrap() - 250.0).abs() < 1e-12);

        // Unknown areas give no total
        let summary = ResultSummary::new("run", &r, &[p, p], 10.0);
        assert_eq!(summary.total_radiation_kwh, None);
    }

    #[test]
    fn test_split() {
        let r = IrradianceResult::new(vec![1.0, 2.0, 3.0], RadiationUnit::WattHoursPerSquareMeter);
        let grids = vec![
            GridInfo {
                name: "a".into(),
                identifier: "a".into(),
                count: 1,
                start: 0,
            },
            GridInfo {
                name: "b".into(),
                identifier: "b".into(),
                count: 2,
                start: 1,
            },
        ];
        let parts = r.split(&grids);
        assert_eq!(parts[0].1, &[1.0]);
        assert_eq!(parts[1].1, &[2.0, 3.0]);
    }
}
