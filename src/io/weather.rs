use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::sim::weather::{Location, WeatherSeries};

/// Reads an EPW file, or a CSV series located at `location`.
///
/// The format is chosen by the file extension. CSV files carry no site, so
/// `location` is required for them; EPW files carry their own and reject it.
pub fn read_weather(path: &Path, location: Option<Location>) -> Result<WeatherSeries> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    match (is_csv, &location) {
        (true, None) => bail!(
            "CSV weather file {} needs a site location (latitude, longitude, timezone)",
            path.display()
        ),
        (false, Some(_)) => bail!(
            "EPW weather file {} defines its own location; do not pass one",
            path.display()
        ),
        _ => {}
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read weather file: {}", path.display()))?;
    let series = match location {
        Some(location) => WeatherSeries::from_csv(&content, location),
        None => WeatherSeries::from_epw(&content),
    };
    series.with_context(|| format!("Failed to parse weather file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_with_location() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("series.csv");
        std::fs::write(&path, "timestamp,direct_normal,diffuse_horizontal\n03-21 12:00,600,90\n")?;
        let location = Location::new("Site", 48.2, 16.4, 1.0, 170.0);
        let series = read_weather(&path, Some(location.clone()))?;
        assert_eq!(series.location, location);
        assert_eq!(series.num_hours(), 1);
        Ok(())
    }

    #[test]
    fn test_csv_requires_location() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("series.csv");
        std::fs::write(&path, "03-21 12:00,600,90\n")?;
        let err = read_weather(&path, None).unwrap_err();
        assert!(err.to_string().contains("needs a site location"));
        Ok(())
    }

    #[test]
    fn test_epw_rejects_location() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("site.epw");
        std::fs::write(&path, "LOCATION,X,,Y,,0,10.0,20.0,1.0,0.0\n")?;
        let location = Location::new("Site", 48.2, 16.4, 1.0, 170.0);
        let err = read_weather(&path, Some(location)).unwrap_err();
        assert!(err.to_string().contains("defines its own location"));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(read_weather(Path::new("/nonexistent/weather.epw"), None).is_err());
    }
}
