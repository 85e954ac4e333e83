/// Offline aggregation of raw readings into a time series
///
/// Readings inside a half-open window are bucketed by their exact timestamp
/// and by the cell containing their site, and summed per bucket.

use crate::cell_projector::CellProjector;
use crate::constants::HEX_RESOLUTION;
use crate::time_series::TimeSeries;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use h3o::Resolution;

/// One timestamped generation reading at a site
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub lon: f64,
    pub lat: f64,
    pub timestamp: DateTime<Utc>,
    pub energy_wh: f64,
}

/// `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The UTC day `[date 00:00, date+1 00:00)`
    pub fn utc_day(date: NaiveDate) -> Self {
        let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
        Self {
            start,
            end: start + chrono::Duration::days(1),
        }
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        *timestamp >= self.start && *timestamp < self.end
    }
}

/// Energy value from a raw field. Total: anything that is not a finite
/// number (empty, text, NaN, infinity) counts as 0 Wh.
pub fn parse_energy_value(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Time key for a timestamp: `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn format_time_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub accepted: usize,
    pub outside_window: usize,
    pub invalid_location: usize,
    pub non_finite_energy: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    projector: CellProjector,
}

impl Aggregator {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            projector: CellProjector::new(resolution),
        }
    }

    pub fn aggregate<'a>(
        &self,
        readings: impl IntoIterator<Item = &'a Reading>,
        window: &TimeWindow,
    ) -> TimeSeries {
        let (series, stats) = self.aggregate_with_stats(readings, window);
        log::info!(
            "Aggregated {} readings into {} time buckets ({} outside window, {} without a location)",
            stats.accepted,
            series.len(),
            stats.outside_window,
            stats.invalid_location
        );
        series
    }

    pub fn aggregate_with_stats<'a>(
        &self,
        readings: impl IntoIterator<Item = &'a Reading>,
        window: &TimeWindow,
    ) -> (TimeSeries, AggregationStats) {
        let mut series = TimeSeries::new();
        let mut stats = AggregationStats::default();

        for reading in readings {
            if !window.contains(&reading.timestamp) {
                stats.outside_window += 1;
                continue;
            }
            let Some(cell) = self.projector.cell_for(reading.lon, reading.lat) else {
                log::warn!(
                    "Skipping reading at {} with invalid location ({}, {})",
                    reading.timestamp,
                    reading.lon,
                    reading.lat
                );
                stats.invalid_location += 1;
                continue;
            };

            let energy = if reading.energy_wh.is_finite() {
                reading.energy_wh
            } else {
                stats.non_finite_energy += 1;
                0.0
            };

            series.accumulate(&format_time_key(&reading.timestamp), &cell.to_string(), energy);
            stats.accepted += 1;
        }

        series.prune();
        (series, stats)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Aggregator::new(HEX_RESOLUTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    fn reading(lon: f64, lat: f64, ts: &str, wh: f64) -> Reading {
        Reading {
            lon,
            lat,
            timestamp: at(ts),
            energy_wh: wh,
        }
    }

    fn day() -> TimeWindow {
        TimeWindow::utc_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn test_parse_energy_value() {
        assert_eq!(parse_energy_value("12.5"), 12.5);
        assert_eq!(parse_energy_value("  7 "), 7.0);
        assert_eq!(parse_energy_value("-3"), -3.0);
        assert_eq!(parse_energy_value(""), 0.0);
        assert_eq!(parse_energy_value("n/a"), 0.0);
        assert_eq!(parse_energy_value("NaN"), 0.0);
        assert_eq!(parse_energy_value("inf"), 0.0);
    }

    #[test]
    fn test_utc_day_window() {
        let window = day();
        assert_eq!(window.start, at("2024-01-01T00:00:00Z"));
        assert_eq!(window.end, at("2024-01-02T00:00:00Z"));
        assert!(window.contains(&at("2024-01-01T00:00:00Z")));
        assert!(window.contains(&at("2024-01-01T23:59:59.999Z")));
        assert!(!window.contains(&at("2024-01-02T00:00:00Z")));
        assert!(!window.contains(&at("2023-12-31T23:59:59Z")));
    }

    #[test]
    fn test_format_time_key() {
        assert_eq!(format_time_key(&at("2024-01-01T00:30:00Z")), "2024-01-01T00:30:00.000Z");
        assert_eq!(format_time_key(&at("2024-01-01T01:30:00+01:00")), "2024-01-01T00:30:00.000Z");
    }

    #[test]
    fn test_window_bounds() {
        let readings = vec![
            reading(-1.5, 52.0, "2024-01-01T00:00:00Z", 10.0),
            reading(-1.5, 52.0, "2024-01-02T00:00:00Z", 20.0),
        ];
        let (series, stats) = Aggregator::default().aggregate_with_stats(&readings, &day());
        assert_eq!(series.time_keys(), vec!["2024-01-01T00:00:00.000Z"]);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.outside_window, 1);
    }

    #[test]
    fn test_same_cell_same_time_sums() {
        let readings = vec![
            reading(-1.5, 52.0, "2024-01-01T10:00:00Z", 10.0),
            reading(-1.5001, 52.0001, "2024-01-01T10:00:00Z", 15.0),
            reading(-1.5, 52.0, "2024-01-01T10:30:00Z", 1.0),
        ];
        let series = Aggregator::default().aggregate(&readings, &day());
        let cell = CellProjector::default().cell_for(-1.5, 52.0).unwrap().to_string();

        assert_eq!(series.len(), 2);
        assert_eq!(series.history("2024-01-01T10:00:00.000Z").unwrap()[&cell], 25.0);
        assert_eq!(series.history("2024-01-01T10:30:00.000Z").unwrap()[&cell], 1.0);
    }

    #[test]
    fn test_non_positive_cells_are_dropped() {
        let readings = vec![
            reading(-1.5, 52.0, "2024-01-01T10:00:00Z", 5.0),
            reading(-1.5, 52.0, "2024-01-01T10:00:00Z", -5.0),
            reading(-3.0, 55.0, "2024-01-01T10:00:00Z", 4.0),
            reading(-1.5, 52.0, "2024-01-01T11:00:00Z", 0.0),
        ];
        let series = Aggregator::default().aggregate(&readings, &day());
        let survivor = CellProjector::default().cell_for(-3.0, 55.0).unwrap().to_string();

        let history = series.history("2024-01-01T10:00:00.000Z").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[&survivor], 4.0);
        assert!(series.history("2024-01-01T11:00:00.000Z").is_none());
    }

    #[test]
    fn test_non_finite_energy_counts_as_zero() {
        let readings = vec![
            reading(-1.5, 52.0, "2024-01-01T10:00:00Z", f64::NAN),
            reading(-1.5, 52.0, "2024-01-01T10:00:00Z", 3.0),
            reading(f64::NAN, 52.0, "2024-01-01T10:00:00Z", 3.0),
        ];
        let (series, stats) = Aggregator::default().aggregate_with_stats(&readings, &day());
        assert_eq!(series.total_for("2024-01-01T10:00:00.000Z"), 3.0);
        assert_eq!(stats.non_finite_energy, 1);
        assert_eq!(stats.invalid_location, 1);
    }
}
