/// Time-bucketed energy totals
///
/// `{ "<ISO-8601 instant>": { "<cell>": <Wh>, ... }, ... }`. Keys are ISO
/// instants in one format, so lexical order is chronological order. Every
/// stored total is strictly positive; empty buckets are not kept.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cell identifier -> accumulated Wh for one time key
pub type History = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeries {
    entries: BTreeMap<String, History>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and prune in one go
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        let mut series: TimeSeries = serde_json::from_str(json)?;
        let removed = series.prune();
        if removed > 0 {
            log::warn!("Dropped {} non-positive time series entries", removed);
        }
        Ok(series)
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Add `value` to the running total of (time key, cell)
    pub fn accumulate(&mut self, time_key: &str, cell: &str, value: f64) {
        let history = self.entries.entry(time_key.to_string()).or_default();
        *history.entry(cell.to_string()).or_insert(0.0) += value;
    }

    /// Drop non-positive or non-finite totals and then empty time keys.
    /// Returns how many cell entries and keys were removed.
    pub fn prune(&mut self) -> usize {
        let mut removed = 0;
        for history in self.entries.values_mut() {
            let before = history.len();
            history.retain(|_, total| total.is_finite() && *total > 0.0);
            removed += before - history.len();
        }
        let before = self.entries.len();
        self.entries.retain(|_, history| !history.is_empty());
        removed + (before - self.entries.len())
    }

    /// Time keys in chronological order
    pub fn time_keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn history(&self, time_key: &str) -> Option<&History> {
        self.entries.get(time_key)
    }

    /// Largest single (time key, cell) total; 0 when empty
    pub fn daily_max(&self) -> f64 {
        self.entries
            .values()
            .flat_map(|history| history.values())
            .copied()
            .fold(0.0, f64::max)
    }

    /// Sum over all cells for one key
    pub fn total_for(&self, time_key: &str) -> f64 {
        self.history(time_key)
            .map(|history| history.values().sum())
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_prune() {
        let json = r#"{
            "2024-06-01T12:00:00.000Z": {"85195da3fffffff": 120.5, "85195dbbfffffff": 0},
            "2024-06-01T00:00:00.000Z": {"85195da3fffffff": -4},
            "2024-06-01T06:30:00.000Z": {"85195da3fffffff": 10}
        }"#;

        let series = TimeSeries::from_json_str(json).unwrap();
        assert_eq!(
            series.time_keys(),
            vec!["2024-06-01T06:30:00.000Z", "2024-06-01T12:00:00.000Z"]
        );
        assert_eq!(series.history("2024-06-01T12:00:00.000Z").unwrap().len(), 1);
        assert!(series.history("2024-06-01T00:00:00.000Z").is_none());
        assert_eq!(series.daily_max(), 120.5);
    }

    #[test]
    fn test_accumulate_sums() {
        let mut series = TimeSeries::new();
        series.accumulate("t", "a", 2.0);
        series.accumulate("t", "a", 3.5);
        series.accumulate("t", "b", 1.0);
        assert_eq!(series.history("t").unwrap()["a"], 5.5);
        assert_eq!(series.total_for("t"), 6.5);
        assert_eq!(series.total_for("missing"), 0.0);
    }

    #[test]
    fn test_prune_counts() {
        let mut series = TimeSeries::new();
        series.accumulate("t1", "a", 0.0);
        series.accumulate("t1", "b", f64::NAN);
        series.accumulate("t2", "a", 1.0);
        series.accumulate("t2", "b", -1.0);
        // two cells + one key in t1, one cell in t2
        assert_eq!(series.prune(), 4);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_empty_series() {
        let series = TimeSeries::from_json_str("{}").unwrap();
        assert!(series.is_empty());
        assert_eq!(series.daily_max(), 0.0);
        assert_eq!(series.to_json(false).unwrap(), "{}");
    }

    #[test]
    fn test_json_layout() {
        let mut series = TimeSeries::new();
        series.accumulate("2024-01-01T00:00:00.000Z", "85754e67fffffff", 100.0);
        let json = series.to_json(false).unwrap();
        assert_eq!(json, r#"{"2024-01-01T00:00:00.000Z":{"85754e67fffffff":100.0}}"#);
        assert_eq!(TimeSeries::from_json_str(&json).unwrap(), series);
    }
}
