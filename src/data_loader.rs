/// Startup loading of the two input datasets
///
/// Region outlines and the time series are independent, so they load on two
/// scoped threads; callers get both or the first error.

use crate::error::{Result, SolarHexError};
use crate::geo_json::FeatureCollection;
use crate::time_series::TimeSeries;
use std::fs;
use std::path::Path;
use std::thread;

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SolarHexError::data_fetch(path, e))
}

pub fn load_feature_collection<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let json = read_text(path)?;
    let collection =
        FeatureCollection::from_json_str(&json).map_err(|e| SolarHexError::data_fetch(path, e))?;
    log::info!("Loaded {} features from {}", collection.features.len(), path.display());
    Ok(collection)
}

pub fn load_time_series<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
    let path = path.as_ref();
    let json = read_text(path)?;
    let series = TimeSeries::from_json_str(&json).map_err(|e| SolarHexError::data_fetch(path, e))?;
    log::info!("Loaded {} time keys from {}", series.len(), path.display());
    Ok(series)
}

/// Load both inputs concurrently and wait for both
pub fn load_inputs(geo_path: &Path, series_path: &Path) -> Result<(FeatureCollection, TimeSeries)> {
    thread::scope(|scope| {
        let geo = scope.spawn(|| load_feature_collection(geo_path));
        let series = scope.spawn(|| load_time_series(series_path));

        let geo = geo
            .join()
            .map_err(|_| SolarHexError::data_fetch(geo_path, "loader thread panicked"))?;
        let series = series
            .join()
            .map_err(|_| SolarHexError::data_fetch(series_path, "loader thread panicked"))?;
        Ok((geo?, series?))
    })
}
