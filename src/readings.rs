/// Raw sources for the offline generator
///
/// Readings: `ss_id`, `datetime_GMT`, `generation_Wh`, from Parquet or CSV.
/// Site metadata (CSV): `ss_id,latitude_rounded,longitude_rounded`. Readings
/// are inner-joined to their site by `ss_id`; readings for unknown sites are
/// dropped.

use crate::aggregator::{Reading, parse_energy_value};
use crate::error::{Result, SolarHexError};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Container of the readings file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingsFormat {
    Parquet,
    Csv,
}

impl ReadingsFormat {
    /// `.parquet` / `.pq` read as Parquet, anything else as CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") || ext.eq_ignore_ascii_case("pq") => {
                ReadingsFormat::Parquet
            }
            _ => ReadingsFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteLocation {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
struct SiteRow {
    ss_id: String,
    #[serde(alias = "lat")]
    latitude_rounded: f64,
    #[serde(alias = "lon")]
    longitude_rounded: f64,
}

#[derive(Debug, Deserialize)]
struct ReadingRow {
    ss_id: String,
    #[serde(rename = "datetime_GMT")]
    datetime_gmt: String,
    #[serde(rename = "generation_Wh", default)]
    generation_wh: String,
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// RFC 3339, or a zone-less `YYYY-MM-DD HH:MM:SS[.fff]` taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    if let Ok(timestamp) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(timestamp.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn warn_malformed(line: u64, reason: impl ToString) {
    let error = SolarHexError::MalformedInputRow {
        line,
        reason: reason.to_string(),
    };
    log::warn!("{}", error);
}

fn row_line(error: &csv::Error, fallback: u64) -> u64 {
    error.position().map(|p| p.line()).unwrap_or(fallback)
}

pub fn read_site_metadata<R: Read>(reader: R) -> Result<HashMap<String, SiteLocation>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut sites = HashMap::new();

    for (index, row) in csv_reader.deserialize::<SiteRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn_malformed(row_line(&e, index as u64 + 2), &e);
                continue;
            }
        };
        sites.insert(
            row.ss_id,
            SiteLocation {
                lat: row.latitude_rounded,
                lon: row.longitude_rounded,
            },
        );
    }

    log::info!("Loaded {} site locations", sites.len());
    Ok(sites)
}

/// Inner join of reading rows onto site locations
struct SiteJoin<'a> {
    sites: &'a HashMap<String, SiteLocation>,
    readings: Vec<Reading>,
    unknown_sites: usize,
}

impl<'a> SiteJoin<'a> {
    fn new(sites: &'a HashMap<String, SiteLocation>) -> Self {
        Self {
            sites,
            readings: Vec::new(),
            unknown_sites: 0,
        }
    }

    fn push(&mut self, ss_id: &str, timestamp: DateTime<Utc>, energy_wh: f64) {
        let Some(site) = self.sites.get(ss_id) else {
            self.unknown_sites += 1;
            return;
        };
        self.readings.push(Reading {
            lon: site.lon,
            lat: site.lat,
            timestamp,
            energy_wh,
        });
    }

    fn finish(self) -> Vec<Reading> {
        if self.unknown_sites > 0 {
            log::debug!("{} readings had no site metadata", self.unknown_sites);
        }
        log::info!("Loaded {} readings", self.readings.len());
        self.readings
    }
}

/// Join CSV reading rows to their sites. Energy values go through
/// [`parse_energy_value`]; rows with an unreadable timestamp are skipped.
pub fn read_readings<R: Read>(reader: R, sites: &HashMap<String, SiteLocation>) -> Result<Vec<Reading>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut join = SiteJoin::new(sites);

    for (index, row) in csv_reader.deserialize::<ReadingRow>().enumerate() {
        let line = index as u64 + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn_malformed(row_line(&e, line), &e);
                continue;
            }
        };
        let Some(timestamp) = parse_timestamp(&row.datetime_gmt) else {
            warn_malformed(line, format!("unreadable timestamp '{}'", row.datetime_gmt));
            continue;
        };
        join.push(&row.ss_id, timestamp, parse_energy_value(&row.generation_wh));
    }

    Ok(join.finish())
}

/// Site ids are numeric in the published dataset; keys are compared as text
fn field_as_site_id(field: &Field) -> Option<String> {
    match field {
        Field::Str(id) => Some(id.trim().to_string()),
        Field::Long(id) => Some(id.to_string()),
        Field::Int(id) => Some(id.to_string()),
        Field::Short(id) => Some(id.to_string()),
        Field::ULong(id) => Some(id.to_string()),
        Field::UInt(id) => Some(id.to_string()),
        _ => None,
    }
}

fn field_as_timestamp(field: &Field) -> Option<DateTime<Utc>> {
    match field {
        Field::TimestampMillis(ms) => DateTime::from_timestamp_millis(*ms),
        Field::TimestampMicros(us) => DateTime::from_timestamp_micros(*us),
        Field::Str(raw) => parse_timestamp(raw),
        _ => None,
    }
}

/// Same coercion as [`parse_energy_value`]: null and non-finite read as 0
fn field_as_energy(field: &Field) -> f64 {
    let value = match field {
        Field::Double(value) => *value,
        Field::Float(value) => f64::from(*value),
        Field::Long(value) => *value as f64,
        Field::Int(value) => f64::from(*value),
        Field::Str(raw) => parse_energy_value(raw),
        _ => 0.0,
    };
    if value.is_finite() { value } else { 0.0 }
}

/// Join Parquet reading rows to their sites. Columns are matched by name;
/// `ss_id` may be text or integer, `datetime_GMT` text or a timestamp.
pub fn read_parquet_readings(file: File, sites: &HashMap<String, SiteLocation>) -> Result<Vec<Reading>> {
    let reader = SerializedFileReader::new(file)?;
    let mut join = SiteJoin::new(sites);

    for (index, row) in reader.get_row_iter(None)?.enumerate() {
        let line = index as u64 + 1;
        let row = row?;

        let mut ss_id = None;
        let mut timestamp = None;
        let mut raw_timestamp = None;
        let mut energy_wh = 0.0;
        for (name, field) in row.get_column_iter() {
            match name.as_str() {
                "ss_id" => ss_id = field_as_site_id(field),
                "datetime_GMT" => {
                    timestamp = field_as_timestamp(field);
                    raw_timestamp = Some(field.to_string());
                }
                "generation_Wh" => energy_wh = field_as_energy(field),
                _ => {}
            }
        }

        let Some(ss_id) = ss_id else {
            warn_malformed(line, "missing ss_id");
            continue;
        };
        let Some(timestamp) = timestamp else {
            warn_malformed(
                line,
                format!("unreadable timestamp '{}'", raw_timestamp.unwrap_or_default()),
            );
            continue;
        };
        join.push(&ss_id, timestamp, energy_wh);
    }

    Ok(join.finish())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| SolarHexError::data_fetch(path, e))
}

/// Load and join readings and site metadata from disk, picking the readings
/// reader from the file extension
pub fn load_readings(readings_path: &Path, metadata_path: &Path) -> Result<Vec<Reading>> {
    load_readings_as(readings_path, metadata_path, ReadingsFormat::from_path(readings_path))
}

pub fn load_readings_as(
    readings_path: &Path,
    metadata_path: &Path,
    format: ReadingsFormat,
) -> Result<Vec<Reading>> {
    let sites = read_site_metadata(open(metadata_path)?)?;
    let file = open(readings_path)?;
    match format {
        ReadingsFormat::Csv => read_readings(file, &sites),
        ReadingsFormat::Parquet => read_parquet_readings(file, &sites)
            .map_err(|e| SolarHexError::data_fetch(readings_path, e)),
    }
}
