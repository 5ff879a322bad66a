//! Measurement ingestion from CSV.
//!
//! Input files carry one row per tensile test: `id,yield_MPa`. Parsing is
//! strict: duplicate specimen ids, non-finite values, and non-positive yield
//! strengths are all hard errors, surfaced with the offending row.

use csv::Trim;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// One tensile-test record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub id: u64,
    #[serde(rename = "yield_MPa")]
    pub yield_mpa: f64,
}

/// A parsed measurement data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSet {
    pub records: Vec<MeasurementRecord>,
}

impl MeasurementSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The yield-strength values, in file order.
    pub fn values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.yield_mpa).collect()
    }
}

/// Errors raised during measurement ingestion.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV record: {0}")]
    Csv(#[from] csv::Error),
    #[error("duplicate specimen id {id} at row {row}")]
    DuplicateId { id: u64, row: usize },
    #[error("invalid yield strength {value} for specimen {id}: must be positive and finite")]
    InvalidValue { id: u64, value: f64 },
    #[error("no measurement rows found")]
    Empty,
}

/// Read a measurement CSV from a file path.
pub fn read_measurements(path: &Path) -> Result<MeasurementSet, CollectError> {
    let file = std::fs::File::open(path).map_err(|source| CollectError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_measurements(file)
}

/// Parse a measurement CSV from any reader.
pub fn parse_measurements<R: Read>(reader: R) -> Result<MeasurementSet, CollectError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for (row, result) in csv_reader.deserialize::<MeasurementRecord>().enumerate() {
        let record = result?;
        if !seen.insert(record.id) {
            return Err(CollectError::DuplicateId {
                id: record.id,
                row: row + 1,
            });
        }
        if !record.yield_mpa.is_finite() || record.yield_mpa <= 0.0 {
            return Err(CollectError::InvalidValue {
                id: record.id,
                value: record.yield_mpa,
            });
        }
        records.push(record);
    }
    if records.is_empty() {
        return Err(CollectError::Empty);
    }
    Ok(MeasurementSet { records })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_csv() {
        let data = "id,yield_MPa\n1,351.2\n2,338.9\n3,347.0\n";
        let set = parse_measurements(data.as_bytes()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.values(), vec![351.2, 338.9, 347.0]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let data = "id,yield_MPa\n1,351.2\n1,338.9\n";
        assert!(matches!(
            parse_measurements(data.as_bytes()),
            Err(CollectError::DuplicateId { id: 1, row: 2 })
        ));
    }

    #[test]
    fn rejects_nonpositive_values() {
        let data = "id,yield_MPa\n1,-5.0\n";
        assert!(matches!(
            parse_measurements(data.as_bytes()),
            Err(CollectError::InvalidValue { id: 1, .. })
        ));
    }

    #[test]
    fn rejects_empty_file() {
        let data = "id,yield_MPa\n";
        assert!(matches!(
            parse_measurements(data.as_bytes()),
            Err(CollectError::Empty)
        ));
    }

    #[test]
    fn rejects_malformed_rows() {
        let data = "id,yield_MPa\n1,not_a_number\n";
        assert!(matches!(
            parse_measurements(data.as_bytes()),
            Err(CollectError::Csv(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_measurements(Path::new("/nonexistent/tests.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tests.csv"));
    }
}
