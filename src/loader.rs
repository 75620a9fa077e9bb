use crate::error::{ReportError, Result};
use crate::record::{columns_for_width, TestRecord, HEADER_SENTINEL};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::debug;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Columns every headered test-results file must provide.
const REQUIRED_COLUMNS: [&str; 12] = [
    "Test_Number",
    "Unix_Test_Start_Time",
    "Local_Test_Start_Time",
    "Unix_Test_End_Time",
    "Local_Test_End_Time",
    "Verse_ID",
    "Characters",
    "WPM",
    "Test_Seconds",
    "Error_Rate",
    "Error_and_Backspace_Rate",
    "Player",
];

/// Whether a first row is a header row rather than data.
pub fn is_header_row(first_row: &StringRecord) -> bool {
    first_row
        .get(0)
        .map(|cell| cell.trim_start_matches('\u{feff}').trim() == HEADER_SENTINEL)
        .unwrap_or(false)
}

/// Read a test-results file, headered or headerless. An empty file
/// yields no records.
pub fn read_test_results(path: &Path) -> Result<Vec<TestRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ReportError::csv(path, e))?;

    let mut rows = reader.records();
    let first = match rows.next() {
        Some(row) => row.map_err(|e| ReportError::csv(path, e))?,
        None => {
            debug!("{} is empty", path.display());
            return Ok(Vec::new());
        }
    };

    let (headers, mut records) = if is_header_row(&first) {
        let headers: StringRecord = first
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();
        check_required_columns(path, &headers)?;
        (headers, Vec::new())
    } else {
        let columns = columns_for_width(first.len()).ok_or_else(|| {
            ReportError::schema(
                path,
                format!(
                    "headerless row has {} fields; expected 21 or 22",
                    first.len()
                ),
            )
        })?;
        let headers = StringRecord::from(columns.to_vec());
        let record = deserialize_row(path, &first, &headers, 1)?;
        (headers, vec![record])
    };

    for (idx, row) in rows.enumerate() {
        let row = row.map_err(|e| ReportError::csv(path, e))?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        records.push(deserialize_row(path, &row, &headers, idx + 2)?);
    }

    debug!("read {} tests from {}", records.len(), path.display());
    Ok(records)
}

fn check_required_columns(path: &Path, headers: &StringRecord) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::schema(
            path,
            format!("missing required columns: {}", missing.join(", ")),
        ))
    }
}

fn deserialize_row(
    path: &Path,
    row: &StringRecord,
    headers: &StringRecord,
    line: usize,
) -> Result<TestRecord> {
    row.deserialize(Some(headers)).map_err(|e| {
        ReportError::schema(path, format!("row {line} does not match the schema: {e}"))
    })
}

/// Read any headered csv into typed rows (word results, verse catalog).
pub fn read_headered<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| ReportError::csv(path, e))?;
    reader
        .deserialize()
        .map(|row| row.map_err(|e| ReportError::csv(path, e)))
        .collect()
}

/// Write test records with a header row. Data goes to a sibling temp
/// file first and is renamed into place once complete.
pub fn write_test_results(path: &Path, records: &[TestRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    let tmp = path.with_extension("csv.partial");
    {
        let mut writer = WriterBuilder::new()
            .has_headers(true)
            .from_path(&tmp)
            .map_err(|e| ReportError::csv(&tmp, e))?;
        for record in records {
            writer
                .serialize(record)
                .map_err(|e| ReportError::csv(&tmp, e))?;
        }
        writer.flush().map_err(|e| ReportError::io(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| ReportError::io(path, e))
}
