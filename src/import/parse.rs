use csv::ReaderBuilder;
use csvwatch_core::{ImportError, Record};
use std::path::Path;

/// Parse CSV `data`: the first row names the fields, every following row
/// becomes one record. Rows with a different number of cells than the header
/// are rejected. When a header name repeats, the right-most column wins.
pub fn parse_records(path: &Path, data: &[u8]) -> Result<(Vec<String>, Vec<Record>), ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(path, &e, 0))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| parse_error(path, &e, index as u64 + 1))?;
        let record: Record = headers
            .iter()
            .cloned()
            .zip(row.iter().map(str::to_string))
            .collect();
        records.push(record);
    }

    Ok((headers, records))
}

fn parse_error(path: &Path, err: &csv::Error, fallback_row: u64) -> ImportError {
    let row = err.position().map(|p| p.record()).unwrap_or(fallback_row);
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {expected_len} fields, found {len}"),
        csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8: {err}"),
        _ => err.to_string(),
    };
    ImportError::parse(path, row, message)
}
