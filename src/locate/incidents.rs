use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use barangay::ClassificationResult;

/// One incident report row: coordinates stay as text until classification
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRow {
    pub id: String,
    pub lat: String,
    pub long: String,
}

/// One output line per incident, carrying either the result or the error
#[derive(Debug, Serialize)]
pub struct IncidentOutput {
    pub id: String,
    #[serde(flatten)]
    pub result: Option<ClassificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Load incident rows from a CSV file with `id`, `lat` and `long` columns
pub fn load_incidents(path: &Path) -> Result<Vec<IncidentRow>> {
    info!("Loading incidents from {}", path.display());
    let file = File::open(path).context("Failed to open incidents file")?;
    let rows = read_incidents(file)?;
    info!("Loaded {} incidents", rows.len());
    Ok(rows)
}

pub fn read_incidents<R: Read>(reader: R) -> Result<Vec<IncidentRow>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();

    // Find column indices
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .with_context(|| format!("Column '{}' not found", name))
    };
    let id_idx = column("id")?;
    let lat_idx = column("lat")?;
    let long_idx = column("long")?;

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(IncidentRow {
            id: record.get(id_idx).unwrap_or_default().to_string(),
            lat: record.get(lat_idx).unwrap_or_default().to_string(),
            long: record.get(long_idx).unwrap_or_default().to_string(),
        });
    }

    Ok(rows)
}
