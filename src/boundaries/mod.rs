//! Boundary data: external record shape, loading and refreshable snapshots.

mod fetcher;
mod record;
mod store;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

pub use fetcher::BoundaryFetcher;
pub use record::{AxisOrder, BoundaryRecord, MunicipalityRef, ProvinceRef, RawVertex};
pub use store::{BoundaryStore, Snapshot};

/// Read a JSON array of boundary records from disk
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<BoundaryRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read boundaries file {}", path.display()))?;
    let records: Vec<BoundaryRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse boundaries file {}", path.display()))?;
    info!("Read {} boundary records from {}", records.len(), path.display());
    Ok(records)
}

/// Read and validate a boundaries file into a snapshot
pub fn load_snapshot<P: AsRef<Path>>(path: P, axis: AxisOrder) -> Result<Snapshot> {
    let path = path.as_ref();
    let records = load_file(path)?;
    Snapshot::build(records, axis, path.display().to_string())
        .with_context(|| format!("Invalid boundaries in {}", path.display()))
}

/// Fetch and validate boundaries from an endpoint into a snapshot
pub async fn fetch_snapshot(fetcher: &BoundaryFetcher, axis: AxisOrder) -> Result<Snapshot> {
    let records = fetcher.fetch().await?;
    Snapshot::build(records, axis, fetcher.url().as_str())
        .with_context(|| format!("Invalid boundaries from {}", fetcher.url()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_snapshot_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "Del Carmen",
                 "points": [{{"lat": 7.113824, "long": 125.044968}},
                            {{"lat": 7.126276, "long": 125.029640}},
                            {{"lat": 7.105394, "long": 125.014189}},
                            {{"lat": 7.102659, "long": 125.041444}}],
                 "province": {{"provinceName": "Cotabato"}}}}]"#
        )
        .unwrap();

        let snapshot = load_snapshot(file.path(), AxisOrder::LatLong).unwrap();
        assert_eq!(snapshot.polygon_count(), 1);
        assert_eq!(snapshot.source, file.path().display().to_string());
    }

    #[test]
    fn test_load_snapshot_reports_invalid_polygon() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "Broken", "points": [], "province": {{"provinceName": "Cotabato"}}}}]"#
        )
        .unwrap();

        let err = load_snapshot(file.path(), AxisOrder::LatLong).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Broken"), "{message}");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_file("/nonexistent/boundaries.json").is_err());
    }
}
