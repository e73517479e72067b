//! Boundary loading and periodic refresh for the query server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use barangay::boundaries::{self, AxisOrder, BoundaryFetcher, BoundaryStore, Snapshot};
use barangay::config::BoundarySource;

/// Loads fresh snapshots from the configured source
pub enum BoundaryLoader {
    File(PathBuf),
    Url(BoundaryFetcher),
}

impl BoundaryLoader {
    pub fn from_source(source: BoundarySource) -> Result<Self> {
        Ok(match source {
            BoundarySource::File(path) => BoundaryLoader::File(path),
            BoundarySource::Url(url) => BoundaryLoader::Url(BoundaryFetcher::new(&url)?),
        })
    }

    pub async fn load(&self, axis: AxisOrder) -> Result<Snapshot> {
        match self {
            BoundaryLoader::File(path) => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || boundaries::load_snapshot(path, axis)).await?
            }
            BoundaryLoader::Url(fetcher) => boundaries::fetch_snapshot(fetcher, axis).await,
        }
    }
}

/// Reload boundaries every `every`, swapping the store's snapshot on success.
pub async fn refresh_loop(
    loader: BoundaryLoader,
    axis: AxisOrder,
    store: Arc<BoundaryStore>,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    // First tick completes immediately; the initial load already happened
    ticker.tick().await;

    loop {
        ticker.tick().await;
        refresh_once(&loader, axis, &store).await;
    }
}

/// One reload attempt. A failed reload keeps serving the previous snapshot.
pub async fn refresh_once(
    loader: &BoundaryLoader,
    axis: AxisOrder,
    store: &BoundaryStore,
) -> bool {
    match loader.load(axis).await {
        Ok(snapshot) => {
            let polygons = snapshot.polygon_count();
            store.replace(snapshot);
            info!("Refreshed boundaries: {} polygons", polygons);
            true
        }
        Err(e) => {
            warn!("Boundary refresh failed, keeping previous data: {:#}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn boundaries_json(name: &str) -> String {
        format!(
            r#"[{{"name": "{name}",
                 "points": [{{"lat": 7.0, "long": 125.0}}, {{"lat": 7.01, "long": 125.0}},
                            {{"lat": 7.01, "long": 125.01}}, {{"lat": 7.0, "long": 125.01}}],
                 "province": {{"provinceName": "Cotabato"}}}}]"#
        )
    }

    fn rewrite(path: &std::path::Path, content: &str) {
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn first_name(store: &BoundaryStore) -> String {
        store.snapshot().records[0].name.clone()
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let file = tempfile::NamedTempFile::new().unwrap();
        rewrite(file.path(), &boundaries_json("Poblacion"));

        let loader = BoundaryLoader::File(file.path().to_path_buf());
        let store = BoundaryStore::new(loader.load(AxisOrder::LatLong).await.unwrap());
        let before = store.snapshot();
        assert_eq!(first_name(&store), "Poblacion");

        rewrite(file.path(), "[{\"name\": ");
        assert!(!refresh_once(&loader, AxisOrder::LatLong, &store).await);
        assert!(Arc::ptr_eq(&store.snapshot(), &before));

        // Parses, but the polygon is degenerate
        rewrite(
            file.path(),
            r#"[{"name": "Broken", "points": [], "province": {"provinceName": "Cotabato"}}]"#,
        );
        assert!(!refresh_once(&loader, AxisOrder::LatLong, &store).await);
        assert!(Arc::ptr_eq(&store.snapshot(), &before));

        rewrite(file.path(), &boundaries_json("Katidtuan"));
        assert!(refresh_once(&loader, AxisOrder::LatLong, &store).await);
        assert!(!Arc::ptr_eq(&store.snapshot(), &before));
        assert_eq!(first_name(&store), "Katidtuan");
        assert_eq!(before.records[0].name, "Poblacion");
    }

    #[tokio::test]
    async fn test_refresh_loop_swaps_on_tick() {
        let file = tempfile::NamedTempFile::new().unwrap();
        rewrite(file.path(), &boundaries_json("Poblacion"));

        let loader = BoundaryLoader::File(file.path().to_path_buf());
        let initial = loader.load(AxisOrder::LatLong).await.unwrap();
        let store = Arc::new(BoundaryStore::new(initial));
        rewrite(file.path(), &boundaries_json("Katidtuan"));

        let handle = tokio::spawn(refresh_loop(
            loader,
            AxisOrder::LatLong,
            Arc::clone(&store),
            Duration::from_millis(20),
        ));

        let mut refreshed = false;
        for _ in 0..250 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if first_name(&store) == "Katidtuan" {
                refreshed = true;
                break;
            }
        }
        handle.abort();
        assert!(refreshed);
    }
}
