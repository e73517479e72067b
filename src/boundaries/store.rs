//! Loaded boundary snapshots with atomic replacement.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use tracing::info;

use super::{AxisOrder, BoundaryRecord};
use crate::error::{LocateError, Result};
use crate::models::{ContextKey, PolygonSet};
use crate::pip::RegionIndex;

/// Immutable view of one boundary load: the raw records, the validated
/// polygon set and a region index per classification context.
#[derive(Debug)]
pub struct Snapshot {
    pub records: Vec<BoundaryRecord>,
    pub set: PolygonSet,
    pub loaded_at: DateTime<Utc>,
    /// Where the records came from (file path or URL)
    pub source: String,
    all: RegionIndex,
    by_context: HashMap<ContextKey, RegionIndex>,
}

impl Snapshot {
    /// Validate the records and build every index up front
    pub fn build(
        records: Vec<BoundaryRecord>,
        axis: AxisOrder,
        source: impl Into<String>,
    ) -> Result<Self> {
        let set = PolygonSet::from_records(&records, axis)?;
        let all = RegionIndex::build(set.all())?;

        let mut by_context = HashMap::new();
        for (key, polygons) in set.groups() {
            by_context.insert(key.clone(), RegionIndex::build(polygons.to_vec())?);
        }

        // Province-level fallback for provinces only loaded per municipality
        for province in set.provinces() {
            let key = ContextKey::province(province);
            if !by_context.contains_key(&key) {
                let polygons = set.resolve(&key)?.into_owned();
                by_context.insert(key, RegionIndex::build(polygons)?);
            }
        }

        let source = source.into();
        info!(
            "Loaded {} polygons in {} contexts from {}",
            set.polygon_count(),
            set.len(),
            source
        );

        Ok(Self {
            records,
            set,
            loaded_at: Utc::now(),
            source,
            all,
            by_context,
        })
    }

    /// Empty snapshot, used before the first successful load
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            set: PolygonSet::new(),
            loaded_at: Utc::now(),
            source: String::new(),
            all: RegionIndex::empty(),
            by_context: HashMap::new(),
        }
    }

    /// Index applying to a query context, following the same fallback as
    /// [`PolygonSet::resolve`]. No province means every loaded polygon.
    pub fn index_for(
        &self,
        province: Option<&str>,
        municipality: Option<&str>,
    ) -> Result<&RegionIndex> {
        let Some(province) = province.filter(|p| !p.trim().is_empty()) else {
            return Ok(&self.all);
        };

        let key = ContextKey::new(province, municipality);
        self.by_context
            .get(&key)
            .or_else(|| self.by_context.get(&ContextKey::province(province)))
            .ok_or(LocateError::UnknownContext {
                province: key.province,
                municipality: key.municipality,
            })
    }

    /// Records of one province, or all records
    pub fn records_for(&self, province: Option<&str>) -> Vec<&BoundaryRecord> {
        match province.filter(|p| !p.trim().is_empty()) {
            Some(province) => {
                let wanted = ContextKey::province(province).province;
                self.records
                    .iter()
                    .filter(|r| r.context().province == wanted)
                    .collect()
            }
            None => self.records.iter().collect(),
        }
    }

    pub fn polygon_count(&self) -> usize {
        self.all.len()
    }
}

/// Shared holder of the current [`Snapshot`].
///
/// Readers take an `Arc` to the snapshot and keep using it for the whole
/// request; a refresh swaps in a fully built replacement in one step.
#[derive(Debug)]
pub struct BoundaryStore {
    current: RwLock<Arc<Snapshot>>,
}

impl BoundaryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a new snapshot, returning the previous one
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundaries::{MunicipalityRef, ProvinceRef, RawVertex};
    use crate::models::Point;
    use crate::pip::RegionClassifier;

    fn record(
        name: &str,
        province: &str,
        municipality: Option<&str>,
        lat: f64,
        lon: f64,
    ) -> BoundaryRecord {
        let corners = [
            (lat, lon),
            (lat + 0.01, lon),
            (lat + 0.01, lon + 0.01),
            (lat, lon + 0.01),
        ];
        BoundaryRecord {
            name: name.to_string(),
            points: corners
                .iter()
                .map(|&(lat, long)| RawVertex { lat, long })
                .collect(),
            province: ProvinceRef {
                province_name: province.to_string(),
            },
            municipality: municipality.map(|m| MunicipalityRef {
                mun_name: m.to_string(),
            }),
            pol_type: None,
        }
    }

    fn records() -> Vec<BoundaryRecord> {
        vec![
            record("Poblacion", "Cotabato", Some("Kabacan"), 7.0, 125.0),
            record("Katidtuan", "Cotabato", Some("Kabacan"), 7.01, 125.0),
            record("Del Carmen", "Cotabato", Some("Pres. Roxas"), 7.0, 125.0),
            record("Apokon", "Davao del Norte", None, 7.4, 125.8),
        ]
    }

    #[test]
    fn test_index_for_contexts() {
        let snapshot = Snapshot::build(records(), AxisOrder::LatLong, "test").unwrap();
        assert_eq!(snapshot.polygon_count(), 4);
        assert_eq!(snapshot.index_for(None, None).unwrap().len(), 4);
        assert_eq!(
            snapshot.index_for(Some("cotabato"), Some("KABACAN")).unwrap().len(),
            2
        );
        // Province-level fallback merges municipalities
        assert_eq!(snapshot.index_for(Some("Cotabato"), None).unwrap().len(), 3);
        assert_eq!(snapshot.index_for(Some("Cotabato"), Some("Pikit")).unwrap().len(), 3);
        assert_eq!(snapshot.index_for(Some("Davao del Norte"), None).unwrap().len(), 1);
        assert!(matches!(
            snapshot.index_for(Some("Bukidnon"), None),
            Err(LocateError::UnknownContext { .. })
        ));
    }

    #[test]
    fn test_records_for() {
        let snapshot = Snapshot::build(records(), AxisOrder::LatLong, "test").unwrap();
        assert_eq!(snapshot.records_for(None).len(), 4);
        assert_eq!(snapshot.records_for(Some(" COTABATO ")).len(), 3);
        assert!(snapshot.records_for(Some("Bukidnon")).is_empty());
    }

    #[test]
    fn test_build_rejects_invalid_record() {
        let mut bad = records();
        bad[2].points.truncate(1);
        assert!(matches!(
            Snapshot::build(bad, AxisOrder::LatLong, "test"),
            Err(LocateError::InvalidPolygon { index: 2, .. })
        ));
    }

    #[test]
    fn test_replace_keeps_old_snapshot_alive() {
        let store = BoundaryStore::new(Snapshot::empty());
        let before = store.snapshot();
        assert_eq!(before.polygon_count(), 0);

        let old = store.replace(Snapshot::build(records(), AxisOrder::LatLong, "test").unwrap());
        assert!(Arc::ptr_eq(&old, &before));
        assert_eq!(before.polygon_count(), 0);
        assert_eq!(store.snapshot().polygon_count(), 4);
    }

    #[test]
    fn test_concurrent_readers_during_swap() {
        let store = Arc::new(BoundaryStore::new(
            Snapshot::build(records(), AxisOrder::LatLong, "first").unwrap(),
        ));
        let classifier = RegionClassifier::default();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let classifier = classifier.clone();
                std::thread::spawn(move || {
                    let point = Point::new(7.005, 125.005).unwrap();
                    for _ in 0..200 {
                        let snapshot = store.snapshot();
                        let index = snapshot.index_for(Some("Cotabato"), Some("Kabacan")).unwrap();
                        let result = classifier.locate_indexed(&point, index).unwrap();
                        assert_eq!(result.matched_names, vec!["Poblacion".to_string()]);
                    }
                })
            })
            .collect();

        for _ in 0..20 {
            store.replace(Snapshot::build(records(), AxisOrder::LatLong, "refresh").unwrap());
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
