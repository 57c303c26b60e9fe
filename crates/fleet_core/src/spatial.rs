//! Spatial operations: H3 distance/path helpers and the cell → entity index.
//!
//! - **Distance**: haversine distance between H3 cells, memoized in a global LRU cache
//! - **Grid paths**: H3 grid paths between cells, memoized (successful paths only)
//! - **SpatialIndex**: "what is at this cell" lookups for vehicles, requests, stations and bases
//!
//! Default resolution is 9 (~240m cell size), suitable for city-scale simulations.

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::{Mutex, OnceLock};

use h3o::{CellIndex, LatLng, Resolution};
use lru::LruCache;

use crate::ids::{BaseId, RequestId, StationId, VehicleId};

pub const DEFAULT_RESOLUTION: Resolution = Resolution::Nine;

const EARTH_RADIUS_KM: f64 = 6371.0;

fn distance_km_between_cells_uncached(a: CellIndex, b: CellIndex) -> f64 {
    let a: LatLng = a.into();
    let b: LatLng = b.into();
    let (lat1, lon1) = (a.lat().to_radians(), a.lng().to_radians());
    let (lat2, lon2) = (b.lat().to_radians(), b.lng().to_radians());
    let sin_dlat = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon = ((lon2 - lon1) * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

fn distance_cache() -> &'static Mutex<LruCache<(CellIndex, CellIndex), f64>> {
    static CACHE: OnceLock<Mutex<LruCache<(CellIndex, CellIndex), f64>>> = OnceLock::new();
    CACHE.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(50_000).expect("cache size must be non-zero"),
        ))
    })
}

fn path_cache() -> &'static Mutex<LruCache<(CellIndex, CellIndex), Vec<CellIndex>>> {
    static CACHE: OnceLock<Mutex<LruCache<(CellIndex, CellIndex), Vec<CellIndex>>>> =
        OnceLock::new();
    CACHE.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(5_000).expect("cache size must be non-zero"),
        ))
    })
}

/// Haversine distance between two cell centroids, with LRU caching.
pub fn distance_km_between_cells(a: CellIndex, b: CellIndex) -> f64 {
    if a == b {
        return 0.0;
    }
    // symmetric key, smaller cell first
    let key = if a < b { (a, b) } else { (b, a) };
    let mut cache = match distance_cache().lock() {
        Ok(guard) => guard,
        Err(_) => return distance_km_between_cells_uncached(key.0, key.1),
    };
    *cache.get_or_insert(key, || distance_km_between_cells_uncached(key.0, key.1))
}

fn compute_grid_path(from: CellIndex, to: CellIndex) -> Option<Vec<CellIndex>> {
    let cells: Vec<CellIndex> = from
        .grid_path_cells(to)
        .ok()?
        .filter_map(|cell| cell.ok())
        .collect();
    if cells.is_empty() {
        None
    } else {
        Some(cells)
    }
}

/// H3 grid path from `from` to `to` (both ends included), with LRU caching.
///
/// Paths are direction-sensitive, so the cache key is ordered. Failures are not cached.
pub fn grid_path_cells_cached(from: CellIndex, to: CellIndex) -> Option<Vec<CellIndex>> {
    let mut cache = match path_cache().lock() {
        Ok(guard) => guard,
        Err(_) => return compute_grid_path(from, to),
    };
    if let Some(cached) = cache.get(&(from, to)) {
        return Some(cached.clone());
    }
    let path = compute_grid_path(from, to)?;
    cache.put((from, to), path.clone());
    Some(path)
}

/// Convert a lat/lng pair to a cell at the simulation resolution.
pub fn cell_from_lat_lng(lat: f64, lng: f64) -> Option<CellIndex> {
    LatLng::new(lat, lng)
        .ok()
        .map(|coord| coord.to_cell(DEFAULT_RESOLUTION))
}

/// Bidirectional cell ↔ id map for one entity kind.
#[derive(Debug, Clone)]
struct CellMap<K: Ord + Clone> {
    by_cell: HashMap<CellIndex, BTreeSet<K>>,
    cell_of: HashMap<K, CellIndex>,
}

impl<K: Ord + Clone> Default for CellMap<K> {
    fn default() -> Self {
        Self {
            by_cell: HashMap::new(),
            cell_of: HashMap::new(),
        }
    }
}

impl<K: Ord + Clone + std::hash::Hash> CellMap<K> {
    fn insert(&mut self, id: K, cell: CellIndex) {
        if let Some(old) = self.cell_of.insert(id.clone(), cell) {
            if old == cell {
                return;
            }
            self.detach(&id, old);
        }
        self.by_cell.entry(cell).or_default().insert(id);
    }

    fn remove(&mut self, id: &K) {
        if let Some(cell) = self.cell_of.remove(id) {
            self.detach(id, cell);
        }
    }

    fn detach(&mut self, id: &K, cell: CellIndex) {
        if let Some(ids) = self.by_cell.get_mut(&cell) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_cell.remove(&cell);
            }
        }
    }

    fn at(&self, cell: CellIndex) -> Vec<K> {
        self.by_cell
            .get(&cell)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn cell(&self, id: &K) -> Option<CellIndex> {
        self.cell_of.get(id).copied()
    }
}

/// Everything located at one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitiesAtCell {
    pub vehicles: Vec<VehicleId>,
    pub requests: Vec<RequestId>,
    pub stations: Vec<StationId>,
    pub bases: Vec<BaseId>,
}

/// Spatial index from H3 cell to the entities located there.
///
/// Maintained by the simulation state's mutation primitives; never edited directly.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    vehicles: CellMap<VehicleId>,
    requests: CellMap<RequestId>,
    stations: CellMap<StationId>,
    bases: CellMap<BaseId>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or relocate a vehicle.
    pub fn place_vehicle(&mut self, id: VehicleId, cell: CellIndex) {
        self.vehicles.insert(id, cell);
    }

    pub fn remove_vehicle(&mut self, id: &VehicleId) {
        self.vehicles.remove(id);
    }

    pub fn place_request(&mut self, id: RequestId, cell: CellIndex) {
        self.requests.insert(id, cell);
    }

    pub fn remove_request(&mut self, id: &RequestId) {
        self.requests.remove(id);
    }

    pub fn place_station(&mut self, id: StationId, cell: CellIndex) {
        self.stations.insert(id, cell);
    }

    pub fn remove_station(&mut self, id: &StationId) {
        self.stations.remove(id);
    }

    pub fn place_base(&mut self, id: BaseId, cell: CellIndex) {
        self.bases.insert(id, cell);
    }

    pub fn remove_base(&mut self, id: &BaseId) {
        self.bases.remove(id);
    }

    pub fn vehicle_cell(&self, id: &VehicleId) -> Option<CellIndex> {
        self.vehicles.cell(id)
    }

    pub fn request_cell(&self, id: &RequestId) -> Option<CellIndex> {
        self.requests.cell(id)
    }

    /// All entity ids at `cell`, each list in id order.
    pub fn at_cell(&self, cell: CellIndex) -> EntitiesAtCell {
        EntitiesAtCell {
            vehicles: self.vehicles.at(cell),
            requests: self.requests.at(cell),
            stations: self.stations.at(cell),
            bases: self.bases.at(cell),
        }
    }

    /// Vehicles in any of `cells`.
    pub fn vehicles_in_cells(&self, cells: &[CellIndex]) -> Vec<VehicleId> {
        cells.iter().flat_map(|cell| self.vehicles.at(*cell)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> CellIndex {
        CellIndex::try_from(0x8a1fb46622dffff).expect("valid cell")
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_same_cell() {
        let a = origin();
        let b = a
            .grid_disk::<Vec<_>>(3)
            .into_iter()
            .find(|c| a.grid_distance(*c).ok() == Some(3))
            .expect("ring cell");
        assert_eq!(distance_km_between_cells(a, a), 0.0);
        let ab = distance_km_between_cells(a, b);
        let ba = distance_km_between_cells(b, a);
        assert!(ab > 0.0);
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn grid_path_starts_and_ends_at_endpoints() {
        let a = origin();
        let b = a
            .grid_disk::<Vec<_>>(4)
            .into_iter()
            .find(|c| a.grid_distance(*c).ok() == Some(4))
            .expect("ring cell");
        let path = grid_path_cells_cached(a, b).expect("path");
        assert_eq!(path.first(), Some(&a));
        assert_eq!(path.last(), Some(&b));
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn spatial_index_relocates_vehicles() {
        let a = origin();
        let b = a
            .grid_disk::<Vec<_>>(1)
            .into_iter()
            .find(|c| *c != a)
            .expect("neighbor");
        let mut index = SpatialIndex::new();
        index.place_vehicle("v1".into(), a);
        index.place_vehicle("v2".into(), a);
        index.place_station("s1".into(), a);

        index.place_vehicle("v1".into(), b);

        let at_a = index.at_cell(a);
        assert_eq!(at_a.vehicles, vec![VehicleId::from("v2")]);
        assert_eq!(at_a.stations, vec![StationId::from("s1")]);
        assert_eq!(index.at_cell(b).vehicles, vec![VehicleId::from("v1")]);
        assert_eq!(index.vehicle_cell(&"v1".into()), Some(b));

        index.remove_vehicle(&"v2".into());
        assert!(index.at_cell(a).vehicles.is_empty());
    }
}
