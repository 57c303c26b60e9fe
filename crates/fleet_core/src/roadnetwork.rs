//! Road network contract consumed by the vehicle state machine.
//!
//! The simulation only needs two things from a road network: a route between two cells, and the
//! cell reached after travelling some distance along one link. [`H3GridRoadNetwork`] provides
//! both over the H3 grid with haversine link lengths and a constant free-flow speed.

mod traversal;

use std::fmt;

use h3o::CellIndex;

use crate::ids::LinkId;
use crate::spatial::{distance_km_between_cells, grid_path_cells_cached};

pub use traversal::{traverse, RouteTraversal};

/// Travel speed floor, so a misconfigured link never takes infinite time.
const MIN_SPEED_KMH: f64 = 1.0;

/// One directed link traversal with its distance and free-flow speed.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTraversal {
    pub link_id: LinkId,
    pub start: CellIndex,
    pub end: CellIndex,
    pub distance_km: f64,
    pub speed_kmh: f64,
}

impl LinkTraversal {
    pub fn travel_time_secs(&self) -> f64 {
        if self.distance_km <= 0.0 {
            0.0
        } else {
            self.distance_km / self.speed_kmh.max(MIN_SPEED_KMH) * 3600.0
        }
    }
}

/// Ordered sequence of link traversals from an origin to a destination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    links: Vec<LinkTraversal>,
}

impl Route {
    pub fn new(links: Vec<LinkTraversal>) -> Self {
        Self { links }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn links(&self) -> &[LinkTraversal] {
        &self.links
    }

    pub fn distance_km(&self) -> f64 {
        self.links.iter().map(|link| link.distance_km).sum()
    }

    pub fn travel_time_secs(&self) -> f64 {
        self.links.iter().map(LinkTraversal::travel_time_secs).sum()
    }

    pub fn origin(&self) -> Option<CellIndex> {
        self.links.first().map(|link| link.start)
    }

    pub fn destination(&self) -> Option<CellIndex> {
        self.links.last().map(|link| link.end)
    }

    /// True when this route leads from `origin` to `destination`.
    ///
    /// An empty route corresponds only when both ends are the same cell.
    pub fn corresponds_with(&self, origin: CellIndex, destination: CellIndex) -> bool {
        match (self.origin(), self.destination()) {
            (Some(start), Some(end)) => start == origin && end == destination,
            _ => origin == destination,
        }
    }

    /// True when this route starts at `origin` (or is empty).
    pub fn starts_at(&self, origin: CellIndex) -> bool {
        self.origin().map_or(true, |start| start == origin)
    }
}

/// Routing backend. Implementations are shared read-only across every simulation snapshot.
pub trait RoadNetwork: Send + Sync + fmt::Debug {
    /// Route between two cells. Same-cell routing yields an empty route.
    fn route(&self, from: CellIndex, to: CellIndex) -> Route;

    /// Cell reached after travelling `offset_km` along `link` from its start.
    fn position_at(&self, link: &LinkTraversal, offset_km: f64) -> CellIndex;

    /// Free-flow speed used for newly built links.
    fn speed_kmh(&self) -> f64;
}

/// Routes along the H3 grid using cached grid paths and haversine distances.
#[derive(Debug, Clone, Copy)]
pub struct H3GridRoadNetwork {
    pub speed_kmh: f64,
}

impl Default for H3GridRoadNetwork {
    fn default() -> Self {
        // average city speed
        Self { speed_kmh: 40.0 }
    }
}

impl H3GridRoadNetwork {
    pub fn with_speed_kmh(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    fn link(&self, start: CellIndex, end: CellIndex) -> LinkTraversal {
        LinkTraversal {
            link_id: LinkId::new(format!("{start}-{end}")),
            start,
            end,
            distance_km: distance_km_between_cells(start, end),
            speed_kmh: self.speed_kmh,
        }
    }
}

impl RoadNetwork for H3GridRoadNetwork {
    fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    fn route(&self, from: CellIndex, to: CellIndex) -> Route {
        if from == to {
            return Route::empty();
        }
        match grid_path_cells_cached(from, to) {
            Some(cells) => Route::new(
                cells
                    .windows(2)
                    .map(|pair| self.link(pair[0], pair[1]))
                    .collect(),
            ),
            // no grid path (e.g. across a pentagon): fall back to a single straight link
            None => Route::new(vec![self.link(from, to)]),
        }
    }

    fn position_at(&self, link: &LinkTraversal, offset_km: f64) -> CellIndex {
        if link.distance_km <= 0.0 || offset_km <= 0.0 {
            return link.start;
        }
        if offset_km >= link.distance_km {
            return link.end;
        }
        let fraction = offset_km / link.distance_km;
        match grid_path_cells_cached(link.start, link.end) {
            Some(cells) if !cells.is_empty() => {
                let idx = (fraction * (cells.len() - 1) as f64).round() as usize;
                cells[idx.min(cells.len() - 1)]
            }
            _ if fraction < 0.5 => link.start,
            _ => link.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_cell, test_cell_at_distance};

    #[test]
    fn same_cell_route_is_empty_and_corresponds() {
        let network = H3GridRoadNetwork::default();
        let route = network.route(test_cell(), test_cell());
        assert!(route.is_empty());
        assert!(route.corresponds_with(test_cell(), test_cell()));
        assert!(!route.corresponds_with(test_cell(), test_cell_at_distance(1)));
    }

    #[test]
    fn grid_route_links_are_contiguous() {
        let network = H3GridRoadNetwork::default();
        let destination = test_cell_at_distance(5);
        let route = network.route(test_cell(), destination);

        assert_eq!(route.len(), 5);
        assert!(route.corresponds_with(test_cell(), destination));
        for pair in route.links().windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert!(route.distance_km() > 0.0);
        let expected_secs = route.distance_km() / 40.0 * 3600.0;
        assert!((route.travel_time_secs() - expected_secs).abs() < 1e-6);
    }

    #[test]
    fn position_at_snaps_to_link_ends() {
        let network = H3GridRoadNetwork::default();
        let route = network.route(test_cell(), test_cell_at_distance(1));
        let link = &route.links()[0];
        assert_eq!(network.position_at(link, 0.0), link.start);
        assert_eq!(network.position_at(link, link.distance_km * 0.2), link.start);
        assert_eq!(network.position_at(link, link.distance_km * 0.8), link.end);
        assert_eq!(network.position_at(link, link.distance_km * 2.0), link.end);
    }
}
