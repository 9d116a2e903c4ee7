//! Read-only snapshot of route topology and waypoint coordinates
use crate::geo::Coordinate;
use crate::services::TransitDataSource;
use log::{debug, info};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Lookup table from waypoint id to its coordinates
pub type PointRegistry = HashMap<String, Coordinate>;

/// One continuous piece of a route's path as an ordered chain of waypoint ids
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    waypoint_ids: Vec<String>,
}

impl Segment {
    pub fn new(waypoint_ids: Vec<String>) -> Self {
        Segment { waypoint_ids }
    }

    pub fn waypoint_ids(&self) -> &[String] {
        &self.waypoint_ids
    }

    /// Resolve waypoint ids to coordinates, ids missing from the registry are skipped
    pub fn resolve(&self, points: &PointRegistry) -> Vec<Coordinate> {
        self.waypoint_ids
            .iter()
            .filter_map(|id| points.get(id).copied())
            .collect()
    }
}

/// Path of a route in one direction
#[derive(Clone, Debug, PartialEq)]
pub struct RoutePath {
    route_number: String,
    segments: Vec<Segment>,
}

impl RoutePath {
    pub fn new(route_number: String, segments: Vec<Segment>) -> Self {
        RoutePath {
            route_number,
            segments,
        }
    }

    pub fn route_number(&self) -> &str {
        &self.route_number
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Routes and points loaded once at startup, never modified afterwards
#[derive(Debug)]
pub struct RouteRepository {
    routes: Vec<RoutePath>,
    points: PointRegistry,
    known_route_numbers: Vec<String>,
}

impl RouteRepository {
    pub fn new(routes: Vec<RoutePath>, points: PointRegistry) -> Self {
        let mut known_route_numbers: Vec<String> =
            routes.iter().map(|r| r.route_number().to_string()).collect();
        known_route_numbers.sort_by(|a, b| compare_route_numbers(a, b));
        known_route_numbers.dedup();

        RouteRepository {
            routes,
            points,
            known_route_numbers,
        }
    }

    /// Fetch the route topology and point registry from the transit data source
    pub fn load(source: &dyn TransitDataSource) -> Result<Self, Box<dyn std::error::Error>> {
        let routes = source.route_paths()?;
        let points = source.point_registry()?;
        info!(
            "Loaded {} route paths and {} points from the transit data source",
            routes.len(),
            points.len()
        );
        Ok(Self::new(routes, points))
    }

    /// Route numbers sorted numerically without duplicates
    pub fn known_route_numbers(&self) -> &[String] {
        &self.known_route_numbers
    }

    pub fn is_known_route(&self, route_number: &str) -> bool {
        self.known_route_numbers.iter().any(|n| n == route_number)
    }

    /// Every path registered for the route number, usually one per direction
    pub fn route_paths<'a>(&'a self, route_number: &'a str) -> impl Iterator<Item = &'a RoutePath> {
        self.routes
            .iter()
            .filter(move |r| r.route_number() == route_number)
    }

    /// Resolve every segment of every path of the route into a coordinate chain.
    ///
    /// Waypoints missing from the registry are dropped from their chain and a segment
    /// without a single known waypoint contributes no chain at all.
    pub fn resolve_polylines(&self, route_number: &str) -> Vec<Vec<Coordinate>> {
        let mut polylines = Vec::new();
        for route in self.route_paths(route_number) {
            for segment in route.segments() {
                let chain = segment.resolve(&self.points);
                if chain.len() < segment.waypoint_ids().len() {
                    debug!(
                        "route {}: {} of {} waypoints have no coordinates",
                        route_number,
                        segment.waypoint_ids().len() - chain.len(),
                        segment.waypoint_ids().len()
                    );
                }
                if !chain.is_empty() {
                    polylines.push(chain);
                }
            }
        }
        polylines
    }
}

/// Numeric route numbers come first in numeric order, anything else follows alphabetically.
/// Numbers with the same value (`3` and `03`) are ordered by their text so that equal
/// strings always end up next to each other.
fn compare_route_numbers(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::VehicleObservation;
    use std::cell::Cell;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    fn segment(ids: &[&str]) -> Segment {
        Segment::new(ids.iter().map(|s| s.to_string()).collect())
    }

    fn registry() -> PointRegistry {
        let mut points = PointRegistry::new();
        points.insert("A".to_string(), coord(56.83, 60.60));
        points.insert("B".to_string(), coord(56.84, 60.61));
        points.insert("C".to_string(), coord(56.85, 60.62));
        points
    }

    #[test]
    fn unknown_waypoints_are_dropped_from_the_chain() {
        let routes = vec![RoutePath::new(
            "32".to_string(),
            vec![segment(&["A", "MISSING", "B"])],
        )];
        let repo = RouteRepository::new(routes, registry());

        let polylines = repo.resolve_polylines("32");
        assert_eq!(polylines, vec![vec![coord(56.83, 60.60), coord(56.84, 60.61)]]);
    }

    #[test]
    fn every_direction_of_a_route_is_resolved() {
        let routes = vec![
            RoutePath::new("5".to_string(), vec![segment(&["A", "B"]), segment(&["B", "C"])]),
            RoutePath::new("5".to_string(), vec![segment(&["C", "A"])]),
            RoutePath::new("7".to_string(), vec![segment(&["A", "C"])]),
        ];
        let repo = RouteRepository::new(routes, registry());

        assert_eq!(repo.resolve_polylines("5").len(), 3);
        assert_eq!(repo.resolve_polylines("7").len(), 1);
    }

    #[test]
    fn segment_without_known_waypoints_is_omitted() {
        let routes = vec![RoutePath::new(
            "1".to_string(),
            vec![segment(&["X", "Y"]), segment(&["A"])],
        )];
        let repo = RouteRepository::new(routes, registry());

        assert_eq!(repo.resolve_polylines("1"), vec![vec![coord(56.83, 60.60)]]);
    }

    #[test]
    fn unknown_route_yields_no_polylines() {
        let routes = vec![RoutePath::new("1".to_string(), vec![segment(&["A", "B"])])];
        let repo = RouteRepository::new(routes, registry());

        assert!(repo.resolve_polylines("01").is_empty());
        assert!(repo.resolve_polylines("2").is_empty());
    }

    #[test]
    fn route_numbers_are_sorted_numerically_and_deduplicated() {
        let routes = ["15", "3", "26", "3", "A", "15"]
            .iter()
            .map(|n| RoutePath::new(n.to_string(), Vec::new()))
            .collect();
        let repo = RouteRepository::new(routes, PointRegistry::new());

        assert_eq!(repo.known_route_numbers(), &["3", "15", "26", "A"]);
        assert!(repo.is_known_route("26"));
        assert!(!repo.is_known_route("4"));
    }

    #[test]
    fn zero_padded_route_numbers_do_not_split_duplicates() {
        let routes = ["3", "03", "3", "003", "03"]
            .iter()
            .map(|n| RoutePath::new(n.to_string(), Vec::new()))
            .collect();
        let repo = RouteRepository::new(routes, PointRegistry::new());

        assert_eq!(repo.known_route_numbers(), &["003", "03", "3"]);
    }

    /// In memory transit source that counts how often topology is requested
    struct StaticSource {
        routes: Vec<RoutePath>,
        points: PointRegistry,
        route_calls: Cell<usize>,
        point_calls: Cell<usize>,
    }

    impl TransitDataSource for StaticSource {
        fn vehicle_positions(
            &self,
        ) -> Result<Vec<VehicleObservation>, Box<dyn std::error::Error>> {
            Ok(Vec::new())
        }

        fn route_paths(&self) -> Result<Vec<RoutePath>, Box<dyn std::error::Error>> {
            self.route_calls.set(self.route_calls.get() + 1);
            Ok(self.routes.clone())
        }

        fn point_registry(&self) -> Result<PointRegistry, Box<dyn std::error::Error>> {
            self.point_calls.set(self.point_calls.get() + 1);
            Ok(self.points.clone())
        }
    }

    #[test]
    fn load_fetches_topology_once() {
        let source = StaticSource {
            routes: vec![
                RoutePath::new("8".to_string(), vec![segment(&["A", "B"])]),
                RoutePath::new("2".to_string(), vec![segment(&["C"])]),
            ],
            points: registry(),
            route_calls: Cell::new(0),
            point_calls: Cell::new(0),
        };
        let repo = RouteRepository::load(&source).unwrap();

        assert_eq!(source.route_calls.get(), 1);
        assert_eq!(source.point_calls.get(), 1);
        assert_eq!(repo.known_route_numbers(), &["2", "8"]);
        assert_eq!(
            repo.resolve_polylines("8"),
            vec![vec![coord(56.83, 60.60), coord(56.84, 60.61)]]
        );
        assert_eq!(repo.resolve_polylines("2"), vec![vec![coord(56.85, 60.62)]]);
    }
}
