//! Turn a requested route number into map image URLs
use crate::map::{ImageSize, MapGeometry, VehicleObservation, Viewport};
use crate::repository::RouteRepository;
use crate::services::MapRenderingService;
use crate::Error;
use log::debug;

/// Full size and preview URLs of the same map
#[derive(Clone, Debug, PartialEq)]
pub struct MapUrls {
    image_url: String,
    thumbnail_url: String,
}

impl MapUrls {
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }
}

/// Combines the route snapshot and the configured map backend, both are built once at
/// startup and only read afterwards
pub struct RouteMapper<'a> {
    repository: &'a RouteRepository,
    renderer: &'a dyn MapRenderingService,
    default_view: Viewport,
}

impl<'a> RouteMapper<'a> {
    pub fn new(
        repository: &'a RouteRepository,
        renderer: &'a dyn MapRenderingService,
        default_view: Viewport,
    ) -> Self {
        RouteMapper {
            repository,
            renderer,
            default_view,
        }
    }

    pub fn known_route_numbers(&self) -> &'a [String] {
        self.repository.known_route_numbers()
    }

    /// Fails with `UnknownRouteError` listing the valid numbers if the route doesn't exist
    pub fn check_route(&self, route_number: &str) -> Result<(), Error> {
        if self.repository.is_known_route(route_number) {
            Ok(())
        } else {
            Err(Error::UnknownRouteError(
                route_number.to_string(),
                self.known_route_numbers().to_vec(),
            ))
        }
    }

    /// Markers and route lines of a known route, computed once and reusable for any size
    pub fn geometry(
        &self,
        route_number: &str,
        vehicles: &[VehicleObservation],
    ) -> Result<MapGeometry, Error> {
        self.check_route(route_number)?;
        let polylines = self.repository.resolve_polylines(route_number);
        let geometry = MapGeometry::assemble(route_number, vehicles, polylines, self.default_view);
        debug!(
            "route {}: {} vehicles, {} polylines",
            route_number,
            geometry.markers().len(),
            geometry.polylines().len()
        );
        Ok(geometry)
    }

    pub fn render(&self, geometry: &MapGeometry, size: ImageSize) -> Result<String, Error> {
        self.renderer.render(&geometry.request(size))
    }

    /// URLs of the full size image and its thumbnail
    pub fn map_urls(
        &self,
        route_number: &str,
        vehicles: &[VehicleObservation],
    ) -> Result<MapUrls, Error> {
        let geometry = self.geometry(route_number, vehicles)?;
        Ok(MapUrls {
            image_url: self.render(&geometry, ImageSize::full())?,
            thumbnail_url: self.render(&geometry, ImageSize::thumbnail())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::repository::{PointRegistry, RoutePath, Segment};
    use crate::services::map::{MapBox, MapQuest};

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    fn repository() -> RouteRepository {
        let mut points = PointRegistry::new();
        points.insert("1".to_string(), coord(56.83, 60.6));
        points.insert("2".to_string(), coord(56.84, 60.62));
        let routes = vec![
            RoutePath::new(
                "32".to_string(),
                vec![Segment::new(vec!["1".to_string(), "2".to_string()])],
            ),
            RoutePath::new("3".to_string(), Vec::new()),
        ];
        RouteRepository::new(routes, points)
    }

    fn vehicles() -> Vec<VehicleObservation> {
        vec![
            VehicleObservation::new(coord(56.8348, 60.6910), 270.0, "32".to_string()),
            VehicleObservation::new(coord(56.8000, 60.5000), 10.0, "3".to_string()),
        ]
    }

    #[test]
    fn unknown_route_lists_known_numbers() {
        let repo = repository();
        let backend = MapQuest::new("key".to_string());
        let mapper = RouteMapper::new(&repo, &backend, Viewport::default());

        match mapper.map_urls("99", &vehicles()) {
            Err(Error::UnknownRouteError(route, known)) => {
                assert_eq!(route, "99");
                assert_eq!(known, vec!["3".to_string(), "32".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn full_and_thumbnail_urls_share_geometry() {
        let repo = repository();
        let backend = MapQuest::new("key".to_string());
        let mapper = RouteMapper::new(&repo, &backend, Viewport::default());

        let urls = mapper.map_urls("32", &vehicles()).unwrap();
        assert!(urls.image_url().contains("size=1024%2C1024"));
        assert!(urls.thumbnail_url().contains("size=256%2C256"));
        assert_eq!(
            urls.image_url().replace("size=1024%2C1024", "size=256%2C256"),
            urls.thumbnail_url()
        );
    }

    #[test]
    fn route_without_geometry_still_renders() {
        let repo = repository();
        let backend = MapBox::new("token".to_string());
        let mapper = RouteMapper::new(&repo, &backend, Viewport::default());

        let geometry = mapper.geometry("3", &vehicles()).unwrap();
        assert_eq!(geometry.markers().len(), 1);
        assert!(geometry.polylines().is_empty());

        let url = mapper.render(&geometry, ImageSize::full()).unwrap();
        assert!(url.contains("/auto/1024x1024@2x"));
    }
}
