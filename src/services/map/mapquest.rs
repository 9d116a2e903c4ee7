//! Encode map images for the MapQuest static map API
use super::MapRenderingService;
use crate::config::FromServiceConfig;
use crate::geo::Coordinate;
use crate::map::{Frame, MapRenderRequest, Marker};
use crate::Error;
use log::trace;

/// Distance in meters from a vehicle to the point that shows its course
const COURSE_DISTANCE: f64 = 150.0;

/// Defines parameters to interact with the MapQuest static map v5 API
#[derive(Debug, FromServiceConfig)]
pub struct MapQuest {
    base_url: String,
    #[service_config(required)]
    key: String,
    #[service_config(skip)]
    image_format: &'static str,
}

impl MapQuest {
    pub fn new(key: String) -> Self {
        MapQuest {
            key,
            ..Default::default()
        }
    }

    /// Each vehicle becomes a pair of locations, its position and a via point along its
    /// course, so the provider draws a short line showing the direction.
    fn encode_locations(&self, markers: &[Marker]) -> String {
        markers
            .iter()
            .map(|m| {
                let course = m.course_point(COURSE_DISTANCE);
                format!(
                    "{},{}||{},{}|via-sm",
                    m.coordinate().latitude(),
                    m.coordinate().longitude(),
                    course.latitude(),
                    course.longitude()
                )
            })
            .collect::<Vec<String>>()
            .join("||")
    }
}

impl Default for MapQuest {
    fn default() -> Self {
        MapQuest {
            base_url: "https://www.mapquestapi.com/staticmap/v5/map".to_string(),
            key: String::new(),
            image_format: "jpg90",
        }
    }
}

fn encode_shape(polyline: &[Coordinate]) -> String {
    polyline
        .iter()
        .map(|c| format!("{},{}", c.latitude(), c.longitude()))
        .collect::<Vec<String>>()
        .join("|")
}

impl MapRenderingService for MapQuest {
    fn name(&self) -> &'static str {
        "MapQuest"
    }

    fn render(&self, request: &MapRenderRequest) -> Result<String, Error> {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("key", &self.key);
        if !request.markers().is_empty() {
            params.append_pair("locations", &self.encode_locations(request.markers()));
        }
        params.append_pair("size", &format!("{},{}", request.width(), request.height()));
        params.append_pair("format", self.image_format);
        params.append_pair("defaultMarker", &format!("circle-{}", request.label()));
        for polyline in request.polylines() {
            params.append_pair("shape", &encode_shape(polyline));
        }
        match request.frame() {
            Frame::Bounds(bbox) => {
                // the provider expects the box as north, west, south, east
                params.append_pair(
                    "boundingBox",
                    &format!(
                        "{},{},{},{}",
                        bbox.north(),
                        bbox.west(),
                        bbox.south(),
                        bbox.east()
                    ),
                );
            }
            Frame::Centered(view) => {
                params.append_pair(
                    "center",
                    &format!(
                        "{},{}",
                        view.center().latitude(),
                        view.center().longitude()
                    ),
                );
                params.append_pair("zoom", &view.zoom().to_string());
            }
        }

        let url = format!("{}?{}", self.base_url, params.finish());
        trace!("MapQuest image URL for route {}: {}", request.label(), url);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{ImageSize, MapGeometry, VehicleObservation, Viewport};

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    fn query_params(url: &str) -> Vec<(String, String)> {
        let query = url.splitn(2, '?').nth(1).unwrap();
        form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn route_32() -> MapGeometry {
        let vehicles = vec![VehicleObservation::new(
            coord(56.8348, 60.6910),
            270.0,
            "32".to_string(),
        )];
        let polylines = vec![vec![coord(56.83, 60.6), coord(56.84, 60.62)]];
        MapGeometry::assemble("32", &vehicles, polylines, Viewport::default())
    }

    #[test]
    fn render_vehicle_and_route() {
        let geometry = route_32();
        let url = MapQuest::new("secret".to_string())
            .render(&geometry.request(ImageSize::full()))
            .unwrap();
        assert!(url.starts_with("https://www.mapquestapi.com/staticmap/v5/map?"));

        let params = query_params(&url);
        assert_eq!(param(&params, "key"), vec!["secret"]);
        assert_eq!(param(&params, "boundingBox"), vec!["56.84,60.6,56.83,60.62"]);
        assert_eq!(param(&params, "size"), vec!["1024,1024"]);
        assert_eq!(param(&params, "format"), vec!["jpg90"]);
        assert_eq!(param(&params, "defaultMarker"), vec!["circle-32"]);
        assert_eq!(param(&params, "shape"), vec!["56.83,60.6|56.84,60.62"]);
        assert!(param(&params, "center").is_empty());

        let locations = param(&params, "locations");
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].matches("|via-sm").count(), 1);
        let pair: Vec<&str> = locations[0].split("||").collect();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair[0], "56.8348,60.691");
    }

    #[test]
    fn sizes_only_change_the_size_parameter() {
        let geometry = route_32();
        let backend = MapQuest::new("secret".to_string());
        let full = backend.render(&geometry.request(ImageSize::full())).unwrap();
        let thumb = backend
            .render(&geometry.request(ImageSize::thumbnail()))
            .unwrap();

        assert_ne!(full, thumb);
        assert_eq!(full.replace("size=1024%2C1024", "size=256%2C256"), thumb);
    }

    #[test]
    fn route_without_polylines_uses_centered_view() {
        let view = Viewport::new(coord(56.8389, 60.6057), 12);
        let geometry = MapGeometry::assemble("8", &[], Vec::new(), view);
        let url = MapQuest::new("secret".to_string())
            .render(&geometry.request(ImageSize::thumbnail()))
            .unwrap();

        let params = query_params(&url);
        assert_eq!(param(&params, "center"), vec!["56.8389,60.6057"]);
        assert_eq!(param(&params, "zoom"), vec!["12"]);
        assert!(param(&params, "boundingBox").is_empty());
        assert!(param(&params, "shape").is_empty());
        assert!(param(&params, "locations").is_empty());
    }
}
