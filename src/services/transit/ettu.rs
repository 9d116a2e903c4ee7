//! Fetch tram positions, routes and stops from the ETTU (Yekaterinburg) open API
use super::TransitDataSource;
use crate::config::FromServiceConfig;
use crate::geo::Coordinate;
use crate::map::VehicleObservation;
use crate::repository::{PointRegistry, RoutePath, Segment};
use crate::Error;
use log::{debug, warn};
use reqwest::{blocking::Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// The API mixes numbers and numeric strings for the same fields
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> String {
        match value {
            Scalar::Text(s) => s,
            Scalar::Integer(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
        }
    }
}

fn deserialize_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(String::from)
}

fn deserialize_scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Scalar>::deserialize(deserializer)?;
    Ok(values.into_iter().map(String::from).collect())
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    #[serde(default)]
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct Board {
    #[serde(default, deserialize_with = "deserialize_scalar")]
    dev_id: String,
    #[serde(deserialize_with = "deserialize_scalar")]
    route: String,
    #[serde(deserialize_with = "deserialize_scalar")]
    lat: String,
    #[serde(deserialize_with = "deserialize_scalar")]
    lon: String,
    #[serde(deserialize_with = "deserialize_scalar")]
    course: String,
}

#[derive(Debug, Deserialize)]
struct BoardsResponse {
    error: ApiError,
    #[serde(default)]
    vehicles: Vec<Board>,
}

#[derive(Debug, Deserialize)]
struct RouteElement {
    #[serde(default, deserialize_with = "deserialize_scalar_list")]
    full_path: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Route {
    #[serde(deserialize_with = "deserialize_scalar")]
    num: String,
    #[serde(default)]
    elements: Vec<RouteElement>,
}

#[derive(Debug, Deserialize)]
struct RoutesResponse {
    error: ApiError,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct Point {
    #[serde(deserialize_with = "deserialize_scalar")]
    id: String,
    #[serde(deserialize_with = "deserialize_scalar")]
    lat: String,
    #[serde(deserialize_with = "deserialize_scalar")]
    lon: String,
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    error: ApiError,
    #[serde(default)]
    points: Vec<Point>,
}

/// Non zero codes mean the request failed even though the HTTP status was fine
fn check_api_error(error: &ApiError, what: &str) -> Result<(), Error> {
    if error.code != 0 {
        return Err(Error::TransitApiError(
            error.code,
            format!("can not load {}: {}", what, error.msg),
        ));
    }
    Ok(())
}

fn parse_coordinate(lat: &str, lon: &str) -> Option<Coordinate> {
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    Coordinate::new(lat, lon).ok()
}

fn parse_vehicles(resp: BoardsResponse) -> Result<Vec<VehicleObservation>, Error> {
    check_api_error(&resp.error, "boards")?;
    let mut vehicles = Vec::with_capacity(resp.vehicles.len());
    for board in resp.vehicles {
        let coordinate = match parse_coordinate(&board.lat, &board.lon) {
            Some(c) => c,
            None => {
                warn!(
                    "skipping vehicle {} with invalid position: {},{}",
                    board.dev_id, board.lat, board.lon
                );
                continue;
            }
        };
        // an unknown course still shows the vehicle, pointing north
        let heading = match board.course.trim().parse::<f64>() {
            Ok(h) if h.is_finite() => h,
            _ => {
                warn!(
                    "vehicle {} has invalid course {:?}, using 0",
                    board.dev_id, board.course
                );
                0.0
            }
        };
        vehicles.push(VehicleObservation::new(coordinate, heading, board.route));
    }
    Ok(vehicles)
}

fn parse_routes(resp: RoutesResponse) -> Result<Vec<RoutePath>, Error> {
    check_api_error(&resp.error, "routes")?;
    Ok(resp
        .routes
        .into_iter()
        .map(|route| {
            let segments = route
                .elements
                .into_iter()
                .map(|element| Segment::new(element.full_path))
                .collect();
            RoutePath::new(route.num, segments)
        })
        .collect())
}

fn parse_points(resp: PointsResponse) -> Result<PointRegistry, Error> {
    check_api_error(&resp.error, "points")?;
    let mut registry = PointRegistry::with_capacity(resp.points.len());
    for point in resp.points {
        match parse_coordinate(&point.lat, &point.lon) {
            Some(c) => {
                registry.insert(point.id, c);
            }
            None => warn!(
                "skipping point {} with invalid position: {},{}",
                point.id, point.lat, point.lon
            ),
        }
    }
    Ok(registry)
}

/// Defines the connection parameters to request data from the ETTU API
#[derive(Clone, Debug, FromServiceConfig)]
pub struct Ettu {
    base_url: String,
    #[service_config(skip)]
    api_version: &'static str,
    vehicle_type: String,
    #[service_config(required)]
    api_key: String,
    timeout_secs: u64,
}

impl Ettu {
    pub fn new(api_key: String) -> Self {
        Ettu {
            api_key,
            ..Default::default()
        }
    }

    fn request_url(&self, data_type: &str) -> Result<Url, Box<dyn std::error::Error>> {
        Url::parse_with_params(
            &format!(
                "{}/api/{}/{}/{}/",
                self.base_url, self.api_version, self.vehicle_type, data_type
            ),
            &[("apiKey", self.api_key.as_str())],
        )
        .map_err(|e| e.into())
    }

    fn fetch<T: DeserializeOwned>(
        &self,
        data_type: &str,
        params: &[(&str, &str)],
    ) -> Result<T, Box<dyn std::error::Error>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;
        debug!("requesting {}/{} from ETTU", self.vehicle_type, data_type);
        let resp = client.get(self.request_url(data_type)?).query(params).send()?;
        if resp.status().is_success() {
            Ok(resp.json()?)
        } else {
            let code = resp.status();
            Err(Box::new(Error::RequestError(
                code,
                format!("can not load {}/{}", self.vehicle_type, data_type),
            )))
        }
    }
}

impl Default for Ettu {
    fn default() -> Self {
        Ettu {
            base_url: "http://map.ettu.ru".to_string(),
            api_version: "v2",
            vehicle_type: "tram".to_string(),
            api_key: String::new(),
            timeout_secs: 20,
        }
    }
}

impl TransitDataSource for Ettu {
    fn vehicle_positions(&self) -> Result<Vec<VehicleObservation>, Box<dyn std::error::Error>> {
        let resp: BoardsResponse = self.fetch("boards", &[("order", "1")])?;
        Ok(parse_vehicles(resp)?)
    }

    fn route_paths(&self) -> Result<Vec<RoutePath>, Box<dyn std::error::Error>> {
        let resp: RoutesResponse = self.fetch("routes", &[])?;
        Ok(parse_routes(resp)?)
    }

    fn point_registry(&self) -> Result<PointRegistry, Box<dyn std::error::Error>> {
        let resp: PointsResponse = self.fetch("points", &[])?;
        Ok(parse_points(resp)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_boards_skips_broken_positions_only() {
        let resp: BoardsResponse = serde_yaml::from_str(
            r#"{"error": {"code": 0, "msg": ""}, "vehicles": [
                {"DEV_ID": "1", "ROUTE": "32", "LAT": "56.8348", "LON": "60.6910", "COURSE": "270"},
                {"DEV_ID": "2", "ROUTE": 15, "LAT": 56.83, "LON": 60.61, "COURSE": 90},
                {"DEV_ID": "3", "ROUTE": "32", "LAT": "", "LON": "60.6", "COURSE": "0"},
                {"DEV_ID": "4", "ROUTE": "32", "LAT": "56.8", "LON": "60.6", "COURSE": "north"}
            ]}"#,
        )
        .unwrap();
        let vehicles = parse_vehicles(resp).unwrap();

        assert_eq!(vehicles.len(), 3);
        assert_eq!(vehicles[0].route_number(), "32");
        assert_eq!(vehicles[0].heading(), 270.0);
        assert_eq!(vehicles[0].coordinate(), Coordinate::new(56.8348, 60.6910).unwrap());
        assert_eq!(vehicles[1].route_number(), "15");
    }

    #[test]
    fn vehicle_with_unknown_course_points_north() {
        let resp: BoardsResponse = serde_yaml::from_str(
            r#"{"error": {"code": 0, "msg": ""}, "vehicles": [
                {"DEV_ID": "4", "ROUTE": "32", "LAT": "56.8", "LON": "60.6", "COURSE": "north"},
                {"DEV_ID": "5", "ROUTE": "32", "LAT": "56.9", "LON": "60.7", "COURSE": ""}
            ]}"#,
        )
        .unwrap();
        let vehicles = parse_vehicles(resp).unwrap();

        assert_eq!(vehicles.len(), 2);
        assert!(vehicles.iter().all(|v| v.heading() == 0.0));
        assert_eq!(vehicles[1].coordinate(), Coordinate::new(56.9, 60.7).unwrap());
    }

    #[test]
    fn parse_routes_accepts_numeric_waypoint_ids() {
        let resp: RoutesResponse = serde_yaml::from_str(
            r#"{"error": {"code": 0, "msg": ""}, "routes": [
                {"num": "32", "id": "1", "elements": [{"full_path": [10, "11", 12]}, {"full_path": []}]},
                {"num": 5, "elements": []}
            ]}"#,
        )
        .unwrap();
        let routes = parse_routes(resp).unwrap();

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].route_number(), "32");
        assert_eq!(routes[0].segments()[0].waypoint_ids(), &["10", "11", "12"]);
        assert!(routes[0].segments()[1].waypoint_ids().is_empty());
        assert_eq!(routes[1].route_number(), "5");
    }

    #[test]
    fn parse_points_into_registry() {
        let resp: PointsResponse = serde_yaml::from_str(
            r#"{"error": {"code": 0, "msg": ""}, "points": [
                {"ID": "10", "NAME": "Depot", "LAT": "56.83", "LON": "60.60"},
                {"ID": 11, "LAT": "999", "LON": "60.61"}
            ]}"#,
        )
        .unwrap();
        let points = parse_points(resp).unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points["10"], Coordinate::new(56.83, 60.60).unwrap());
    }

    #[test]
    fn api_error_code_is_reported() {
        let resp: PointsResponse =
            serde_yaml::from_str(r#"{"error": {"code": 3, "msg": "bad key"}}"#).unwrap();
        match parse_points(resp) {
            Err(Error::TransitApiError(code, msg)) => {
                assert_eq!(code, 3);
                assert!(msg.contains("bad key"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn request_url_carries_api_key() {
        let ettu = Ettu::new("k3y".to_string());
        assert_eq!(
            ettu.request_url("boards").unwrap().as_str(),
            "http://map.ettu.ru/api/v2/tram/boards/?apiKey=k3y"
        );
    }
}
