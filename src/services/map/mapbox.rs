//! Encode map images for the MapBox static images API using path overlays
use super::MapRenderingService;
use crate::config::FromServiceConfig;
use crate::geo::{encode_coordinates, Coordinate};
use crate::map::{Frame, MapRenderRequest, Viewport};
use crate::Error;
use log::warn;
use std::fmt;

const OWNER: &str = "mapbox";
const STYLE: &str = "streets-v12";

const ROUTE_STROKE_WIDTH: u32 = 1;
const ROUTE_STROKE_COLOR: &str = "f00";

const MARKER_STROKE_WIDTH: u32 = 2;
const MARKER_STROKE_COLOR: &str = "000";
const MARKER_STROKE_OPACITY: f32 = 1.0;
const MARKER_FILL_COLOR: &str = "fc6100";
const MARKER_FILL_OPACITY: f32 = 1.0;

/// Vehicle glyph as (distance in meters, angle in degrees) relative to the course direction
const MARKER_SHAPE: [(f64, f64); 5] = [
    (75.0, 0.0),
    (50.0, 45.0),
    (50.0, 135.0),
    (50.0, -135.0),
    (50.0, -45.0),
];

/// mapbox rejects URLs longer than this
const MAX_URL_LENGTH: usize = 8192;

/// Percent encode a single URL path component
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// A line or polygon drawn over the map
#[derive(Clone, Debug, PartialEq)]
pub struct PathOverlay {
    coordinates: Vec<Coordinate>,
    stroke_width: u32,
    stroke_color: &'static str,
    stroke_opacity: Option<f32>,
    fill_color: Option<&'static str>,
    fill_opacity: Option<f32>,
}

impl PathOverlay {
    fn route(coordinates: Vec<Coordinate>) -> Self {
        PathOverlay {
            coordinates,
            stroke_width: ROUTE_STROKE_WIDTH,
            stroke_color: ROUTE_STROKE_COLOR,
            stroke_opacity: None,
            fill_color: None,
            fill_opacity: None,
        }
    }

    fn vehicle(coordinates: Vec<Coordinate>) -> Self {
        PathOverlay {
            coordinates,
            stroke_width: MARKER_STROKE_WIDTH,
            stroke_color: MARKER_STROKE_COLOR,
            stroke_opacity: Some(MARKER_STROKE_OPACITY),
            fill_color: Some(MARKER_FILL_COLOR),
            fill_opacity: Some(MARKER_FILL_OPACITY),
        }
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    pub fn stroke_color(&self) -> &str {
        self.stroke_color
    }

    pub fn fill_color(&self) -> Option<&str> {
        self.fill_color
    }

    /// Encode as `path-{width}+{color}[-{opacity}][+{fill}[-{opacity}]]({polyline})`
    fn encode(&self) -> Result<String, Error> {
        let mut result = format!("path-{}+{}", self.stroke_width, self.stroke_color);
        if let Some(opacity) = self.stroke_opacity {
            result += &format!("-{}", opacity);
        }
        if let Some(color) = self.fill_color {
            result += &format!("+{}", color);
        }
        if let Some(opacity) = self.fill_opacity {
            result += &format!("-{}", opacity);
        }
        let polyline = encode_coordinates(&self.coordinates).map_err(Error::Other)?;
        result += &format!("({})", encode_component(&polyline));
        Ok(result)
    }
}

/// Where the map is centered
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Position {
    /// Let the provider fit the image to the overlays
    Auto,
    Center(Viewport),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Auto => write!(f, "auto"),
            Position::Center(view) => write!(
                f,
                "{},{},{}",
                view.center().longitude(),
                view.center().latitude(),
                view.zoom()
            ),
        }
    }
}

/// A fully described static image, turned into a signed URL with `url`
#[derive(Clone, Debug, PartialEq)]
pub struct StaticImageRequest {
    owner: &'static str,
    style: &'static str,
    overlays: Vec<PathOverlay>,
    position: Position,
    width: u32,
    height: u32,
    high_res: bool,
}

impl StaticImageRequest {
    pub fn overlays(&self) -> &[PathOverlay] {
        &self.overlays
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn url(&self, base_url: &str, access_token: &str) -> Result<String, Error> {
        let overlays = self
            .overlays
            .iter()
            .map(PathOverlay::encode)
            .collect::<Result<Vec<String>, Error>>()?
            .join(",");

        let mut url = format!(
            "{}/styles/v1/{}/{}/static/",
            base_url, self.owner, self.style
        );
        if !overlays.is_empty() {
            url += &overlays;
            url.push('/');
        }
        url += &format!(
            "{}/{}x{}{}",
            self.position,
            self.width,
            self.height,
            if self.high_res { "@2x" } else { "" }
        );

        // the access_token=[..] part in the query takes up around 100 bytes by itself
        if url.len() > MAX_URL_LENGTH {
            warn!(
                "URL length exceeds 8KB due to a long route, request may fail (size={:.2}KB).",
                url.len() as f32 / 1024.0
            );
        }

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("access_token", access_token)
            .finish();
        Ok(format!("{}?{}", url, query))
    }
}

/// Defines parameters to interact with the MapBox API
#[derive(Debug, FromServiceConfig)]
pub struct MapBox {
    base_url: String,
    #[service_config(required)]
    access_token: String,
}

impl MapBox {
    pub fn new(access_token: String) -> Self {
        MapBox {
            access_token,
            ..Default::default()
        }
    }

    /// Route paths are drawn first so vehicle glyphs end up on top of them
    pub fn build_request(&self, request: &MapRenderRequest) -> StaticImageRequest {
        let mut overlays: Vec<PathOverlay> = request
            .polylines()
            .iter()
            .map(|p| PathOverlay::route(p.clone()))
            .collect();
        overlays.extend(
            request
                .markers()
                .iter()
                .map(|m| PathOverlay::vehicle(m.rosette(&MARKER_SHAPE))),
        );

        let position = match request.frame() {
            Frame::Centered(view) if overlays.is_empty() => Position::Center(*view),
            _ => Position::Auto,
        };

        StaticImageRequest {
            owner: OWNER,
            style: STYLE,
            overlays,
            position,
            width: request.width(),
            height: request.height(),
            high_res: true,
        }
    }
}

impl Default for MapBox {
    fn default() -> Self {
        MapBox {
            base_url: "https://api.mapbox.com".to_string(),
            access_token: String::new(),
        }
    }
}

impl MapRenderingService for MapBox {
    fn name(&self) -> &'static str {
        "MapBox"
    }

    fn render(&self, request: &MapRenderRequest) -> Result<String, Error> {
        self.build_request(request)
            .url(&self.base_url, &self.access_token)
    }
}
