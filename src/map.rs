//! Provider agnostic description of a map image to render
use crate::geo::{bounding_box, BoundingBox, Coordinate};
use crate::Error;
use log::debug;
use serde::Deserialize;
use std::convert::TryFrom;

/// Size used for images sent to a chat
pub const FULL_SIZE: u32 = 1024;
/// Size used for inline query previews
pub const THUMBNAIL_SIZE: u32 = 256;

/// A single live position report of a vehicle
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleObservation {
    coordinate: Coordinate,
    /// course in degrees as reported by the vehicle
    heading: f64,
    route_number: String,
}

impl VehicleObservation {
    pub fn new(coordinate: Coordinate, heading: f64, route_number: String) -> Self {
        VehicleObservation {
            coordinate,
            heading,
            route_number,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn route_number(&self) -> &str {
        &self.route_number
    }
}

/// Vehicle position and heading drawn on the map
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    coordinate: Coordinate,
    heading: f64,
}

impl Marker {
    pub fn new(coordinate: Coordinate, heading: f64) -> Self {
        Marker {
            coordinate,
            heading,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Point `distance` meters away along the course glyph direction, `heading + 90`
    pub fn course_point(&self, distance: f64) -> Coordinate {
        self.coordinate.project(self.heading + 90.0, distance)
    }

    /// Project a glyph given as `(distance, angle)` pairs where each angle is relative to
    /// the course glyph direction
    pub fn rosette(&self, shape: &[(f64, f64)]) -> Vec<Coordinate> {
        shape
            .iter()
            .map(|&(distance, angle)| {
                self.coordinate
                    .project(self.heading + 90.0 + angle, distance)
            })
            .collect()
    }
}

/// Center and zoom level used when there is nothing to fit the image to
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawViewport")]
pub struct Viewport {
    center: Coordinate,
    zoom: u8,
}

impl Viewport {
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        Viewport { center, zoom }
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }
}

impl Default for Viewport {
    fn default() -> Self {
        // Yekaterinburg city centre
        Viewport {
            center: Coordinate::from_trusted(56.8389, 60.6057),
            zoom: 12,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawViewport {
    latitude: f64,
    longitude: f64,
    zoom: u8,
}

impl TryFrom<RawViewport> for Viewport {
    type Error = Error;

    fn try_from(raw: RawViewport) -> Result<Self, Self::Error> {
        Ok(Viewport::new(
            Coordinate::new(raw.latitude, raw.longitude)?,
            raw.zoom,
        ))
    }
}

/// Visible area of the image
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Frame {
    /// Fit the image to the box around the route
    Bounds(BoundingBox),
    /// Nothing to fit to, use a fixed view
    Centered(Viewport),
}

/// Dimensions of the requested image in pixels, both are positive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    width: u32,
    height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidImageSizeError(width, height));
        }
        Ok(ImageSize { width, height })
    }

    pub fn full() -> Self {
        ImageSize {
            width: FULL_SIZE,
            height: FULL_SIZE,
        }
    }

    pub fn thumbnail() -> Self {
        ImageSize {
            width: THUMBNAIL_SIZE,
            height: THUMBNAIL_SIZE,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Markers, route polylines and framing for one route, computed once per request and then
/// rendered at as many sizes as needed
#[derive(Clone, Debug, PartialEq)]
pub struct MapGeometry {
    label: String,
    markers: Vec<Marker>,
    polylines: Vec<Vec<Coordinate>>,
    frame: Frame,
}

impl MapGeometry {
    /// Build the geometry of `route_number` from the live vehicle positions and the
    /// resolved route polylines. Vehicles serving other routes are ignored.
    pub fn assemble(
        route_number: &str,
        vehicles: &[VehicleObservation],
        polylines: Vec<Vec<Coordinate>>,
        fallback: Viewport,
    ) -> Self {
        let markers: Vec<Marker> = vehicles
            .iter()
            .filter(|v| v.route_number() == route_number)
            .map(|v| Marker::new(v.coordinate(), v.heading()))
            .collect();

        // the frame only follows the route itself, vehicles sit on it anyway
        let frame = match bounding_box(polylines.iter().flatten()) {
            Ok(bbox) => Frame::Bounds(bbox),
            Err(_) => {
                debug!(
                    "route {} has no polyline points, using the default view",
                    route_number
                );
                Frame::Centered(fallback)
            }
        };

        MapGeometry {
            label: route_number.to_string(),
            markers,
            polylines,
            frame,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn polylines(&self) -> &[Vec<Coordinate>] {
        &self.polylines
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Request an image of this geometry at the given size
    pub fn request(&self, size: ImageSize) -> MapRenderRequest<'_> {
        MapRenderRequest {
            geometry: self,
            size,
        }
    }
}

/// Everything a map backend needs to produce one image URL
#[derive(Clone, Copy, Debug)]
pub struct MapRenderRequest<'a> {
    geometry: &'a MapGeometry,
    size: ImageSize,
}

impl<'a> MapRenderRequest<'a> {
    pub fn label(&self) -> &'a str {
        self.geometry.label()
    }

    pub fn markers(&self) -> &'a [Marker] {
        self.geometry.markers()
    }

    pub fn polylines(&self) -> &'a [Vec<Coordinate>] {
        self.geometry.polylines()
    }

    pub fn frame(&self) -> &'a Frame {
        self.geometry.frame()
    }

    pub fn width(&self) -> u32 {
        self.size.width()
    }

    pub fn height(&self) -> u32 {
        self.size.height()
    }
}
