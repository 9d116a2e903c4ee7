//! Module with geodesy helpers and coordinate structures
use crate::Error;
use std::char;

/// Mean earth radius in meters, the earth is treated as a sphere
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Stores a single geospatial point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    /// latitude coordinate in degrees
    latitude: f64,
    /// longitude coordinate in degrees
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate from degrees, latitude must be within [-90, 90] and longitude
    /// within [-180, 180]
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, Error> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinateError(latitude, longitude));
        }
        Ok(Coordinate {
            latitude,
            longitude,
        })
    }

    /// Build a coordinate from constants known to be in range
    pub(crate) const fn from_trusted(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// Return latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Return longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Destination reached by travelling `distance` meters along the great circle that
    /// starts at this coordinate with the given `bearing` (degrees clockwise from north)
    pub fn project(&self, bearing: f64, distance: f64) -> Coordinate {
        let delta = distance / EARTH_RADIUS;
        let theta = bearing.to_radians();
        let phi1 = self.latitude.to_radians();
        let lambda1 = self.longitude.to_radians();

        let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
        let lambda2 = lambda1
            + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

        Coordinate {
            latitude: phi2.to_degrees(),
            longitude: normalize_longitude(lambda2.to_degrees()),
        }
    }

    /// Great circle distance in meters using the haversine formula
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_phi = (other.latitude - self.latitude).to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Initial bearing in degrees [0, 360) of the great circle towards `other`
    pub fn bearing_to(&self, other: &Coordinate) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let y = d_lambda.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

/// Wrap a longitude in degrees into [-180, 180)
fn normalize_longitude(longitude: f64) -> f64 {
    (longitude + 540.0).rem_euclid(360.0) - 180.0
}

/// Destination reached from `origin` travelling `distance_meters` along `bearing_degrees`
pub fn project(origin: Coordinate, bearing_degrees: f64, distance_meters: f64) -> Coordinate {
    origin.project(bearing_degrees, distance_meters)
}

/// Axis aligned rectangle in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    north: f64,
    south: f64,
    west: f64,
    east: f64,
}

impl BoundingBox {
    /// Maximum latitude
    pub fn north(&self) -> f64 {
        self.north
    }

    /// Minimum latitude
    pub fn south(&self) -> f64 {
        self.south
    }

    /// Minimum longitude
    pub fn west(&self) -> f64 {
        self.west
    }

    /// Maximum longitude
    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.south..=self.north).contains(&coordinate.latitude())
            && (self.west..=self.east).contains(&coordinate.longitude())
    }
}

/// Compute the tightest box containing every point, fails with `EmptyInputError` when there
/// are no points at all.
pub fn bounding_box<'a, I>(points: I) -> Result<BoundingBox, Error>
where
    I: IntoIterator<Item = &'a Coordinate>,
{
    let mut points = points.into_iter();
    let first = points.next().ok_or(Error::EmptyInputError)?;
    let init = BoundingBox {
        north: first.latitude(),
        south: first.latitude(),
        west: first.longitude(),
        east: first.longitude(),
    };
    Ok(points.fold(init, |bbox, p| BoundingBox {
        north: bbox.north.max(p.latitude()),
        south: bbox.south.min(p.latitude()),
        west: bbox.west.min(p.longitude()),
        east: bbox.east.max(p.longitude()),
    }))
}

/// Encodes a slice of coordinates into Google Encoded Polyline format.
///
/// This code was extracted and simplified for our use case from:
/// https://github.com/georust/polyline
/// https://developers.google.com/maps/documentation/utilities/polylinealgorithm
pub fn encode_coordinates(coordinates: &[Coordinate]) -> Result<String, String> {
    let mut output = String::new();
    let mut b = (0, 0);

    for a in coordinates {
        let a = (scale(a.latitude), scale(a.longitude));
        output.push_str(&encode(a.0, b.0)?);
        output.push_str(&encode(a.1, b.1)?);
        b = a;
    }

    Ok(output)
}

/// Scale a floating point value into an integer at the given precision
#[inline]
fn scale(n: f64) -> i64 {
    static FACTOR: f64 = 100_000.0; // use 5 digits of precision
    (FACTOR * n).round() as i64
}

/// Encode a single latitude or longitude value into the polyline format
fn encode(current: i64, previous: i64) -> Result<String, String> {
    let mut coordinate = (current - previous) << 1;
    if (current - previous) < 0 {
        coordinate = !coordinate;
    }
    let mut output = String::new();
    while coordinate >= 0x20 {
        let from_char = char::from_u32(((0x20 | (coordinate & 0x1f)) + 63) as u32)
            .ok_or("Couldn't convert character")?;
        output.push(from_char);
        coordinate >>= 5;
    }
    let from_char = char::from_u32((coordinate + 63) as u32).ok_or("Couldn't convert character")?;
    output.push(from_char);
    Ok(output)
}
