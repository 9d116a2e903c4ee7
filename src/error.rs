//! Defines the general error type for the crate and various conversions into it
use std::convert;
use std::fmt;

/// General error type for the crate
#[derive(Debug)]
pub enum Error {
    EmptyInputError,
    InvalidConfigurationValue(String),
    InvalidCoordinateError(f64, f64),
    InvalidImageSizeError(u32, u32),
    Io(std::io::Error),
    MissingConfigurationValue(String),
    Other(String),
    RequestError(reqwest::StatusCode, String),
    Reqwest(reqwest::Error),
    SerdeYaml(serde_yaml::Error),
    TelegramApiError(String),
    TransitApiError(i64, String),
    UnknownProviderError(String),
    /// Requested route number along with every route number that is known
    UnknownRouteError(String, Vec<String>),
    UnknownServiceHandler(String),
}

impl convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl convert::From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        Error::Reqwest(err)
    }
}

impl convert::From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::SerdeYaml(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInputError => {
                write!(f, "Cannot compute a bounding box without any points")
            }
            Error::InvalidConfigurationValue(msg) => write!(f, "{}", msg),
            Error::InvalidCoordinateError(lat, lon) => write!(
                f,
                "Coordinate out of range: latitude={}, longitude={}",
                lat, lon
            ),
            Error::InvalidImageSizeError(width, height) => write!(
                f,
                "Image dimensions must be positive, got {}x{}",
                width, height
            ),
            Error::Io(e) => write!(f, "{}", e),
            Error::MissingConfigurationValue(key) => {
                write!(f, "missing required configuration value: {}", key)
            }
            Error::Other(msg) => write!(f, "{}", msg),
            Error::RequestError(code, msg) => {
                write!(f, "Request failed with code: {} - {}", code, msg)
            }
            Error::Reqwest(e) => write!(f, "{}", e),
            Error::SerdeYaml(e) => write!(f, "{}", e),
            Error::TelegramApiError(msg) => write!(f, "Telegram API error: {}", msg),
            Error::TransitApiError(code, msg) => {
                write!(f, "Transit API returned error {}: {}", code, msg)
            }
            Error::UnknownProviderError(name) => write!(
                f,
                "Unknown map provider '{}', expected one of: mapquest, mapbox",
                name
            ),
            Error::UnknownRouteError(route, known) => write!(
                f,
                "Route {} not found. Allowed routes: {}",
                route,
                known.join(", ")
            ),
            Error::UnknownServiceHandler(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}
