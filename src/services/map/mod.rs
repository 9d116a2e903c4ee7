//! Turn a map render request into an image URL of a static map provider
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::map::MapRenderRequest;
use crate::Error;
mod mapbox;
mod mapquest;
pub use mapbox::{MapBox, PathOverlay, Position, StaticImageRequest};
pub use mapquest::MapQuest;

/// trait that defines how to encode a map render request for a static map provider
pub trait MapRenderingService {
    /// Name of the provider, used for logging
    fn name(&self) -> &'static str;

    /// Build the URL of the rendered image. No request is made, the URL is fetched later
    /// by whoever delivers the image.
    fn render(&self, request: &MapRenderRequest) -> Result<String, Error>;
}

/// Create the map backend named by the config handler, this is done once at startup and an
/// unknown provider name is a fatal error.
pub fn new_map_rendering_handler(
    config: &ServiceConfig,
) -> Result<Box<dyn MapRenderingService>, Error> {
    match config.handler().to_ascii_lowercase().as_str() {
        "mapquest" | "query" => Ok(Box::new(MapQuest::from_config(config)?)),
        "mapbox" | "overlay" => Ok(Box::new(MapBox::from_config(config)?)),
        _ => Err(Error::UnknownProviderError(config.handler().to_string())),
    }
}
