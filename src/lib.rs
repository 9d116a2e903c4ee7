pub mod bot;
pub mod cli;
pub mod config;
mod error;
pub mod geo;
pub mod i18n;
pub mod map;
pub mod mapper;
pub mod repository;
pub mod services;

pub use error::Error;
pub use geo::{bounding_box, project, BoundingBox, Coordinate};
pub use map::{ImageSize, MapGeometry, MapRenderRequest, VehicleObservation};
pub use mapper::{MapUrls, RouteMapper};
pub use repository::RouteRepository;
