//! Access live vehicle positions and route topology from a transit data provider
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::map::VehicleObservation;
use crate::repository::{PointRegistry, RoutePath};
use crate::Error;
mod ettu;
pub use ettu::Ettu;

/// trait that defines the data the bot needs from a transit provider
pub trait TransitDataSource {
    /// Current positions of every vehicle on the network, fetched fresh on every call
    fn vehicle_positions(&self) -> Result<Vec<VehicleObservation>, Box<dyn std::error::Error>>;

    /// Paths of every route, one entry per direction
    fn route_paths(&self) -> Result<Vec<RoutePath>, Box<dyn std::error::Error>>;

    /// Coordinates of every stop and waypoint referenced by the route paths
    fn point_registry(&self) -> Result<PointRegistry, Box<dyn std::error::Error>>;
}

pub fn new_transit_data_handler(
    config: &ServiceConfig,
) -> Result<Box<dyn TransitDataSource>, Error> {
    match config.handler() {
        "ettu" => Ok(Box::new(Ettu::from_config(config)?)),
        _ => Err(Error::UnknownServiceHandler(format!(
            "no transit data handler exists for: {}",
            config.handler()
        ))),
    }
}
