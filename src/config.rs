//! Store application configuration that gets read from disk
use crate::map::Viewport;
use crate::services::{
    new_map_rendering_handler, new_transit_data_handler, MapRenderingService,
    TelegramClient, TransitDataSource,
};
use crate::Error;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use simplelog::LevelFilter;
use std::collections::HashMap;
use std::io::prelude::*;
use std::iter::Iterator;
use std::path::PathBuf;
use std::str::FromStr;

pub use tram_map_bot_derive::FromServiceConfig;

static CONFIG_DIR_NAME: &str = "tram-map-bot";
static CONFIG_FILE_NAME: &str = "config.yml";

/// Defines the allowed keys under the services map
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    MapRendering,
    Messaging,
    TransitData,
}

/// Type alias for clarity
pub type ServiceParameters = HashMap<String, Value>;

/// Configuration options for a single service of any type
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    handler: String,
    #[serde(default)]
    configuration: ServiceParameters,
}

/// Build a service handler from the parameters defined in its config section
pub trait FromServiceConfig: Sized {
    fn from_config(config: &ServiceConfig) -> Result<Self, Error>;
}

impl ServiceConfig {
    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn parameters(&self) -> impl Iterator<Item = &String> + '_ {
        self.configuration.keys()
    }

    pub fn get_parameter(&self, key: &str) -> Option<&Value> {
        self.configuration.get(key)
    }

    pub fn get_parameter_as_string(&self, key: &str) -> Option<Result<String, Error>> {
        self.configuration.get(key).map(|value| {
            value
                .as_str()
                .ok_or_else(|| {
                    Error::InvalidConfigurationValue(format!(
                        "invalid value for {}.{}, expected a string: {:?}",
                        &self.handler, key, value
                    ))
                })
                .map(|v| v.to_string())
        })
    }

    pub fn get_parameter_as_i64(&self, key: &str) -> Option<Result<i64, Error>> {
        self.configuration.get(key).map(|value| {
            value.as_i64().ok_or_else(|| {
                Error::InvalidConfigurationValue(format!(
                    "invalid value for {}.{}, expected an integer: {:?}",
                    &self.handler, key, value
                ))
            })
        })
    }

    pub fn get_parameter_as_f64(&self, key: &str) -> Option<Result<f64, Error>> {
        self.configuration.get(key).map(|value| {
            value.as_f64().ok_or_else(|| {
                Error::InvalidConfigurationValue(format!(
                    "invalid value for {}.{}, expected a floating point value: {:?}",
                    &self.handler, key, value
                ))
            })
        })
    }
}

/// Configuration struct that we can create from the config file used
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(
        deserialize_with = "deserialize_level_filter",
        default = "default_level_filter"
    )]
    log_level: LevelFilter,
    #[serde(default)]
    default_view: Viewport,
    services: HashMap<ServiceType, ServiceConfig>,
}

impl Config {
    pub fn load<T: Read>(source: &mut T) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(source)
    }

    /// Location of the config file when one isn't given on the command line
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    /// View used when a route has nothing to frame the image around
    pub fn default_view(&self) -> Viewport {
        self.default_view
    }

    fn service(&self, service: ServiceType, name: &str) -> Result<&ServiceConfig, Error> {
        self.services.get(&service).ok_or_else(|| {
            Error::UnknownServiceHandler(format!(
                "no service configuration defined for {}",
                name
            ))
        })
    }

    pub fn get_map_rendering_handler(&self) -> Result<Box<dyn MapRenderingService>, Error> {
        new_map_rendering_handler(self.service(ServiceType::MapRendering, "map rendering")?)
    }

    pub fn get_transit_data_handler(&self) -> Result<Box<dyn TransitDataSource>, Error> {
        new_transit_data_handler(self.service(ServiceType::TransitData, "transit data")?)
    }

    pub fn get_messaging_handler(&self) -> Result<TelegramClient, Error> {
        let cfg = self.service(ServiceType::Messaging, "messaging")?;
        match cfg.handler() {
            "telegram" => TelegramClient::from_config(cfg),
            _ => Err(Error::UnknownServiceHandler(format!(
                "no messaging handler exists for: {}",
                cfg.handler()
            ))),
        }
    }
}

fn deserialize_level_filter<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let buf = String::deserialize(deserializer)?;
    LevelFilter::from_str(&buf)
        .map_err(|_| serde::de::Error::custom(format!("invalid level value: {}", buf)))
}

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE: &str = r#"
log_level: debug
default_view:
  latitude: 55.75
  longitude: 37.61
  zoom: 10
services:
  map_rendering:
    handler: mapquest
    configuration:
      key: secret
  transit_data:
    handler: ettu
    configuration:
      api_key: ettu-key
  messaging:
    handler: telegram
    configuration:
      bot_token: "123:abc"
"#;

    #[test]
    fn load_full_config() {
        let config = Config::load(&mut SAMPLE.as_bytes()).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Debug);
        assert_eq!(config.default_view().zoom(), 10);
        assert_eq!(config.default_view().center().latitude(), 55.75);
        assert!(config.get_map_rendering_handler().is_ok());
        assert!(config.get_transit_data_handler().is_ok());
        assert!(config.get_messaging_handler().is_ok());
    }

    #[test]
    fn defaults_apply_to_optional_sections() {
        let config = Config::load(&mut "services: {}".as_bytes()).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Info);
        assert_eq!(config.default_view(), Viewport::default());
        assert!(matches!(
            config.get_map_rendering_handler(),
            Err(Error::UnknownServiceHandler(_))
        ));
    }

    #[test]
    fn default_view_out_of_range_is_rejected() {
        let source = "default_view: {latitude: 95.0, longitude: 0.0, zoom: 3}\nservices: {}";
        assert!(Config::load(&mut source.as_bytes()).is_err());
    }

    #[test]
    fn parameters_are_type_checked() {
        let cfg: ServiceConfig =
            serde_yaml::from_str("handler: x\nconfiguration: {name: 5, size: abc}").unwrap();
        assert!(cfg.get_parameter_as_string("name").unwrap().is_err());
        assert!(cfg.get_parameter_as_i64("size").unwrap().is_err());
        assert!(cfg.get_parameter_as_f64("name").unwrap().is_ok());
        assert!(cfg.get_parameter_as_string("missing").is_none());
    }
}
