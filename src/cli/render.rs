//! Define the render subcommand
use crate::config::Config;
use crate::map::{ImageSize, FULL_SIZE};
use crate::mapper::RouteMapper;
use crate::repository::RouteRepository;
use crate::Error;
use log::info;
use structopt::StructOpt;

/// Print the URL of a route map showing where its vehicles are right now
#[derive(Debug, StructOpt)]
pub struct RenderOpts {
    /// Route number to draw (use the routes command to list them)
    #[structopt(name = "ROUTE")]
    route: String,
    /// Image width in pixels
    #[structopt(long, default_value = "1024")]
    width: u32,
    /// Image height in pixels
    #[structopt(long, default_value = "1024")]
    height: u32,
}

impl RenderOpts {
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn size(&self) -> Result<ImageSize, Error> {
        ImageSize::new(self.width, self.height)
    }
}

pub fn render_command(config: Config, opts: RenderOpts) -> Result<(), Box<dyn std::error::Error>> {
    let size = opts.size()?;
    // an unusable map provider must stop us before anything is fetched
    let renderer = config.get_map_rendering_handler()?;
    let transit = config.get_transit_data_handler()?;
    let repository = RouteRepository::load(transit.as_ref())?;

    let mapper = RouteMapper::new(&repository, renderer.as_ref(), config.default_view());
    mapper.check_route(opts.route())?;
    let vehicles = transit.vehicle_positions()?;
    let geometry = mapper.geometry(opts.route(), &vehicles)?;
    if size.width() > FULL_SIZE || size.height() > FULL_SIZE {
        info!("Requested size is larger than what the bot sends ({0}x{0})", FULL_SIZE);
    }
    println!("{}", mapper.render(&geometry, size)?);
    Ok(())
}
