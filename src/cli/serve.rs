//! Define the serve subcommand
use crate::bot::RouteMapBot;
use crate::config::Config;
use crate::mapper::RouteMapper;
use crate::repository::RouteRepository;
use log::info;
use structopt::StructOpt;

/// Run the bot, polling Telegram for messages and inline queries
#[derive(Debug, StructOpt)]
pub struct ServeOpts {}

pub fn serve_command(config: Config, _opts: ServeOpts) -> Result<(), Box<dyn std::error::Error>> {
    // an unusable map provider must stop us before anything is fetched
    let renderer = config.get_map_rendering_handler()?;
    let transit = config.get_transit_data_handler()?;
    let telegram = config.get_messaging_handler()?;

    let repository = RouteRepository::load(transit.as_ref())?;
    info!(
        "Loaded {} routes, rendering maps with {}",
        repository.known_route_numbers().len(),
        renderer.name()
    );

    let mapper = RouteMapper::new(&repository, renderer.as_ref(), config.default_view());
    let bot = RouteMapBot::new(telegram, transit.as_ref(), mapper)?;
    bot.run()
}
