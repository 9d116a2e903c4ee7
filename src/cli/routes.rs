//! Define the routes subcommand
use crate::config::Config;
use crate::repository::RouteRepository;
use structopt::StructOpt;

/// Print the route numbers known to the transit data provider
#[derive(Debug, StructOpt)]
pub struct RoutesOpts {
    /// Print every route number on its own line
    #[structopt(short, long)]
    lines: bool,
}

pub fn routes_command(config: Config, opts: RoutesOpts) -> Result<(), Box<dyn std::error::Error>> {
    let transit = config.get_transit_data_handler()?;
    let repository = RouteRepository::load(transit.as_ref())?;

    let routes = repository.known_route_numbers();
    if opts.lines {
        for route in routes {
            println!("{}", route);
        }
    } else {
        println!("{}", routes.join(", "));
    }
    Ok(())
}
