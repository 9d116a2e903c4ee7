use log::{error, trace};
use simplelog::{Config as LogConfig, TermLogger, TerminalMode};
use std::fs::File;
use structopt::StructOpt;
use tram_map_bot::cli::Cli;
use tram_map_bot::config::Config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Cli::from_args();

    // the log level lives in the config file so the logger can only start once it is read
    let config_path = opt.config_path();
    let config = match File::open(&config_path) {
        Ok(mut fp) => Config::load(&mut fp)?,
        Err(e) => {
            eprintln!("Could not open config file {:?}: {}", config_path, e);
            return Err(Box::new(e));
        }
    };
    TermLogger::init(
        opt.verbosity(config.log_level()),
        LogConfig::default(),
        TerminalMode::Mixed,
    )?;
    trace!("Loaded configuration from {:?}", config_path);

    // execute the requested subcommand
    if let Err(e) = opt.execute_subcommand(config) {
        error!("{}", e);
        return Err(e);
    }
    Ok(())
}
