//! Define the application's command line interface
use crate::config::Config;
use simplelog::LevelFilter;
use std::path::PathBuf;
use structopt::StructOpt;

mod render;
use render::{render_command, RenderOpts};
mod routes;
use routes::{routes_command, RoutesOpts};
mod serve;
use serve::{serve_command, ServeOpts};

/// Telegram bot that draws live tram positions on a map of their route
#[derive(Debug, StructOpt)]
#[structopt(name = "tram-map-bot")]
pub struct Cli {
    /// Set logging level to debug, use a second time (e.g. -vv) to set logging to trace
    #[structopt(short, long, parse(from_occurrences))]
    verbose: i32,
    /// Suppress info logging messages use a second time (e.g. -qq) to hide warnings
    #[structopt(short, long, parse(from_occurrences))]
    quiet: i32,
    /// Configuration file to use instead of the one in the user's config directory
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    cmd: Command,
}

impl Cli {
    /// Return the verbose flag counts as a log level filter
    pub fn verbosity(&self, default: LevelFilter) -> LevelFilter {
        if self.quiet == 1 {
            LevelFilter::Warn
        } else if self.quiet > 1 {
            LevelFilter::Error
        } else if self.verbose == 1 {
            LevelFilter::Debug
        } else if self.verbose > 1 {
            LevelFilter::Trace
        } else {
            default
        }
    }

    /// Path of the configuration file to load
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Consume options struct and return the result of subcommand execution
    pub fn execute_subcommand(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        self.cmd.execute(config)
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Run the Telegram bot until interrupted
    #[structopt(name = "serve")]
    Serve(ServeOpts),
    /// List the route numbers known to the transit data provider
    #[structopt(name = "routes")]
    Routes(RoutesOpts),
    /// Print the map URL of a route with its vehicles' current positions
    #[structopt(name = "render")]
    Render(RenderOpts),
}

impl Command {
    /// Consume enum variant and return the result of the command's execution
    fn execute(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Command::Serve(opts) => serve_command(config, opts),
            Command::Routes(opts) => routes_command(config, opts),
            Command::Render(opts) => render_command(config, opts),
        }
    }
}
