//! Command line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FoodieTour - weather-aware food tours with maps and exports
#[derive(Parser, Debug)]
#[command(name = "foodietour", about, version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Force debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web planner
    Serve {
        /// Port to listen on, overrides the configured one
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Plan tours and write JSON, PDF and HTML files for each city
    Plan {
        /// Comma-separated city names
        cities: String,

        /// Dietary preferences, e.g. Vegan or Gluten-Free
        #[arg(short, long, value_delimiter = ',')]
        prefs: Vec<String>,

        /// Skip the surprise stop
        #[arg(long)]
        no_surprise: bool,

        /// Directory for the generated files
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}
