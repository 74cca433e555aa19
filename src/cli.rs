//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `fleetwatch.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Fleet registry maintenance monitor.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// CSV file used to seed the fleet.
    #[arg(long, value_name = "FILE")]
    pub fleet_file: Option<PathBuf>,

    /// Interval between maintenance scans in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub scan_interval: Option<u64>,

    /// Address that receives operator notifications.
    #[arg(long, value_name = "EMAIL")]
    pub operator_address: Option<String>,

    /// Run a single maintenance scan and exit.
    #[arg(long)]
    pub scan_once: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut store = Dict::new();
        if let Some(path) = &self.fleet_file {
            store.insert(
                "fleet_file".into(),
                Value::from(path.to_string_lossy().to_string()),
            );
        }

        let mut maintenance = Dict::new();
        if let Some(seconds) = self.scan_interval {
            maintenance.insert("scan_interval_seconds".into(), Value::from(seconds));
        }

        let mut notification = Dict::new();
        if let Some(address) = &self.operator_address {
            notification.insert("operator_address".into(), Value::from(address.clone()));
        }

        let mut dict = Dict::new();
        for (key, section) in [
            ("store", store),
            ("maintenance", maintenance),
            ("notification", notification),
        ] {
            if !section.is_empty() {
                dict.insert(key.into(), Value::from(section));
            }
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
