//! Configuration management for FleetWatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer defaults, a `fleetwatch.toml` file, environment variables
//! and command-line arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The default configuration file, used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "fleetwatch.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for notification composition and delivery.
    pub notification: NotificationConfig,
    /// Configuration for the maintenance scan.
    pub maintenance: MaintenanceConfig,
    /// Configuration for the vehicle store.
    pub store: StoreConfig,
}

/// Configuration for notification composition and delivery.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NotificationConfig {
    /// Recipient of update, deletion, maintenance and report notices.
    pub operator_address: String,
    /// Location of the image embedded in vehicle notices.
    pub inline_image_resource: String,
    /// Content id the HTML body uses to reference the inline image.
    pub inline_image_content_id: String,
    /// File name given to the fleet report attachment.
    pub report_filename: String,
    /// Upper bound on a single dispatch, in milliseconds.
    pub dispatch_timeout_ms: u64,
    /// Webhook that receives notifications as JSON. When unset, notifications
    /// are only logged.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Configuration for the maintenance scan.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MaintenanceConfig {
    /// Smallest day count (inclusive) that triggers a reminder.
    pub window_min_days: i64,
    /// Largest day count (inclusive) that triggers a reminder.
    pub window_max_days: i64,
    /// Time between scheduled scans, in seconds.
    pub scan_interval_seconds: u64,
    /// When set, a vehicle already reminded about a due date is not reminded
    /// again for the same date within this many seconds.
    #[serde(default)]
    pub suppression_ttl_seconds: Option<u64>,
}

/// Configuration for the vehicle store.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct StoreConfig {
    /// CSV file used to seed the in-memory store.
    #[serde(default)]
    pub fleet_file: Option<PathBuf>,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// Sources are merged in increasing order of precedence: built-in
    /// defaults, the TOML file, `FLEETWATCH_` environment variables (nested
    /// keys separated by `__`), then command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::figment(config_path)
            .merge(cli.clone())
            .extract()
            .map_err(Into::into)
    }

    /// Loads the configuration from a file and the environment only.
    pub fn load_from_path<P: Into<PathBuf>>(config_path: P) -> Result<Self> {
        Self::figment(config_path.into())
            .extract()
            .map_err(Into::into)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g., FLEETWATCH_MAINTENANCE__SCAN_INTERVAL_SECONDS=60
            .merge(Env::prefixed("FLEETWATCH_").split("__"))
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            notification: NotificationConfig {
                operator_address: "fleet-ops@localhost".to_string(),
                inline_image_resource: "images/car_success.jpg".to_string(),
                inline_image_content_id: "carImage".to_string(),
                report_filename: "fleet_report.csv".to_string(),
                dispatch_timeout_ms: 10_000,
                webhook_url: None,
            },
            maintenance: MaintenanceConfig {
                window_min_days: 0,
                window_max_days: 7,
                scan_interval_seconds: 86_400,
                suppression_ttl_seconds: None,
            },
            store: StoreConfig::default(),
        }
    }
}
