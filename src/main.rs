//! FleetWatch - fleet registry maintenance monitor
//!
//! Loads the fleet, then runs the maintenance scan on a fixed interval until
//! interrupted, or once with `--scan-once`.

use anyhow::Result;
use clap::Parser;
use fleetwatch::{app::App, cli::Cli, config::Config};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            tracing_subscriber::fmt().init();
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("FleetWatch starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Operator Address: {}", config.notification.operator_address);
    info!(
        "Due Window: {}..={} days",
        config.maintenance.window_min_days, config.maintenance.window_max_days
    );
    info!(
        "Scan Interval: {}s",
        config.maintenance.scan_interval_seconds
    );
    info!(
        "Dispatch Timeout: {}ms",
        config.notification.dispatch_timeout_ms
    );
    info!(
        "Webhook: {}",
        config.notification.webhook_url.as_deref().unwrap_or("Disabled")
    );
    match &config.store.fleet_file {
        Some(path) => info!("Fleet File: {}", path.display()),
        None => info!("Fleet File: Not configured"),
    }
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if cli.scan_once {
        let app = App::builder(config)
            .start_scheduler(false)
            .build(shutdown_rx)
            .await?;
        if let Some(result) = app.scheduler().run_once().await {
            let report = result?;
            println!(
                "examined={} qualifying={} dispatched={} failed={}",
                report.examined,
                report.qualifying.len(),
                report.dispatched,
                report.failed
            );
        }
        return Ok(());
    }

    let app = App::builder(config).build(shutdown_rx).await?;

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received. Shutting down gracefully...");
        let _ = shutdown_tx.send(true);
    });

    info!("FleetWatch initialized successfully. Watching maintenance dates...");
    app.run().await?;
    info!("All tasks shut down. Exiting.");
    Ok(())
}
