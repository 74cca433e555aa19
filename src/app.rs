//! The main application wiring, decoupled from the entry point.

use crate::{
    config::Config,
    core::{ReportGenerator, VehicleStore},
    fleet::FleetService,
    notification::{LoggingDispatcher, NotificationComposer, NotificationDispatcher, WebhookDispatcher},
    report::CsvReportGenerator,
    scanner::{DueWindow, MaintenanceScanner},
    scheduler::MaintenanceScheduler,
    store::InMemoryVehicleStore,
    task_manager::TaskManager,
};
use anyhow::{bail, Result};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{info, instrument};

/// How long shutdown waits for background tasks before aborting them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// A handle to the running application.
pub struct App {
    task_manager: TaskManager,
    fleet: Arc<FleetService>,
    scheduler: MaintenanceScheduler,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The CRUD service, for an enclosing API layer.
    pub fn fleet(&self) -> Arc<FleetService> {
        self.fleet.clone()
    }

    /// The scheduler, for manual scan triggers.
    pub fn scheduler(&self) -> &MaintenanceScheduler {
        &self.scheduler
    }

    /// Waits for the shutdown signal and then gracefully shuts down all tasks.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.task_manager.get_shutdown_rx();
        while !*shutdown_rx.borrow_and_update() {
            if shutdown_rx.changed().await.is_err() {
                break;
            }
        }
        info!("Shutdown signal received. Waiting for tasks to complete...");

        let unclean = self.task_manager.shutdown(SHUTDOWN_GRACE).await;
        if !unclean.is_empty() {
            bail!("Tasks did not shut down cleanly: {:?}", unclean);
        }
        Ok(())
    }
}

/// Builder for the main application.
///
/// Components default to what the configuration describes; each can be
/// overridden, which is how tests inject fakes.
pub struct AppBuilder {
    config: Config,
    store_override: Option<Arc<dyn VehicleStore>>,
    dispatcher_override: Option<Arc<dyn NotificationDispatcher>>,
    report_generator_override: Option<Arc<dyn ReportGenerator>>,
    start_scheduler: bool,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store_override: None,
            dispatcher_override: None,
            report_generator_override: None,
            start_scheduler: true,
        }
    }

    /// Overrides the vehicle store.
    pub fn store_override(mut self, store: Arc<dyn VehicleStore>) -> Self {
        self.store_override = Some(store);
        self
    }

    /// Overrides the notification dispatcher.
    pub fn dispatcher_override(mut self, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        self.dispatcher_override = Some(dispatcher);
        self
    }

    /// Overrides the report generator.
    pub fn report_generator_override(mut self, generator: Arc<dyn ReportGenerator>) -> Self {
        self.report_generator_override = Some(generator);
        self
    }

    /// Whether `build` spawns the recurring scan loop. Defaults to `true`.
    pub fn start_scheduler(mut self, start: bool) -> Self {
        self.start_scheduler = start;
        self
    }

    /// Builds all components and, unless disabled, spawns the scheduler.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        let task_manager = TaskManager::new(shutdown_rx);

        if config.maintenance.window_min_days > config.maintenance.window_max_days {
            bail!(
                "Invalid due window: min {} is greater than max {}",
                config.maintenance.window_min_days,
                config.maintenance.window_max_days
            );
        }
        if config.maintenance.scan_interval_seconds == 0 {
            bail!("scan_interval_seconds must be greater than zero");
        }
        if config.notification.dispatch_timeout_ms == 0 {
            bail!("dispatch_timeout_ms must be greater than zero");
        }

        let dispatch_timeout = Duration::from_millis(config.notification.dispatch_timeout_ms);

        let store: Arc<dyn VehicleStore> = match self.store_override {
            Some(store) => store,
            None => match &config.store.fleet_file {
                Some(path) => Arc::new(InMemoryVehicleStore::from_csv_path(path)?),
                None => Arc::new(InMemoryVehicleStore::new()),
            },
        };

        let dispatcher: Arc<dyn NotificationDispatcher> = match self.dispatcher_override {
            Some(dispatcher) => dispatcher,
            None => match &config.notification.webhook_url {
                Some(url) => Arc::new(WebhookDispatcher::new(url.clone(), dispatch_timeout)?),
                None => {
                    info!("No webhook configured; notifications will only be logged.");
                    Arc::new(LoggingDispatcher)
                }
            },
        };

        let report_generator = self
            .report_generator_override
            .unwrap_or_else(|| Arc::new(CsvReportGenerator));

        let composer = Arc::new(NotificationComposer::from_config(&config.notification));

        let fleet = Arc::new(FleetService::new(
            store.clone(),
            composer.clone(),
            dispatcher.clone(),
            report_generator,
            dispatch_timeout,
        ));

        let mut scanner = MaintenanceScanner::new(
            store,
            composer,
            dispatcher,
            DueWindow::from(&config.maintenance),
            dispatch_timeout,
        );
        if let Some(ttl) = config.maintenance.suppression_ttl_seconds {
            info!("Maintenance reminder suppression enabled for {}s.", ttl);
            scanner = scanner.with_suppression(Duration::from_secs(ttl));
        }

        let scheduler = MaintenanceScheduler::new(
            Arc::new(scanner),
            Duration::from_secs(config.maintenance.scan_interval_seconds),
        );

        if self.start_scheduler {
            task_manager.spawn(
                "MaintenanceScheduler",
                scheduler.clone().run(task_manager.get_shutdown_rx()),
            );
        }

        Ok(App {
            task_manager,
            fleet,
            scheduler,
        })
    }
}
