//! The maintenance-due scan.
//!
//! On each invocation the scanner reads the whole fleet, works out how many
//! days remain until each vehicle's next maintenance, and sends one reminder
//! per vehicle whose due date falls inside the due window.

use crate::config::MaintenanceConfig;
use crate::core::{CarId, VehicleStore};
use crate::notification::{
    dispatch_contained, FleetEvent, NotificationComposer, NotificationDispatcher,
};
use crate::store::StoreError;
use chrono::{Local, NaiveDate};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Inclusive range of day counts that trigger a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    pub min_days: i64,
    pub max_days: i64,
}

impl Default for DueWindow {
    fn default() -> Self {
        Self {
            min_days: 0,
            max_days: 7,
        }
    }
}

impl DueWindow {
    pub fn contains(&self, days_until: i64) -> bool {
        (self.min_days..=self.max_days).contains(&days_until)
    }
}

impl From<&MaintenanceConfig> for DueWindow {
    fn from(config: &MaintenanceConfig) -> Self {
        Self {
            min_days: config.window_min_days,
            max_days: config.window_max_days,
        }
    }
}

/// Whole calendar days from `today` until `due_date`; negative when overdue.
pub fn days_until(today: NaiveDate, due_date: NaiveDate) -> i64 {
    (due_date - today).num_days()
}

/// The outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Vehicles read from the store.
    pub examined: usize,
    /// Ids of vehicles whose due date fell inside the window, in scan order.
    pub qualifying: Vec<CarId>,
    pub dispatched: usize,
    pub failed: usize,
    /// Qualifying vehicles skipped because they were reminded recently.
    pub suppressed: usize,
}

/// Finds vehicles due for maintenance and reminds the operator about them.
pub struct MaintenanceScanner {
    store: Arc<dyn VehicleStore>,
    composer: Arc<NotificationComposer>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    window: DueWindow,
    dispatch_timeout: Duration,
    recently_notified: Option<Cache<(CarId, NaiveDate), ()>>,
}

impl MaintenanceScanner {
    /// Creates a scanner that re-notifies every qualifying vehicle on every
    /// scan.
    pub fn new(
        store: Arc<dyn VehicleStore>,
        composer: Arc<NotificationComposer>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        window: DueWindow,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            composer,
            dispatcher,
            window,
            dispatch_timeout,
            recently_notified: None,
        }
    }

    /// Skips vehicles that were successfully reminded about the same due date
    /// within `ttl`.
    pub fn with_suppression(mut self, ttl: Duration) -> Self {
        self.recently_notified = Some(Cache::builder().time_to_live(ttl).build());
        self
    }

    pub fn window(&self) -> DueWindow {
        self.window
    }

    /// Scans against today's local calendar date.
    pub async fn scan_today(&self) -> Result<ScanReport, StoreError> {
        self.scan(Local::now().date_naive()).await
    }

    /// Scans the fleet as of `today`.
    ///
    /// A failed dispatch is logged and counted; it never stops the scan.
    /// Only a store read failure aborts it.
    #[instrument(skip(self))]
    pub async fn scan(&self, today: NaiveDate) -> Result<ScanReport, StoreError> {
        let fleet = self.store.find_all().await?;
        metrics::counter!("maintenance_scans_total").increment(1);

        let mut report = ScanReport {
            examined: fleet.len(),
            ..Default::default()
        };

        for vehicle in &fleet {
            let Some(due_date) = vehicle.details.next_maintenance_date else {
                continue;
            };
            let days = days_until(today, due_date);
            debug!(car_id = vehicle.car_id, days, "Days until next maintenance");

            if !self.window.contains(days) {
                continue;
            }
            report.qualifying.push(vehicle.car_id);

            let key = (vehicle.car_id, due_date);
            if let Some(cache) = &self.recently_notified {
                if cache.contains_key(&key) {
                    debug!(car_id = vehicle.car_id, "Maintenance reminder suppressed");
                    report.suppressed += 1;
                    continue;
                }
            }

            let Some(payload) = self.composer.compose(FleetEvent::MaintenanceDue {
                car_id: vehicle.car_id,
                due_date,
            }) else {
                continue;
            };

            if dispatch_contained(self.dispatcher.as_ref(), &payload, self.dispatch_timeout).await
            {
                report.dispatched += 1;
                metrics::counter!("maintenance_notifications_sent").increment(1);
                if let Some(cache) = &self.recently_notified {
                    cache.insert(key, ()).await;
                }
            } else {
                warn!(
                    car_id = vehicle.car_id,
                    "Maintenance reminder not delivered; continuing scan"
                );
                report.failed += 1;
                metrics::counter!("maintenance_notifications_failed").increment(1);
            }
        }

        info!(
            examined = report.examined,
            qualifying = report.qualifying.len(),
            dispatched = report.dispatched,
            failed = report.failed,
            suppressed = report.suppressed,
            "Maintenance scan complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{VehicleDetails, VehicleRecord};
    use crate::notification::{
        DispatchError, InlineImage, NotificationKind, NotificationPayload,
    };
    use crate::store::InMemoryVehicleStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // Records every payload; fails or stalls on those whose body contains the
    // configured needle.
    #[derive(Default)]
    struct FakeDispatcher {
        sent: Mutex<Vec<NotificationPayload>>,
        fail_bodies_containing: Option<String>,
        stall_bodies_containing: Option<String>,
    }

    #[async_trait]
    impl NotificationDispatcher for FakeDispatcher {
        fn name(&self) -> &str {
            "fake"
        }

        async fn send(&self, payload: &NotificationPayload) -> Result<(), DispatchError> {
            self.sent.lock().unwrap().push(payload.clone());
            if let Some(needle) = &self.stall_bodies_containing {
                if payload.html_body.contains(needle.as_str()) {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
            }
            match &self.fail_bodies_containing {
                Some(needle) if payload.html_body.contains(needle.as_str()) => {
                    Err(DispatchError::Transport("mail relay unreachable".to_string()))
                }
                _ => Ok(()),
            }
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn vehicle(due_in_days: Option<i64>) -> VehicleDetails {
        VehicleDetails {
            vehicle_type: "Sedan".to_string(),
            model: "Corolla".to_string(),
            year_of_manufacture: 2020,
            status: "AVAILABLE".to_string(),
            owner_email: Some("owner@example.com".to_string()),
            next_maintenance_date: due_in_days.map(|d| today() + chrono::Duration::days(d)),
        }
    }

    fn scanner(
        fleet: Vec<VehicleDetails>,
        dispatcher: Arc<FakeDispatcher>,
    ) -> MaintenanceScanner {
        let composer = NotificationComposer::new(
            "ops@example.com",
            InlineImage {
                content_id: "carImage".to_string(),
                resource: "images/car_success.jpg".to_string(),
            },
            "fleet_report.csv",
        );
        MaintenanceScanner::new(
            Arc::new(InMemoryVehicleStore::with_fleet(fleet)),
            Arc::new(composer),
            dispatcher,
            DueWindow::default(),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_days_until_is_signed_whole_days() {
        let today = today();
        assert_eq!(days_until(today, today), 0);
        assert_eq!(days_until(today, today + chrono::Duration::days(7)), 7);
        assert_eq!(days_until(today, today - chrono::Duration::days(1)), -1);
        // Across a month boundary
        let end_of_jan = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let feb_2 = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        assert_eq!(days_until(end_of_jan, feb_2), 2);
    }

    #[test]
    fn test_due_window_bounds_are_inclusive() {
        let window = DueWindow::default();
        assert!(!window.contains(-1));
        assert!(window.contains(0));
        assert!(window.contains(7));
        assert!(!window.contains(8));
    }

    #[tokio::test]
    async fn test_scan_notifies_only_vehicles_inside_window() {
        let dispatcher = Arc::new(FakeDispatcher::default());
        let scanner = scanner(
            vec![
                vehicle(Some(-1)),
                vehicle(Some(0)),
                vehicle(Some(3)),
                vehicle(Some(7)),
                vehicle(Some(8)),
                vehicle(None),
            ],
            dispatcher.clone(),
        );

        let report = scanner.scan(today()).await.unwrap();

        assert_eq!(report.examined, 6);
        assert_eq!(report.qualifying, vec![2, 3, 4]);
        assert_eq!(report.dispatched, 3);
        let sent = dispatcher.sent.lock().unwrap();
        assert!(sent
            .iter()
            .all(|p| p.kind == NotificationKind::MaintenanceDue && p.recipient == "ops@example.com"));
    }

    #[tokio::test]
    async fn test_failure_for_one_vehicle_does_not_stop_scan() {
        let dispatcher = Arc::new(FakeDispatcher {
            fail_bodies_containing: Some("<strong>1</strong>".to_string()),
            ..Default::default()
        });
        let scanner = scanner(vec![vehicle(Some(1)), vehicle(Some(2))], dispatcher.clone());

        let report = scanner.scan(today()).await.unwrap();

        assert_eq!(dispatcher.sent.lock().unwrap().len(), 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.dispatched, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_dispatch_counts_as_failure_and_scan_continues() {
        let dispatcher = Arc::new(FakeDispatcher {
            stall_bodies_containing: Some("<strong>1</strong>".to_string()),
            ..Default::default()
        });
        let scanner = scanner(vec![vehicle(Some(1)), vehicle(Some(2))], dispatcher.clone());

        let report = scanner.scan(today()).await.unwrap();

        assert_eq!(report.qualifying, vec![1, 2]);
        assert_eq!(report.failed, 1);
        assert_eq!(report.dispatched, 1);
        let sent = dispatcher.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].html_body.contains("<strong>2</strong>"));
    }

    #[tokio::test]
    async fn test_custom_window_is_respected() {
        let dispatcher = Arc::new(FakeDispatcher::default());
        let mut scanner = scanner(
            vec![vehicle(Some(1)), vehicle(Some(10)), vehicle(Some(14))],
            dispatcher,
        );
        scanner.window = DueWindow {
            min_days: 2,
            max_days: 14,
        };

        let report = scanner.scan(today()).await.unwrap();
        assert_eq!(report.qualifying, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_suppression_skips_repeat_reminders() {
        let dispatcher = Arc::new(FakeDispatcher::default());
        let scanner = scanner(vec![vehicle(Some(2))], dispatcher.clone())
            .with_suppression(Duration::from_secs(3600));

        let first = scanner.scan(today()).await.unwrap();
        let second = scanner.scan(today()).await.unwrap();

        assert_eq!(first.dispatched, 1);
        assert_eq!(second.dispatched, 0);
        assert_eq!(second.suppressed, 1);
        assert_eq!(dispatcher.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_suppression_does_not_hide_failed_reminders() {
        let dispatcher = Arc::new(FakeDispatcher {
            fail_bodies_containing: Some("<strong>1</strong>".to_string()),
            ..Default::default()
        });
        let scanner = scanner(vec![vehicle(Some(2))], dispatcher.clone())
            .with_suppression(Duration::from_secs(3600));

        scanner.scan(today()).await.unwrap();
        let second = scanner.scan(today()).await.unwrap();

        assert_eq!(second.suppressed, 0);
        assert_eq!(second.failed, 1);
    }

    #[tokio::test]
    async fn test_scan_is_read_only() {
        let dispatcher = Arc::new(FakeDispatcher::default());
        let store = Arc::new(InMemoryVehicleStore::with_fleet(vec![vehicle(Some(1))]));
        let before: Vec<VehicleRecord> = store.find_all().await.unwrap();
        let composer = Arc::new(NotificationComposer::new(
            "ops@example.com",
            InlineImage {
                content_id: "carImage".to_string(),
                resource: "images/car_success.jpg".to_string(),
            },
            "fleet_report.csv",
        ));
        let scanner = MaintenanceScanner::new(
            store.clone(),
            composer,
            dispatcher,
            DueWindow::default(),
            Duration::from_secs(1),
        );

        scanner.scan(today()).await.unwrap();

        assert_eq!(store.find_all().await.unwrap(), before);
    }
}
