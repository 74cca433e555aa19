#![allow(dead_code)]
//! Shared fakes and fixtures for the integration tests.

pub mod recording_dispatcher;

use chrono::{Local, NaiveDate};
use fleetwatch::config::Config;
use fleetwatch::notification::NotificationComposer;
use fleetwatch::VehicleDetails;
use std::sync::Arc;

pub use recording_dispatcher::RecordingDispatcher;

/// Today's local calendar date, the reference the scanner uses.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// A vehicle whose maintenance is due `days` from today, or undated.
pub fn vehicle_due_in(days: Option<i64>) -> VehicleDetails {
    VehicleDetails {
        vehicle_type: "Sedan".to_string(),
        model: "Civic".to_string(),
        year_of_manufacture: 2021,
        status: "AVAILABLE".to_string(),
        owner_email: Some("owner@example.com".to_string()),
        next_maintenance_date: days.map(|d| today() + chrono::Duration::days(d)),
    }
}

pub fn vehicle_with_email(email: Option<&str>) -> VehicleDetails {
    VehicleDetails {
        owner_email: email.map(str::to_string),
        ..vehicle_due_in(None)
    }
}

pub fn test_composer() -> Arc<NotificationComposer> {
    let mut config = Config::default();
    config.notification.operator_address = "ops@example.com".to_string();
    Arc::new(NotificationComposer::from_config(&config.notification))
}
