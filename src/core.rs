//! Core domain types and service traits for FleetWatch
//!
//! This module defines the vehicle record and the trait contracts for the
//! collaborators that live outside the crate: the vehicle store and the
//! report generator. The notification dispatcher contract lives in
//! [`crate::notification`].

use crate::store::StoreError;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store-assigned vehicle identity.
pub type CarId = i64;

/// The mutable part of a vehicle record.
///
/// Callers create and update vehicles through this type; only a
/// [`VehicleStore`] turns it into a [`VehicleRecord`] by assigning a `CarId`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VehicleDetails {
    /// Category of the vehicle (e.g., "SUV", "Sedan")
    pub vehicle_type: String,
    pub model: String,
    pub year_of_manufacture: i32,
    /// Availability state (e.g., "AVAILABLE", "IN_SERVICE")
    pub status: String,
    /// Owner contact address, used only for the registration notice
    #[serde(default)]
    pub owner_email: Option<String>,
    /// Local calendar date of the next scheduled maintenance
    #[serde(default)]
    pub next_maintenance_date: Option<NaiveDate>,
}

impl VehicleDetails {
    /// Returns the owner email, exactly as stored, when it is present and
    /// non-empty. No other validation is applied.
    pub fn contact_email(&self) -> Option<&str> {
        self.owner_email.as_deref().filter(|email| !email.is_empty())
    }
}

/// A persisted vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleRecord {
    pub car_id: CarId,
    #[serde(flatten)]
    pub details: VehicleDetails,
}

impl VehicleRecord {
    pub fn new(car_id: CarId, details: VehicleDetails) -> Self {
        Self { car_id, details }
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Persistence for vehicle records.
///
/// Implementations own all persisted state and must make each call atomic.
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Returns every vehicle in the fleet.
    async fn find_all(&self) -> Result<Vec<VehicleRecord>, StoreError>;

    async fn find_by_id(&self, car_id: CarId) -> Result<Option<VehicleRecord>, StoreError>;

    /// Persists a new vehicle and returns it with its freshly assigned id.
    async fn insert(&self, details: VehicleDetails) -> Result<VehicleRecord, StoreError>;

    /// Persists `record` under its existing id, replacing whatever was there.
    async fn save(&self, record: VehicleRecord) -> Result<VehicleRecord, StoreError>;

    async fn delete_by_id(&self, car_id: CarId) -> Result<(), StoreError>;

    async fn exists_by_id(&self, car_id: CarId) -> Result<bool, StoreError>;

    /// Returns the vehicles whose status equals `status` exactly.
    async fn find_by_status(&self, status: &str) -> Result<Vec<VehicleRecord>, StoreError>;

    /// Returns the vehicles whose type equals `vehicle_type` exactly.
    async fn find_by_vehicle_type(
        &self,
        vehicle_type: &str,
    ) -> Result<Vec<VehicleRecord>, StoreError>;
}

/// Renders a binary report from a list of vehicles.
pub trait ReportGenerator: Send + Sync {
    /// Renders the report.
    ///
    /// # Returns
    /// * `Ok(bytes)` with the rendered document
    /// * `Err` if rendering failed
    fn generate(&self, vehicles: &[VehicleRecord]) -> Result<Vec<u8>>;
}
