//! An in-memory vehicle store, optionally seeded from a CSV fleet file.

use super::StoreError;
use crate::core::{CarId, VehicleDetails, VehicleRecord, VehicleStore};
use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::RwLock;

#[derive(Debug)]
struct Inner {
    vehicles: BTreeMap<CarId, VehicleDetails>,
    next_id: CarId,
}

/// A `VehicleStore` that keeps the fleet in a `BTreeMap` behind an async lock.
///
/// Ids are assigned from 1 upwards and never reused. Every trait method takes
/// the lock exactly once, so each call is atomic.
#[derive(Debug)]
pub struct InMemoryVehicleStore {
    inner: RwLock<Inner>,
}

impl Default for InMemoryVehicleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVehicleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                vehicles: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Creates a store holding `fleet`, assigning ids in iteration order.
    pub fn with_fleet(fleet: impl IntoIterator<Item = VehicleDetails>) -> Self {
        let mut vehicles = BTreeMap::new();
        let mut next_id = 1;
        for details in fleet {
            vehicles.insert(next_id, details);
            next_id += 1;
        }
        Self {
            inner: RwLock::new(Inner { vehicles, next_id }),
        }
    }

    /// Loads a fleet from a CSV file with a header row.
    ///
    /// Expected columns: `vehicle_type`, `model`, `year_of_manufacture`,
    /// `status`, `owner_email`, `next_maintenance_date` (`YYYY-MM-DD`).
    /// Empty cells in the optional columns are read as absent.
    ///
    /// # Arguments
    /// * `path` - The path to the CSV fleet file.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading fleet from CSV file: {:?}", path.as_ref());
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut fleet = Vec::new();
        for result in reader.deserialize() {
            let details: VehicleDetails = result?;
            fleet.push(details);
        }

        debug!("Loaded {} vehicles from CSV.", fleet.len());
        Ok(Self::with_fleet(fleet))
    }

    fn filtered(inner: &Inner, predicate: impl Fn(&VehicleDetails) -> bool) -> Vec<VehicleRecord> {
        inner
            .vehicles
            .iter()
            .filter(|(_, details)| predicate(details))
            .map(|(id, details)| VehicleRecord::new(*id, details.clone()))
            .collect()
    }
}

#[async_trait]
impl VehicleStore for InMemoryVehicleStore {
    async fn find_all(&self) -> Result<Vec<VehicleRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(Self::filtered(&inner, |_| true))
    }

    async fn find_by_id(&self, car_id: CarId) -> Result<Option<VehicleRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .vehicles
            .get(&car_id)
            .map(|details| VehicleRecord::new(car_id, details.clone())))
    }

    async fn insert(&self, details: VehicleDetails) -> Result<VehicleRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let car_id = inner.next_id;
        inner.next_id += 1;
        inner.vehicles.insert(car_id, details.clone());
        Ok(VehicleRecord::new(car_id, details))
    }

    async fn save(&self, record: VehicleRecord) -> Result<VehicleRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if record.car_id >= inner.next_id {
            inner.next_id = record.car_id + 1;
        }
        inner.vehicles.insert(record.car_id, record.details.clone());
        Ok(record)
    }

    async fn delete_by_id(&self, car_id: CarId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .vehicles
            .remove(&car_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(car_id))
    }

    async fn exists_by_id(&self, car_id: CarId) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.vehicles.contains_key(&car_id))
    }

    async fn find_by_status(&self, status: &str) -> Result<Vec<VehicleRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(Self::filtered(&inner, |details| details.status == status))
    }

    async fn find_by_vehicle_type(
        &self,
        vehicle_type: &str,
    ) -> Result<Vec<VehicleRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(Self::filtered(&inner, |details| {
            details.vehicle_type == vehicle_type
        }))
    }
}
