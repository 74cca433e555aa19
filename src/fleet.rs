//! CRUD orchestration for the fleet registry.
//!
//! Every mutation is persisted first; the matching notification is then
//! composed and dispatched on a best-effort basis. A notification failure is
//! logged and never changes the result returned to the caller.

use crate::core::{CarId, ReportGenerator, VehicleDetails, VehicleRecord, VehicleStore};
use crate::notification::{
    dispatch_contained, FleetEvent, NotificationComposer, NotificationDispatcher,
    NotificationPayload,
};
use crate::store::StoreError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FleetError {
    #[error("Car with ID {0} not found.")]
    NotFound(CarId),

    #[error("No bookings found.")]
    NoDataFound,

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct FleetService {
    store: Arc<dyn VehicleStore>,
    composer: Arc<NotificationComposer>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    report_generator: Arc<dyn ReportGenerator>,
    dispatch_timeout: Duration,
}

impl FleetService {
    pub fn new(
        store: Arc<dyn VehicleStore>,
        composer: Arc<NotificationComposer>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        report_generator: Arc<dyn ReportGenerator>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            composer,
            dispatcher,
            report_generator,
            dispatch_timeout,
        }
    }

    /// Registers a vehicle and notifies its owner if an email is on file.
    #[instrument(skip_all)]
    pub async fn add_car(&self, details: VehicleDetails) -> Result<VehicleRecord, FleetError> {
        let saved = self.store.insert(details).await?;
        info!(car_id = saved.car_id, "Vehicle registered");

        match self.composer.compose(FleetEvent::Registered(&saved)) {
            Some(payload) => {
                self.notify(&payload).await;
            }
            None => {
                warn!(
                    car_id = saved.car_id,
                    "Email is missing, skipping registration notification."
                );
            }
        }
        Ok(saved)
    }

    /// Returns the whole fleet and mails a report of it to the operator.
    ///
    /// A report rendering failure is logged; the fleet is still returned.
    #[instrument(skip_all)]
    pub async fn get_all_cars(&self) -> Result<Vec<VehicleRecord>, FleetError> {
        let cars = self.store.find_all().await?;

        match self.report_generator.generate(&cars) {
            Ok(report) => {
                if let Some(payload) = self.composer.compose(FleetEvent::FleetReport {
                    vehicle_count: cars.len(),
                    report: &report,
                }) {
                    self.notify(&payload).await;
                }
            }
            Err(e) => {
                error!("Failed to render fleet report: {:#}", e);
            }
        }
        Ok(cars)
    }

    pub async fn find_cars_by_status(&self, status: &str) -> Result<Vec<VehicleRecord>, FleetError> {
        Ok(self.store.find_by_status(status).await?)
    }

    pub async fn find_cars_by_vehicle_type(
        &self,
        vehicle_type: &str,
    ) -> Result<Vec<VehicleRecord>, FleetError> {
        Ok(self.store.find_by_vehicle_type(vehicle_type).await?)
    }

    /// Replaces every field of `car_id` except its identity.
    ///
    /// # Returns
    /// * `Ok(None)` if no vehicle has this id; nothing is written or sent
    /// * `Ok(Some(saved))` otherwise
    #[instrument(skip(self, details))]
    pub async fn update_car_details(
        &self,
        car_id: CarId,
        details: VehicleDetails,
    ) -> Result<Option<VehicleRecord>, FleetError> {
        if self.store.find_by_id(car_id).await?.is_none() {
            warn!(car_id, "Update requested for unknown vehicle");
            return Ok(None);
        }

        let saved = self.store.save(VehicleRecord::new(car_id, details)).await?;
        info!(car_id, "Vehicle details updated");

        if let Some(payload) = self.composer.compose(FleetEvent::Updated(&saved)) {
            self.notify(&payload).await;
        }
        Ok(Some(saved))
    }

    /// Deletes a vehicle.
    ///
    /// Fails with [`FleetError::InvalidArgument`] when the id is unknown.
    #[instrument(skip(self))]
    pub async fn delete_car_by_id(&self, car_id: CarId) -> Result<(), FleetError> {
        if !self.store.exists_by_id(car_id).await? {
            return Err(unknown_car(car_id));
        }

        // Another caller may have removed it since the existence check.
        match self.store.delete_by_id(car_id).await {
            Ok(()) => {}
            Err(StoreError::NotFound(id)) => return Err(unknown_car(id)),
            Err(e) => return Err(e.into()),
        }
        info!(car_id, "Vehicle deleted");

        if let Some(payload) = self.composer.compose(FleetEvent::Deleted(car_id)) {
            self.notify(&payload).await;
        }
        Ok(())
    }

    pub async fn get_car_by_id(&self, car_id: CarId) -> Result<VehicleRecord, FleetError> {
        self.store
            .find_by_id(car_id)
            .await?
            .ok_or(FleetError::NotFound(car_id))
    }

    /// Same lookup as [`FleetService::get_car_by_id`], kept for the details view.
    pub async fn get_car_details(&self, car_id: CarId) -> Result<VehicleRecord, FleetError> {
        self.get_car_by_id(car_id).await
    }

    /// Returns the whole fleet, failing with [`FleetError::NoDataFound`] when
    /// it is empty.
    pub async fn get_all_bookings(&self) -> Result<Vec<VehicleRecord>, FleetError> {
        let cars = self.store.find_all().await?;
        if cars.is_empty() {
            return Err(FleetError::NoDataFound);
        }
        Ok(cars)
    }

    async fn notify(&self, payload: &NotificationPayload) {
        dispatch_contained(self.dispatcher.as_ref(), payload, self.dispatch_timeout).await;
    }
}

fn unknown_car(car_id: CarId) -> FleetError {
    FleetError::InvalidArgument(format!("Car ID not found: {}", car_id))
}
