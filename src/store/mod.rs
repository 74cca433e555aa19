//! Vehicle persistence adapters.
//!
//! The [`VehicleStore`](crate::core::VehicleStore) contract is defined in
//! `core`; this module holds its error type and the in-memory adapter used by
//! the binary and the test suite.

pub mod memory;

use crate::core::CarId;
use thiserror::Error;

pub use memory::InMemoryVehicleStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Vehicle store unavailable: {0}")]
    Unavailable(String),

    #[error("Car with ID {0} does not exist in the store")]
    NotFound(CarId),
}
