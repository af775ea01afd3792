//! Persistence seams. The service-due calculation and pricing never touch storage;
//! services reach vehicles and logbook entries through [`VehicleRepository`], and
//! whole-garage snapshots through [`StorageBackend`].

pub mod json_backend;
pub mod memory;
pub mod snapshot;

use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::{Garage, ServiceEntry, Vehicle};
use crate::errors::Result;

/// Get/put/list access to vehicles and their service entries.
pub trait VehicleRepository: Send + Sync {
    fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>>;
    /// Inserts or replaces the vehicle (including its service history).
    fn put_vehicle(&self, vehicle: &Vehicle) -> Result<()>;
    fn list_vehicles(&self) -> Result<Vec<Vehicle>>;
    fn get_service_entry(&self, vehicle_id: Uuid, entry_id: Uuid) -> Result<Option<ServiceEntry>>;
    /// Inserts or replaces an entry. Fails with `NotFound` when the vehicle is unknown.
    fn put_service_entry(&self, vehicle_id: Uuid, entry: ServiceEntry) -> Result<()>;
    fn list_service_entries(&self, vehicle_id: Uuid) -> Result<Vec<ServiceEntry>>;
}

impl<R: VehicleRepository + ?Sized> VehicleRepository for &R {
    fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>> {
        (**self).get_vehicle(id)
    }

    fn put_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        (**self).put_vehicle(vehicle)
    }

    fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        (**self).list_vehicles()
    }

    fn get_service_entry(&self, vehicle_id: Uuid, entry_id: Uuid) -> Result<Option<ServiceEntry>> {
        (**self).get_service_entry(vehicle_id, entry_id)
    }

    fn put_service_entry(&self, vehicle_id: Uuid, entry: ServiceEntry) -> Result<()> {
        (**self).put_service_entry(vehicle_id, entry)
    }

    fn list_service_entries(&self, vehicle_id: Uuid) -> Result<Vec<ServiceEntry>> {
        (**self).list_service_entries(vehicle_id)
    }
}

/// Abstraction over backends capable of storing garage snapshots and their backups.
pub trait StorageBackend: Send + Sync {
    fn save(&self, garage: &Garage, name: &str) -> Result<()>;
    fn load(&self, name: &str) -> Result<Garage>;
    fn exists(&self, name: &str) -> bool;
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    fn backup(&self, garage: &Garage, name: &str, note: Option<&str>) -> Result<String>;
    fn restore(&self, name: &str, backup_name: &str) -> Result<Garage>;
}

/// Detects dangling references and inconsistent readings within a garage snapshot.
pub fn garage_warnings(garage: &Garage) -> Vec<String> {
    let vehicle_ids: HashSet<_> = garage.vehicles.iter().map(|v| v.id).collect();
    let mechanic_ids: HashSet<_> = garage.mechanics.iter().map(|m| m.id).collect();
    let mut warnings = Vec::new();

    for vehicle in &garage.vehicles {
        for entry in &vehicle.service_history {
            if entry.is_completed() && entry.odometer > vehicle.odometer {
                warnings.push(format!(
                    "service {} on vehicle {} records {} km, above the current {} km",
                    entry.id, vehicle.id, entry.odometer, vehicle.odometer
                ));
            }
        }
    }
    for booking in &garage.bookings {
        if !vehicle_ids.contains(&booking.vehicle_id) {
            warnings.push(format!(
                "booking {} references unknown vehicle {}",
                booking.id, booking.vehicle_id
            ));
        }
        if !mechanic_ids.contains(&booking.mechanic_id) {
            warnings.push(format!(
                "booking {} references unknown mechanic {}",
                booking.id, booking.mechanic_id
            ));
        }
    }
    warnings
}

pub use json_backend::JsonStorage;
pub use memory::InMemoryRepository;
pub use snapshot::SnapshotRepository;
