use std::sync::Mutex;

use uuid::Uuid;

use crate::domain::{Garage, ServiceEntry, Vehicle};
use crate::errors::{AutoServeError, Result};

use super::{StorageBackend, VehicleRepository};

/// [`VehicleRepository`] over a named garage snapshot held by a [`StorageBackend`].
///
/// Every write loads the snapshot, applies the change and saves it back. Writes from
/// one process are serialized; separate processes are not coordinated.
pub struct SnapshotRepository<B: StorageBackend> {
    backend: B,
    name: String,
    write_lock: Mutex<()>,
}

impl<B: StorageBackend> SnapshotRepository<B> {
    pub fn new(backend: B, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current snapshot, or an empty garage when nothing has been saved yet.
    pub fn garage(&self) -> Result<Garage> {
        if self.backend.exists(&self.name) {
            self.backend.load(&self.name)
        } else {
            Ok(Garage::new(self.name.clone()))
        }
    }

    /// Applies `mutator` to the stored snapshot and persists the result.
    pub fn update<T, F>(&self, mutator: F) -> Result<T>
    where
        F: FnOnce(&mut Garage) -> Result<T>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AutoServeError::Storage("snapshot lock poisoned".into()))?;
        let mut garage = self.garage()?;
        let value = mutator(&mut garage)?;
        garage.touch();
        self.backend.save(&garage, &self.name)?;
        Ok(value)
    }
}

impl<B: StorageBackend> VehicleRepository for SnapshotRepository<B> {
    fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>> {
        Ok(self.garage()?.vehicle(id).cloned())
    }

    fn put_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        self.update(|garage| {
            match garage.vehicle_mut(vehicle.id) {
                Some(existing) => *existing = vehicle.clone(),
                None => {
                    garage.add_vehicle(vehicle.clone());
                }
            }
            Ok(())
        })
    }

    fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        Ok(self.garage()?.vehicles)
    }

    fn get_service_entry(&self, vehicle_id: Uuid, entry_id: Uuid) -> Result<Option<ServiceEntry>> {
        Ok(self
            .garage()?
            .vehicle(vehicle_id)
            .and_then(|vehicle| vehicle.service_entry(entry_id))
            .cloned())
    }

    fn put_service_entry(&self, vehicle_id: Uuid, entry: ServiceEntry) -> Result<()> {
        self.update(|garage| {
            let vehicle = garage
                .vehicle_mut(vehicle_id)
                .ok_or_else(|| AutoServeError::NotFound(format!("vehicle {vehicle_id}")))?;
            vehicle.upsert_service(entry);
            Ok(())
        })
    }

    fn list_service_entries(&self, vehicle_id: Uuid) -> Result<Vec<ServiceEntry>> {
        let garage = self.garage()?;
        let vehicle = garage
            .vehicle(vehicle_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("vehicle {vehicle_id}")))?;
        Ok(vehicle.service_history.clone())
    }
}
