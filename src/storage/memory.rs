use std::{collections::BTreeMap, sync::RwLock};

use uuid::Uuid;

use crate::domain::{ServiceEntry, Vehicle};
use crate::errors::{AutoServeError, Result};

use super::VehicleRepository;

/// Process-local repository. State lives as long as the value does.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    vehicles: RwLock<BTreeMap<Uuid, Vehicle>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the repository, e.g. from a mock table or a deserialized snapshot.
    pub fn with_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        let map = vehicles.into_iter().map(|v| (v.id, v)).collect();
        Self {
            vehicles: RwLock::new(map),
        }
    }
}

fn poisoned() -> AutoServeError {
    AutoServeError::Storage("in-memory repository lock poisoned".into())
}

impl VehicleRepository for InMemoryRepository {
    fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>> {
        let vehicles = self.vehicles.read().map_err(|_| poisoned())?;
        Ok(vehicles.get(&id).cloned())
    }

    fn put_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        let mut vehicles = self.vehicles.write().map_err(|_| poisoned())?;
        vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        let vehicles = self.vehicles.read().map_err(|_| poisoned())?;
        Ok(vehicles.values().cloned().collect())
    }

    fn get_service_entry(&self, vehicle_id: Uuid, entry_id: Uuid) -> Result<Option<ServiceEntry>> {
        let vehicles = self.vehicles.read().map_err(|_| poisoned())?;
        Ok(vehicles
            .get(&vehicle_id)
            .and_then(|vehicle| vehicle.service_entry(entry_id))
            .cloned())
    }

    fn put_service_entry(&self, vehicle_id: Uuid, entry: ServiceEntry) -> Result<()> {
        let mut vehicles = self.vehicles.write().map_err(|_| poisoned())?;
        let vehicle = vehicles
            .get_mut(&vehicle_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("vehicle {vehicle_id}")))?;
        vehicle.upsert_service(entry);
        Ok(())
    }

    fn list_service_entries(&self, vehicle_id: Uuid) -> Result<Vec<ServiceEntry>> {
        let vehicles = self.vehicles.read().map_err(|_| poisoned())?;
        let vehicle = vehicles
            .get(&vehicle_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("vehicle {vehicle_id}")))?;
        Ok(vehicle.service_history.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn put_service_entry_requires_known_vehicle() {
        let repo = InMemoryRepository::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = repo
            .put_service_entry(Uuid::new_v4(), ServiceEntry::new(date, "Oil", 1_000))
            .expect_err("unknown vehicle");
        assert!(matches!(err, AutoServeError::NotFound(_)));
    }

    #[test]
    fn entries_are_visible_through_vehicle_and_entry_lookups() {
        let vehicle = Vehicle::new("Honda", "Jazz", 2015, 110_000);
        let vehicle_id = vehicle.id;
        let repo = InMemoryRepository::with_vehicles([vehicle]);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let entry = ServiceEntry::new(date, "Timing belt", 100_000);
        let entry_id = entry.id;

        repo.put_service_entry(vehicle_id, entry).unwrap();

        assert_eq!(repo.list_service_entries(vehicle_id).unwrap().len(), 1);
        assert!(repo.get_service_entry(vehicle_id, entry_id).unwrap().is_some());
        let stored = repo.get_vehicle(vehicle_id).unwrap().unwrap();
        assert_eq!(stored.service_history[0].id, entry_id);
    }
}
