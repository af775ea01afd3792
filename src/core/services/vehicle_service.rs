//! Vehicle registration, logbook entries and service-due lookups.

use chrono::Datelike;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{ServiceEntry, Vehicle};
use crate::errors::{AutoServeError, Result};
use crate::pricing::CostBreakdown;
use crate::service_due::{calculate_service_due, ServiceDueResult};
use crate::storage::VehicleRepository;
use crate::time::Clock;

const FIRST_MODEL_YEAR: u16 = 1886;

/// Vehicle workflows over any [`VehicleRepository`].
pub struct VehicleService<R: VehicleRepository, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: VehicleRepository, C: Clock> VehicleService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Validates and stores a new vehicle, returning its identifier.
    pub fn register(&self, vehicle: Vehicle) -> Result<Uuid> {
        if vehicle.make.trim().is_empty() || vehicle.model.trim().is_empty() {
            return Err(AutoServeError::InvalidInput(
                "make and model are required".into(),
            ));
        }
        let latest_year = u16::try_from(self.clock.today().year() + 1).unwrap_or(u16::MAX);
        if !(FIRST_MODEL_YEAR..=latest_year).contains(&vehicle.year) {
            return Err(AutoServeError::InvalidInput(format!(
                "year {} is outside {FIRST_MODEL_YEAR}..={latest_year}",
                vehicle.year
            )));
        }
        if self.repo.get_vehicle(vehicle.id)?.is_some() {
            return Err(AutoServeError::InvalidInput(format!(
                "vehicle {} already registered",
                vehicle.id
            )));
        }
        self.repo.put_vehicle(&vehicle)?;
        info!(vehicle = %vehicle.id, make = %vehicle.make, model = %vehicle.model, "vehicle registered");
        Ok(vehicle.id)
    }

    pub fn vehicle(&self, id: Uuid) -> Result<Vehicle> {
        self.repo
            .get_vehicle(id)?
            .ok_or_else(|| AutoServeError::NotFound(format!("vehicle {id}")))
    }

    pub fn list(&self) -> Result<Vec<Vehicle>> {
        self.repo.list_vehicles()
    }

    /// Records a new odometer reading. Readings never go backwards.
    pub fn update_odometer(&self, id: Uuid, reading: u32) -> Result<Vehicle> {
        let mut vehicle = self.vehicle(id)?;
        if reading < vehicle.odometer {
            return Err(AutoServeError::InvalidInput(format!(
                "odometer reading {reading} is below the recorded {}",
                vehicle.odometer
            )));
        }
        vehicle.odometer = reading;
        self.repo.put_vehicle(&vehicle)?;
        debug!(vehicle = %id, odometer = reading, "odometer updated");
        Ok(vehicle)
    }

    /// Adds (or replaces) a logbook entry.
    ///
    /// A completed service recorded above the current odometer advances the odometer to match.
    pub fn log_service(&self, vehicle_id: Uuid, entry: ServiceEntry) -> Result<Uuid> {
        if entry.service_type.trim().is_empty() {
            return Err(AutoServeError::InvalidInput(
                "service type is required".into(),
            ));
        }
        if let Some(item) = entry
            .items
            .iter()
            .find(|item| !item.price.is_finite() || item.price < 0.0)
        {
            return Err(AutoServeError::InvalidInput(format!(
                "item `{}` has invalid price {}",
                item.name, item.price
            )));
        }
        let mut vehicle = self.vehicle(vehicle_id)?;
        if entry.is_completed() && entry.odometer > vehicle.odometer {
            vehicle.odometer = entry.odometer;
        }
        let entry_id = vehicle.upsert_service(entry);
        self.repo.put_vehicle(&vehicle)?;
        info!(vehicle = %vehicle_id, entry = %entry_id, "service logged");
        Ok(entry_id)
    }

    /// Logbook entries, newest first.
    pub fn history(&self, vehicle_id: Uuid) -> Result<Vec<ServiceEntry>> {
        let mut entries = self.repo.list_service_entries(vehicle_id)?;
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    /// Invoice totals recomputed from an entry's line items.
    pub fn invoice(&self, vehicle_id: Uuid, entry_id: Uuid, gst_rate: f64) -> Result<CostBreakdown> {
        let entry = self
            .repo
            .get_service_entry(vehicle_id, entry_id)?
            .ok_or_else(|| AutoServeError::NotFound(format!("service entry {entry_id}")))?;
        Ok(entry.breakdown(gst_rate))
    }

    pub fn service_due(&self, vehicle_id: Uuid) -> Result<ServiceDueResult> {
        let vehicle = self.vehicle(vehicle_id)?;
        Ok(calculate_service_due(&vehicle, self.clock.now()))
    }

    /// Every vehicle with its service-due result, most urgent first.
    pub fn fleet_due(&self) -> Result<Vec<(Vehicle, ServiceDueResult)>> {
        let now = self.clock.now();
        let mut rows: Vec<(Vehicle, ServiceDueResult)> = self
            .repo
            .list_vehicles()?
            .into_iter()
            .map(|vehicle| {
                let due = calculate_service_due(&vehicle, now);
                (vehicle, due)
            })
            .collect();
        rows.sort_by(|(_, a), (_, b)| b.progress_percentage.total_cmp(&a.progress_percentage));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ServiceItem, ServiceStatus};
    use crate::service_due::ServiceDueStatus;
    use crate::storage::InMemoryRepository;
    use crate::time::FixedClock;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service() -> VehicleService<InMemoryRepository, FixedClock> {
        VehicleService::new(InMemoryRepository::new(), FixedClock::on(date(2024, 9, 1)))
    }

    #[test]
    fn register_rejects_blank_make() {
        let err = service()
            .register(Vehicle::new(" ", "Civic", 2018, 1))
            .expect_err("blank make");
        assert!(matches!(err, AutoServeError::InvalidInput(_)));
    }

    #[test]
    fn register_rejects_future_model_years() {
        let err = service()
            .register(Vehicle::new("Honda", "Civic", 2030, 1))
            .expect_err("future year");
        assert!(err.to_string().contains("2030"));
    }

    #[test]
    fn odometer_cannot_go_backwards() {
        let service = service();
        let id = service.register(Vehicle::new("Holden", "Commodore", 2012, 150_000)).unwrap();
        assert!(service.update_odometer(id, 149_999).is_err());
        assert_eq!(service.update_odometer(id, 151_000).unwrap().odometer, 151_000);
    }

    #[test]
    fn completed_service_above_odometer_advances_reading() {
        let service = service();
        let id = service.register(Vehicle::new("Mazda", "CX-5", 2019, 60_000)).unwrap();
        service
            .log_service(id, ServiceEntry::new(date(2024, 8, 30), "Logbook", 61_200))
            .unwrap();
        assert_eq!(service.vehicle(id).unwrap().odometer, 61_200);
    }

    #[test]
    fn service_due_uses_the_injected_clock() {
        let service = service();
        let id = service.register(Vehicle::new("Mazda", "CX-5", 2019, 48_500)).unwrap();
        service
            .log_service(id, ServiceEntry::new(date(2024, 8, 2), "Logbook", 40_000))
            .unwrap();
        let due = service.service_due(id).unwrap();
        assert_eq!(due.status, ServiceDueStatus::DueSoon);
        assert_eq!(due.days_until_service, 150);
    }

    #[test]
    fn invoice_recomputes_from_items() {
        let service = service();
        let id = service.register(Vehicle::new("VW", "Polo", 2017, 70_000)).unwrap();
        let entry = ServiceEntry::new(date(2024, 6, 1), "Brakes", 69_000)
            .with_items(vec![
                ServiceItem::parts("Pads", 120.0),
                ServiceItem::labor("Fit pads", 80.0),
            ])
            .with_total_cost(999.0);
        let entry_id = service.log_service(id, entry).unwrap();
        let invoice = service.invoice(id, entry_id, 0.10).unwrap();
        assert_eq!(invoice.total, 220.0);
    }

    #[test]
    fn fleet_due_orders_most_urgent_first() {
        let service = service();
        let fresh = service.register(Vehicle::new("Kia", "Rio", 2022, 10_000)).unwrap();
        service
            .log_service(fresh, ServiceEntry::new(date(2024, 8, 25), "Logbook", 10_000))
            .unwrap();
        let untracked = service.register(Vehicle::new("Kia", "Stinger", 2019, 50_000)).unwrap();
        service
            .log_service(
                untracked,
                ServiceEntry::new(date(2024, 8, 1), "Tyres", 49_000)
                    .with_status(ServiceStatus::Cancelled),
            )
            .unwrap();

        let rows = service.fleet_due().unwrap();
        assert_eq!(rows[0].0.id, untracked);
        assert_eq!(rows[0].1.status, ServiceDueStatus::Overdue);
        assert_eq!(rows[1].0.id, fresh);
    }
}
