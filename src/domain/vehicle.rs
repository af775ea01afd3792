use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;
use crate::domain::service_entry::ServiceEntry;

/// A tracked vehicle and its logbook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: u16,
    /// Current odometer reading in kilometres.
    pub odometer: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(default)]
    pub service_history: Vec<ServiceEntry>,
}

impl Vehicle {
    pub fn new(make: impl Into<String>, model: impl Into<String>, year: u16, odometer: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            make: make.into(),
            model: model.into(),
            year,
            odometer,
            color: None,
            plate: None,
            service_history: Vec::new(),
        }
    }

    pub fn with_plate(mut self, plate: impl Into<String>) -> Self {
        self.plate = Some(plate.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_service(mut self, entry: ServiceEntry) -> Self {
        self.service_history.push(entry);
        self
    }

    /// Inserts the entry, replacing any existing entry with the same id.
    pub fn upsert_service(&mut self, entry: ServiceEntry) -> Uuid {
        let id = entry.id;
        match self.service_history.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = entry,
            None => self.service_history.push(entry),
        }
        id
    }

    pub fn service_entry(&self, id: Uuid) -> Option<&ServiceEntry> {
        self.service_history.iter().find(|entry| entry.id == id)
    }

    pub fn completed_services(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.service_history.iter().filter(|entry| entry.is_completed())
    }

    /// History sorted newest first; entries sharing a date keep their recorded order.
    pub fn history_newest_first(&self) -> Vec<&ServiceEntry> {
        let mut entries: Vec<&ServiceEntry> = self.service_history.iter().collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }
}

impl Identifiable for Vehicle {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Vehicle {
    fn display_label(&self) -> String {
        match &self.plate {
            Some(plate) => format!("{} {} {} ({})", self.year, self.make, self.model, plate),
            None => format!("{} {} {}", self.year, self.make, self.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::service_entry::ServiceStatus;
    use chrono::NaiveDate;

    #[test]
    fn upsert_replaces_existing_entry() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut vehicle = Vehicle::new("Toyota", "Corolla", 2019, 50_000);
        let entry = ServiceEntry::new(date, "Logbook service", 45_000)
            .with_status(ServiceStatus::InProgress);
        let id = vehicle.upsert_service(entry.clone());

        let updated = entry.with_status(ServiceStatus::Completed);
        vehicle.upsert_service(updated);

        assert_eq!(vehicle.service_history.len(), 1);
        assert!(vehicle.service_entry(id).unwrap().is_completed());
    }

    #[test]
    fn display_label_includes_plate_when_present() {
        let vehicle = Vehicle::new("Mazda", "3", 2021, 12_000).with_plate("ABC123");
        assert_eq!(vehicle.display_label(), "2021 Mazda 3 (ABC123)");
    }

    #[test]
    fn history_is_sorted_newest_first() {
        let older = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let newer = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let vehicle = Vehicle::new("Ford", "Ranger", 2018, 90_000)
            .with_service(ServiceEntry::new(older, "Tyres", 70_000))
            .with_service(ServiceEntry::new(newer, "Brakes", 85_000));
        let history = vehicle.history_newest_first();
        assert_eq!(history[0].date, newer);
        assert_eq!(history[1].date, older);
    }
}
