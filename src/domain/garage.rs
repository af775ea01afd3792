use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    booking::Booking, mechanic::Mechanic, notification::Notification, vehicle::Vehicle,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Snapshot of everything the app persists locally: the user's vehicles,
/// the mechanic directory, bookings, and notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Garage {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub mechanics: Vec<Mechanic>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Garage::schema_version_default")]
    pub schema_version: u8,
}

impl Garage {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            vehicles: Vec::new(),
            mechanics: Vec::new(),
            bookings: Vec::new(),
            notifications: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> Uuid {
        let id = vehicle.id;
        self.vehicles.push(vehicle);
        self.touch();
        id
    }

    pub fn add_mechanic(&mut self, mechanic: Mechanic) -> Uuid {
        let id = mechanic.id;
        self.mechanics.push(mechanic);
        self.touch();
        id
    }

    pub fn add_booking(&mut self, booking: Booking) -> Uuid {
        let id = booking.id;
        self.bookings.push(booking);
        self.touch();
        id
    }

    pub fn push_notification(&mut self, notification: Notification) -> Uuid {
        let id = notification.id;
        self.notifications.push(notification);
        self.touch();
        id
    }

    pub fn vehicle(&self, id: Uuid) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.id == id)
    }

    pub fn vehicle_mut(&mut self, id: Uuid) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|vehicle| vehicle.id == id)
    }

    pub fn mechanic(&self, id: Uuid) -> Option<&Mechanic> {
        self.mechanics.iter().find(|mechanic| mechanic.id == id)
    }

    pub fn mechanic_mut(&mut self, id: Uuid) -> Option<&mut Mechanic> {
        self.mechanics.iter_mut().find(|mechanic| mechanic.id == id)
    }

    pub fn booking(&self, id: Uuid) -> Option<&Booking> {
        self.bookings.iter().find(|booking| booking.id == id)
    }

    pub fn booking_mut(&mut self, id: Uuid) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|booking| booking.id == id)
    }

    pub fn bookings_for_vehicle(&self, vehicle_id: Uuid) -> impl Iterator<Item = &Booking> {
        self.bookings
            .iter()
            .filter(move |booking| booking.vehicle_id == vehicle_id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
